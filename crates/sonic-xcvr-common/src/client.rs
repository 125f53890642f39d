//! Platform management client abstraction.
//!
//! The platform management service owns all transceiver hardware access.
//! Daemons reach it through short-lived connections: acquire a handle,
//! issue RPCs, drop the handle. The traits here are the entire surface
//! this workspace consumes; the wire protocol behind them belongs to the
//! platform vendor stack and is out of scope.

use async_trait::async_trait;

use crate::error::XcvrResult;

/// A single open connection to the platform management service.
///
/// Handles are scoped: the connection is released when the handle is
/// dropped, on success and failure paths alike. Callers must not hold a
/// handle across unrelated work.
///
/// Port numbers are 1-based front-panel indices.
#[async_trait]
pub trait MgmtConnection: Send {
    /// Returns the highest valid QSFP port index on this platform.
    async fn max_qsfp_port(&mut self) -> XcvrResult<u32>;

    /// Returns true if a transceiver module is inserted in `port`.
    async fn presence(&mut self, port: u32) -> XcvrResult<bool>;

    /// Returns true if `port` is operating in low-power mode.
    async fn low_power_mode(&mut self, port: u32) -> XcvrResult<bool>;

    /// Enables or disables low-power mode on `port`.
    ///
    /// Returns the platform status code; 0 indicates success.
    async fn set_low_power_mode(&mut self, port: u32, enable: bool) -> XcvrResult<i32>;

    /// Asserts or deasserts the reset line on `port`.
    ///
    /// Returns the platform status code; 0 indicates success. A module
    /// left with reset asserted is held inoperative, so callers pairing
    /// assert/deassert must issue both on the same connection.
    async fn set_reset(&mut self, port: u32, asserted: bool) -> XcvrResult<i32>;

    /// Returns the full raw EEPROM dump of the module in `port` as a
    /// hex string.
    async fn eeprom_hex(&mut self, port: u32) -> XcvrResult<String>;
}

/// Factory for connections to the platform management service.
///
/// Implementations are cheap to clone/share; each [`connect`] call
/// performs the actual endpoint handshake. A failed `connect` surfaces
/// as [`crate::XcvrError::Connection`] and is a routine condition while
/// the management service is still starting up.
///
/// [`connect`]: MgmtClient::connect
#[async_trait]
pub trait MgmtClient: Send + Sync {
    /// Opens a new connection to the management service.
    async fn connect(&self) -> XcvrResult<Box<dyn MgmtConnection>>;
}
