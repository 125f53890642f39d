//! Per-port transceiver facade
//!
//! Single-port operations are one-call passthroughs to the management
//! service, gated on a port-bounds check against the resolved range.
//! The fallible internals return `XcvrResult`; the facade collapses
//! them to the conservative platform-layer defaults (`false`/`None`)
//! so a flaky port or transient outage never surfaces as an error to
//! the NOS.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use sonic_xcvr_common::{XcvrError, XcvrResult};

use crate::context::XcvrContext;
use crate::presence::ChangeSet;

impl XcvrContext {
    /// Reads module presence for a single port.
    #[instrument(skip(self))]
    pub async fn port_presence(&self, port: u32) -> XcvrResult<bool> {
        self.ensure_valid_port(port).await?;
        let mut conn = self.client().connect().await?;
        conn.presence(port).await
    }

    /// Reads the low-power mode flag for a single port.
    #[instrument(skip(self))]
    pub async fn port_low_power_mode(&self, port: u32) -> XcvrResult<bool> {
        self.ensure_valid_port(port).await?;
        let mut conn = self.client().connect().await?;
        conn.low_power_mode(port).await
    }

    /// Enables or disables low-power mode on a single port.
    ///
    /// Returns true if the platform accepted the write (status 0).
    #[instrument(skip(self))]
    pub async fn set_port_low_power_mode(&self, port: u32, enable: bool) -> XcvrResult<bool> {
        self.ensure_valid_port(port).await?;
        let mut conn = self.client().connect().await?;
        let status = conn.set_low_power_mode(port, enable).await?;
        Ok(status == 0)
    }

    /// Resets the module in a single port.
    ///
    /// Assert and deassert are issued as two ordered calls on one
    /// connection. The deassert is attempted even if the assert RPC
    /// errors; a module left with reset asserted is held inoperative.
    #[instrument(skip(self))]
    pub async fn reset_port(&self, port: u32) -> XcvrResult<bool> {
        self.ensure_valid_port(port).await?;
        let mut conn = self.client().connect().await?;

        let asserted = conn.set_reset(port, true).await;
        let deasserted = conn.set_reset(port, false).await;

        Ok(matches!(asserted, Ok(0)) && matches!(deasserted, Ok(0)))
    }
}

/// Per-port view of the transceiver subsystem.
///
/// Holds a port number fixed at construction and a shared reference to
/// the process-wide [`XcvrContext`]; carries no state of its own. Any
/// number of facades may exist concurrently.
#[derive(Clone)]
pub struct Sfp {
    ctx: Arc<XcvrContext>,
    port: u32,
}

impl Sfp {
    /// Creates a facade for `port`.
    pub fn new(ctx: Arc<XcvrContext>, port: u32) -> Self {
        Self { ctx, port }
    }

    /// The port number this facade is bound to.
    pub fn port_num(&self) -> u32 {
        self.port
    }

    /// Returns true if a module is inserted.
    ///
    /// Out-of-range ports and failed reads report false.
    pub async fn get_presence(&self) -> bool {
        collapse(self.ctx.port_presence(self.port).await, "presence")
    }

    /// Returns true if the module is in low-power mode.
    pub async fn get_lpmode(&self) -> bool {
        collapse(
            self.ctx.port_low_power_mode(self.port).await,
            "low_power_mode",
        )
    }

    /// Enables or disables low-power mode; true on success.
    pub async fn set_lpmode(&self, enable: bool) -> bool {
        collapse(
            self.ctx.set_port_low_power_mode(self.port, enable).await,
            "set_low_power_mode",
        )
    }

    /// Resets the module; true if both reset calls succeeded.
    pub async fn reset(&self) -> bool {
        collapse(self.ctx.reset_port(self.port).await, "reset")
    }

    /// Fetches an EEPROM snapshot into the shared cache file.
    ///
    /// Returns the cache path, or `None` when the port is empty,
    /// out of range, or the fetch failed.
    pub async fn get_eeprom_path(&self) -> Option<PathBuf> {
        match self.ctx.port_eeprom_path(self.port).await {
            Ok(path) => path,
            Err(XcvrError::InvalidPort { port }) => {
                debug!(port, "Ignoring out-of-range port");
                None
            }
            Err(e) => {
                warn!(port = self.port, "EEPROM snapshot failed: {}", e);
                None
            }
        }
    }

    /// Waits on the shared change-event watcher.
    ///
    /// The watcher is context-wide; which facade the call goes through
    /// is immaterial. See [`XcvrContext::wait_for_change`].
    pub async fn get_change_event(&self, timeout_ms: i64) -> (bool, ChangeSet) {
        self.ctx.wait_for_change(timeout_ms).await
    }
}

impl std::fmt::Debug for Sfp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sfp").field("port", &self.port).finish()
    }
}

/// Collapses a fallible per-port read to the platform-layer default.
///
/// Invalid-port is a routine caller bug and logs at debug; everything
/// else is a degraded backend and logs at warn.
fn collapse(result: XcvrResult<bool>, operation: &str) -> bool {
    match result {
        Ok(value) => value,
        Err(XcvrError::InvalidPort { port }) => {
            debug!(port, operation, "Ignoring out-of-range port");
            false
        }
        Err(e) => {
            warn!(operation, "Degrading to false: {}", e);
            false
        }
    }
}
