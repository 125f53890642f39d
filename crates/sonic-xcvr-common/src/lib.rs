//! Common infrastructure for SONiC transceiver daemons.
//!
//! This crate provides the shared building blocks for transceiver
//! management daemons in the Rust rewrite:
//!
//! - [`client`]: The narrow async interface to the platform management
//!   service (presence, low-power mode, reset, EEPROM dumps)
//! - [`error`]: Error types for transceiver operations
//! - [`mock`]: An in-memory platform manager used by tests and by
//!   standalone daemon runs
//!
//! # Architecture
//!
//! Transceiver daemons never talk to hardware directly. All module state
//! lives behind the platform management service, reached through
//! short-lived connections:
//!
//! 1. Acquire a connection via [`client::MgmtClient::connect`]
//! 2. Issue one or more RPCs on the [`client::MgmtConnection`] handle
//! 3. Drop the handle, releasing the connection on every path
//!
//! Connection-level failures are routine during switch bring-up (the
//! management service starts after the NOS) and are surfaced as
//! [`error::XcvrError::Connection`] for callers to degrade on.

pub mod client;
pub mod error;
pub mod mock;

// Re-export commonly used items at crate root
pub use client::{MgmtClient, MgmtConnection};
pub use error::{XcvrError, XcvrResult};
pub use mock::{MgmtCall, MockPltfmMgr};
