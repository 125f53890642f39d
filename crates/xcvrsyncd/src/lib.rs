//! Transceiver Synchronization Daemon
//!
//! Monitors pluggable transceivers (SFP/QSFP) through the platform
//! management service and surfaces hot-plug events to the NOS platform
//! layer. One process-wide [`XcvrContext`] owns the port range, the
//! presence watcher, and the EEPROM snapshot cache; per-port
//! [`Sfp`] facades forward single-port operations to it.
//!
//! Presence changes are detected by a cadence-bounded poll loop rather
//! than hardware interrupts: the management service is the only party
//! with module access, and it is polled through short-lived
//! connections that tolerate the service being down during bring-up.

pub mod config;
pub mod context;
pub mod eeprom_cache;
pub mod presence;
pub mod sfp;
pub mod watcher;

pub use config::{EepromConfig, MgmtConfig, WatcherConfig, XcvrConfig};
pub use context::{PortRange, XcvrContext};
pub use presence::{ChangeSet, PortState, Presence};
pub use sfp::Sfp;
pub use watcher::WatcherPhase;
