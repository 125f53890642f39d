//! Shared daemon context and port-range resolution
//!
//! One `XcvrContext` is constructed at daemon startup and shared by
//! reference with every per-port facade. It owns the management client
//! handle, the lazily-resolved port range, the change-event watcher
//! bookkeeping, and the EEPROM cache lock. Presence polling is one
//! subsystem no matter how many port objects exist, so all of its state
//! lives here.

use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, instrument};

use sonic_xcvr_common::{MgmtClient, XcvrError, XcvrResult};

use crate::config::XcvrConfig;
use crate::eeprom_cache;
use crate::presence::WatcherState;

/// 1-based inclusive range of front-panel QSFP ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    /// First valid port number
    pub start: u32,
    /// Last valid port number; 0 while unresolved
    pub end: u32,
}

impl PortRange {
    /// Range used before resolution succeeds; contains no ports.
    pub(crate) const UNRESOLVED: PortRange = PortRange { start: 1, end: 0 };

    /// Returns true once the range has been learned from the platform.
    pub fn is_resolved(&self) -> bool {
        self.end > 0
    }

    /// Returns true if `port` falls inside the range.
    pub fn contains(&self, port: u32) -> bool {
        port >= self.start && port <= self.end
    }

    /// Iterates the ports in the range in ascending order.
    pub fn ports(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

/// Process-wide transceiver subsystem state.
///
/// Construct once at startup and share via [`Arc`]; see
/// [`crate::sfp::Sfp`] for the per-port view.
pub struct XcvrContext {
    client: Arc<dyn MgmtClient>,
    config: XcvrConfig,
    /// Resolved port range; set at most once for the process lifetime.
    range: OnceCell<PortRange>,
    /// Watcher bookkeeping; held for the full duration of a
    /// `wait_for_change` call.
    pub(crate) watcher: Mutex<WatcherState>,
    /// Serializes access to the shared EEPROM cache file.
    pub(crate) eeprom_lock: Mutex<()>,
}

impl XcvrContext {
    /// Creates the context and primes the EEPROM cache file.
    ///
    /// The cache directory and file are created (empty) before any RPC
    /// traffic so later fetches only ever rewrite an existing file.
    pub async fn new(client: Arc<dyn MgmtClient>, config: XcvrConfig) -> XcvrResult<Self> {
        eeprom_cache::prime_cache_file(&config.eeprom.cache_path).await?;

        let watcher = Mutex::new(WatcherState::new(config.watcher.poll_interval_ticks));

        Ok(Self {
            client,
            config,
            range: OnceCell::new(),
            watcher,
            eeprom_lock: Mutex::new(()),
        })
    }

    pub(crate) fn client(&self) -> &dyn MgmtClient {
        self.client.as_ref()
    }

    pub(crate) fn config(&self) -> &XcvrConfig {
        &self.config
    }

    /// Resolves the QSFP port range from the platform.
    ///
    /// The first successful resolution is cached for the process
    /// lifetime; failed attempts leave the range unresolved and are
    /// retried on the next call.
    #[instrument(skip(self))]
    pub async fn resolve_port_range(&self) -> XcvrResult<PortRange> {
        self.range
            .get_or_try_init(|| async {
                let mut conn = self.client.connect().await?;
                let max = conn.max_qsfp_port().await?;
                if max == 0 {
                    // Zero ports means the platform profile is not
                    // loaded yet; stay unresolved and retry later.
                    return Err(XcvrError::rpc(
                        "max_qsfp_port",
                        "management service reported zero ports",
                    ));
                }
                info!("Resolved QSFP port range 1..={}", max);
                Ok(PortRange { start: 1, end: max })
            })
            .await
            .copied()
    }

    /// Best-effort view of the port range.
    ///
    /// Attempts resolution if it has not succeeded yet; while the
    /// management service is unreachable this returns the unresolved
    /// range, so every port-bounds check fails closed.
    pub(crate) async fn current_range(&self) -> PortRange {
        match self.resolve_port_range().await {
            Ok(range) => range,
            Err(e) => {
                debug!("Port range not resolved: {}", e);
                PortRange::UNRESOLVED
            }
        }
    }

    /// First valid port number.
    pub async fn port_start(&self) -> u32 {
        self.current_range().await.start
    }

    /// Last valid port number; 0 while the range is unresolved.
    pub async fn port_end(&self) -> u32 {
        self.current_range().await.end
    }

    /// Ordered list of ports eligible for transceiver operations.
    pub async fn qsfp_ports(&self) -> Vec<u32> {
        self.current_range().await.ports().collect()
    }

    /// Fails with [`XcvrError::InvalidPort`] for ports outside the
    /// resolved range (every port, while unresolved).
    pub(crate) async fn ensure_valid_port(&self, port: u32) -> XcvrResult<()> {
        if self.current_range().await.contains(port) {
            Ok(())
        } else {
            Err(XcvrError::InvalidPort { port })
        }
    }
}

impl std::fmt::Debug for XcvrContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XcvrContext")
            .field("range", &self.range.get())
            .finish_non_exhaustive()
    }
}
