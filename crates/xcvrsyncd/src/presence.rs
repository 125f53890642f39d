//! Transceiver presence sampling and change detection
//!
//! Samples per-port module presence from the platform management service
//! and computes the sparse diff against the last-observed state. One
//! connection is opened per poll cycle; a failed connect aborts the
//! cycle, a failed per-port read degrades that port to absent.

use std::collections::BTreeMap;

use tracing::{debug, instrument, warn};

use crate::context::XcvrContext;

/// Module presence values
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    /// A transceiver module is inserted
    Present,
    /// The port is empty
    Absent,
}

impl Presence {
    /// Convert presence to the platform-layer wire encoding
    pub fn as_str(&self) -> &'static str {
        match self {
            Presence::Present => "1",
            Presence::Absent => "0",
        }
    }

    /// Convert a raw presence flag from the management service
    pub fn from_flag(present: bool) -> Self {
        if present {
            Presence::Present
        } else {
            Presence::Absent
        }
    }

    /// Returns true for [`Presence::Present`]
    pub fn is_present(&self) -> bool {
        matches!(self, Presence::Present)
    }
}

/// Full last-observed presence per port, overwritten in place each cycle
pub type PortState = BTreeMap<u32, Presence>;

/// Sparse map of ports whose presence differs from the previous state
pub type ChangeSet = BTreeMap<u32, Presence>;

/// Mutable change-event watcher bookkeeping.
///
/// Guarded by the context's watcher mutex; `wait_for_change` holds the
/// guard for its whole run, so a second concurrent watcher call queues
/// behind the first.
#[derive(Debug)]
pub(crate) struct WatcherState {
    /// Last-observed presence for every port in range
    pub(crate) current: PortState,
    /// Change set produced by the most recent poll cycle
    pub(crate) pending: ChangeSet,
    /// Watcher phase (readiness is sticky once achieved)
    pub(crate) phase: crate::watcher::WatcherPhase,
    /// Tick countdown until the next presence poll
    pub(crate) cadence: u32,
}

impl WatcherState {
    pub(crate) fn new(poll_interval_ticks: u32) -> Self {
        Self {
            current: PortState::new(),
            pending: ChangeSet::new(),
            phase: crate::watcher::WatcherPhase::NotReady,
            cadence: poll_interval_ticks,
        }
    }
}

impl XcvrContext {
    /// Samples presence for every port in range and returns the sparse
    /// diff against the last-observed state.
    ///
    /// Opens exactly one management connection for the whole cycle. If
    /// the connection cannot be opened the cycle aborts: the change set
    /// comes back empty and `current` is left untouched. A per-port
    /// read failure does not abort the scan; the port reports absent
    /// for this cycle.
    #[instrument(skip(self, state))]
    pub(crate) async fn poll_presence(&self, state: &mut WatcherState) -> ChangeSet {
        let range = self.current_range().await;

        let mut conn = match self.client().connect().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Presence poll aborted: {}", e);
                return ChangeSet::new();
            }
        };

        let mut changes = ChangeSet::new();

        for port in range.ports() {
            let sampled = match conn.presence(port).await {
                Ok(present) => Presence::from_flag(present),
                Err(e) => {
                    debug!(port, "Presence read failed, reporting absent: {}", e);
                    Presence::Absent
                }
            };

            // A never-seen port compares as absent, so only insertions
            // show up on the first scan.
            let previous = state
                .current
                .get(&port)
                .copied()
                .unwrap_or(Presence::Absent);
            if sampled != previous {
                changes.insert(port, sampled);
            }

            state.current.insert(port, sampled);
        }

        changes
    }
}
