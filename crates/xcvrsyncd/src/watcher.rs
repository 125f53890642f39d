//! Change-event watcher state machine
//!
//! A single long-lived watcher detects transceiver hot-plug events. It
//! folds two concerns into one tick loop: liveness probing while the
//! management service is still coming up, and cadence-bounded presence
//! polling once it is. A watcher started before the service exists does
//! not error out; it degrades to "not ready" and keeps retrying the
//! probe on the same cadence as presence polls.

use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use sonic_xcvr_common::XcvrError;

use crate::context::XcvrContext;
use crate::presence::ChangeSet;

/// Watcher lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherPhase {
    /// The management service has never answered a probe
    NotReady,
    /// Ready, with no change-event call in flight
    ReadyIdle,
    /// Ready, with a caller blocked in `wait_for_change`
    ReadyWaiting,
}

impl WatcherPhase {
    /// Readiness is sticky: once a probe has succeeded the phase never
    /// returns to [`WatcherPhase::NotReady`].
    pub fn is_ready(&self) -> bool {
        !matches!(self, WatcherPhase::NotReady)
    }
}

impl XcvrContext {
    /// Opens and immediately drops a connection as a liveness probe.
    ///
    /// The probe connection is discarded rather than reused for the
    /// following poll; the poll cycle opens its own.
    async fn probe_liveness(&self) -> bool {
        match self.client().connect().await {
            Ok(conn) => {
                drop(conn);
                true
            }
            Err(e) => {
                debug!("Liveness probe failed: {}", e);
                false
            }
        }
    }

    /// Blocks until transceiver presence changes or the timeout expires.
    ///
    /// * `timeout_ms == 0` waits indefinitely.
    /// * `timeout_ms > 0` is converted to a whole-second budget;
    ///   sub-second remainders are dropped.
    /// * `timeout_ms < 0` is invalid and returns `(false, {})` without
    ///   blocking.
    ///
    /// The returned flag reports whether the management service has
    /// ever answered a probe; the change set is the sparse presence
    /// diff since the previous successful poll, empty on timeout or
    /// while the watcher is not yet ready.
    #[instrument(skip(self))]
    pub async fn wait_for_change(&self, timeout_ms: i64) -> (bool, ChangeSet) {
        if timeout_ms < 0 {
            let err =
                XcvrError::invalid_argument(format!("negative change-event timeout {}ms", timeout_ms));
            warn!("{}", err);
            return (false, ChangeSet::new());
        }

        let forever = timeout_ms == 0;
        let mut remaining = timeout_ms as u64 / 1000;
        let poll_interval = self.config().watcher.poll_interval_ticks;
        let tick = self.config().tick();

        // Held for the whole wait: the watcher is one subsystem and a
        // second concurrent caller queues behind the first.
        let mut state = self.watcher.lock().await;
        if state.phase.is_ready() {
            state.phase = WatcherPhase::ReadyWaiting;
        }

        loop {
            if !forever && remaining == 0 {
                break;
            }

            if !state.phase.is_ready() {
                if self.probe_liveness().await {
                    info!("Management service is up, watcher ready");
                    state.phase = WatcherPhase::ReadyWaiting;
                    state.pending.clear();
                    // Restart without sleeping so a freshly-ready
                    // watcher begins polling without delay.
                    continue;
                }
            } else if state.cadence == 0 {
                state.cadence = poll_interval;
                let changes = self.poll_presence(&mut state).await;
                state.pending = changes;
                if !state.pending.is_empty() {
                    break;
                }
            }

            if !forever {
                remaining -= 1;
            }
            if state.cadence > 0 {
                state.cadence -= 1;
            }
            sleep(tick).await;
        }

        let ready = state.phase.is_ready();
        if ready {
            state.phase = WatcherPhase::ReadyIdle;
        }
        (ready, std::mem::take(&mut state.pending))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use sonic_xcvr_common::MockPltfmMgr;

    use super::*;
    use crate::config::XcvrConfig;
    use crate::presence::Presence;

    async fn test_context(mock: &MockPltfmMgr) -> Arc<XcvrContext> {
        let dir = tempfile::tempdir().unwrap();
        let mut config = XcvrConfig::default();
        config.eeprom.cache_path = dir.path().join("cache");
        Arc::new(
            XcvrContext::new(Arc::new(mock.clone()), config)
                .await
                .unwrap(),
        )
    }

    #[test]
    fn test_phase_readiness() {
        assert!(!WatcherPhase::NotReady.is_ready());
        assert!(WatcherPhase::ReadyIdle.is_ready());
        assert!(WatcherPhase::ReadyWaiting.is_ready());
    }

    #[tokio::test]
    async fn test_negative_timeout_fails_fast() {
        let mock = MockPltfmMgr::new(4);
        let ctx = test_context(&mock).await;

        let (ready, changes) = ctx.wait_for_change(-1).await;

        assert!(!ready);
        assert!(changes.is_empty());
        // Invalid argument short-circuits before any backend traffic.
        assert_eq!(mock.connect_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_wait_expires_empty_on_quiet_backend() {
        let mock = MockPltfmMgr::new(4);
        let ctx = test_context(&mock).await;

        let start = tokio::time::Instant::now();
        let (ready, changes) = ctx.wait_for_change(5000).await;

        assert!(ready);
        assert!(changes.is_empty());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed <= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_second_timeout_truncates_to_zero_budget() {
        let mock = MockPltfmMgr::new(4);
        let ctx = test_context(&mock).await;

        let start = tokio::time::Instant::now();
        let (ready, changes) = ctx.wait_for_change(500).await;

        assert!(!ready);
        assert!(changes.is_empty());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_backend_reports_not_ready() {
        let mock = MockPltfmMgr::unreachable(4);
        let ctx = test_context(&mock).await;

        let (ready, changes) = ctx.wait_for_change(3000).await;

        assert!(!ready);
        assert!(changes.is_empty());
        assert_eq!(mock.connect_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_module_inserted_before_wait_is_reported() {
        let mock = MockPltfmMgr::new(8);
        mock.insert_module(5);
        let ctx = test_context(&mock).await;

        let (ready, changes) = ctx.wait_for_change(30_000).await;

        assert!(ready);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get(&5), Some(&Presence::Present));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_wait_blocks_until_change() {
        let mock = MockPltfmMgr::new(8);
        let ctx = test_context(&mock).await;

        let watcher = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.wait_for_change(0).await })
        };

        // A minute of quiet backend: many poll cycles, no change, no
        // spurious return.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!watcher.is_finished());

        mock.insert_module(2);
        let (ready, changes) = watcher.await.expect("watcher task panicked");

        assert!(ready);
        assert_eq!(changes.get(&2), Some(&Presence::Present));
    }

    #[tokio::test(start_paused = true)]
    async fn test_readiness_is_sticky_across_outage() {
        let mock = MockPltfmMgr::new(4);
        let ctx = test_context(&mock).await;

        // First call achieves readiness.
        let (ready, _) = ctx.wait_for_change(1000).await;
        assert!(ready);

        // Service goes down: readiness must not revert.
        mock.set_reachable(false);
        let (ready, changes) = ctx.wait_for_change(2000).await;

        assert!(ready);
        assert!(changes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_removal_detected_on_later_poll() {
        let mock = MockPltfmMgr::new(8);
        mock.insert_module(3);
        let ctx = test_context(&mock).await;

        let (_, first) = ctx.wait_for_change(30_000).await;
        assert_eq!(first.get(&3), Some(&Presence::Present));

        mock.remove_module(3);
        let (ready, second) = ctx.wait_for_change(30_000).await;

        assert!(ready);
        assert_eq!(second.len(), 1);
        assert_eq!(second.get(&3), Some(&Presence::Absent));
    }
}
