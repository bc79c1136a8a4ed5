// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connectivity signal for the sync engine.
//!
//! The monitor holds the host environment's binary network-presence
//! indicator and fans out edge-triggered transitions over a watch channel.
//! The signal is a heuristic, not a reachability probe: "online" can still
//! mean the fleet API is unreachable. That limitation is accepted here and
//! handled by the sync engine's retry path, not hidden.
//!
//! The monitor never retries or queues anything itself.

use tokio::sync::watch;
use tracing::info;

/// Binary connectivity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

impl Connectivity {
    pub fn is_online(self) -> bool {
        self == Connectivity::Online
    }
}

/// Observes the host's online/offline signal and emits transition events.
///
/// The platform integration feeds the monitor via [`report_online`] /
/// [`report_offline`]; consumers subscribe and see only actual transitions
/// (duplicate reports do not re-notify).
///
/// [`report_online`]: ConnectivityMonitor::report_online
/// [`report_offline`]: ConnectivityMonitor::report_offline
pub struct ConnectivityMonitor {
    tx: watch::Sender<Connectivity>,
}

impl ConnectivityMonitor {
    /// Create a monitor with the given initial state.
    pub fn new(initial: Connectivity) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Current state snapshot.
    pub fn is_online(&self) -> bool {
        self.tx.borrow().is_online()
    }

    /// Subscribe to connectivity transitions.
    ///
    /// The receiver's `changed()` resolves once per actual transition.
    pub fn subscribe(&self) -> watch::Receiver<Connectivity> {
        self.tx.subscribe()
    }

    /// Report that the host believes it is online.
    pub fn report_online(&self) {
        self.report(Connectivity::Online);
    }

    /// Report that the host believes it is offline.
    pub fn report_offline(&self) {
        self.report(Connectivity::Offline);
    }

    fn report(&self, state: Connectivity) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            info!(?state, "connectivity transition");
        }
    }
}

impl Default for ConnectivityMonitor {
    /// Starts offline; the platform integration reports the real state.
    fn default() -> Self {
        Self::new(Connectivity::Offline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let monitor = ConnectivityMonitor::new(Connectivity::Offline);
        let mut rx = monitor.subscribe();

        monitor.report_online();
        rx.changed().await.expect("sender alive");
        assert_eq!(*rx.borrow_and_update(), Connectivity::Online);

        monitor.report_offline();
        rx.changed().await.expect("sender alive");
        assert_eq!(*rx.borrow_and_update(), Connectivity::Offline);
    }

    #[tokio::test]
    async fn duplicate_reports_do_not_renotify() {
        let monitor = ConnectivityMonitor::new(Connectivity::Online);
        let mut rx = monitor.subscribe();
        rx.borrow_and_update();

        monitor.report_online();
        assert!(
            !rx.has_changed().expect("sender alive"),
            "reporting the current state must not emit an event"
        );
    }

    #[test]
    fn snapshot_reflects_latest_report() {
        let monitor = ConnectivityMonitor::default();
        assert!(!monitor.is_online());
        monitor.report_online();
        assert!(monitor.is_online());
    }
}
