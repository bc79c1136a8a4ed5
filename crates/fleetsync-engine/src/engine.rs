// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The sync pass state machine: Idle -> Debouncing -> Syncing.
//!
//! A pass iterates the queue strictly in FIFO order and never dispatches
//! two actions concurrently, since later items may be causally dependent on
//! earlier ones reaching the server. A failed action does not abort the
//! pass: the loop records the failure and continues to the next item.
//! Deliberate trade-off: independent actions are not blocked by one stuck
//! item, at the cost of broken ordering between causally dependent actions
//! (a free-trip close can be attempted after its start failed). The server
//! must tolerate that order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fleetsync_config::model::SyncConfig;
use fleetsync_connectivity::Connectivity;
use fleetsync_core::types::{DeadLetterReason, DispatchOutcome, OfflineAction, SyncReport, SyncStatus};
use fleetsync_core::{ActionTransport, FleetsyncError};
use fleetsync_outbox::{Outbox, RetryDisposition};

/// Orchestrates sync passes over the outbox.
///
/// An explicit service instance owned by the application's dependency
/// graph: the outbox handles `init` (document load) and every mutation is
/// flushed, so the engine itself has no teardown step.
pub struct SyncEngine {
    outbox: Arc<Outbox>,
    transport: Arc<dyn ActionTransport>,
    connectivity: watch::Receiver<Connectivity>,
    config: SyncConfig,
    /// Single-flight guard: at most one pass runs at a time.
    pass_active: AtomicBool,
}

impl SyncEngine {
    pub fn new(
        outbox: Arc<Outbox>,
        transport: Arc<dyn ActionTransport>,
        connectivity: watch::Receiver<Connectivity>,
        config: SyncConfig,
    ) -> Self {
        Self {
            outbox,
            transport,
            connectivity,
            config,
            pass_active: AtomicBool::new(false),
        }
    }

    /// Status snapshot for the UI layer.
    pub fn status(&self) -> Result<SyncStatus, FleetsyncError> {
        self.outbox.status()
    }

    /// Manual "sync now" trigger.
    ///
    /// Skips the reconnect debounce but honors the same guards as an
    /// automatic pass: offline, an empty queue, or an already-running pass
    /// all make this a no-op reported as an empty [`SyncReport`].
    pub async fn sync_now(&self) -> Result<SyncReport, FleetsyncError> {
        if !self.connectivity.borrow().is_online() {
            debug!("sync_now skipped: offline");
            return Ok(SyncReport::default());
        }
        self.pass_with_offline_cancel(&CancellationToken::new()).await
    }

    /// Long-running loop: consume connectivity transitions and schedule
    /// debounced passes until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), FleetsyncError> {
        let mut rx = self.connectivity.clone();
        let mut online = rx.borrow_and_update().is_online();

        // A queue left over from the previous session syncs on startup if
        // the host is already online.
        if online && self.outbox.pending_count()? > 0 {
            self.debounced_pass(&mut rx, &shutdown).await?;
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("sync engine stopping");
                    return Ok(());
                }
                changed = rx.changed() => {
                    if changed.is_err() {
                        // Monitor dropped; nothing will ever wake us again.
                        return Ok(());
                    }
                    let now_online = rx.borrow_and_update().is_online();
                    let became_online = now_online && !online;
                    online = now_online;
                    if became_online && self.outbox.pending_count()? > 0 {
                        self.debounced_pass(&mut rx, &shutdown).await?;
                        online = rx.borrow_and_update().is_online();
                    }
                }
            }
        }
    }

    /// Debounce a reconnect, then run a pass if the guards still hold.
    async fn debounced_pass(
        &self,
        rx: &mut watch::Receiver<Connectivity>,
        shutdown: &CancellationToken,
    ) -> Result<(), FleetsyncError> {
        if !self.await_debounce(rx, shutdown).await? {
            return Ok(());
        }
        self.pass_with_offline_cancel(shutdown).await?;
        Ok(())
    }

    /// Wait out the debounce window.
    ///
    /// Returns `true` if the pass should proceed: the delay elapsed with
    /// connectivity still online and the queue still non-empty. Flipping
    /// offline before the delay elapses abandons the scheduled attempt.
    async fn await_debounce(
        &self,
        rx: &mut watch::Receiver<Connectivity>,
        shutdown: &CancellationToken,
    ) -> Result<bool, FleetsyncError> {
        debug!(secs = self.config.debounce_secs, "debouncing reconnect");
        let delay = tokio::time::sleep(Duration::from_secs(self.config.debounce_secs));
        tokio::pin!(delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(false),
                _ = &mut delay => {
                    return Ok(rx.borrow().is_online() && self.outbox.pending_count()? > 0);
                }
                changed = rx.changed() => {
                    if changed.is_err() {
                        return Ok(false);
                    }
                    if !rx.borrow_and_update().is_online() {
                        debug!("debounce abandoned: went offline");
                        return Ok(false);
                    }
                }
            }
        }
    }

    /// Run one pass with a cancellation token tripped by the monitor
    /// reporting offline mid-pass (or by shutdown).
    async fn pass_with_offline_cancel(
        &self,
        shutdown: &CancellationToken,
    ) -> Result<SyncReport, FleetsyncError> {
        let cancel = shutdown.child_token();
        let mut rx = self.connectivity.clone();
        let trip = cancel.clone();
        let watcher = tokio::spawn(async move {
            loop {
                if !rx.borrow_and_update().is_online() {
                    trip.cancel();
                    return;
                }
                if rx.changed().await.is_err() {
                    return;
                }
            }
        });
        let report = self.run_pass(&cancel).await;
        watcher.abort();
        report
    }

    /// Execute one sync pass.
    ///
    /// Strictly sequential FIFO drain; per-action outcomes:
    /// - `Success`: remove from the queue immediately.
    /// - `Retryable`: bump the retry count (dead-letter at the cap), keep
    ///   queued, continue with the next action.
    /// - `Terminal`: move to the dead-letter list, continue.
    ///
    /// Each dispatch is bounded by `sync.dispatch_timeout_secs`; expiry
    /// counts as a retryable failure so a stalled call cannot hold the
    /// single-flight guard forever. Cancellation stops the pass; the
    /// in-flight action and everything after it stay queued with their
    /// retry counts untouched, since the server may still have applied the
    /// interrupted call (at-least-once).
    async fn run_pass(&self, cancel: &CancellationToken) -> Result<SyncReport, FleetsyncError> {
        if self
            .pass_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("sync pass skipped: another pass is running");
            return Ok(SyncReport::default());
        }
        let _guard = PassGuard(&self.pass_active);

        let snapshot = self.outbox.list()?;
        if snapshot.is_empty() {
            return Ok(SyncReport::default());
        }

        self.outbox.set_syncing(true)?;
        let mut report = SyncReport::default();
        let drained = self.drain(&snapshot, cancel, &mut report).await;
        // Clear the syncing flag even when the drain aborted on a storage
        // error, otherwise the document reports a running pass until the
        // next restart.
        let finished = self
            .outbox
            .finish_pass(report.succeeded, report.failed, Utc::now());
        drained?;
        finished?;

        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            dead_lettered = report.dead_lettered,
            cancelled = report.cancelled,
            "sync pass finished"
        );
        Ok(report)
    }

    async fn drain(
        &self,
        snapshot: &[OfflineAction],
        cancel: &CancellationToken,
        report: &mut SyncReport,
    ) -> Result<(), FleetsyncError> {
        let dispatch_timeout = Duration::from_secs(self.config.dispatch_timeout_secs);

        for action in snapshot {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    report.cancelled = true;
                    break;
                }
                dispatched = tokio::time::timeout(dispatch_timeout, self.transport.dispatch(action)) => {
                    match dispatched {
                        Ok(outcome) => outcome,
                        Err(_) => DispatchOutcome::Retryable(format!(
                            "dispatch exceeded {}s", self.config.dispatch_timeout_secs
                        )),
                    }
                }
            };
            report.attempted += 1;

            match outcome {
                DispatchOutcome::Success => {
                    self.outbox.remove(&action.id)?;
                    report.succeeded += 1;
                }
                DispatchOutcome::Retryable(reason) => {
                    warn!(id = %action.id, kind = %action.kind, %reason, "action failed, will retry");
                    report.failed += 1;
                    if self.outbox.record_retry_failure(&action.id)?
                        == RetryDisposition::DeadLettered
                    {
                        report.dead_lettered += 1;
                    }
                }
                DispatchOutcome::Terminal(detail) => {
                    warn!(id = %action.id, kind = %action.kind, %detail, "action rejected permanently");
                    report.failed += 1;
                    report.dead_lettered += 1;
                    self.outbox
                        .move_to_dead_letter(&action.id, DeadLetterReason::Terminal { detail })?;
                }
            }
        }
        Ok(())
    }
}

/// Releases the single-flight guard on every exit path of a pass.
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
