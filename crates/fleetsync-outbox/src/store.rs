// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The outbox store: FIFO queue operations, sync metadata bookkeeping, and
//! document persistence.
//!
//! The store is written from two logical actors: the UI (`enqueue`) and the
//! sync engine (`remove`, metadata updates). Unlike the single-threaded UI
//! runtime this design came from, both actors here may run on different
//! threads, so all state sits behind a mutex and every mutation flushes the
//! document before returning.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use fleetsync_config::model::StorageConfig;
use fleetsync_core::FleetsyncError;
use fleetsync_core::types::{
    ActionId, ActionKind, DeadLetter, DeadLetterReason, OfflineAction, Payload, SyncMetadata,
    SyncStatus,
};

use crate::document::{OutboxDocument, SCHEMA_VERSION};

/// What happened to an action after a retryable failure was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    /// Still queued; will be attempted again on the next pass.
    Requeued,
    /// Retry cap reached; moved to the dead-letter list.
    DeadLettered,
}

/// Durable, ordered store of pending offline actions plus sync metadata.
pub struct Outbox {
    path: PathBuf,
    state: Mutex<OutboxDocument>,
    max_attempts: u32,
    recovered: bool,
}

impl Outbox {
    /// Open (or create) the outbox document for the configured application.
    ///
    /// A missing document starts empty. A document that fails to parse or
    /// carries an unsupported schema version also starts empty -- the
    /// failure is logged and reported through [`Outbox::recovered`], never
    /// propagated as an error and never silent. `is_syncing` is always
    /// reset to false on load.
    pub fn open(storage: &StorageConfig, max_attempts: u32) -> Result<Self, FleetsyncError> {
        let dir = if storage.data_dir.is_empty() {
            dirs::data_dir()
                .ok_or_else(|| {
                    FleetsyncError::Config("no platform data dir; set storage.data_dir".into())
                })?
                .join("fleetsync")
        } else {
            PathBuf::from(&storage.data_dir)
        };
        fs::create_dir_all(&dir).map_err(FleetsyncError::outbox)?;
        let path = dir.join(format!("{}-outbox.json", storage.app_name));

        let (mut document, recovered) = Self::load_document(&path);
        document.is_syncing = false;
        if recovered {
            // Metadata from the unreadable document is gone with it.
            document = OutboxDocument {
                schema_version: SCHEMA_VERSION,
                ..OutboxDocument::default()
            };
        }

        debug!(
            path = %path.display(),
            pending = document.pending.len(),
            recovered,
            "outbox opened"
        );

        Ok(Self {
            path,
            state: Mutex::new(document),
            max_attempts,
            recovered,
        })
    }

    fn load_document(path: &Path) -> (OutboxDocument, bool) {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return (OutboxDocument::default(), false);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "outbox document unreadable, starting empty");
                return (OutboxDocument::default(), true);
            }
        };

        match serde_json::from_slice::<OutboxDocument>(&raw) {
            Ok(doc) if doc.schema_version <= SCHEMA_VERSION => (doc, false),
            Ok(doc) => {
                warn!(
                    found = doc.schema_version,
                    supported = SCHEMA_VERSION,
                    "outbox document from a newer schema, starting empty"
                );
                (OutboxDocument::default(), true)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "outbox document corrupt, starting empty");
                (OutboxDocument::default(), true)
            }
        }
    }

    /// True if the persisted document could not be loaded and the store
    /// started from an empty queue.
    pub fn recovered(&self) -> bool {
        self.recovered
    }

    /// Path of the persisted document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, OutboxDocument>, FleetsyncError> {
        self.state
            .lock()
            .map_err(|_| FleetsyncError::Internal("outbox mutex poisoned".into()))
    }

    /// Atomic replace: write a sibling temp file, fsync, then rename over
    /// the document. A crash mid-write leaves the previous document intact.
    fn flush(&self, doc: &OutboxDocument) -> Result<(), FleetsyncError> {
        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(doc).map_err(FleetsyncError::outbox)?;
        let mut file = fs::File::create(&tmp).map_err(FleetsyncError::outbox)?;
        file.write_all(&bytes).map_err(FleetsyncError::outbox)?;
        file.sync_all().map_err(FleetsyncError::outbox)?;
        fs::rename(&tmp, &self.path).map_err(FleetsyncError::outbox)?;
        Ok(())
    }

    /// Append a new action at the tail of the queue.
    ///
    /// The document is flushed before this returns, so a crash immediately
    /// after enqueue does not drop the action.
    pub fn enqueue(&self, kind: ActionKind, payload: Payload) -> Result<ActionId, FleetsyncError> {
        let action = OfflineAction::new(kind, payload);
        let id = action.id.clone();
        let mut doc = self.lock()?;
        doc.pending.push(action);
        self.flush(&doc)?;
        debug!(%id, %kind, pending = doc.pending.len(), "action enqueued");
        Ok(id)
    }

    /// Remove the action with the given id. Idempotent: returns `false` if
    /// no such action is queued.
    pub fn remove(&self, id: &ActionId) -> Result<bool, FleetsyncError> {
        let mut doc = self.lock()?;
        let before = doc.pending.len();
        doc.pending.retain(|a| a.id != *id);
        if doc.pending.len() == before {
            return Ok(false);
        }
        self.flush(&doc)?;
        Ok(true)
    }

    /// Snapshot of pending actions in insertion order.
    pub fn list(&self) -> Result<Vec<OfflineAction>, FleetsyncError> {
        Ok(self.lock()?.pending.clone())
    }

    /// Number of pending actions.
    pub fn pending_count(&self) -> Result<usize, FleetsyncError> {
        Ok(self.lock()?.pending.len())
    }

    /// Snapshot of the dead-letter list.
    pub fn dead_letters(&self) -> Result<Vec<DeadLetter>, FleetsyncError> {
        Ok(self.lock()?.dead_letter.clone())
    }

    /// Administrative reset: drops pending actions, dead letters, and sync
    /// metadata. Used on logout/session switch.
    pub fn clear(&self) -> Result<(), FleetsyncError> {
        let mut doc = self.lock()?;
        let dropped = doc.pending.len();
        *doc = OutboxDocument::default();
        self.flush(&doc)?;
        info!(dropped, "outbox cleared");
        Ok(())
    }

    /// Current sync metadata.
    pub fn metadata(&self) -> Result<SyncMetadata, FleetsyncError> {
        let doc = self.lock()?;
        Ok(SyncMetadata {
            is_syncing: doc.is_syncing,
            sync_error: doc.sync_error.clone(),
            last_sync_at: doc.last_sync_at,
        })
    }

    /// Combined status snapshot for the UI layer.
    pub fn status(&self) -> Result<SyncStatus, FleetsyncError> {
        let doc = self.lock()?;
        Ok(SyncStatus {
            pending_count: doc.pending.len(),
            dead_letter_count: doc.dead_letter.len(),
            is_syncing: doc.is_syncing,
            sync_error: doc.sync_error.clone(),
            last_sync_at: doc.last_sync_at,
        })
    }

    /// Mark a pass as started or stopped. Starting a pass clears the
    /// previous aggregate error.
    pub fn set_syncing(&self, syncing: bool) -> Result<(), FleetsyncError> {
        let mut doc = self.lock()?;
        doc.is_syncing = syncing;
        if syncing {
            doc.sync_error = None;
        }
        self.flush(&doc)
    }

    /// Record the aggregate outcome of a completed pass.
    ///
    /// Precedence: any failure sets the aggregate error and leaves
    /// `last_sync_at` untouched; a pass with successes and no failures
    /// bumps `last_sync_at` and clears the error.
    pub fn finish_pass(
        &self,
        succeeded: usize,
        failed: usize,
        at: DateTime<Utc>,
    ) -> Result<(), FleetsyncError> {
        let mut doc = self.lock()?;
        doc.is_syncing = false;
        if failed > 0 {
            doc.sync_error = Some(format!("{failed} action(s) not synced"));
        } else {
            doc.sync_error = None;
            if succeeded > 0 {
                doc.last_sync_at = Some(at);
            }
        }
        self.flush(&doc)
    }

    /// Record a retryable failure against a queued action.
    ///
    /// Bumps `retry_count`; at the configured cap the action is evicted to
    /// the dead-letter list instead of being retried forever. Unknown ids
    /// are a no-op reported as `Requeued`.
    pub fn record_retry_failure(
        &self,
        id: &ActionId,
    ) -> Result<RetryDisposition, FleetsyncError> {
        let mut doc = self.lock()?;
        let Some(pos) = doc.pending.iter().position(|a| a.id == *id) else {
            return Ok(RetryDisposition::Requeued);
        };
        doc.pending[pos].retry_count += 1;
        let disposition = if doc.pending[pos].retry_count >= self.max_attempts {
            let action = doc.pending.remove(pos);
            warn!(%id, attempts = action.retry_count, "retries exhausted, dead-lettering action");
            doc.dead_letter.push(DeadLetter {
                action,
                reason: DeadLetterReason::RetriesExhausted,
                failed_at: Utc::now(),
            });
            RetryDisposition::DeadLettered
        } else {
            RetryDisposition::Requeued
        };
        self.flush(&doc)?;
        Ok(disposition)
    }

    /// Evict a queued action after a terminal rejection. No-op if absent.
    pub fn move_to_dead_letter(
        &self,
        id: &ActionId,
        reason: DeadLetterReason,
    ) -> Result<(), FleetsyncError> {
        let mut doc = self.lock()?;
        let Some(pos) = doc.pending.iter().position(|a| a.id == *id) else {
            return Ok(());
        };
        let action = doc.pending.remove(pos);
        warn!(%id, ?reason, "action dead-lettered");
        doc.dead_letter.push(DeadLetter {
            action,
            reason,
            failed_at: Utc::now(),
        });
        self.flush(&doc)
    }
}
