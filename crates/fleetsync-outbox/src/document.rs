// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The persisted outbox document.
//!
//! Unknown fields are ignored on load so the document can share its
//! persistence boundary with co-located offline caches (trip list,
//! assignment list) without this crate knowing about them. Absent fields
//! take serde defaults, which keeps old documents loadable after schema
//! additions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fleetsync_core::types::{DeadLetter, OfflineAction};

/// Current document schema version. Documents with a newer version are not
/// loaded; the store falls back to an empty document and reports recovery.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything the outbox persists, as one versioned blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxDocument {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Pending actions in strict insertion order. Insertion order is the
    /// only meaningful order and must survive persistence round-trips.
    #[serde(default)]
    pub pending: Vec<OfflineAction>,

    /// Actions evicted after a terminal rejection or exhausted retries.
    #[serde(default)]
    pub dead_letter: Vec<DeadLetter>,

    /// Timestamp of the most recent fully clean pass with confirmations.
    #[serde(default)]
    pub last_sync_at: Option<DateTime<Utc>>,

    /// Aggregate error from the most recent pass.
    #[serde(default)]
    pub sync_error: Option<String>,

    /// Persisted for UI continuity only. Reset to false on every load: a
    /// restart proves no pass is running.
    #[serde(default)]
    pub is_syncing: bool,
}

impl Default for OutboxDocument {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            pending: Vec::new(),
            dead_letter: Vec::new(),
            last_sync_at: None,
            sync_error: None,
            is_syncing: false,
        }
    }
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}
