// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Fleetsync crates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Unique identifier for a queued offline action.
///
/// Format: `<unix-millis>-<8-hex-suffix>`. Assigned once at enqueue time and
/// never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub String);

impl ActionId {
    /// Generate a fresh id from the current time plus a random suffix.
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        ActionId(format!("{millis}-{}", &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of driver actions that can be recorded offline.
///
/// Wire names match the fleet API action identifiers (`FUEL_LOG` etc.).
/// Dispatch is an exhaustive match over this enum, so an unhandled kind is a
/// compile error rather than a runtime "unknown type" branch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// A fuel fill with pump readings and a receipt photo.
    FuelLog,
    /// Completion of an assigned trip, with closing odometer photo.
    TripComplete,
    /// An incident report against an assigned trip.
    TripIncident,
    /// Start of an unassigned ("free") trip.
    FreeTripStart,
    /// Close of a free trip.
    FreeTripClose,
}

/// A single field of an action payload.
///
/// Primitives cover the form fields drivers fill in; `Attachment` carries
/// photo evidence (fuel receipts, odometer readings). Attachment bytes are
/// base64 in the persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayloadValue {
    Text { value: String },
    Number { value: f64 },
    Bool { value: bool },
    Attachment {
        file_name: String,
        content_type: String,
        #[serde(with = "base64_bytes")]
        bytes: Vec<u8>,
    },
}

impl PayloadValue {
    pub fn text(value: impl Into<String>) -> Self {
        PayloadValue::Text {
            value: value.into(),
        }
    }

    pub fn number(value: f64) -> Self {
        PayloadValue::Number { value }
    }

    pub fn bool(value: bool) -> Self {
        PayloadValue::Bool { value }
    }

    pub fn attachment(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        PayloadValue::Attachment {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Whether this field is a binary attachment.
    pub fn is_attachment(&self) -> bool {
        matches!(self, PayloadValue::Attachment { .. })
    }
}

/// Ordered key/value payload of an offline action.
pub type Payload = BTreeMap<String, PayloadValue>;

/// A driver action recorded while offline, waiting for replay to the server.
///
/// After creation only `retry_count` changes; every other field is immutable
/// for the lifetime of the queue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineAction {
    pub id: ActionId,
    pub kind: ActionKind,
    pub payload: Payload,
    pub created_at: DateTime<Utc>,
    /// Number of failed dispatch attempts so far.
    #[serde(default)]
    pub retry_count: u32,
}

impl OfflineAction {
    /// Create a new action with a generated id and the current timestamp.
    pub fn new(kind: ActionKind, payload: Payload) -> Self {
        Self {
            id: ActionId::generate(),
            kind,
            payload,
            created_at: Utc::now(),
            retry_count: 0,
        }
    }
}

/// Sync bookkeeping persisted alongside the queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncMetadata {
    /// True only while a sync pass is actively running. Always reset to
    /// false when the document is loaded from disk.
    #[serde(default)]
    pub is_syncing: bool,
    /// Aggregate message from the most recent pass, if any action failed.
    #[serde(default)]
    pub sync_error: Option<String>,
    /// Timestamp of the most recent fully clean pass that confirmed at
    /// least one action.
    #[serde(default)]
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Read-only status snapshot for the UI layer.
///
/// This is the only contract the rest of the application may rely on; no
/// caller mutates the queue directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncStatus {
    pub pending_count: usize,
    pub dead_letter_count: usize,
    pub is_syncing: bool,
    pub sync_error: Option<String>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Why an action was evicted from the pending queue without being confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeadLetterReason {
    /// The server classified the action as permanently unacceptable (4xx).
    Terminal { detail: String },
    /// The retry cap was reached without a confirmation.
    RetriesExhausted,
}

/// An evicted action, kept for operator inspection instead of being retried
/// forever as a poison pill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub action: OfflineAction,
    pub reason: DeadLetterReason,
    pub failed_at: DateTime<Utc>,
}

/// Outcome of dispatching a single action to the fleet API.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// 2xx response; the action is confirmed applied.
    Success,
    /// The call never reached the server, timed out, or returned 408/429/5xx.
    /// The action stays queued for the next pass.
    Retryable(String),
    /// The server rejected the action in a way that will never succeed
    /// unmodified (other 4xx). The action must not be retried.
    Terminal(String),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Success)
    }
}

/// Result of a single sync pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    /// Actions for which a dispatch was attempted this pass.
    pub attempted: usize,
    /// Actions confirmed and removed from the queue.
    pub succeeded: usize,
    /// Actions that failed (retryable or terminal).
    pub failed: usize,
    /// Actions moved to the dead-letter list this pass.
    pub dead_lettered: usize,
    /// True if the pass was cut short by connectivity dropping offline.
    pub cancelled: bool,
}

/// Serde helper: `Vec<u8>` as standard base64 in JSON documents.
mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn action_id_format_and_uniqueness() {
        let a = ActionId::generate();
        let b = ActionId::generate();
        assert_ne!(a, b, "two generated ids must differ");

        let (millis, suffix) = a.as_str().split_once('-').expect("id has a dash");
        assert!(millis.parse::<i64>().is_ok(), "prefix is a timestamp");
        assert_eq!(suffix.len(), 8, "suffix is 8 hex chars");
    }

    #[test]
    fn action_kind_wire_names() {
        assert_eq!(ActionKind::FuelLog.to_string(), "FUEL_LOG");
        assert_eq!(ActionKind::FreeTripClose.to_string(), "FREE_TRIP_CLOSE");
        assert_eq!(
            "TRIP_INCIDENT".parse::<ActionKind>().unwrap(),
            ActionKind::TripIncident
        );
    }

    #[test]
    fn action_kind_serde_matches_strum() {
        for kind in ActionKind::iter() {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn attachment_bytes_survive_serde() {
        let value = PayloadValue::attachment("receipt.jpg", "image/jpeg", vec![0xff, 0xd8, 0x00]);
        let json = serde_json::to_string(&value).unwrap();
        assert!(json.contains("\"/9gA\""), "bytes are base64 in JSON: {json}");
        let back: PayloadValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn offline_action_defaults_retry_count_on_load() {
        // Documents written before retry bookkeeping existed omit the field.
        let json = r#"{
            "id": "1700000000000-deadbeef",
            "kind": "FUEL_LOG",
            "payload": {},
            "created_at": "2026-01-01T00:00:00Z"
        }"#;
        let action: OfflineAction = serde_json::from_str(json).unwrap();
        assert_eq!(action.retry_count, 0);
    }
}
