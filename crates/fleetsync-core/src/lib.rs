// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core types for the Fleetsync offline action queue and sync engine.
//!
//! Defines the closed set of driver actions, the payload model (including
//! binary attachments), sync metadata, dispatch outcomes, and the
//! [`ActionTransport`] trait that separates the sync orchestrator from the
//! HTTP layer.

pub mod error;
pub mod traits;
pub mod types;

pub use error::FleetsyncError;
pub use traits::ActionTransport;
pub use types::{
    ActionId, ActionKind, DeadLetter, DeadLetterReason, DispatchOutcome, OfflineAction, Payload,
    PayloadValue, SyncMetadata, SyncReport, SyncStatus,
};
