// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The transport seam between the sync orchestrator and the fleet API.

use async_trait::async_trait;

use crate::types::{DispatchOutcome, OfflineAction};

/// Sends a single offline action to the remote fleet API.
///
/// Implementations are pure transport adapters: they encode the action,
/// perform one network call, and classify the result. No business
/// validation happens here; the server is the sole authority on acceptance.
///
/// Implementations must not retry internally -- retry policy belongs to the
/// sync engine so that the persisted `retry_count` stays accurate.
#[async_trait]
pub trait ActionTransport: Send + Sync {
    /// Dispatch one action and classify the outcome.
    ///
    /// Network-level failures are folded into
    /// [`DispatchOutcome::Retryable`]; this method only errs through the
    /// outcome, never through a panic.
    async fn dispatch(&self, action: &OfflineAction) -> DispatchOutcome;
}
