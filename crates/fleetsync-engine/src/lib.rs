// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sync orchestrator for the Fleetsync offline action queue.
//!
//! Consumes connectivity transitions, debounces reconnects, and drains the
//! outbox through an [`ActionTransport`] in strict FIFO order, one action at
//! a time. Confirmed actions are removed immediately; failed ones stay
//! queued for the next pass (or are dead-lettered, see [`engine`]).
//!
//! [`ActionTransport`]: fleetsync_core::ActionTransport

pub mod engine;

pub use engine::SyncEngine;
