// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable offline action outbox.
//!
//! A single versioned JSON document per application name holds the FIFO
//! queue of pending actions, the dead-letter list, and sync metadata. Every
//! mutation is flushed to disk with an atomic replace before the call
//! returns, so a crash immediately after `enqueue` cannot silently drop an
//! action.

pub mod document;
pub mod store;

pub use document::{OutboxDocument, SCHEMA_VERSION};
pub use store::{Outbox, RetryDisposition};
