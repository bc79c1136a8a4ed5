// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Fleetsync sync engine.

use thiserror::Error;

/// The primary error type used across the Fleetsync crates.
#[derive(Debug, Error)]
pub enum FleetsyncError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Outbox persistence errors (document read/write, serialization).
    #[error("outbox error: {source}")]
    Outbox {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport errors that are not a dispatch outcome (client construction,
    /// malformed base URL, invalid attachment MIME type).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FleetsyncError {
    /// Wrap an arbitrary error as an outbox persistence failure.
    pub fn outbox(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        FleetsyncError::Outbox {
            source: Box::new(source),
        }
    }
}
