// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Fleetsync sync engine.
//!
//! TOML configuration with XDG file hierarchy lookup, `FLEETSYNC_*`
//! environment variable overrides, and post-deserialization validation.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::FleetsyncConfig;

use fleetsync_core::FleetsyncError;

/// Load configuration from the XDG hierarchy and validate it.
///
/// The high-level entry point used by the binary: loads TOML files + env
/// vars via Figment, then runs range/shape validation on the result.
pub fn load_and_validate() -> Result<FleetsyncConfig, FleetsyncError> {
    let config = load_config().map_err(|e| FleetsyncError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}
