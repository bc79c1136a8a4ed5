// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of the configuration model.
//!
//! Figment guarantees shape and types; this module checks value ranges and
//! cross-field constraints that serde cannot express.

use fleetsync_core::FleetsyncError;

use crate::model::FleetsyncConfig;

/// Validate a loaded configuration.
///
/// Collects every violation before failing so the operator sees all
/// problems in one run.
pub fn validate_config(config: &FleetsyncConfig) -> Result<(), FleetsyncError> {
    let mut errors: Vec<String> = Vec::new();

    if config.api.base_url.trim().is_empty() {
        errors.push("api.base_url must not be empty".to_string());
    } else if !config.api.base_url.starts_with("http://")
        && !config.api.base_url.starts_with("https://")
    {
        errors.push(format!(
            "api.base_url must start with http:// or https:// (got {:?})",
            config.api.base_url
        ));
    }
    if config.api.base_url.ends_with('/') {
        errors.push("api.base_url must not end with a trailing slash".to_string());
    }

    if config.api.request_timeout_secs == 0 {
        errors.push("api.request_timeout_secs must be at least 1".to_string());
    }
    if config.sync.dispatch_timeout_secs == 0 {
        errors.push("sync.dispatch_timeout_secs must be at least 1".to_string());
    }
    if config.sync.max_attempts == 0 {
        errors.push("sync.max_attempts must be at least 1".to_string());
    }

    if config.storage.app_name.trim().is_empty() {
        errors.push("storage.app_name must not be empty".to_string());
    } else if config
        .storage
        .app_name
        .chars()
        .any(|c| !c.is_ascii_alphanumeric() && c != '-' && c != '_')
    {
        errors.push(format!(
            "storage.app_name may only contain alphanumerics, '-' and '_' (got {:?})",
            config.storage.app_name
        ));
    }

    match config.log.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        other => errors.push(format!(
            "log.level must be one of trace/debug/info/warn/error (got {other:?})"
        )),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(FleetsyncError::Config(errors.join("; ")))
    }
}
