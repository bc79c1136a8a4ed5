// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Fleetsync sync engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup instead of silently ignoring typos.

use serde::{Deserialize, Serialize};

/// Top-level Fleetsync configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FleetsyncConfig {
    /// Fleet API endpoint settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Sync engine timing and retry settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Outbox document storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Fleet API endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the fleet API, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout applied by the HTTP client, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Sync engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Delay between a reconnect and the first sync attempt, to absorb a
    /// flapping connection.
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,

    /// Upper bound on a single dispatched action, after which it counts as
    /// a retryable failure and the pass moves on.
    #[serde(default = "default_dispatch_timeout_secs")]
    pub dispatch_timeout_secs: u64,

    /// Failed attempts before an action is moved to the dead-letter list.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_secs: default_debounce_secs(),
            dispatch_timeout_secs: default_dispatch_timeout_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Outbox storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding the outbox document. Empty means the platform
    /// data dir (`~/.local/share/fleetsync` on Linux).
    #[serde(default)]
    pub data_dir: String,

    /// Application name; the document lives at `<data_dir>/<app_name>-outbox.json`.
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            app_name: default_app_name(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Default log level (trace, debug, info, warn, error). Overridden by
    /// the `FLEETSYNC_LOG` env filter when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_debounce_secs() -> u64 {
    2
}

fn default_dispatch_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    10
}

fn default_app_name() -> String {
    "fleetsync".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
