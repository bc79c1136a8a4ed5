// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./fleetsync.toml` > `~/.config/fleetsync/fleetsync.toml`
//! > `/etc/fleetsync/fleetsync.toml`, with environment variable overrides via
//! the `FLEETSYNC_` prefix.

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::FleetsyncConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/fleetsync/fleetsync.toml` (system-wide)
/// 3. `~/.config/fleetsync/fleetsync.toml` (user XDG config)
/// 4. `./fleetsync.toml` (local directory)
/// 5. `FLEETSYNC_*` environment variables
pub fn load_config() -> Result<FleetsyncConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FleetsyncConfig::default()))
        .merge(Toml::file("/etc/fleetsync/fleetsync.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("fleetsync/fleetsync.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("fleetsync.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit inline configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<FleetsyncConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FleetsyncConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FleetsyncConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FleetsyncConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so key names that contain
/// underscores stay unambiguous: `FLEETSYNC_API_BASE_URL` must map to
/// `api.base_url`, not `api.base.url`.
fn env_provider() -> Env {
    // FLEETSYNC_LOG is the tracing EnvFilter, consumed by the binary, not a
    // config key.
    Env::prefixed("FLEETSYNC_").ignore(&["log"]).map(|key| {
        // Figment passes the key through in its original case here and only
        // lowercases when emitting, so normalize before section matching.
        let key_str = key.as_str().to_ascii_lowercase();
        let mapped = key_str
            .replacen("api_", "api.", 1)
            .replacen("sync_", "sync.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("log_", "log.", 1);
        mapped.into()
    })
}
