// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for config loading, merging, and overrides.

use fleetsync_config::{load_config_from_str, model::FleetsyncConfig};

#[test]
fn defaults_when_no_config_present() {
    let config: FleetsyncConfig = load_config_from_str("").expect("empty config loads");
    assert_eq!(config.api.base_url, "http://localhost:8080");
    assert_eq!(config.sync.debounce_secs, 2);
    assert_eq!(config.sync.dispatch_timeout_secs, 30);
    assert_eq!(config.sync.max_attempts, 10);
    assert_eq!(config.storage.app_name, "fleetsync");
    assert_eq!(config.log.level, "info");
}

#[test]
fn toml_overrides_defaults() {
    let config = load_config_from_str(
        r#"
        [api]
        base_url = "https://fleet.springfield.gov"
        request_timeout_secs = 10

        [sync]
        debounce_secs = 5
        "#,
    )
    .expect("config loads");

    assert_eq!(config.api.base_url, "https://fleet.springfield.gov");
    assert_eq!(config.api.request_timeout_secs, 10);
    assert_eq!(config.sync.debounce_secs, 5);
    // Untouched sections keep their defaults.
    assert_eq!(config.sync.max_attempts, 10);
}

#[test]
fn unknown_keys_are_rejected() {
    let result = load_config_from_str(
        r#"
        [sync]
        debouce_secs = 5
        "#,
    );
    let err = result.expect_err("typo'd key must fail");
    assert!(err.to_string().contains("debouce_secs"), "{err}");
}

#[test]
fn env_vars_override_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "fleetsync.toml",
            r#"
            [api]
            base_url = "https://file.example.gov"
            "#,
        )?;
        jail.set_env("FLEETSYNC_API_BASE_URL", "https://env.example.gov");
        jail.set_env("FLEETSYNC_SYNC_MAX_ATTEMPTS", "3");

        let config = fleetsync_config::load_config().expect("config loads");
        assert_eq!(config.api.base_url, "https://env.example.gov");
        assert_eq!(config.sync.max_attempts, 3);
        Ok(())
    });
}

#[test]
fn env_override_reaches_nested_sections() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("FLEETSYNC_LOG_LEVEL", "debug");
        jail.set_env("FLEETSYNC_STORAGE_APP_NAME", "depot-7");

        let config = fleetsync_config::load_config().expect("config loads");
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.storage.app_name, "depot-7");
        Ok(())
    });
}

#[test]
fn env_filter_variable_is_not_a_config_key() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("FLEETSYNC_LOG", "fleetsync_engine=debug");
        let config = fleetsync_config::load_config().expect("FLEETSYNC_LOG must be ignored");
        assert_eq!(config.log.level, "info");
        Ok(())
    });
}
