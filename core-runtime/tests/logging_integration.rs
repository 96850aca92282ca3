//! Integration tests for runtime setup: logging initialization and the
//! configuration a run starts from.

use core_runtime::config::{Credentials, FailurePolicy, SyncConfig};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig, AUDIT_TARGET};
use core_runtime::Error;
use std::collections::HashMap;

#[test]
fn test_logging_initializes_once() {
    // Only this test installs a subscriber, the test binary is its own process
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_filter("core_runtime=debug");

    assert!(init_logging(config.clone()).is_ok());
    tracing::info!(target: AUDIT_TARGET, "login spotify:user:test");

    let second = init_logging(config);
    assert!(matches!(second, Err(Error::Config(ref msg)) if msg.contains("initialize logging")));
}

#[test]
fn test_invalid_filter_is_rejected() {
    let config = LoggingConfig::default().with_filter("core_sync=loud");
    assert!(matches!(init_logging(config), Err(Error::Config(_))));
}

#[test]
fn test_cli_style_config() {
    let config = SyncConfig::builder()
        .base_id("appBase")
        .table("Tracks")
        .playlist_prefix("mine")
        .epoch(1990)
        .current_year(2000)
        .failure_policy(FailurePolicy::Continue)
        .build()
        .unwrap();

    assert_eq!(config.managed_prefix(), "mine-");
    assert_eq!(config.failure_policy, FailurePolicy::Continue);
}

#[test]
fn test_credentials_report_first_missing_variable() {
    let env: HashMap<&str, &str> = [("SPOTIFY_CLIENT_ID", "id")].into_iter().collect();
    let err = Credentials::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap_err();

    assert_eq!(
        err.to_string(),
        "required environment variable SPOTIFY_CLIENT_SECRET not set"
    );
}
