//! Integration tests for logging initialization and config loading

use core_runtime::config::ServiceConfig;
use core_runtime::Error;
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LogLevel, LoggingConfig,
};
use std::io::Write;

#[test]
fn test_logging_initializes_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    init_logging(config.clone()).expect("first initialization succeeds");
    assert!(matches!(init_logging(config), Err(Error::Logging(_))));

    tracing::info!(target: "core_runtime", "logging initialized");
}

#[test]
fn test_redaction_of_credentials() {
    assert_eq!(redact_if_sensitive("access_token", "BQD..."), "[REDACTED]");
    assert_eq!(redact_if_sensitive("client_secret", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("track_uri", "spotify:track:1"), "spotify:track:1");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/srv/discovery/data.db"), "data.db");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [logging]
        level = "warn"

        [discovery]
        batch_size = 7
        "#
    )
    .unwrap();

    let config = ServiceConfig::from_file(file.path()).unwrap();
    assert_eq!(config.logging.level, LogLevel::Warn);
    assert_eq!(config.discovery.batch_size, 7);
    assert!(config.metadata.is_none());
}

#[test]
fn test_config_from_file_validates() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[discovery]\nbatch_size = 0").unwrap();

    let err = ServiceConfig::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("batch_size"));
}

#[test]
fn test_missing_config_file() {
    let err = ServiceConfig::from_file("/nonexistent/discovery.toml").unwrap_err();
    assert!(matches!(err, Error::ConfigFile { .. }));
    assert!(err.to_string().contains("/nonexistent/discovery.toml"));
}
