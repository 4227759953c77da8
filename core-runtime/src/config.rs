//! # Service Configuration Module
//!
//! Provides configuration management for the discovery service.
//!
//! ## Overview
//!
//! Configuration is read from a TOML file into a [`ServiceConfig`], or built
//! programmatically with the `with_*` setters. Either way [`ServiceConfig::validate`]
//! runs before anything is wired, so a bad batch size or an empty credential
//! fails at startup instead of during the first sweep.
//!
//! ## Sections
//!
//! - `[logging]` - see [`LoggingConfig`]
//! - `[database]` - SQLite file and pool size
//! - `[metadata]` - external metadata API; omit it to run without a backend
//! - `[discovery]` - batch size and trigger intervals
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ServiceConfig;
//!
//! let config = ServiceConfig::from_file("discovery.toml")?;
//! assert!(config.metadata.is_some());
//! ```
//!
//! ## Environment
//!
//! `DISCOVERY_CLIENT_SECRET`, when set, replaces `metadata.client_secret` so the
//! secret does not have to live in the file.

use crate::error::{Error, Result};
use crate::logging::{redact_if_sensitive, LoggingConfig};
use serde::Deserialize;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `metadata.client_secret`.
pub const CLIENT_SECRET_ENV: &str = "DISCOVERY_CLIENT_SECRET";

/// Complete service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub logging: LoggingConfig,
    pub database: DatabaseSettings,
    /// `None` selects the disabled metadata backend.
    pub metadata: Option<MetadataApiConfig>,
    pub discovery: DiscoverySettings,
}

/// SQLite storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSettings {
    /// Path to the SQLite database file
    pub path: PathBuf,
    /// Maximum number of pooled connections
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("discovery.db"),
            max_connections: 5,
        }
    }
}

/// Configuration for the external metadata API.
///
/// # Security Note
///
/// The client secret should not be committed with the config file. Prefer
/// [`CLIENT_SECRET_ENV`]; `Debug` output never prints it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataApiConfig {
    /// Base of the accounts service; the token endpoint is `<account_url>/token`.
    pub account_url: String,
    /// Base of the Web API, e.g. `https://api.spotify.com/v1`.
    pub api_base_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Additional attempts after a server error or transport failure.
    pub retry_count: u32,
    /// Pause between those attempts, in milliseconds.
    pub retry_wait_ms: u64,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
    /// Upstream limit on ids per bulk lookup.
    pub max_ids_per_request: usize,
}

impl Default for MetadataApiConfig {
    fn default() -> Self {
        Self {
            account_url: "https://accounts.spotify.com/api".to_string(),
            api_base_url: "https://api.spotify.com/v1".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            retry_count: 2,
            retry_wait_ms: 1000,
            timeout_secs: 30,
            max_ids_per_request: 50,
        }
    }
}

impl fmt::Debug for MetadataApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataApiConfig")
            .field("account_url", &self.account_url)
            .field("api_base_url", &self.api_base_url)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &redact_if_sensitive("client_secret", &self.client_secret),
            )
            .field("retry_count", &self.retry_count)
            .field("retry_wait_ms", &self.retry_wait_ms)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_ids_per_request", &self.max_ids_per_request)
            .finish()
    }
}

impl MetadataApiConfig {
    /// Creates a config for the given client credentials with default endpoints
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ..Self::default()
        }
    }

    pub fn with_account_url(mut self, url: impl Into<String>) -> Self {
        self.account_url = url.into();
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_retry(mut self, retry_count: u32, retry_wait: Duration) -> Self {
        self.retry_count = retry_count;
        self.retry_wait_ms = retry_wait.as_millis() as u64;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_max_ids_per_request(mut self, max_ids: usize) -> Self {
        self.max_ids_per_request = max_ids;
        self
    }

    pub fn token_url(&self) -> String {
        format!("{}/token", self.account_url.trim_end_matches('/'))
    }

    pub fn retry_wait(&self) -> Duration {
        Duration::from_millis(self.retry_wait_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("account_url", &self.account_url),
            ("api_base_url", &self.api_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "metadata.{} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }

        if self.client_id.trim().is_empty() {
            return Err(Error::Config("metadata.client_id cannot be empty".to_string()));
        }

        if self.client_secret.trim().is_empty() {
            return Err(Error::Config(format!(
                "metadata.client_secret cannot be empty (set it in the file or via {})",
                CLIENT_SECRET_ENV
            )));
        }

        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "metadata.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.max_ids_per_request == 0 {
            return Err(Error::Config(
                "metadata.max_ids_per_request must be at least 1".to_string(),
            ));
        }

        if self.retry_wait_ms > 60_000 {
            return Err(Error::Config(
                "metadata.retry_wait_ms exceeds maximum of 60 seconds (60,000ms)".to_string(),
            ));
        }

        Ok(())
    }
}

/// Discovery worker and trigger loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoverySettings {
    /// Requests per round and artists per lookup sub-batch.
    pub batch_size: usize,
    /// Sweep at least this often even without notifications.
    pub fallback_interval_secs: u64,
    /// Storage keepalive ping interval.
    pub keepalive_interval_secs: u64,
    /// Unresolved sweeps after which a request is quarantined.
    pub max_resolution_attempts: u32,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            fallback_interval_secs: 300,
            keepalive_interval_secs: 90,
            max_resolution_attempts: 3,
        }
    }
}

impl DiscoverySettings {
    /// Batch size as a non-zero value. Fails on a config that skipped validation.
    pub fn batch_size(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.batch_size)
            .ok_or_else(|| Error::Config("discovery.batch_size must be at least 1".to_string()))
    }

    pub fn fallback_interval(&self) -> Duration {
        Duration::from_secs(self.fallback_interval_secs)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }

    pub fn validate(&self) -> Result<()> {
        self.batch_size()?;

        if self.fallback_interval_secs == 0 {
            return Err(Error::Config(
                "discovery.fallback_interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.keepalive_interval_secs == 0 {
            return Err(Error::Config(
                "discovery.keepalive_interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.max_resolution_attempts == 0 {
            return Err(Error::Config(
                "discovery.max_resolution_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl ServiceConfig {
    /// Load, apply environment overrides and validate a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigFile` if the file cannot be read, and
    /// `Error::Config` if it is not valid TOML for this schema or fails
    /// validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_toml_str(&content)?;
        if let Ok(secret) = std::env::var(CLIENT_SECRET_ENV) {
            config.apply_client_secret_override(secret);
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without touching the environment or validating.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    fn apply_client_secret_override(&mut self, secret: String) {
        if let Some(metadata) = self.metadata.as_mut() {
            metadata.client_secret = secret;
        }
    }

    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database.path = path.into();
        self
    }

    pub fn with_metadata(mut self, metadata: MetadataApiConfig) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.discovery.batch_size = batch_size;
        self
    }

    /// Validates every section
    pub fn validate(&self) -> Result<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(Error::Config("database.path cannot be empty".to_string()));
        }

        if self.database.max_connections == 0 {
            return Err(Error::Config(
                "database.max_connections must be at least 1".to_string(),
            ));
        }

        if let Some(metadata) = &self.metadata {
            metadata.validate()?;
        }

        self.discovery.validate()
    }
}
