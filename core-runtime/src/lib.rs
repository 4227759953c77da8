//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the discovery service:
//! - Logging and tracing infrastructure
//! - Configuration loading and validation
//!
//! ## Overview
//!
//! Every other crate takes its settings from the types defined here and logs
//! through `tracing`; this crate is the only one that installs a subscriber.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{DatabaseSettings, DiscoverySettings, MetadataApiConfig, ServiceConfig};
pub use error::{Error, Result};
