//! # Resilient Metadata Client
//!
//! Resolves track references and artist ids into stored-shape [`Track`] and
//! [`Artist`] values.
//!
//! ## Overview
//!
//! This module handles:
//! - Client-credentials login with lease reuse (via `core-auth`)
//! - Bulk lookups split into bounded requests, order preserved
//! - Retry on server and transport failures, a single re-login on 401
//! - A disabled backend for deployments without a metadata service
//!
//! [`Track`]: core_library::Track
//! [`Artist`]: core_library::Artist

pub mod backend;
pub mod client;
pub mod disabled;
pub mod error;
pub mod provider;
pub mod reference;
pub mod retry;

mod payload;

pub use backend::MetadataBackend;
pub use client::SpotifyMetadataClient;
pub use disabled::DisabledMetadataProvider;
pub use error::{EntityKind, MetadataError, Result};
pub use provider::MetadataProvider;
pub use reference::TrackReference;
pub use retry::{RetryDecision, RetryPolicy};
