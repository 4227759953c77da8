//! # Authentication Module
//!
//! Client-credentials authentication against the metadata service's accounts
//! endpoint, and the in-memory credential lease that results from it.
//!
//! ## Overview
//!
//! - [`ClientCredentialsFlow`] performs one token exchange.
//! - [`CredentialLease`] is the token, its scheme and its absolute expiry.
//! - [`LeaseManager`] owns the current lease for one client instance and
//!   serializes every mutation of it, so concurrent callers that all see an
//!   expired or rejected token cause a single exchange.
//!
//! Leases are never persisted. A restarted process logs in again.

pub mod client_credentials;
pub mod error;
pub mod lease;
pub mod manager;

pub use client_credentials::{ClientCredentialsConfig, ClientCredentialsFlow};
pub use error::{AuthError, Result};
pub use lease::CredentialLease;
pub use manager::LeaseManager;
