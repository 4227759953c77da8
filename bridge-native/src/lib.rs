//! # Native Bridge Implementations
//!
//! Implementations of bridge traits for the server binary.
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` (rustls, connection pooling, per-request timeout)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_native::ReqwestHttpClient;
//! use std::time::Duration;
//!
//! let http_client = ReqwestHttpClient::with_timeout(Duration::from_secs(30))?;
//! ```

mod http;

pub use http::{ReqwestHttpClient, DEFAULT_TIMEOUT};
