//! # Host Bridge Traits
//!
//! Capability traits the discovery core depends on but does not implement.
//!
//! ## Overview
//!
//! The core never talks to the network or the wall clock directly. It receives
//! an [`HttpClient`](http::HttpClient) and a [`Clock`](time::Clock) at
//! construction time, which keeps the metadata client and credential lease
//! testable without sockets or sleeps.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Single-attempt async HTTP
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Implementations
//!
//! | Capability | Implementation |
//! |------------|----------------|
//! | `HttpClient` | `bridge_native::ReqwestHttpClient` |
//! | `Clock` | [`SystemClock`](time::SystemClock), [`ManualClock`](time::ManualClock) |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert platform errors into it and keep the variants that callers branch on
//! (`Timeout`, `Connection`) distinct from generic failures.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so one instance can be shared by the
//! worker and the ingestion boundary.

pub mod error;
pub mod http;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use time::{Clock, ManualClock, SystemClock};
