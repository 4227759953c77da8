//! Workspace placeholder crate.
//!
//! Re-exports the workspace crates behind feature flags so hosts can depend on
//! `discovery-workspace` alone. `service` (default) brings in the bootstrap
//! façade; `pipeline` exposes the worker and metadata client directly.

#[cfg(feature = "service")]
pub use core_service::{CoreError, DiscoveryService, DiscoveryStatus};

#[cfg(feature = "pipeline")]
pub use core_discovery as discovery;

#[cfg(feature = "pipeline")]
pub use core_metadata as metadata;
