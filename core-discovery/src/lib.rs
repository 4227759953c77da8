//! # Discovery Pipeline
//!
//! Resolves pending discovery requests into stored tracks and artists.
//!
//! ## Components
//!
//! - **Batch Planner** (`planner`): number of rounds for a sweep
//! - **Dedup Filter** (`dedup`): credited artists not yet stored
//! - **Discovery Worker** (`worker`): one sweep, one transaction per round
//! - **Sweep Guard** (`guard`): keeps sweeps from overlapping
//! - **Trigger Loop** (`trigger`): runs sweeps on notification and on a timer

pub mod dedup;
pub mod error;
pub mod guard;
pub mod planner;
pub mod trigger;
pub mod worker;

pub use error::{DiscoveryError, Result};
pub use guard::{SweepGuard, SweepPermit};
pub use trigger::{DiscoveryTrigger, TriggerLoop};
pub use worker::{DiscoveryWorker, SweepOutcome, SweepReport, WorkerConfig};
