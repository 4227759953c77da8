//! # Repository Pattern Implementation
//!
//! Each entity has a repository trait for pool-level reads and a SQLite
//! implementation that also exposes connection-level functions for the
//! writes a discovery round performs inside its transaction.
//!
//! ## Available Repositories
//!
//! - `TrackRepository` - Resolved tracks with ordered artist credits
//! - `ArtistRepository` - Resolved artists
//! - `DiscoveryRequestRepository` - Pending and quarantined requests

pub mod artist;
pub mod discovery;
pub mod track;

pub use artist::{ArtistRepository, SqliteArtistRepository};
pub use discovery::{DiscoveryRequestRepository, SqliteDiscoveryRequestRepository};
pub use track::{SqliteTrackRepository, TrackRepository};

/// Upper bound on bind parameters per statement. SQLite builds before 3.32
/// cap a statement at 999.
pub(crate) const BIND_CHUNK: usize = 900;
