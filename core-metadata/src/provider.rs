use crate::error::Result;
use async_trait::async_trait;
use core_library::{Artist, Track};

/// Source of resolved track and artist metadata.
///
/// Bulk lookups preserve request order. If any requested id comes back
/// unresolved, the whole call fails with
/// [`MetadataError::Unresolved`](crate::MetadataError::Unresolved) listing
/// those ids.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Whether this provider talks to a real service.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Make sure a valid credential lease is held. A no-op while the
    /// current lease has not expired.
    async fn login(&self) -> Result<()>;

    async fn get_tracks(&self, ids: &[String]) -> Result<Vec<Track>>;

    async fn get_artists(&self, ids: &[String]) -> Result<Vec<Artist>>;

    /// `Ok(None)` if the service does not know the id.
    async fn get_track(&self, id: &str) -> Result<Option<Track>>;

    /// `Ok(None)` if the service does not know the id.
    async fn get_artist(&self, id: &str) -> Result<Option<Artist>>;
}
