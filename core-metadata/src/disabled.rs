//! Provider used when no metadata service is configured.
//!
//! Every lookup succeeds with an empty answer and no request leaves the
//! process.

use crate::error::Result;
use crate::provider::MetadataProvider;
use async_trait::async_trait;
use core_library::{Artist, Track};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMetadataProvider;

#[async_trait]
impl MetadataProvider for DisabledMetadataProvider {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn login(&self) -> Result<()> {
        debug!("Metadata provider disabled; login skipped");
        Ok(())
    }

    async fn get_tracks(&self, _ids: &[String]) -> Result<Vec<Track>> {
        Ok(Vec::new())
    }

    async fn get_artists(&self, _ids: &[String]) -> Result<Vec<Artist>> {
        Ok(Vec::new())
    }

    async fn get_track(&self, _id: &str) -> Result<Option<Track>> {
        Ok(None)
    }

    async fn get_artist(&self, _id: &str) -> Result<Option<Artist>> {
        Ok(None)
    }
}
