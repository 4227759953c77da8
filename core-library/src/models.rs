//! Domain models for the discovery database
//!
//! Tracks and artists carry the ids assigned by the metadata service; they
//! are globally unique and double as primary keys.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::time::Duration;

// =============================================================================
// Domain Models
// =============================================================================

/// A resolved track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// External id
    pub id: String,
    /// Track title
    pub name: String,
    /// External URI, e.g. `spotify:track:<id>`
    pub uri: String,
    /// Playing time as reported by the source
    pub duration: Duration,
    /// Credited artists, in credit order
    pub artist_ids: Vec<String>,
}

impl Track {
    /// Validate track data
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Track id cannot be empty".to_string());
        }

        if self.artist_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(format!("Track {} credits an artist with an empty id", self.id));
        }

        if i64::try_from(self.duration.as_millis()).is_err() {
            return Err(format!("Track {} duration does not fit in storage", self.id));
        }

        Ok(())
    }

    /// Duration in whole milliseconds, as stored.
    pub fn duration_ms(&self) -> i64 {
        i64::try_from(self.duration.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Row shape of the `tracks` table
#[derive(Debug, Clone, FromRow)]
pub(crate) struct TrackRow {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub duration_ms: i64,
}

impl TrackRow {
    pub(crate) fn into_track(self, artist_ids: Vec<String>) -> Track {
        Track {
            id: self.id,
            name: self.name,
            uri: self.uri,
            duration: Duration::from_millis(self.duration_ms.max(0) as u64),
            artist_ids,
        }
    }
}

/// A resolved artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Artist {
    /// External id
    pub id: String,
    /// Artist name
    pub name: String,
    /// External URI, e.g. `spotify:artist:<id>`
    pub uri: String,
    /// Genre labels in the order the source lists them
    #[sqlx(json)]
    pub genres: Vec<String>,
}

impl Artist {
    /// Validate artist data
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Artist id cannot be empty".to_string());
        }

        Ok(())
    }
}

/// A stored discovery request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DiscoveryRequest {
    /// Storage-assigned id; also the processing order
    pub id: i64,
    /// Artist name as submitted (informational only)
    pub artist_name: String,
    /// Reference to one of the artist's tracks, as submitted
    pub track_uri: String,
    /// Sweeps in which the reference failed to resolve
    pub resolution_attempts: u32,
    /// Unix seconds when the request left the pending set
    pub quarantined_at: Option<i64>,
    /// Unix seconds of submission
    pub created_at: i64,
}

impl DiscoveryRequest {
    pub fn is_pending(&self) -> bool {
        self.quarantined_at.is_none()
    }
}

/// Submission payload for a discovery request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDiscoveryRequest {
    pub artist_name: String,
    pub track_uri: String,
}

impl NewDiscoveryRequest {
    pub fn new(artist_name: impl Into<String>, track_uri: impl Into<String>) -> Self {
        Self {
            artist_name: artist_name.into(),
            track_uri: track_uri.into(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.track_uri.trim().is_empty() {
            return Err("Track reference cannot be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(duration: Duration) -> Track {
        Track {
            id: "t1".to_string(),
            name: "Song".to_string(),
            uri: "spotify:track:t1".to_string(),
            duration,
            artist_ids: vec!["a1".to_string()],
        }
    }

    #[test]
    fn test_track_validation() {
        assert!(track(Duration::from_millis(215_000)).validate().is_ok());

        let mut empty_id = track(Duration::ZERO);
        empty_id.id = " ".to_string();
        assert!(empty_id.validate().is_err());

        let mut empty_artist = track(Duration::ZERO);
        empty_artist.artist_ids.push(String::new());
        assert!(empty_artist.validate().is_err());

        assert!(track(Duration::MAX).validate().is_err());
    }

    #[test]
    fn test_track_row_roundtrip_duration() {
        let row = TrackRow {
            id: "t1".to_string(),
            name: "Song".to_string(),
            uri: "spotify:track:t1".to_string(),
            duration_ms: 215_123,
        };
        let track = row.into_track(vec!["a1".to_string()]);
        assert_eq!(track.duration, Duration::from_millis(215_123));
        assert_eq!(track.duration_ms(), 215_123);
    }

    #[test]
    fn test_new_request_validation() {
        assert!(NewDiscoveryRequest::new("Artist", "spotify:track:1").validate().is_ok());
        assert!(NewDiscoveryRequest::new("Artist", "  ").validate().is_err());
        // The artist name is informational; an empty one is accepted
        assert!(NewDiscoveryRequest::new("", "spotify:track:1").validate().is_ok());
    }
}
