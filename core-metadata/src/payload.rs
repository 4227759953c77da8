//! Wire shapes of the metadata service's track and artist endpoints.
//!
//! Only the fields the discovery database stores are decoded; everything else
//! in the payload is ignored.

use core_library::{Artist, Track};
use serde::Deserialize;
use std::time::Duration;

/// `GET /tracks?ids=...`
#[derive(Debug, Deserialize)]
pub(crate) struct TracksEnvelope {
    pub tracks: Vec<Option<TrackObject>>,
}

/// `GET /artists?ids=...`
#[derive(Debug, Deserialize)]
pub(crate) struct ArtistsEnvelope {
    pub artists: Vec<Option<ArtistObject>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackObject {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
}

/// Artist credit embedded in a track. Local files carry no id.
#[derive(Debug, Deserialize)]
pub(crate) struct SimplifiedArtist {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistObject {
    pub id: String,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl From<TrackObject> for Track {
    fn from(track: TrackObject) -> Self {
        let mut artist_ids: Vec<String> = Vec::with_capacity(track.artists.len());
        for id in track.artists.into_iter().filter_map(|artist| artist.id) {
            if !artist_ids.contains(&id) {
                artist_ids.push(id);
            }
        }

        Track {
            id: track.id,
            name: track.name,
            uri: track.uri,
            duration: Duration::from_millis(track.duration_ms),
            artist_ids,
        }
    }
}

impl From<ArtistObject> for Artist {
    fn from(artist: ArtistObject) -> Self {
        Artist {
            id: artist.id,
            name: artist.name,
            uri: artist.uri,
            genres: artist.genres,
        }
    }
}
