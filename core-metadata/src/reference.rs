//! Track references as submitted with discovery requests.
//!
//! Accepted forms:
//!
//! - `spotify:track:<id>`
//! - `https://open.spotify.com/track/<id>` (optionally with a locale prefix
//!   such as `/intl-de/`, a query string or a fragment)
//! - a bare `<id>`

use crate::error::{MetadataError, Result};
use std::fmt;
use std::str::FromStr;

const URI_PREFIX: &str = "spotify:track:";
const WEB_HOST: &str = "open.spotify.com";

/// A validated track id extracted from a submitted reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackReference(String);

impl TrackReference {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let invalid = || MetadataError::InvalidReference(raw.to_string());

        let id = if let Some(id) = raw.strip_prefix(URI_PREFIX) {
            id
        } else if let Some(rest) = raw
            .strip_prefix("https://")
            .or_else(|| raw.strip_prefix("http://"))
        {
            let (host, path) = rest.split_once('/').ok_or_else(invalid)?;
            if !host.eq_ignore_ascii_case(WEB_HOST) {
                return Err(invalid());
            }
            let path = path.split(['?', '#']).next().unwrap_or_default();
            let mut segments = path.split('/').filter(|s| !s.is_empty());
            segments
                .by_ref()
                .find(|segment| *segment == "track")
                .ok_or_else(invalid)?;
            segments.next().ok_or_else(invalid)?
        } else {
            raw
        };

        if is_valid_id(id) {
            Ok(Self(id.to_string()))
        } else {
            Err(invalid())
        }
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    pub fn uri(&self) -> String {
        format!("{}{}", URI_PREFIX, self.0)
    }

    pub fn into_id(self) -> String {
        self.0
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 64 && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

impl FromStr for TrackReference {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TrackReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "4uLU6hMCjMI75M1A2tKUQC";

    #[test]
    fn test_parse_accepted_forms() {
        for raw in [
            format!("spotify:track:{}", ID),
            format!("https://open.spotify.com/track/{}", ID),
            format!("https://open.spotify.com/track/{}?si=abc123", ID),
            format!("https://open.spotify.com/intl-de/track/{}#x", ID),
            format!("http://OPEN.spotify.com/track/{}/", ID),
            format!("  {}  ", ID),
        ] {
            let reference = TrackReference::parse(&raw).unwrap();
            assert_eq!(reference.id(), ID, "input: {}", raw);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for raw in [
            "",
            "spotify:track:",
            "spotify:album:abc",
            "https://example.com/track/abc",
            "https://open.spotify.com/album/abc",
            "https://open.spotify.com/track/",
            "not an id",
            "abc/def",
        ] {
            assert!(
                matches!(TrackReference::parse(raw), Err(MetadataError::InvalidReference(_))),
                "input: {}",
                raw
            );
        }
    }

    #[test]
    fn test_uri_and_display() {
        let reference: TrackReference = ID.parse().unwrap();
        assert_eq!(reference.uri(), format!("spotify:track:{}", ID));
        assert_eq!(reference.to_string(), reference.uri());
        assert_eq!(reference.into_id(), ID);
    }
}
