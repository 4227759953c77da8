use bridge_traits::BridgeError;
use core_auth::AuthError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Kind of entity a bulk lookup asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Track,
    Artist,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Track => write!(f, "track"),
            EntityKind::Artist => write!(f, "artist"),
        }
    }
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Transport failure calling {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: BridgeError,
    },

    #[error("Unauthorized by metadata service at {url} after re-authentication")]
    Unauthorized { url: String },

    #[error("Rate limited by metadata service (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Metadata service error {status} from {url}")]
    ServerError { status: u16, url: String },

    #[error("Unexpected response {status} from {url}: {body}")]
    ResponseError {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("{} {kind} id(s) did not resolve: {ids:?}", .ids.len())]
    Unresolved { kind: EntityKind, ids: Vec<String> },

    #[error("Invalid track reference '{0}'")]
    InvalidReference(String),

    #[error("Authentication failed: {0}")]
    Authentication(#[from] AuthError),
}

impl MetadataError {
    /// Failures that may clear up on a later attempt without any change to
    /// the request itself.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MetadataError::Transport { .. }
                | MetadataError::RateLimited { .. }
                | MetadataError::ServerError { .. }
                | MetadataError::Unauthorized { .. }
                | MetadataError::Authentication(_)
        )
    }

    /// Ids the service answered with `null` for, if this is such an error.
    pub fn unresolved_ids(&self) -> Option<&[String]> {
        match self {
            MetadataError::Unresolved { ids, .. } => Some(ids),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(MetadataError::RateLimited { retry_after: None }.is_transient());
        assert!(MetadataError::ServerError {
            status: 503,
            url: "u".to_string()
        }
        .is_transient());
        assert!(!MetadataError::Unresolved {
            kind: EntityKind::Track,
            ids: vec!["x".to_string()]
        }
        .is_transient());
        assert!(!MetadataError::InvalidReference("x".to_string()).is_transient());
    }

    #[test]
    fn test_unresolved_message_names_kind() {
        let err = MetadataError::Unresolved {
            kind: EntityKind::Artist,
            ids: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "2 artist id(s) did not resolve: [\"a\", \"b\"]");
        assert_eq!(err.unresolved_ids().map(|ids| ids.len()), Some(2));
    }
}
