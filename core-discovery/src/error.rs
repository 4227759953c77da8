use core_library::LibraryError;
use core_metadata::MetadataError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Metadata lookup failed: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] LibraryError),

    #[error("Invalid discovery settings: {0}")]
    Config(String),
}

impl From<sqlx::Error> for DiscoveryError {
    fn from(e: sqlx::Error) -> Self {
        DiscoveryError::Persistence(LibraryError::Database(e))
    }
}

impl From<core_runtime::Error> for DiscoveryError {
    fn from(e: core_runtime::Error) -> Self {
        DiscoveryError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
