use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token endpoint rejected credentials ({status}): {reason}")]
    AuthenticationFailed { status: u16, reason: String },

    #[error("Token endpoint unreachable: {0}")]
    Transport(#[from] BridgeError),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    #[error("Auth error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
