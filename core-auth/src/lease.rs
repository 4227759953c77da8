//! Credential lease type

use crate::error::{AuthError, Result};
use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// An access token valid until `expires_at`.
///
/// The lease is usable strictly before its expiry instant; at `expires_at`
/// and after, a new lease must be acquired before issuing requests.
///
/// # Examples
///
/// ```
/// use core_auth::CredentialLease;
/// use chrono::{Duration, Utc};
///
/// let now = Utc::now();
/// let lease = CredentialLease::new("BQD...", "Bearer", now, 3600).unwrap();
///
/// assert!(lease.is_valid_at(now));
/// assert!(!lease.is_valid_at(now + Duration::seconds(3600)));
/// assert_eq!(lease.authorization_header(), "Bearer BQD...");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialLease {
    /// The access token sent on every API request
    pub access_token: String,
    /// Authorization scheme reported by the token endpoint, usually `Bearer`
    pub token_type: String,
    /// When the access token expires (UTC)
    pub expires_at: DateTime<Utc>,
}

impl CredentialLease {
    /// Create a lease that expires `expires_in` seconds after `issued_at`.
    ///
    /// A negative `expires_in` yields an already expired lease.
    ///
    /// # Errors
    ///
    /// `AuthError::InvalidResponse` if the expiry is not a representable
    /// instant.
    pub fn new(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_in: i64,
    ) -> Result<Self> {
        let expires_at = Duration::try_seconds(expires_in.max(0))
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::InvalidResponse(format!("expires_in out of range: {}", expires_in))
            })?;

        Ok(Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            expires_at,
        })
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Get the time remaining until expiry, `None` once expired.
    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.is_valid_at(now) {
            Some(self.expires_at - now)
        } else {
            None
        }
    }
}

// Tokens never reach log output
impl fmt::Debug for CredentialLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialLease")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
