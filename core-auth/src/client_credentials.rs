//! OAuth 2.0 Client Credentials Grant
//!
//! Implements the RFC 6749 §4.4 exchange used by service-to-service API
//! access: the client authenticates with HTTP basic auth and posts
//! `grant_type=client_credentials` to the token endpoint.
//!
//! # Security
//!
//! - The client secret only travels in the `Authorization` header
//! - Tokens are never logged; see the `Debug` impl of [`CredentialLease`]
//!
//! # Example
//!
//! ```no_run
//! use core_auth::{ClientCredentialsConfig, ClientCredentialsFlow};
//! use bridge_traits::{HttpClient, SystemClock};
//! use std::sync::Arc;
//!
//! # async fn example() -> core_auth::Result<()> {
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let config = ClientCredentialsConfig {
//!     token_url: "https://accounts.spotify.com/api/token".to_string(),
//!     client_id: "your-client-id".to_string(),
//!     client_secret: "your-client-secret".to_string(),
//! };
//!
//! let flow = ClientCredentialsFlow::new(config, http_client, Arc::new(SystemClock));
//! let lease = flow.acquire().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::lease::CredentialLease;
use bridge_traits::http::{HttpClient, HttpRequest};
use bridge_traits::time::Clock;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Token endpoint and client credentials.
#[derive(Clone)]
pub struct ClientCredentialsConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentialsConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Performs client-credentials token exchanges.
pub struct ClientCredentialsFlow {
    config: ClientCredentialsConfig,
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
}

impl ClientCredentialsFlow {
    pub fn new(
        config: ClientCredentialsConfig,
        http_client: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            http_client,
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Exchange the client credentials for a new lease.
    ///
    /// Expiry is computed from the clock reading taken before the request is
    /// sent, so the lease never outlives the token on the server side.
    ///
    /// # Errors
    ///
    /// - `AuthError::Transport` if the endpoint could not be reached
    /// - `AuthError::AuthenticationFailed` for any non-2xx status
    /// - `AuthError::InvalidResponse` if the body is not a token response
    #[instrument(skip(self), fields(token_url = %self.config.token_url))]
    pub async fn acquire(&self) -> Result<CredentialLease> {
        let request = HttpRequest::post(self.config.token_url.clone())
            .basic_auth(&self.config.client_id, &self.config.client_secret)
            .form(&[("grant_type", "client_credentials")])
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;

        let issued_at = self.clock.now();
        let started = Instant::now();
        let response = self.http_client.execute(request).await?;

        debug!(
            status = response.status,
            method = "POST",
            url = %self.config.token_url,
            duration_ms = started.elapsed().as_millis() as u64,
            "Token endpoint responded"
        );

        if !response.is_success() {
            let reason = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            warn!(status = response.status, "Client credentials exchange rejected");
            return Err(AuthError::AuthenticationFailed {
                status: response.status,
                reason,
            });
        }

        let token: TokenResponse = response
            .json()
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        if token.access_token.is_empty() {
            return Err(AuthError::InvalidResponse(
                "access_token is empty".to_string(),
            ));
        }

        debug!(expires_in = token.expires_in, "Acquired access token");

        CredentialLease::new(
            token.access_token,
            token.token_type,
            issued_at,
            token.expires_in,
        )
    }
}

/// Token response from the accounts service.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn default_expires_in() -> i64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::HttpResponse;
    use bridge_traits::time::ManualClock;
    use chrono::{Duration, Utc};
    use std::sync::Mutex;

    struct StubHttpClient {
        response: Mutex<Option<BridgeResult<HttpResponse>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl StubHttpClient {
        fn returning(response: BridgeResult<HttpResponse>) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Some(response)),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpClient for StubHttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(BridgeError::OperationFailed("no response".into())))
        }
    }

    fn config() -> ClientCredentialsConfig {
        ClientCredentialsConfig {
            token_url: "https://accounts.example.com/api/token".to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_acquire_builds_lease_from_response() {
        let http = StubHttpClient::returning(Ok(HttpResponse::new(
            200,
            r#"{"access_token":"abc","token_type":"Bearer","expires_in":3600}"#,
        )));
        let now = Utc::now();
        let clock = Arc::new(ManualClock::new(now));
        let flow = ClientCredentialsFlow::new(config(), http.clone(), clock);

        let lease = flow.acquire().await.unwrap();

        assert_eq!(lease.access_token, "abc");
        assert_eq!(lease.token_type, "Bearer");
        assert_eq!(lease.expires_at, now + Duration::seconds(3600));

        let requests = http.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://accounts.example.com/api/token");
        assert_eq!(
            requests[0].headers.get("Authorization").map(String::as_str),
            Some("Basic aWQ6c2VjcmV0")
        );
        assert_eq!(
            requests[0].body.as_deref(),
            Some(b"grant_type=client_credentials".as_slice())
        );
    }

    #[tokio::test]
    async fn test_acquire_rejected_credentials() {
        let http = StubHttpClient::returning(Ok(HttpResponse::new(
            400,
            r#"{"error":"invalid_client"}"#,
        )));
        let flow = ClientCredentialsFlow::new(config(), http, Arc::new(ManualClock::new(Utc::now())));

        let err = flow.acquire().await.unwrap_err();
        assert!(matches!(err, AuthError::AuthenticationFailed { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_acquire_transport_failure() {
        let http = StubHttpClient::returning(Err(BridgeError::Connection("refused".into())));
        let flow = ClientCredentialsFlow::new(config(), http, Arc::new(ManualClock::new(Utc::now())));

        let err = flow.acquire().await.unwrap_err();
        assert!(matches!(err, AuthError::Transport(_)));
    }

    #[tokio::test]
    async fn test_acquire_malformed_body() {
        let http = StubHttpClient::returning(Ok(HttpResponse::new(200, "not json")));
        let flow = ClientCredentialsFlow::new(config(), http, Arc::new(ManualClock::new(Utc::now())));

        let err = flow.acquire().await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_acquire_rejects_unrepresentable_expiry() {
        let http = StubHttpClient::returning(Ok(HttpResponse::new(
            200,
            r#"{"access_token":"abc","token_type":"Bearer","expires_in":9223372036854775807}"#,
        )));
        let flow = ClientCredentialsFlow::new(config(), http, Arc::new(ManualClock::new(Utc::now())));

        let err = flow.acquire().await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse(_)));
    }

    #[test]
    fn test_token_response_defaults() {
        let response: TokenResponse = serde_json::from_str(r#"{"access_token":"t"}"#).unwrap();
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 3600);
    }

    #[test]
    fn test_config_debug_redacts_secret() {
        let debug = format!("{:?}", config());
        assert!(!debug.contains("\"secret\""));
        assert!(debug.contains("[REDACTED]"));
    }
}
