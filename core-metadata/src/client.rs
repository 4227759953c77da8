//! # Spotify Web API Metadata Client
//!
//! Resolves tracks and artists against a Spotify-shaped REST API using an
//! application-level client-credentials lease.
//!
//! ## API Endpoints
//!
//! - Token: `POST {account_url}/token`
//! - Tracks: `GET {api_base_url}/tracks?ids=a,b,c` and `GET {api_base_url}/tracks/{id}`
//! - Artists: `GET {api_base_url}/artists?ids=a,b,c` and `GET {api_base_url}/artists/{id}`
//!
//! Bulk lookups are split into requests of at most `max_ids_per_request` ids.
//! Every request goes through the policy in [`crate::retry`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_metadata::{MetadataProvider, SpotifyMetadataClient};
//!
//! let client = SpotifyMetadataClient::new(&config, http_client, Arc::new(SystemClock));
//! client.login().await?;
//! let tracks = client.get_tracks(&ids).await?;
//! ```

use crate::error::{EntityKind, MetadataError, Result};
use crate::payload::{ArtistObject, ArtistsEnvelope, TrackObject, TracksEnvelope};
use crate::provider::MetadataProvider;
use crate::retry::{decide, AttemptOutcome, RetryDecision, RetryPolicy};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::time::Clock;
use bridge_traits::BridgeError;
use core_auth::{ClientCredentialsConfig, ClientCredentialsFlow, LeaseManager};
use core_library::{Artist, Track};
use core_runtime::MetadataApiConfig;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

pub struct SpotifyMetadataClient {
    http_client: Arc<dyn HttpClient>,
    leases: LeaseManager,
    api_base_url: String,
    timeout: Duration,
    retry_policy: RetryPolicy,
    max_ids_per_request: usize,
}

impl SpotifyMetadataClient {
    pub fn new(
        config: &MetadataApiConfig,
        http_client: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let credentials = ClientCredentialsConfig {
            token_url: config.token_url(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        };
        let flow = ClientCredentialsFlow::new(credentials, Arc::clone(&http_client), clock);

        Self {
            http_client,
            leases: LeaseManager::new(flow),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
            retry_policy: RetryPolicy::from(config),
            max_ids_per_request: config.max_ids_per_request.max(1),
        }
    }

    pub fn leases(&self) -> &LeaseManager {
        &self.leases
    }

    async fn fetch_many<W, T>(&self, kind: EntityKind, path: &str, ids: &[String]) -> Result<Vec<T>>
    where
        W: Envelope,
        T: From<W::Item>,
    {
        let ids = unique(ids);
        let mut resolved = Vec::with_capacity(ids.len());
        let mut unresolved = Vec::new();

        for chunk in ids.chunks(self.max_ids_per_request) {
            let url = format!("{}/{}?ids={}", self.api_base_url, path, join_ids(chunk));
            let envelope: W = self.get_json(&url).await?;

            let mut returned = envelope.into_items().into_iter();
            for id in chunk {
                match returned.next().flatten() {
                    Some(item) => resolved.push(T::from(item)),
                    None => unresolved.push(id.clone()),
                }
            }
        }

        if !unresolved.is_empty() {
            warn!(%kind, count = unresolved.len(), "Metadata service returned unresolved ids");
            return Err(MetadataError::Unresolved {
                kind,
                ids: unresolved,
            });
        }

        debug!(%kind, count = resolved.len(), "Resolved metadata");
        Ok(resolved)
    }

    async fn fetch_one<W, T>(&self, path: &str, id: &str) -> Result<Option<T>>
    where
        W: DeserializeOwned,
        T: From<W>,
    {
        let url = format!("{}/{}/{}", self.api_base_url, path, urlencoding::encode(id));

        match self.get_json::<W>(&url).await {
            Ok(item) => Ok(Some(T::from(item))),
            Err(MetadataError::ResponseError { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.send(url).await?;

        response.json().map_err(|e| MetadataError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Issue a GET under the current lease, applying the retry policy.
    async fn send(&self, url: &str) -> Result<HttpResponse> {
        let mut lease = self.leases.ensure_valid().await?;
        let mut retries_used = 0;
        let mut reauthenticated = false;

        loop {
            let request = HttpRequest::get(url)
                .authorization(&lease.token_type, lease.access_token.clone())
                .timeout(self.timeout);

            let started = Instant::now();
            let result = self.http_client.execute(request).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            let outcome = match &result {
                Ok(response) => {
                    debug!(
                        status = response.status,
                        method = "GET",
                        url,
                        duration_ms,
                        "Metadata service responded"
                    );
                    AttemptOutcome::Status(response.status)
                }
                Err(error) => {
                    warn!(error = %error, method = "GET", url, duration_ms, "Metadata request failed");
                    AttemptOutcome::Transport
                }
            };

            match decide(outcome, retries_used, reauthenticated, &self.retry_policy) {
                RetryDecision::Accept => return result.map_err(|source| transport(url, source)),
                RetryDecision::Retry { after } => {
                    retries_used += 1;
                    debug!(url, retry = retries_used, wait_ms = after.as_millis() as u64, "Retrying metadata request");
                    tokio::time::sleep(after).await;
                }
                RetryDecision::Reauthenticate => {
                    reauthenticated = true;
                    lease = self
                        .leases
                        .refresh_rejected(&lease.access_token)
                        .await
                        .map_err(|e| {
                            warn!(error = %e, url, "Re-authentication after 401 failed");
                            MetadataError::Unauthorized {
                                url: url.to_string(),
                            }
                        })?;
                }
                RetryDecision::Fail => return Err(failure(url, result)),
            }
        }
    }
}

#[async_trait]
impl MetadataProvider for SpotifyMetadataClient {
    async fn login(&self) -> Result<()> {
        self.leases.ensure_valid().await?;
        Ok(())
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    async fn get_tracks(&self, ids: &[String]) -> Result<Vec<Track>> {
        self.fetch_many::<TracksEnvelope, Track>(EntityKind::Track, "tracks", ids)
            .await
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    async fn get_artists(&self, ids: &[String]) -> Result<Vec<Artist>> {
        self.fetch_many::<ArtistsEnvelope, Artist>(EntityKind::Artist, "artists", ids)
            .await
    }

    async fn get_track(&self, id: &str) -> Result<Option<Track>> {
        self.fetch_one::<TrackObject, Track>("tracks", id).await
    }

    async fn get_artist(&self, id: &str) -> Result<Option<Artist>> {
        self.fetch_one::<ArtistObject, Artist>("artists", id).await
    }
}

/// Bulk response body: one entry per requested id, `None` where unresolved.
trait Envelope: DeserializeOwned {
    type Item;

    fn into_items(self) -> Vec<Option<Self::Item>>;
}

impl Envelope for TracksEnvelope {
    type Item = TrackObject;

    fn into_items(self) -> Vec<Option<TrackObject>> {
        self.tracks
    }
}

impl Envelope for ArtistsEnvelope {
    type Item = ArtistObject;

    fn into_items(self) -> Vec<Option<ArtistObject>> {
        self.artists
    }
}

fn unique(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

fn join_ids(ids: &[String]) -> String {
    ids.iter()
        .map(|id| urlencoding::encode(id).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

fn transport(url: &str, source: BridgeError) -> MetadataError {
    MetadataError::Transport {
        url: url.to_string(),
        source,
    }
}

fn failure(url: &str, result: bridge_traits::error::Result<HttpResponse>) -> MetadataError {
    let response = match result {
        Ok(response) => response,
        Err(source) => return transport(url, source),
    };

    match response.status {
        401 => MetadataError::Unauthorized {
            url: url.to_string(),
        },
        429 => MetadataError::RateLimited {
            retry_after: response
                .header("Retry-After")
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        },
        status if status >= 500 => MetadataError::ServerError {
            status,
            url: url.to_string(),
        },
        status => MetadataError::ResponseError {
            status,
            url: url.to_string(),
            body: response.text().unwrap_or_default(),
        },
    }
}
