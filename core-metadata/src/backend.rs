//! Backend selection.
//!
//! The service runs against the live client when a `[metadata]` section is
//! configured and against [`DisabledMetadataProvider`] otherwise.

use crate::client::SpotifyMetadataClient;
use crate::disabled::DisabledMetadataProvider;
use crate::error::Result;
use crate::provider::MetadataProvider;
use async_trait::async_trait;
use bridge_traits::http::HttpClient;
use bridge_traits::time::Clock;
use core_library::{Artist, Track};
use core_runtime::MetadataApiConfig;
use std::sync::Arc;
use tracing::info;

pub enum MetadataBackend {
    Live(SpotifyMetadataClient),
    Disabled(DisabledMetadataProvider),
}

impl MetadataBackend {
    pub fn from_config(
        config: Option<&MetadataApiConfig>,
        http_client: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        match config {
            Some(config) => {
                info!(api_base_url = %config.api_base_url, "Using live metadata backend");
                Self::Live(SpotifyMetadataClient::new(config, http_client, clock))
            }
            None => {
                info!("No metadata service configured; discovery is disabled");
                Self::Disabled(DisabledMetadataProvider)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Live(_) => "live",
            Self::Disabled(_) => "disabled",
        }
    }
}

#[async_trait]
impl MetadataProvider for MetadataBackend {
    fn is_enabled(&self) -> bool {
        match self {
            Self::Live(client) => client.is_enabled(),
            Self::Disabled(disabled) => disabled.is_enabled(),
        }
    }

    async fn login(&self) -> Result<()> {
        match self {
            Self::Live(client) => client.login().await,
            Self::Disabled(disabled) => disabled.login().await,
        }
    }

    async fn get_tracks(&self, ids: &[String]) -> Result<Vec<Track>> {
        match self {
            Self::Live(client) => client.get_tracks(ids).await,
            Self::Disabled(disabled) => disabled.get_tracks(ids).await,
        }
    }

    async fn get_artists(&self, ids: &[String]) -> Result<Vec<Artist>> {
        match self {
            Self::Live(client) => client.get_artists(ids).await,
            Self::Disabled(disabled) => disabled.get_artists(ids).await,
        }
    }

    async fn get_track(&self, id: &str) -> Result<Option<Track>> {
        match self {
            Self::Live(client) => client.get_track(id).await,
            Self::Disabled(disabled) => disabled.get_track(id).await,
        }
    }

    async fn get_artist(&self, id: &str) -> Result<Option<Artist>> {
        match self {
            Self::Live(client) => client.get_artist(id).await,
            Self::Disabled(disabled) => disabled.get_artist(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use bridge_traits::{BridgeError, SystemClock};

    struct UnreachableHttpClient;

    #[async_trait]
    impl HttpClient for UnreachableHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Err(BridgeError::Connection("no network in tests".to_string()))
        }
    }

    #[tokio::test]
    async fn test_missing_config_selects_disabled_backend() {
        let backend = MetadataBackend::from_config(
            None,
            Arc::new(UnreachableHttpClient),
            Arc::new(SystemClock),
        );

        assert_eq!(backend.name(), "disabled");
        assert!(!backend.is_enabled());
        backend.login().await.unwrap();
        assert!(backend.get_tracks(&["x".to_string()]).await.unwrap().is_empty());
        assert!(backend.get_artists(&["a".to_string()]).await.unwrap().is_empty());
        assert_eq!(backend.get_track("x").await.unwrap(), None);
        assert_eq!(backend.get_artist("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_config_selects_live_backend() {
        let config = MetadataApiConfig::new("client", "secret");
        let backend = MetadataBackend::from_config(
            Some(&config),
            Arc::new(UnreachableHttpClient),
            Arc::new(SystemClock),
        );

        assert_eq!(backend.name(), "live");
        assert!(backend.is_enabled());
        assert!(backend.login().await.is_err());
    }
}
