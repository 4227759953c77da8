use async_trait::async_trait;
use core_discovery::SweepOutcome;
use core_library::db::create_test_pool;
use core_library::{Artist, NewDiscoveryRequest, Track};
use core_metadata::{MetadataProvider, Result as MetadataResult};
use core_runtime::{DiscoverySettings, MetadataApiConfig, ServiceConfig};
use core_service::{CoreError, DiscoveryService, DiscoveryStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Every track is credited to one artist named after it.
struct CatalogProvider;

#[async_trait]
impl MetadataProvider for CatalogProvider {
    async fn login(&self) -> MetadataResult<()> {
        Ok(())
    }

    async fn get_tracks(&self, ids: &[String]) -> MetadataResult<Vec<Track>> {
        Ok(ids
            .iter()
            .map(|id| Track {
                id: id.clone(),
                name: id.clone(),
                uri: format!("spotify:track:{}", id),
                duration: Duration::from_secs(200),
                artist_ids: vec![format!("artist-of-{}", id)],
            })
            .collect())
    }

    async fn get_artists(&self, ids: &[String]) -> MetadataResult<Vec<Artist>> {
        Ok(ids
            .iter()
            .map(|id| Artist {
                id: id.clone(),
                name: id.clone(),
                uri: format!("spotify:artist:{}", id),
                genres: Vec::new(),
            })
            .collect())
    }

    async fn get_track(&self, _id: &str) -> MetadataResult<Option<Track>> {
        Ok(None)
    }

    async fn get_artist(&self, _id: &str) -> MetadataResult<Option<Artist>> {
        Ok(None)
    }
}

fn requests(uris: &[&str]) -> Vec<NewDiscoveryRequest> {
    uris.iter()
        .map(|uri| NewDiscoveryRequest::new("Someone", *uri))
        .collect()
}

#[tokio::test]
async fn test_bootstrap_without_metadata_runs_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServiceConfig::default().with_database_path(dir.path().join("discovery.db"));

    let service = DiscoveryService::bootstrap(&config).await.unwrap();

    assert_eq!(service.submit(&requests(&["t1", "t2", "t1"])).await.unwrap(), 2);
    assert_eq!(service.run_now().await.unwrap(), SweepOutcome::Disabled);
    assert_eq!(
        service.status().await.unwrap(),
        DiscoveryStatus {
            remaining: 2,
            quarantined: 0,
            discovered_artists: 0,
            discovered_tracks: 0,
        }
    );

    service.close().await;
}

#[tokio::test]
async fn test_bootstrap_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServiceConfig::default()
        .with_database_path(dir.path().join("discovery.db"))
        .with_batch_size(0);

    let result = DiscoveryService::bootstrap(&config).await;
    assert!(matches!(result, Err(CoreError::Config(_))));

    let config = ServiceConfig::default()
        .with_database_path(dir.path().join("discovery.db"))
        .with_metadata(MetadataApiConfig::new("client", ""));
    let result = DiscoveryService::bootstrap(&config).await;
    assert!(matches!(result, Err(CoreError::Config(_))));
}

#[tokio::test]
async fn test_submit_requires_requests() {
    let pool = create_test_pool().await.unwrap();
    let service =
        DiscoveryService::from_parts(pool, Arc::new(CatalogProvider), &DiscoverySettings::default())
            .unwrap();

    let result = service.submit(&[]).await;
    assert!(matches!(result, Err(CoreError::InvalidInput(_))));
}

#[tokio::test]
async fn test_run_now_resolves_submitted_requests() {
    let pool = create_test_pool().await.unwrap();
    let service =
        DiscoveryService::from_parts(pool, Arc::new(CatalogProvider), &DiscoverySettings::default())
            .unwrap();

    service
        .submit(&requests(&["spotify:track:t1", "https://open.spotify.com/track/t2"]))
        .await
        .unwrap();

    match service.run_now().await.unwrap() {
        SweepOutcome::Completed(report) => assert_eq!(report.requests_consumed, 2),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(
        service.status().await.unwrap(),
        DiscoveryStatus {
            remaining: 0,
            quarantined: 0,
            discovered_artists: 2,
            discovered_tracks: 2,
        }
    );
}

#[tokio::test]
async fn test_submit_wakes_trigger_loop() {
    let pool = create_test_pool().await.unwrap();
    let service =
        DiscoveryService::from_parts(pool, Arc::new(CatalogProvider), &DiscoverySettings::default())
            .unwrap();

    let shutdown = CancellationToken::new();
    let handle = service.spawn_trigger_loop(shutdown.clone());

    // Let the idle startup sweep finish before writing
    tokio::time::sleep(Duration::from_millis(50)).await;
    service.submit(&requests(&["t1"])).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while service.status().await.unwrap().remaining > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("submitted request was not resolved");

    shutdown.cancel();
    handle.await.unwrap();
    assert_eq!(service.status().await.unwrap().discovered_tracks, 1);
}
