//! Core service façade and bootstrap helpers.
//!
//! This crate wires the native bridges (HTTP client, system clock), the
//! SQLite pool and the configured metadata backend into one
//! [`DiscoveryService`], the storage-level entry point the ingestion boundary
//! and the `discovery-service` binary talk to.

pub mod error;

pub use error::{CoreError, Result};

use bridge_native::ReqwestHttpClient;
use bridge_traits::http::HttpClient;
use bridge_traits::time::{Clock, SystemClock};
use core_discovery::{
    DiscoveryTrigger, DiscoveryWorker, SweepOutcome, TriggerLoop, WorkerConfig,
};
use core_library::db::{self, DatabaseConfig};
use core_library::repositories::{
    ArtistRepository, DiscoveryRequestRepository, SqliteArtistRepository,
    SqliteDiscoveryRequestRepository, SqliteTrackRepository, TrackRepository,
};
use core_library::NewDiscoveryRequest;
use core_metadata::{MetadataBackend, MetadataProvider};
use core_runtime::logging::strip_path;
use core_runtime::{DiscoverySettings, ServiceConfig};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Queue and catalog counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiscoveryStatus {
    /// Requests still waiting to be resolved
    pub remaining: u64,
    /// Requests set aside after repeated resolution failures
    pub quarantined: u64,
    pub discovered_artists: u64,
    pub discovered_tracks: u64,
}

/// Primary façade exposed to hosts.
pub struct DiscoveryService<P = MetadataBackend> {
    pool: SqlitePool,
    requests: SqliteDiscoveryRequestRepository,
    artists: SqliteArtistRepository,
    tracks: SqliteTrackRepository,
    worker: Arc<DiscoveryWorker<P>>,
    trigger: DiscoveryTrigger,
    settings: DiscoverySettings,
}

impl DiscoveryService<MetadataBackend> {
    /// Build the service from a validated configuration.
    ///
    /// Opens (and migrates) the database and selects the metadata backend:
    /// live when `[metadata]` is present, disabled otherwise.
    pub async fn bootstrap(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let pool = db::create_pool(
            DatabaseConfig::new(&config.database.path)
                .max_connections(config.database.max_connections),
        )
        .await?;

        let timeout = config
            .metadata
            .as_ref()
            .map(|metadata| metadata.timeout())
            .unwrap_or(bridge_native::DEFAULT_TIMEOUT);
        let http_client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::with_timeout(timeout)?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let backend = MetadataBackend::from_config(config.metadata.as_ref(), http_client, clock);
        info!(
            database = strip_path(&config.database.path.to_string_lossy()),
            backend = backend.name(),
            "Discovery service initialized"
        );

        Self::from_parts(pool, Arc::new(backend), &config.discovery)
    }
}

impl<P: MetadataProvider + 'static> DiscoveryService<P> {
    /// Assemble a service from an open pool and a provider.
    pub fn from_parts(pool: SqlitePool, provider: Arc<P>, settings: &DiscoverySettings) -> Result<Self> {
        let config = WorkerConfig::from_settings(settings)?;

        Ok(Self {
            requests: SqliteDiscoveryRequestRepository::new(pool.clone()),
            artists: SqliteArtistRepository::new(pool.clone()),
            tracks: SqliteTrackRepository::new(pool.clone()),
            worker: Arc::new(DiscoveryWorker::new(pool.clone(), provider, config)),
            trigger: DiscoveryTrigger::new(),
            settings: settings.clone(),
            pool,
        })
    }

    /// Enqueue discovery requests and wake the trigger loop.
    ///
    /// References already queued are dropped silently.
    ///
    /// # Returns
    /// Number of requests actually added
    pub async fn submit(&self, requests: &[NewDiscoveryRequest]) -> Result<u64> {
        if requests.is_empty() {
            return Err(CoreError::InvalidInput(
                "at least one discovery request is required".to_string(),
            ));
        }

        let inserted = self.requests.enqueue(requests).await?;
        info!(submitted = requests.len(), inserted, "Discovery requests submitted");

        if inserted > 0 {
            self.trigger.notify();
        }
        Ok(inserted)
    }

    pub async fn status(&self) -> Result<DiscoveryStatus> {
        Ok(DiscoveryStatus {
            remaining: self.requests.count_pending().await?,
            quarantined: self.requests.count_quarantined().await?,
            discovered_artists: self.artists.count().await?,
            discovered_tracks: self.tracks.count().await?,
        })
    }

    /// Run one sweep now, outside the trigger loop.
    pub async fn run_now(&self) -> Result<SweepOutcome> {
        Ok(self.worker.run().await?)
    }

    pub fn trigger(&self) -> DiscoveryTrigger {
        self.trigger.clone()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start the trigger loop on the current runtime.
    pub fn spawn_trigger_loop(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        debug!("Spawning discovery trigger loop");
        let trigger_loop = TriggerLoop::new(
            Arc::clone(&self.worker),
            self.trigger.clone(),
            &self.settings,
        );
        tokio::spawn(trigger_loop.run(shutdown))
    }

    /// Close the pool; waits for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
