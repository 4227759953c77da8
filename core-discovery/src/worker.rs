//! # Discovery Worker
//!
//! Turns pending discovery requests into stored tracks and artists.
//!
//! ## Workflow
//!
//! One call to [`DiscoveryWorker::run`] is a sweep:
//! 1. Count pending requests; stop if there are none
//! 2. Plan `ceil(pending / batch_size)` rounds
//! 3. Log in to the metadata service
//! 4. Run each round: read a batch, resolve its tracks, resolve the credited
//!    artists not stored yet, then in one write transaction insert artists
//!    and tracks, delete the consumed requests and commit
//!
//! No transaction is held across metadata lookups, so requests submitted
//! while a round is resolving do not conflict with its writes. A failed round
//! rolls back completely and ends the sweep. Rounds committed before it stay
//! committed.
//!
//! ## Unresolvable references
//!
//! When a round fails because particular references cannot be resolved, the
//! requests carrying them get one resolution attempt counted. A request that
//! reaches `max_resolution_attempts` is quarantined and no longer read as
//! pending. Transient failures never count.

use crate::dedup;
use crate::error::{DiscoveryError, Result};
use crate::guard::SweepGuard;
use crate::planner;
use core_library::repositories::{
    DiscoveryRequestRepository, SqliteArtistRepository, SqliteDiscoveryRequestRepository,
    SqliteTrackRepository,
};
use core_library::{DiscoveryRequest, Track};
use core_metadata::{EntityKind, MetadataError, MetadataProvider, TrackReference};
use core_runtime::DiscoverySettings;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(49);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Requests per round, and artists per lookup within a round
    pub batch_size: NonZeroUsize,
    /// Failed resolutions before a request is quarantined
    pub max_resolution_attempts: u32,
}

impl WorkerConfig {
    pub fn from_settings(settings: &DiscoverySettings) -> Result<Self> {
        Ok(Self {
            batch_size: settings.batch_size()?,
            max_resolution_attempts: settings.max_resolution_attempts.max(1),
        })
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_resolution_attempts: 3,
        }
    }
}

/// Counters for one completed sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub rounds_planned: u64,
    pub rounds_completed: u64,
    pub requests_consumed: u64,
    pub tracks_created: u64,
    pub artists_created: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Nothing was pending
    Idle,
    /// The metadata backend is disabled; requests were left untouched
    Disabled,
    /// Another sweep was in flight
    AlreadyRunning,
    Completed(SweepReport),
}

#[derive(Debug, Clone, Copy, Default)]
struct RoundStats {
    requests_consumed: u64,
    tracks_created: u64,
    artists_created: u64,
}

/// A failed round, with the requests whose references caused it.
struct RoundFailure {
    error: DiscoveryError,
    blamed: Vec<i64>,
}

impl RoundFailure {
    fn blaming(error: impl Into<DiscoveryError>, blamed: Vec<i64>) -> Self {
        Self {
            error: error.into(),
            blamed,
        }
    }
}

impl From<sqlx::Error> for RoundFailure {
    fn from(e: sqlx::Error) -> Self {
        Self::blaming(e, Vec::new())
    }
}

impl From<core_library::LibraryError> for RoundFailure {
    fn from(e: core_library::LibraryError) -> Self {
        Self::blaming(e, Vec::new())
    }
}

pub struct DiscoveryWorker<P> {
    pool: SqlitePool,
    provider: Arc<P>,
    requests: SqliteDiscoveryRequestRepository,
    config: WorkerConfig,
    guard: SweepGuard,
}

impl<P: MetadataProvider> DiscoveryWorker<P> {
    pub fn new(pool: SqlitePool, provider: Arc<P>, config: WorkerConfig) -> Self {
        Self {
            requests: SqliteDiscoveryRequestRepository::new(pool.clone()),
            pool,
            provider,
            config,
            guard: SweepGuard::new(),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn config(&self) -> WorkerConfig {
        self.config
    }

    /// Whether a sweep is in flight right now.
    pub fn is_running(&self) -> bool {
        self.guard.is_running()
    }

    /// Run one sweep.
    ///
    /// # Errors
    ///
    /// The error of the first failed round, or of the login. Rounds that
    /// committed before the failure are not undone.
    #[instrument(skip(self), fields(batch_size = self.config.batch_size.get()))]
    pub async fn run(&self) -> Result<SweepOutcome> {
        let Some(_permit) = self.guard.try_acquire() else {
            debug!("Discovery sweep already in flight; skipping");
            return Ok(SweepOutcome::AlreadyRunning);
        };

        if !self.provider.is_enabled() {
            info!("Metadata backend disabled; discovery requests left pending");
            return Ok(SweepOutcome::Disabled);
        }

        let pending = self.requests.count_pending().await?;
        if pending == 0 {
            debug!("No pending discovery requests");
            return Ok(SweepOutcome::Idle);
        }

        let rounds_planned = planner::rounds(pending, self.config.batch_size);
        info!(pending, rounds = rounds_planned, "Starting discovery sweep");

        self.provider.login().await.map_err(|e| {
            warn!(error = %e, "Metadata login failed; sweep aborted");
            DiscoveryError::from(e)
        })?;

        let mut report = SweepReport {
            rounds_planned,
            ..SweepReport::default()
        };

        for round in 1..=rounds_planned {
            match self.run_round(round).await {
                Ok(Some(stats)) => {
                    report.rounds_completed += 1;
                    report.requests_consumed += stats.requests_consumed;
                    report.tracks_created += stats.tracks_created;
                    report.artists_created += stats.artists_created;
                }
                Ok(None) => {
                    debug!(round, "No pending requests left; ending sweep early");
                    break;
                }
                Err(failure) => {
                    if !failure.blamed.is_empty() {
                        self.record_unresolved(&failure.blamed).await;
                    }
                    warn!(
                        round,
                        rounds_completed = report.rounds_completed,
                        error = %failure.error,
                        "Discovery round failed; sweep aborted"
                    );
                    return Err(failure.error);
                }
            }
        }

        info!(
            rounds = report.rounds_completed,
            requests = report.requests_consumed,
            tracks = report.tracks_created,
            artists = report.artists_created,
            "Discovery sweep completed"
        );
        Ok(SweepOutcome::Completed(report))
    }

    /// One round. `Ok(None)` when nothing was left to read.
    ///
    /// Lookups run before any transaction is open. The writes then run in a
    /// single `BEGIN IMMEDIATE` transaction, which re-checks the novel artists
    /// against what is stored by then.
    #[instrument(skip(self))]
    async fn run_round(&self, round: u64) -> std::result::Result<Option<RoundStats>, RoundFailure> {
        let batch = {
            let mut conn = self.pool.acquire().await?;
            SqliteDiscoveryRequestRepository::fetch_pending(&mut conn, self.config.batch_size.get())
                .await?
        };
        if batch.is_empty() {
            return Ok(None);
        }

        let references = parse_references(&batch)?;
        let track_ids: Vec<String> = references
            .iter()
            .map(|(_, reference)| reference.id().to_string())
            .collect();

        let tracks = self
            .provider
            .get_tracks(&track_ids)
            .await
            .map_err(|e| blame(e, &references, &[]))?;

        let credited: Vec<String> = tracks
            .iter()
            .flat_map(|track| track.artist_ids.iter().cloned())
            .collect();
        let novel = {
            let mut conn = self.pool.acquire().await?;
            dedup::filter_novel_artist_ids(&mut conn, &credited)
                .await
                .map_err(|e| RoundFailure::blaming(e, Vec::new()))?
        };

        let mut artists = Vec::with_capacity(novel.len());
        for sub_batch in novel.chunks(self.config.batch_size.get()) {
            let resolved = self
                .provider
                .get_artists(sub_batch)
                .await
                .map_err(|e| blame(e, &references, &tracks))?;
            artists.extend(resolved);
        }

        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let still_novel: HashSet<String> = dedup::filter_novel_artist_ids(&mut tx, &novel)
            .await
            .map_err(|e| RoundFailure::blaming(e, Vec::new()))?
            .into_iter()
            .collect();
        artists.retain(|artist| still_novel.contains(&artist.id));

        let artists_created = SqliteArtistRepository::insert_many(&mut tx, &artists).await?;
        let tracks_created = SqliteTrackRepository::insert_many(&mut tx, &tracks).await?;

        let consumed: Vec<i64> = batch.iter().map(|request| request.id).collect();
        let requests_consumed =
            SqliteDiscoveryRequestRepository::delete_by_ids(&mut tx, &consumed).await?;

        tx.commit().await?;

        debug!(
            requests = requests_consumed,
            tracks = tracks_created,
            artists = artists_created,
            "Discovery round committed"
        );
        Ok(Some(RoundStats {
            requests_consumed,
            tracks_created,
            artists_created,
        }))
    }

    /// Count a failed resolution against `ids`, in its own transaction.
    ///
    /// Bookkeeping failures are logged; the round's own error is what the
    /// sweep reports.
    async fn record_unresolved(&self, ids: &[i64]) {
        let now = chrono::Utc::now().timestamp();

        let result: Result<u64> = async {
            let mut tx = self.pool.begin().await?;
            let quarantined = SqliteDiscoveryRequestRepository::record_unresolved(
                &mut tx,
                ids,
                self.config.max_resolution_attempts,
                now,
            )
            .await?;
            tx.commit().await?;
            Ok(quarantined)
        }
        .await;

        match result {
            Ok(0) => debug!(requests = ids.len(), "Counted unresolved discovery requests"),
            Ok(quarantined) => warn!(
                requests = ids.len(),
                quarantined, "Quarantined unresolvable discovery requests"
            ),
            Err(e) => warn!(error = %e, "Failed to record unresolved discovery requests"),
        }
    }
}

fn parse_references(
    batch: &[DiscoveryRequest],
) -> std::result::Result<Vec<(i64, TrackReference)>, RoundFailure> {
    let mut references = Vec::with_capacity(batch.len());
    let mut invalid = Vec::new();
    let mut first_error = None;

    for request in batch {
        match TrackReference::parse(&request.track_uri) {
            Ok(reference) => references.push((request.id, reference)),
            Err(e) => {
                invalid.push(request.id);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(RoundFailure::blaming(e, invalid)),
        None => Ok(references),
    }
}

/// Attribute a lookup failure to the requests behind the unresolved ids.
fn blame(error: MetadataError, references: &[(i64, TrackReference)], tracks: &[Track]) -> RoundFailure {
    let blamed = match &error {
        MetadataError::Unresolved {
            kind: EntityKind::Track,
            ids,
        } => {
            let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
            references
                .iter()
                .filter(|(_, reference)| ids.contains(reference.id()))
                .map(|(request_id, _)| *request_id)
                .collect()
        }
        MetadataError::Unresolved {
            kind: EntityKind::Artist,
            ids,
        } => {
            let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
            let tracks: HashSet<&str> = tracks
                .iter()
                .filter(|track| track.artist_ids.iter().any(|a| ids.contains(a.as_str())))
                .map(|track| track.id.as_str())
                .collect();
            references
                .iter()
                .filter(|(_, reference)| tracks.contains(reference.id()))
                .map(|(request_id, _)| *request_id)
                .collect()
        }
        _ => Vec::new(),
    };

    RoundFailure::blaming(error, blamed)
}
