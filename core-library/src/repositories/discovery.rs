//! Discovery request repository trait and implementation
//!
//! Requests are pending until a sweep consumes them (delete) or they are
//! quarantined after repeatedly failing to resolve.

use crate::error::{LibraryError, Result};
use crate::models::{DiscoveryRequest, NewDiscoveryRequest};
use async_trait::async_trait;
use sqlx::{query, query_as, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use super::BIND_CHUNK;

const REQUEST_COLUMNS: &str =
    "id, artist_name, track_uri, resolution_attempts, quarantined_at, created_at";

/// Discovery request repository interface
#[async_trait]
pub trait DiscoveryRequestRepository: Send + Sync {
    /// Store new requests, silently dropping references already queued.
    ///
    /// # Returns
    /// Number of requests actually added
    ///
    /// # Errors
    /// Returns `InvalidInput` if any request fails validation; nothing is
    /// stored in that case.
    async fn enqueue(&self, requests: &[NewDiscoveryRequest]) -> Result<u64>;

    /// Count requests that have not been quarantined
    async fn count_pending(&self) -> Result<u64>;

    /// Count quarantined requests
    async fn count_quarantined(&self) -> Result<u64>;

    /// Find a request by its track reference
    async fn find_by_track_uri(&self, track_uri: &str) -> Result<Option<DiscoveryRequest>>;

    /// List quarantined requests, oldest first
    async fn list_quarantined(&self, limit: u32) -> Result<Vec<DiscoveryRequest>>;
}

/// SQLite implementation of DiscoveryRequestRepository
pub struct SqliteDiscoveryRequestRepository {
    pool: SqlitePool,
}

impl SqliteDiscoveryRequestRepository {
    /// Create a new SqliteDiscoveryRequestRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read up to `limit` pending requests in storage order.
    pub async fn fetch_pending(
        conn: &mut SqliteConnection,
        limit: usize,
    ) -> Result<Vec<DiscoveryRequest>> {
        let sql = format!(
            "SELECT {} FROM discovery_requests WHERE quarantined_at IS NULL ORDER BY id ASC LIMIT ?",
            REQUEST_COLUMNS
        );
        let requests = query_as::<_, DiscoveryRequest>(&sql)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&mut *conn)
            .await?;

        Ok(requests)
    }

    /// Delete the given requests.
    ///
    /// # Returns
    /// Number of rows deleted
    pub async fn delete_by_ids(conn: &mut SqliteConnection, ids: &[i64]) -> Result<u64> {
        let mut deleted = 0;

        for chunk in ids.chunks(BIND_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("DELETE FROM discovery_requests WHERE id IN (");
            push_id_list(&mut builder, chunk);
            deleted += builder.build().execute(&mut *conn).await?.rows_affected();
        }

        Ok(deleted)
    }

    /// Count one failed resolution for each request and quarantine those that
    /// reached `max_attempts`.
    ///
    /// # Returns
    /// Number of requests newly quarantined
    pub async fn record_unresolved(
        conn: &mut SqliteConnection,
        ids: &[i64],
        max_attempts: u32,
        now: i64,
    ) -> Result<u64> {
        let mut quarantined = 0;

        for chunk in ids.chunks(BIND_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "UPDATE discovery_requests SET resolution_attempts = resolution_attempts + 1 \
                 WHERE quarantined_at IS NULL AND id IN (",
            );
            push_id_list(&mut builder, chunk);
            builder.build().execute(&mut *conn).await?;

            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("UPDATE discovery_requests SET quarantined_at = ");
            builder
                .push_bind(now)
                .push(" WHERE quarantined_at IS NULL AND resolution_attempts >= ")
                .push_bind(i64::from(max_attempts))
                .push(" AND id IN (");
            push_id_list(&mut builder, chunk);
            quarantined += builder.build().execute(&mut *conn).await?.rows_affected();
        }

        debug!(
            requests = ids.len(),
            quarantined, "Recorded unresolved discovery requests"
        );
        Ok(quarantined)
    }
}

fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

#[async_trait]
impl DiscoveryRequestRepository for SqliteDiscoveryRequestRepository {
    async fn enqueue(&self, requests: &[NewDiscoveryRequest]) -> Result<u64> {
        for request in requests {
            request.validate().map_err(|e| LibraryError::InvalidInput {
                field: "DiscoveryRequest".to_string(),
                message: e,
            })?;
        }

        let created_at = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for request in requests {
            inserted += query(
                r#"
                INSERT INTO discovery_requests (artist_name, track_uri, created_at)
                VALUES (?, ?, ?)
                ON CONFLICT(track_uri) DO NOTHING
                "#,
            )
            .bind(&request.artist_name)
            .bind(request.track_uri.trim())
            .bind(created_at)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;

        debug!(
            submitted = requests.len(),
            inserted, "Enqueued discovery requests"
        );
        Ok(inserted)
    }

    async fn count_pending(&self) -> Result<u64> {
        let (count,): (i64,) =
            query_as("SELECT COUNT(*) FROM discovery_requests WHERE quarantined_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count as u64)
    }

    async fn count_quarantined(&self) -> Result<u64> {
        let (count,): (i64,) =
            query_as("SELECT COUNT(*) FROM discovery_requests WHERE quarantined_at IS NOT NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count as u64)
    }

    async fn find_by_track_uri(&self, track_uri: &str) -> Result<Option<DiscoveryRequest>> {
        let sql = format!(
            "SELECT {} FROM discovery_requests WHERE track_uri = ?",
            REQUEST_COLUMNS
        );
        let request = query_as::<_, DiscoveryRequest>(&sql)
            .bind(track_uri)
            .fetch_optional(&self.pool)
            .await?;

        Ok(request)
    }

    async fn list_quarantined(&self, limit: u32) -> Result<Vec<DiscoveryRequest>> {
        let sql = format!(
            "SELECT {} FROM discovery_requests WHERE quarantined_at IS NOT NULL \
             ORDER BY quarantined_at ASC, id ASC LIMIT ?",
            REQUEST_COLUMNS
        );
        let requests = query_as::<_, DiscoveryRequest>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }
}
