//! Track repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{Track, TrackRow};
use async_trait::async_trait;
use sqlx::{query, query_as, query_scalar, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

/// Track repository interface for data access operations
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// Find a track by its ID, with its artist credits in order
    ///
    /// # Returns
    /// - `Ok(Some(track))` if found
    /// - `Ok(None)` if not found
    /// - `Err` if database error occurs
    async fn find_by_id(&self, id: &str) -> Result<Option<Track>>;

    /// Count total tracks
    async fn count(&self) -> Result<u64>;
}

/// SQLite implementation of TrackRepository
pub struct SqliteTrackRepository {
    pool: SqlitePool,
}

impl SqliteTrackRepository {
    /// Create a new SqliteTrackRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert tracks and their artist credits, ignoring ids that already exist.
    ///
    /// Every credited artist must already be visible to `conn`; otherwise the
    /// foreign key on `track_artists` fails the statement.
    ///
    /// # Returns
    /// Number of tracks actually inserted. Credits of a track that already
    /// existed are left untouched.
    pub async fn insert_many(conn: &mut SqliteConnection, tracks: &[Track]) -> Result<u64> {
        for track in tracks {
            track.validate().map_err(|e| LibraryError::InvalidInput {
                field: "Track".to_string(),
                message: e,
            })?;
        }

        let created_at = chrono::Utc::now().timestamp();
        let mut inserted = 0;

        for track in tracks {
            let result = query(
                r#"
                INSERT INTO tracks (id, name, uri, duration_ms, created_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(id) DO NOTHING
                "#,
            )
            .bind(&track.id)
            .bind(&track.name)
            .bind(&track.uri)
            .bind(track.duration_ms())
            .bind(created_at)
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                continue;
            }
            inserted += 1;

            if track.artist_ids.is_empty() {
                continue;
            }

            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("INSERT INTO track_artists (track_id, artist_id, position) ");
            builder.push_values(track.artist_ids.iter().enumerate(), |mut row, (position, artist_id)| {
                row.push_bind(&track.id)
                    .push_bind(artist_id)
                    .push_bind(position as i64);
            });
            builder.push(" ON CONFLICT(track_id, artist_id) DO NOTHING");
            builder.build().execute(&mut *conn).await?;
        }

        Ok(inserted)
    }

    async fn artist_ids(&self, track_id: &str) -> Result<Vec<String>> {
        let ids = query_scalar::<_, String>(
            "SELECT artist_id FROM track_artists WHERE track_id = ? ORDER BY position ASC",
        )
        .bind(track_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}

#[async_trait]
impl TrackRepository for SqliteTrackRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Track>> {
        let row = query_as::<_, TrackRow>("SELECT id, name, uri, duration_ms FROM tracks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let artist_ids = self.artist_ids(&row.id).await?;
                Ok(Some(row.into_track(artist_ids)))
            }
            None => Ok(None),
        }
    }

    async fn count(&self) -> Result<u64> {
        let (count,): (i64,) = query_as("SELECT COUNT(*) FROM tracks")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}
