//! Artist repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::Artist;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{query_as, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashSet;

use super::BIND_CHUNK;

/// Artist repository interface for data access operations
#[async_trait]
pub trait ArtistRepository: Send + Sync {
    /// Find an artist by its ID
    ///
    /// # Returns
    /// - `Ok(Some(artist))` if found
    /// - `Ok(None)` if not found
    /// - `Err` if database error occurs
    async fn find_by_id(&self, id: &str) -> Result<Option<Artist>>;

    /// Count total artists
    async fn count(&self) -> Result<u64>;
}

/// SQLite implementation of ArtistRepository
pub struct SqliteArtistRepository {
    pool: SqlitePool,
}

impl SqliteArtistRepository {
    /// Create a new SqliteArtistRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Subset of `ids` already stored, as seen by `conn`.
    ///
    /// Called with a transaction, the answer reflects that transaction's
    /// snapshot, including rows it inserted itself.
    pub async fn existing_ids(conn: &mut SqliteConnection, ids: &[String]) -> Result<HashSet<String>> {
        let mut existing = HashSet::new();

        for chunk in ids.chunks(BIND_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("SELECT id FROM artists WHERE id IN (");
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(id);
            }
            separated.push_unseparated(")");

            let found: Vec<String> = builder
                .build_query_scalar::<String>()
                .fetch_all(&mut *conn)
                .await?;
            existing.extend(found);
        }

        Ok(existing)
    }

    /// Insert artists, ignoring ids that already exist.
    ///
    /// # Returns
    /// Number of rows actually inserted
    ///
    /// # Errors
    /// Returns `InvalidInput` if any artist fails validation; nothing is
    /// written in that case.
    pub async fn insert_many(conn: &mut SqliteConnection, artists: &[Artist]) -> Result<u64> {
        for artist in artists {
            artist.validate().map_err(|e| LibraryError::InvalidInput {
                field: "Artist".to_string(),
                message: e,
            })?;
        }

        let created_at = chrono::Utc::now().timestamp();
        let mut inserted = 0;

        // Five binds per row
        for chunk in artists.chunks(BIND_CHUNK / 5) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("INSERT INTO artists (id, name, uri, genres, created_at) ");
            builder.push_values(chunk, |mut row, artist| {
                row.push_bind(&artist.id)
                    .push_bind(&artist.name)
                    .push_bind(&artist.uri)
                    .push_bind(Json(&artist.genres))
                    .push_bind(created_at);
            });
            builder.push(" ON CONFLICT(id) DO NOTHING");

            inserted += builder.build().execute(&mut *conn).await?.rows_affected();
        }

        Ok(inserted)
    }
}

#[async_trait]
impl ArtistRepository for SqliteArtistRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Artist>> {
        let artist =
            query_as::<_, Artist>("SELECT id, name, uri, genres FROM artists WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(artist)
    }

    async fn count(&self) -> Result<u64> {
        let (count,): (i64,) = query_as("SELECT COUNT(*) FROM artists")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn artist(id: &str) -> Artist {
        Artist {
            id: id.to_string(),
            name: format!("Artist {}", id),
            uri: format!("spotify:artist:{}", id),
            genres: vec!["shoegaze".to_string(), "dream pop".to_string()],
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_artist() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteArtistRepository::new(pool.clone());

        let mut conn = pool.acquire().await.unwrap();
        let inserted = SqliteArtistRepository::insert_many(&mut conn, &[artist("a1")])
            .await
            .unwrap();
        drop(conn);

        assert_eq!(inserted, 1);
        let found = repo.find_by_id("a1").await.unwrap().unwrap();
        assert_eq!(found, artist("a1"));
        assert_eq!(found.genres, vec!["shoegaze", "dream pop"]);
    }

    #[tokio::test]
    async fn test_insert_ignores_existing_ids() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteArtistRepository::new(pool.clone());
        let mut conn = pool.acquire().await.unwrap();

        SqliteArtistRepository::insert_many(&mut conn, &[artist("a1")])
            .await
            .unwrap();
        let mut renamed = artist("a1");
        renamed.name = "Changed".to_string();
        let inserted = SqliteArtistRepository::insert_many(&mut conn, &[renamed, artist("a2")])
            .await
            .unwrap();
        drop(conn);

        assert_eq!(inserted, 1);
        assert_eq!(repo.count().await.unwrap(), 2);
        assert_eq!(repo.find_by_id("a1").await.unwrap().unwrap().name, "Artist a1");
    }

    #[tokio::test]
    async fn test_existing_ids() {
        let pool = create_test_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        SqliteArtistRepository::insert_many(&mut conn, &[artist("a1"), artist("a3")])
            .await
            .unwrap();

        let candidates: Vec<String> = ["a1", "a2", "a3", "a4"].iter().map(|s| s.to_string()).collect();
        let existing = SqliteArtistRepository::existing_ids(&mut conn, &candidates)
            .await
            .unwrap();

        assert_eq!(existing, HashSet::from(["a1".to_string(), "a3".to_string()]));
    }

    #[tokio::test]
    async fn test_existing_ids_empty_input() {
        let pool = create_test_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let existing = SqliteArtistRepository::existing_ids(&mut conn, &[]).await.unwrap();
        assert!(existing.is_empty());
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_artist() {
        let pool = create_test_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let result = SqliteArtistRepository::insert_many(&mut conn, &[artist("a1"), artist("")]).await;
        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_insert_many_spans_chunks() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteArtistRepository::new(pool.clone());
        let mut conn = pool.acquire().await.unwrap();

        let artists: Vec<Artist> = (0..(BIND_CHUNK / 5) * 2 + 3)
            .map(|i| artist(&format!("a{}", i)))
            .collect();
        let inserted = SqliteArtistRepository::insert_many(&mut conn, &artists)
            .await
            .unwrap();
        drop(conn);

        assert_eq!(inserted as usize, artists.len());
        assert_eq!(repo.count().await.unwrap() as usize, artists.len());
    }
}
