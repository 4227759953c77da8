//! Dedup filter for credited artist ids.

use crate::error::Result;
use core_library::repositories::SqliteArtistRepository;
use sqlx::SqliteConnection;
use std::collections::HashSet;

/// Candidates not in `existing`, each once, in first-seen order.
pub fn novel_ids<'a, I>(candidates: I, existing: &HashSet<String>) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut seen: HashSet<&str> = HashSet::new();
    candidates
        .into_iter()
        .filter(|id| !existing.contains(*id) && seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// Artist ids among `candidates` that are not stored yet, as seen by `conn`.
///
/// Pass the round's transaction so the answer matches the snapshot the
/// subsequent insert runs against.
pub async fn filter_novel_artist_ids(
    conn: &mut SqliteConnection,
    candidates: &[String],
) -> Result<Vec<String>> {
    let unique = novel_ids(candidates, &HashSet::new());
    if unique.is_empty() {
        return Ok(unique);
    }

    let existing = SqliteArtistRepository::existing_ids(conn, &unique).await?;
    Ok(novel_ids(&unique, &existing))
}
