//! Inspiration chunks for prompt enrichment
//!
//! Small pieces of supporting content keyed by a (checked-in, destination)
//! mood pair. Retrieval is an optional enrichment of script generation:
//! lookups that fail or find nothing never block the pipeline.

use crate::error::Result;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

/// Maximum inspiration lines folded into one prompt
pub const MAX_INSPIRATION_CHUNKS: i64 = 4;

/// Insert an inspiration chunk
pub async fn insert_chunk(
    db: &Pool<Sqlite>,
    text: &str,
    checked_in_mood: &str,
    destination_mood: &str,
) -> Result<Uuid> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO match_chunks (id, text, checked_in_mood, destination_mood)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(text)
    .bind(checked_in_mood)
    .bind(destination_mood)
    .execute(db)
    .await?;

    Ok(id)
}

/// Best-matching chunks for a mood transition
pub async fn matching_chunks(
    db: &Pool<Sqlite>,
    checked_in_mood: &str,
    destination_mood: &str,
) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT text FROM match_chunks
        WHERE checked_in_mood = ? AND destination_mood = ?
        LIMIT ?
        "#,
    )
    .bind(checked_in_mood)
    .bind(destination_mood)
    .bind(MAX_INSPIRATION_CHUNKS)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(|(text,)| text).collect())
}
