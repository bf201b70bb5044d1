//! Database initialization
//!
//! Creates required tables on startup if missing. Schema changes are
//! additive; existing rows are never migrated destructively here.

use crate::error::Result;
use sqlx::{Pool, Sqlite};
use tracing::info;

/// Create all tables used by the service
pub async fn init_schema(pool: &Pool<Sqlite>) -> Result<()> {
    info!("Initializing database schema");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS mood_entries (
            id TEXT PRIMARY KEY,
            user_id TEXT,
            checked_in_mood TEXT NOT NULL,
            destination_mood TEXT,
            note TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meditation_sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            mood_entry_id TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            duration_seconds INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Inspiration content for prompt enrichment, keyed by mood pair
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS match_chunks (
            id TEXT PRIMARY KEY,
            text TEXT NOT NULL,
            checked_in_mood TEXT NOT NULL,
            destination_mood TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn schema_init_is_idempotent() {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        init_schema(&pool).await.unwrap();
        init_schema(&pool).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert!(names.contains(&"mood_entries"));
        assert!(names.contains(&"meditation_sessions"));
        assert!(names.contains(&"match_chunks"));
    }
}
