//! Completed-session records
//!
//! Insert-only: one row per ended playback session. Recorded stats are
//! advisory, so callers treat failures here as best-effort.

use crate::error::Result;
use chrono::Utc;
use sentient_common::MeditationSessionRecord;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

/// Insert a completion record. Never updates or deletes.
pub async fn insert_session(db: &Pool<Sqlite>, record: &MeditationSessionRecord) -> Result<Uuid> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO meditation_sessions
            (id, user_id, mood_entry_id, completed, duration_seconds, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(record.user_id.to_string())
    .bind(record.mood_entry_id.to_string())
    .bind(record.completed)
    .bind(record.duration_seconds)
    .bind(Utc::now())
    .execute(db)
    .await?;

    Ok(id)
}

/// Total completed sessions and accumulated seconds for a user
pub async fn user_totals(db: &Pool<Sqlite>, user_id: Uuid) -> Result<(i64, i64)> {
    let totals: (i64, Option<i64>) = sqlx::query_as(
        r#"
        SELECT COUNT(*), SUM(duration_seconds)
        FROM meditation_sessions
        WHERE user_id = ? AND completed = 1
        "#,
    )
    .bind(user_id.to_string())
    .fetch_one(db)
    .await?;

    Ok((totals.0, totals.1.unwrap_or(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_schema;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn insert_and_total_sessions() {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();

        let user = Uuid::new_v4();
        for duration in [180, 42] {
            insert_session(
                &pool,
                &MeditationSessionRecord {
                    user_id: user,
                    mood_entry_id: Uuid::new_v4(),
                    completed: true,
                    duration_seconds: duration,
                },
            )
            .await
            .unwrap();
        }

        let (count, seconds) = user_totals(&pool, user).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(seconds, 222);

        // Other users see nothing
        let (count, seconds) = user_totals(&pool, Uuid::new_v4()).await.unwrap();
        assert_eq!((count, seconds), (0, 0));
    }
}
