//! Mood entry queries
//!
//! An entry is created on check-in, mutated once to add the destination
//! mood (and for note edits before a destination is chosen), and read-only
//! after that.

use crate::error::{ApiError, Result};
use chrono::{DateTime, Utc};
use sentient_common::{Error, MoodEntry};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

type EntryRow = (
    String,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
    DateTime<Utc>,
);

fn row_to_entry(row: EntryRow) -> Result<MoodEntry> {
    let (id, user_id, checked_in_mood, destination_mood, note, created_at) = row;
    Ok(MoodEntry {
        id: Uuid::parse_str(&id)
            .map_err(|e| ApiError::from(Error::Internal(format!("bad entry id {id}: {e}"))))?,
        user_id: match user_id {
            Some(u) => Some(
                Uuid::parse_str(&u)
                    .map_err(|e| ApiError::from(Error::Internal(format!("bad user id: {e}"))))?,
            ),
            None => None,
        },
        checked_in_mood,
        destination_mood,
        note,
        created_at,
    })
}

/// Create a mood entry on check-in submission
pub async fn create_entry(
    db: &Pool<Sqlite>,
    user_id: Option<Uuid>,
    checked_in_mood: &str,
    note: Option<&str>,
) -> Result<MoodEntry> {
    let id = Uuid::new_v4();
    let created_at = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO mood_entries (id, user_id, checked_in_mood, note, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(user_id.map(|u| u.to_string()))
    .bind(checked_in_mood)
    .bind(note)
    .bind(created_at)
    .execute(db)
    .await?;

    Ok(MoodEntry {
        id,
        user_id,
        checked_in_mood: checked_in_mood.to_string(),
        destination_mood: None,
        note: note.map(str::to_string),
        created_at,
    })
}

/// Fetch one entry by id
pub async fn get_entry(db: &Pool<Sqlite>, entry_id: Uuid) -> Result<Option<MoodEntry>> {
    let row: Option<EntryRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, checked_in_mood, destination_mood, note, created_at
        FROM mood_entries
        WHERE id = ?
        "#,
    )
    .bind(entry_id.to_string())
    .fetch_optional(db)
    .await?;

    row.map(row_to_entry).transpose()
}

/// Record the chosen destination mood for an entry
pub async fn set_destination(
    db: &Pool<Sqlite>,
    entry_id: Uuid,
    destination_mood: &str,
) -> Result<()> {
    let result = sqlx::query("UPDATE mood_entries SET destination_mood = ? WHERE id = ?")
        .bind(destination_mood)
        .bind(entry_id.to_string())
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("mood entry {entry_id}")).into());
    }

    Ok(())
}

/// Edit the free-text note. Only allowed before a destination is chosen.
pub async fn set_note(db: &Pool<Sqlite>, entry_id: Uuid, note: Option<&str>) -> Result<()> {
    let result = sqlx::query(
        "UPDATE mood_entries SET note = ? WHERE id = ? AND destination_mood IS NULL",
    )
    .bind(note)
    .bind(entry_id.to_string())
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "mood entry {entry_id} (missing or already finalized)"
        ))
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_schema;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_db() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn create_and_fetch_entry() {
        let db = test_db().await;
        let user = Uuid::new_v4();

        let entry = create_entry(&db, Some(user), "anxious", Some("long day"))
            .await
            .unwrap();

        let fetched = get_entry(&db, entry.id).await.unwrap().unwrap();
        assert_eq!(fetched.checked_in_mood, "anxious");
        assert_eq!(fetched.user_id, Some(user));
        assert_eq!(fetched.note.as_deref(), Some("long day"));
        assert!(fetched.destination_mood.is_none());
    }

    #[tokio::test]
    async fn destination_is_set_once() {
        let db = test_db().await;
        let entry = create_entry(&db, None, "anxious", None).await.unwrap();

        set_destination(&db, entry.id, "calm").await.unwrap();
        let fetched = get_entry(&db, entry.id).await.unwrap().unwrap();
        assert_eq!(fetched.destination_mood.as_deref(), Some("calm"));
    }

    #[tokio::test]
    async fn note_edits_blocked_after_destination() {
        let db = test_db().await;
        let entry = create_entry(&db, None, "sad", Some("before")).await.unwrap();

        set_note(&db, entry.id, Some("edited")).await.unwrap();
        set_destination(&db, entry.id, "peaceful").await.unwrap();

        assert!(set_note(&db, entry.id, Some("too late")).await.is_err());
        let fetched = get_entry(&db, entry.id).await.unwrap().unwrap();
        assert_eq!(fetched.note.as_deref(), Some("edited"));
    }

    #[tokio::test]
    async fn missing_entry_is_none() {
        let db = test_db().await;
        assert!(get_entry(&db, Uuid::new_v4()).await.unwrap().is_none());
    }
}
