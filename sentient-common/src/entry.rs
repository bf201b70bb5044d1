//! Mood check-in records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A mood check-in: starting emotional state, optional destination and note.
///
/// Created once per check-in; mutated once to add the destination mood (and
/// for note edits before a destination is chosen), read-only after that.
/// Owned exclusively by the submitting user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub checked_in_mood: String,
    pub destination_mood: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Durable completion record, written exactly once when a playback session
/// ends. Never updated or deleted by this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeditationSessionRecord {
    pub user_id: Uuid,
    pub mood_entry_id: Uuid,
    pub completed: bool,
    pub duration_seconds: i64,
}
