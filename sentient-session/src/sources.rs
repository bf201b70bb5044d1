//! Data sources consumed by the session layer
//!
//! Trait seams over the API service so the preparation pipeline and
//! playback engine can be tested against in-process fakes. The production
//! implementations live in [`crate::http`].

use crate::error::Result;
use async_trait::async_trait;
use sentient_common::{MeditationPhase, MeditationSessionRecord, MoodEntry};
use uuid::Uuid;

/// Mood entry lookup
#[async_trait]
pub trait EntrySource: Send + Sync {
    /// Fetch one entry; `None` when it does not exist
    async fn fetch_entry(&self, entry_id: Uuid) -> Result<Option<MoodEntry>>;
}

/// Six-phase script generation
#[async_trait]
pub trait ScriptSource: Send + Sync {
    async fn generate_script(
        &self,
        checked_in_mood: &str,
        destination_mood: &str,
        note: Option<&str>,
    ) -> Result<Vec<MeditationPhase>>;
}

/// Batch narration synthesis returning one signed URL per phase
#[async_trait]
pub trait NarrationSource: Send + Sync {
    async fn synthesize_batch(&self, entry_id: Uuid, texts: &[String]) -> Result<Vec<String>>;
}

/// Durable completion-record sink
#[async_trait]
pub trait SessionRecorder: Send + Sync {
    async fn record(&self, record: &MeditationSessionRecord) -> Result<()>;
}
