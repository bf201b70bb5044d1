//! Script generation pipeline
//!
//! Validates the mood transition, builds a prompt (optionally enriched with
//! retrieved inspiration content), submits one chat-completion request and
//! parses the response into exactly six normalized phases.

use crate::clients::ScriptModel;
use crate::db::chunks;
use crate::error::Result;
use sentient_common::phases::{parse_script, MeditationPhase, PHASE_COUNT};
use sentient_common::Error;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are a meditation guide who writes short, vivid, \
second-person guided meditations that move a listener from one emotional state \
to another in six distinct phases: Awareness, Acceptance, Processing, Reframing, \
Integration, Maintenance. Respond with a JSON array of exactly 6 objects, each \
shaped {\"phase\": string, \"text\": string}. Respond with JSON only, no prose, \
no code fences.";

/// Script generator over an injected text model
pub struct ScriptGenerator {
    model: Arc<dyn ScriptModel>,
    db_pool: Pool<Sqlite>,
}

impl ScriptGenerator {
    pub fn new(model: Arc<dyn ScriptModel>, db_pool: Pool<Sqlite>) -> Self {
        Self { model, db_pool }
    }

    /// Generate a six-phase script for a mood transition.
    ///
    /// Both moods must be non-empty; validation failures return before any
    /// network call. Parse and arity failures carry the raw model output
    /// and are not retried.
    pub async fn generate(
        &self,
        checked_in_mood: &str,
        destination_mood: &str,
        note: Option<&str>,
    ) -> Result<Vec<MeditationPhase>> {
        if checked_in_mood.trim().is_empty() || destination_mood.trim().is_empty() {
            return Err(Error::Validation(
                "checked_in_mood and destination_mood are required".into(),
            )
            .into());
        }

        let inspiration = self
            .fetch_inspiration(checked_in_mood, destination_mood)
            .await;

        let user_prompt =
            build_user_prompt(checked_in_mood, destination_mood, note, &inspiration);

        let raw = self.model.complete(SYSTEM_PROMPT, &user_prompt).await?;
        let phases = parse_script(&raw)?;

        debug!(
            checked_in_mood,
            destination_mood,
            phases = phases.len(),
            "script generated"
        );
        debug_assert_eq!(phases.len(), PHASE_COUNT);

        Ok(phases)
    }

    /// Best-effort retrieval enrichment. Failures are logged and skipped;
    /// generation proceeds with an unenriched prompt.
    async fn fetch_inspiration(&self, checked_in_mood: &str, destination_mood: &str) -> Vec<String> {
        match chunks::matching_chunks(&self.db_pool, checked_in_mood, destination_mood).await {
            Ok(found) => found,
            Err(e) => {
                warn!("inspiration retrieval failed, continuing without: {e}");
                Vec::new()
            }
        }
    }
}

/// Build the user prompt from the transition, the optional note and any
/// retrieved inspiration lines.
fn build_user_prompt(
    checked_in_mood: &str,
    destination_mood: &str,
    note: Option<&str>,
    inspiration: &[String],
) -> String {
    let mut prompt = format!(
        "The listener currently feels {checked_in_mood} and wants to feel \
         {destination_mood}. Write the six phases of their meditation."
    );

    if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
        prompt.push_str(&format!("\n\nThey shared this about their day: \"{note}\""));
    }

    if !inspiration.is_empty() {
        prompt.push_str("\n\nDraw inspiration from these passages:\n");
        for line in inspiration {
            prompt.push_str(&format!("- {line}\n"));
        }
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingModel {
        response: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ScriptModel for CountingModel {
        async fn complete(&self, _system: &str, _user: &str) -> sentient_common::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }
    }

    async fn generator(response: &str) -> (ScriptGenerator, Arc<CountingModel>) {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init::init_schema(&pool).await.unwrap();

        let model = Arc::new(CountingModel {
            response: response.to_string(),
            calls: AtomicUsize::new(0),
        });
        (ScriptGenerator::new(model.clone(), pool), model)
    }

    fn six_phases_json() -> String {
        serde_json::to_string(
            &(1..=6)
                .map(|i| serde_json::json!({"phase": format!("P{i}"), "text": "breathe"}))
                .collect::<Vec<_>>(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn empty_moods_fail_before_any_model_call() {
        let (generator, model) = generator(&six_phases_json()).await;

        let err = generator.generate("", "calm", None).await.unwrap_err();
        assert!(matches!(
            err,
            crate::ApiError::Pipeline(Error::Validation(_))
        ));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);

        assert!(generator.generate("anxious", "  ", None).await.is_err());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_transition_generates_six_phases() {
        let (generator, model) = generator(&six_phases_json()).await;

        let phases = generator
            .generate("anxious", "calm", Some("rough week"))
            .await
            .unwrap();
        assert_eq!(phases.len(), PHASE_COUNT);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn wrong_arity_propagates_shape_error() {
        let (generator, _) = generator(r#"[{"phase":"only","text":"one"}]"#).await;

        let err = generator.generate("sad", "peaceful", None).await.unwrap_err();
        assert!(matches!(
            err,
            crate::ApiError::Pipeline(Error::UnexpectedShape { count: 1, .. })
        ));
    }

    #[test]
    fn prompt_includes_note_and_inspiration() {
        let prompt = build_user_prompt(
            "anxious",
            "calm",
            Some("deadline stress"),
            &["Let the breath slow.".to_string()],
        );
        assert!(prompt.contains("anxious"));
        assert!(prompt.contains("calm"));
        assert!(prompt.contains("deadline stress"));
        assert!(prompt.contains("Let the breath slow."));
    }

    #[test]
    fn prompt_omits_blank_note() {
        let prompt = build_user_prompt("sad", "content", Some("   "), &[]);
        assert!(!prompt.contains("about their day"));
        assert!(!prompt.contains("inspiration"));
    }
}
