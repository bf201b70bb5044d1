//! Meditation preparation pipeline
//!
//! Runs the full preparation sequence for one entry: load the mood entry,
//! generate the six-phase script, synthesize narration, preload ambient
//! music and store the session bundle. Progress is published as broadcast
//! events; missing prerequisite state yields a redirect outcome toward
//! the step that can recreate it, never a hard error.

use crate::audio::AudioSink;
use crate::bundle::{BundleStore, SessionBundle};
use crate::error::Result;
use crate::sources::{EntrySource, NarrationSource, ScriptSource};
use chrono::Utc;
use sentient_common::emotions::music_track_for;
use sentient_common::events::{RedirectTarget, SessionEvent};
use sentient_common::phases::PHASE_COUNT;
use sentient_common::MoodEntry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

/// Delay before the failure redirect, long enough to read the message
pub const FAILURE_REDIRECT_DELAY_MS: u64 = 1600;

/// How a preparation run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareOutcome {
    /// Bundle is stored; playback may start for this entry
    Ready { entry_id: Uuid },
    /// Prerequisite state is missing or a step failed; the UI should
    /// navigate to the given step
    Redirect(RedirectTarget),
    /// Another preparation run is already in flight for this preparer
    AlreadyRunning,
}

/// One-shot preparation pipeline.
///
/// The latch admits exactly one run per preparer instance, guarding
/// against double-invocation from re-entrant UI effects.
pub struct Preparer {
    entries: Arc<dyn EntrySource>,
    scripts: Arc<dyn ScriptSource>,
    narration: Arc<dyn NarrationSource>,
    bundles: Arc<dyn BundleStore>,
    sink: Arc<dyn AudioSink>,
    events: broadcast::Sender<SessionEvent>,
    started: AtomicBool,
}

impl Preparer {
    pub fn new(
        entries: Arc<dyn EntrySource>,
        scripts: Arc<dyn ScriptSource>,
        narration: Arc<dyn NarrationSource>,
        bundles: Arc<dyn BundleStore>,
        sink: Arc<dyn AudioSink>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            entries,
            scripts,
            narration,
            bundles,
            sink,
            events,
            started: AtomicBool::new(false),
        }
    }

    /// Run the preparation sequence once.
    ///
    /// `user_id` is the authenticated user, if any; preparation requires
    /// one because completion records are written against it.
    pub async fn prepare(&self, entry_id: Option<Uuid>, user_id: Option<Uuid>) -> PrepareOutcome {
        if self.started.swap(true, Ordering::SeqCst) {
            return PrepareOutcome::AlreadyRunning;
        }

        self.progress(10, "Fetching your emotional state...");

        let Some(entry_id) = entry_id else {
            return PrepareOutcome::Redirect(RedirectTarget::CheckIn);
        };
        if user_id.is_none() {
            return PrepareOutcome::Redirect(RedirectTarget::Login);
        }

        let entry = match self.load_entry(entry_id).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return PrepareOutcome::Redirect(RedirectTarget::CheckIn),
            Err(target) => return PrepareOutcome::Redirect(target),
        };
        let Some(destination) = entry.destination_mood.clone() else {
            return PrepareOutcome::Redirect(RedirectTarget::DestinationPicker);
        };
        self.progress(20, "Fetching your emotional state...");

        self.progress(30, "Generating your personalized meditation...");
        let phases = match self
            .scripts
            .generate_script(
                &entry.checked_in_mood,
                &destination,
                entry.note.as_deref(),
            )
            .await
        {
            Ok(phases) => phases,
            Err(e) => return self.fail(&format!("Failed to generate meditation: {e}")),
        };
        self.progress(50, "Preparing voice narration...");

        let texts: Vec<String> = phases.iter().map(|p| p.text.clone()).collect();
        let urls = match self.narration.synthesize_batch(entry_id, &texts).await {
            Ok(urls) => urls,
            Err(e) => return self.fail(&format!("Failed to synthesize narration: {e}")),
        };
        // A narration count short of the phase count is bundle corruption
        // waiting to happen; reject it here.
        if urls.len() != phases.len() || urls.len() != PHASE_COUNT {
            return self.fail("Narration not fully prepared");
        }
        self.progress(85, "Loading ambient music...");

        // Best-effort: a missing music file degrades the experience, it
        // does not cancel the session.
        let track = music_track_for(&destination);
        if let Err(e) = self.sink.preload_ambient(track) {
            warn!(track, error = %e, "ambient preload failed, continuing");
        }

        self.bundles.put(SessionBundle {
            entry_id,
            phases,
            narration_urls: urls,
        });

        self.progress(100, "Ready!");
        self.emit(SessionEvent::PrepareReady {
            entry_id,
            timestamp: Utc::now(),
        });
        info!(%entry_id, "meditation prepared");

        PrepareOutcome::Ready { entry_id }
    }

    async fn load_entry(&self, entry_id: Uuid) -> std::result::Result<Option<MoodEntry>, RedirectTarget> {
        match self.entries.fetch_entry(entry_id).await {
            Ok(entry) => Ok(entry),
            Err(e) => {
                warn!(%entry_id, error = %e, "entry lookup failed");
                Err(RedirectTarget::CheckIn)
            }
        }
    }

    fn fail(&self, message: &str) -> PrepareOutcome {
        warn!(message, "preparation failed");
        self.emit(SessionEvent::PrepareFailed {
            message: "Something went wrong preparing your meditation. Please try again.".into(),
            redirect: RedirectTarget::DestinationPicker,
            timestamp: Utc::now(),
        });
        self.emit(SessionEvent::RedirectScheduled {
            target: RedirectTarget::DestinationPicker,
            delay_ms: FAILURE_REDIRECT_DELAY_MS,
            timestamp: Utc::now(),
        });
        PrepareOutcome::Redirect(RedirectTarget::DestinationPicker)
    }

    fn progress(&self, percent: u8, step: &str) {
        self.emit(SessionEvent::PrepareProgress {
            percent,
            step: step.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }
}
