//! Playback engine state machine
//!
//! Drives a prepared session through its six phases. The authoritative
//! transition is the pure `tick()` function at one-second resolution;
//! it mutates the counters and advances phases with no timers involved,
//! so the whole state machine is testable against a virtual clock. The
//! live driver is [`EngineHandle`], which arms a `tokio` interval task
//! while playing and cancels it on pause, completion and teardown.
//!
//! Audio side effects go through [`AudioSink`] and are best-effort: a
//! sink failure is logged and never stalls the session.

use crate::audio::AudioSink;
use crate::bundle::{BundleStore, SessionBundle};
use crate::error::Result;
use crate::sources::{EntrySource, NarrationSource, SessionRecorder};
use chrono::Utc;
use sentient_common::colors::{self, HslColor};
use sentient_common::events::{RedirectTarget, SessionEvent};
use sentient_common::{Error, MeditationSessionRecord, MoodEntry};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Timer resolution of the playback clock
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Delay before the post-completion redirect to the profile view
pub const COMPLETION_REDIRECT_DELAY_MS: u64 = 2000;

/// Playback engine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Paused; no timer running, audio paused
    Idle,
    /// Timer running, ambience and narration playing
    Playing,
    /// Terminal; session ended naturally or explicitly
    Complete,
}

/// Result of one clock tick or manual transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing; counters untouched
    Ignored,
    /// Counters advanced within the current phase
    Running,
    /// Crossed into the phase at this index
    Advanced { phase_index: usize },
    /// Session is complete with this much accumulated playback time
    Completed { duration_seconds: u32 },
}

/// State machine for one prepared session
pub struct PlaybackEngine {
    state: EngineState,
    entry_id: Uuid,
    checked_in_mood: String,
    destination_mood: String,
    bundle: SessionBundle,
    current_phase: usize,
    total_elapsed: u32,
    time_in_phase: u32,
    sink: Arc<dyn AudioSink>,
    events: broadcast::Sender<SessionEvent>,
}

impl PlaybackEngine {
    /// Build an engine from a valid bundle and its mood entry. The first
    /// phase's narration is installed paused; playback starts on the first
    /// `toggle_play_pause`.
    pub fn new(
        bundle: SessionBundle,
        entry: &MoodEntry,
        sink: Arc<dyn AudioSink>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Result<Self> {
        if !bundle.is_valid() {
            return Err(Error::Validation("session bundle is not playable".into()).into());
        }
        let destination = entry
            .destination_mood
            .clone()
            .ok_or_else(|| Error::Validation("mood entry has no destination".into()))?;

        let engine = Self {
            state: EngineState::Idle,
            entry_id: entry.id,
            checked_in_mood: entry.checked_in_mood.clone(),
            destination_mood: destination,
            current_phase: 0,
            total_elapsed: 0,
            time_in_phase: 0,
            sink,
            events,
            bundle,
        };
        engine.sink_call(
            engine.sink.load_narration(&engine.bundle.narration_urls[0]),
            "load first narration",
        );
        Ok(engine)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn entry_id(&self) -> Uuid {
        self.entry_id
    }

    pub fn current_phase(&self) -> usize {
        self.current_phase
    }

    pub fn current_phase_label(&self) -> &str {
        &self.bundle.phases[self.current_phase].phase
    }

    pub fn total_elapsed(&self) -> u32 {
        self.total_elapsed
    }

    pub fn time_in_phase(&self) -> u32 {
        self.time_in_phase
    }

    /// Background color at the current phase position
    pub fn ambient_color(&self) -> HslColor {
        colors::ambient_color(
            &self.checked_in_mood,
            &self.destination_mood,
            self.current_phase,
            self.bundle.phases.len(),
        )
    }

    /// Advance the playback clock by one second.
    ///
    /// Only counts while `Playing`. When `time_in_phase` reaches the
    /// active phase's duration the engine crosses exactly one phase
    /// boundary, or completes on the last phase.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != EngineState::Playing {
            return TickOutcome::Ignored;
        }

        self.total_elapsed += 1;
        self.time_in_phase += 1;

        if self.time_in_phase >= self.bundle.phases[self.current_phase].duration_secs() {
            return self.cross_phase_boundary();
        }
        TickOutcome::Running
    }

    /// Toggle between `Idle` and `Playing`. Counters are never reset by
    /// pausing. Returns whether the engine is now playing.
    pub fn toggle_play_pause(&mut self) -> bool {
        match self.state {
            EngineState::Idle => {
                self.state = EngineState::Playing;
                self.sink_call(self.sink.start_ambient(), "start ambient");
                self.sink_call(self.sink.start_narration(), "start narration");
            }
            EngineState::Playing => {
                self.state = EngineState::Idle;
                self.sink_call(self.sink.pause_ambient(), "pause ambient");
                self.sink_call(self.sink.pause_narration(), "pause narration");
            }
            EngineState::Complete => return false,
        }

        let playing = self.state == EngineState::Playing;
        self.emit(SessionEvent::PlaybackStateChanged {
            playing,
            timestamp: Utc::now(),
        });
        playing
    }

    /// Forced phase-boundary crossing. Works while paused; the next
    /// phase's narration is installed but not auto-started.
    pub fn skip_to_next_phase(&mut self) -> TickOutcome {
        match self.state {
            EngineState::Idle | EngineState::Playing => self.cross_phase_boundary(),
            EngineState::Complete => TickOutcome::Ignored,
        }
    }

    /// Immediate completion from any live position
    pub fn end_session(&mut self) -> TickOutcome {
        match self.state {
            EngineState::Idle | EngineState::Playing => self.complete(),
            EngineState::Complete => TickOutcome::Ignored,
        }
    }

    fn cross_phase_boundary(&mut self) -> TickOutcome {
        if self.current_phase + 1 >= self.bundle.phases.len() {
            return self.complete();
        }

        self.current_phase += 1;
        self.time_in_phase = 0;

        // Always pause and discard the outgoing narration before the next
        // one is installed, even while paused.
        self.sink_call(self.sink.pause_narration(), "pause narration");
        self.sink_call(
            self.sink
                .load_narration(&self.bundle.narration_urls[self.current_phase]),
            "load narration",
        );
        if self.state == EngineState::Playing {
            self.sink_call(self.sink.start_narration(), "start narration");
        }

        debug!(phase = self.current_phase, "phase advanced");
        self.emit(SessionEvent::PhaseChanged {
            phase_index: self.current_phase,
            label: self.bundle.phases[self.current_phase].phase.clone(),
            timestamp: Utc::now(),
        });
        TickOutcome::Advanced {
            phase_index: self.current_phase,
        }
    }

    fn complete(&mut self) -> TickOutcome {
        self.state = EngineState::Complete;
        self.sink_call(self.sink.stop_all(), "stop audio");

        info!(
            entry_id = %self.entry_id,
            duration = self.total_elapsed,
            "session complete"
        );
        self.emit(SessionEvent::SessionCompleted {
            duration_seconds: self.total_elapsed,
            timestamp: Utc::now(),
        });
        TickOutcome::Completed {
            duration_seconds: self.total_elapsed,
        }
    }

    fn sink_call(&self, result: sentient_common::Result<()>, what: &str) {
        if let Err(e) = result {
            warn!(what, error = %e, "audio sink command failed");
        }
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

/// How session initialization resolved
pub enum InitOutcome {
    Ready(PlaybackEngine),
    /// Prerequisite state is missing; the UI should navigate there
    Redirect(RedirectTarget),
}

/// Load the mood entry and session bundle and build an engine.
///
/// Bundle loss is recoverable: if the stored bundle still carries the
/// script but its narration is unusable, narration is re-synthesized
/// against the known script. A bundle that is absent entirely (or belongs
/// to another entry) sends the user back to the preparation step.
pub async fn initialize(
    entry_id: Option<Uuid>,
    bundles: &dyn BundleStore,
    entries: &dyn EntrySource,
    narration: &dyn NarrationSource,
    sink: Arc<dyn AudioSink>,
    events: broadcast::Sender<SessionEvent>,
) -> InitOutcome {
    let Some(entry_id) = entry_id else {
        return InitOutcome::Redirect(RedirectTarget::CheckIn);
    };

    let entry = match entries.fetch_entry(entry_id).await {
        Ok(Some(entry)) => entry,
        Ok(None) => return InitOutcome::Redirect(RedirectTarget::CheckIn),
        Err(e) => {
            warn!(%entry_id, error = %e, "entry lookup failed during initialization");
            return InitOutcome::Redirect(RedirectTarget::CheckIn);
        }
    };
    if entry.destination_mood.is_none() {
        return InitOutcome::Redirect(RedirectTarget::DestinationPicker);
    }

    let bundle = match bundles.get() {
        Some(bundle) if bundle.entry_id == entry_id && bundle.is_valid() => bundle,
        Some(bundle)
            if bundle.entry_id == entry_id
                && bundle.phases.len() == sentient_common::phases::PHASE_COUNT =>
        {
            // Script survived but narration did not; rebuild it
            let texts: Vec<String> = bundle.phases.iter().map(|p| p.text.clone()).collect();
            match narration.synthesize_batch(entry_id, &texts).await {
                Ok(urls) if urls.len() == bundle.phases.len() => {
                    let rebuilt = SessionBundle {
                        entry_id,
                        phases: bundle.phases,
                        narration_urls: urls,
                    };
                    bundles.put(rebuilt.clone());
                    rebuilt
                }
                Ok(_) | Err(_) => {
                    warn!(%entry_id, "narration re-synthesis failed, returning to preparation");
                    return InitOutcome::Redirect(RedirectTarget::Ready);
                }
            }
        }
        _ => return InitOutcome::Redirect(RedirectTarget::Ready),
    };

    match PlaybackEngine::new(bundle, &entry, sink, events) {
        Ok(engine) => InitOutcome::Ready(engine),
        Err(e) => {
            warn!(%entry_id, error = %e, "engine construction failed");
            InitOutcome::Redirect(RedirectTarget::Ready)
        }
    }
}

/// Live driver around a [`PlaybackEngine`].
///
/// Owns the one-second interval task; the task exists only while the
/// engine is playing and is aborted on pause, completion and teardown.
/// A leaked interval double-advancing phases is a correctness bug, so
/// re-arming always cancels the previous task first.
pub struct EngineHandle {
    engine: Arc<Mutex<PlaybackEngine>>,
    driver: Mutex<Option<JoinHandle<()>>>,
    recorder: Option<Arc<dyn SessionRecorder>>,
    user_id: Option<Uuid>,
    events: broadcast::Sender<SessionEvent>,
}

impl EngineHandle {
    pub fn new(
        engine: PlaybackEngine,
        recorder: Option<Arc<dyn SessionRecorder>>,
        user_id: Option<Uuid>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            driver: Mutex::new(None),
            recorder,
            user_id,
            events,
        }
    }

    /// Snapshot accessor for UI rendering
    pub fn with_engine<R>(&self, f: impl FnOnce(&PlaybackEngine) -> R) -> R {
        f(&self.engine.lock().unwrap())
    }

    /// Toggle play/pause, arming or cancelling the interval task
    pub fn toggle_play_pause(&self) -> bool {
        let playing = self.engine.lock().unwrap().toggle_play_pause();
        if playing {
            self.arm();
        } else {
            self.disarm();
        }
        playing
    }

    /// Skip to the next phase (or complete from the last one)
    pub async fn skip_to_next_phase(&self) {
        let outcome = self.engine.lock().unwrap().skip_to_next_phase();
        if let TickOutcome::Completed { duration_seconds } = outcome {
            self.disarm();
            Self::finish(
                &self.engine,
                self.recorder.as_ref(),
                self.user_id,
                &self.events,
                duration_seconds,
            )
            .await;
        }
    }

    /// End the session immediately
    pub async fn end_session(&self) {
        let outcome = self.engine.lock().unwrap().end_session();
        if let TickOutcome::Completed { duration_seconds } = outcome {
            self.disarm();
            Self::finish(
                &self.engine,
                self.recorder.as_ref(),
                self.user_id,
                &self.events,
                duration_seconds,
            )
            .await;
        }
    }

    fn arm(&self) {
        let mut driver = self.driver.lock().unwrap();
        if let Some(task) = driver.take() {
            task.abort();
        }

        let engine = Arc::clone(&self.engine);
        let recorder = self.recorder.clone();
        let user_id = self.user_id;
        let events = self.events.clone();
        *driver = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            // The first interval tick fires immediately; consume it so the
            // first counted second really is one second in.
            interval.tick().await;
            loop {
                interval.tick().await;
                let outcome = engine.lock().unwrap().tick();
                match outcome {
                    TickOutcome::Completed { duration_seconds } => {
                        Self::finish(
                            &engine,
                            recorder.as_ref(),
                            user_id,
                            &events,
                            duration_seconds,
                        )
                        .await;
                        break;
                    }
                    TickOutcome::Ignored => break,
                    TickOutcome::Running | TickOutcome::Advanced { .. } => {}
                }
            }
        }));
    }

    fn disarm(&self) {
        if let Some(task) = self.driver.lock().unwrap().take() {
            task.abort();
        }
    }

    /// Completion bookkeeping: write the session record (best-effort,
    /// only with an authenticated user) and schedule the profile redirect.
    async fn finish(
        engine: &Arc<Mutex<PlaybackEngine>>,
        recorder: Option<&Arc<dyn SessionRecorder>>,
        user_id: Option<Uuid>,
        events: &broadcast::Sender<SessionEvent>,
        duration_seconds: u32,
    ) {
        let entry_id = engine.lock().unwrap().entry_id();

        if let (Some(recorder), Some(user_id)) = (recorder, user_id) {
            let record = MeditationSessionRecord {
                user_id,
                mood_entry_id: entry_id,
                completed: true,
                duration_seconds: i64::from(duration_seconds),
            };
            if let Err(e) = recorder.record(&record).await {
                warn!(%entry_id, error = %e, "completion record write failed, redirecting anyway");
            }
        }

        let _ = events.send(SessionEvent::RedirectScheduled {
            target: RedirectTarget::Profile,
            delay_ms: COMPLETION_REDIRECT_DELAY_MS,
            timestamp: Utc::now(),
        });
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if let Some(task) = self.driver.lock().unwrap().take() {
            task.abort();
        }
    }
}
