//! End-to-end session flow tests
//!
//! Drives the whole client-side pipeline with in-process fakes: prepare a
//! session for a mood entry, initialize the playback engine from the
//! stored bundle, play through every phase on the virtual clock and check
//! the durable completion record.

use async_trait::async_trait;
use sentient_common::events::{RedirectTarget, SessionEvent};
use sentient_common::phases::{MeditationPhase, MeditationTheme};
use sentient_common::{MeditationSessionRecord, MoodEntry};
use sentient_session::audio::AudioSink;
use sentient_session::bundle::{BundleStore, MemoryBundleStore};
use sentient_session::engine::{initialize, EngineHandle, EngineState, InitOutcome};
use sentient_session::prepare::{PrepareOutcome, Preparer};
use sentient_session::sources::{EntrySource, NarrationSource, ScriptSource, SessionRecorder};
use sentient_session::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

// =============================================================================
// Fakes
// =============================================================================

struct FakeBackend {
    entry: MoodEntry,
    records: Mutex<Vec<MeditationSessionRecord>>,
}

impl FakeBackend {
    fn new(entry: MoodEntry) -> Self {
        Self {
            entry,
            records: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EntrySource for FakeBackend {
    async fn fetch_entry(&self, entry_id: Uuid) -> Result<Option<MoodEntry>> {
        Ok((entry_id == self.entry.id).then(|| self.entry.clone()))
    }
}

#[async_trait]
impl ScriptSource for FakeBackend {
    async fn generate_script(
        &self,
        checked_in: &str,
        destination: &str,
        _note: Option<&str>,
    ) -> Result<Vec<MeditationPhase>> {
        Ok((1..=6)
            .map(|i| MeditationPhase {
                phase: format!("Phase {i}"),
                text: format!("From {checked_in} toward {destination}, step {i}."),
                theme: MeditationTheme { duration: 2 },
            })
            .collect())
    }
}

#[async_trait]
impl NarrationSource for FakeBackend {
    async fn synthesize_batch(&self, entry_id: Uuid, texts: &[String]) -> Result<Vec<String>> {
        Ok((1..=texts.len())
            .map(|i| format!("https://signed.example/tts/{entry_id}/phase-{i}.mp3"))
            .collect())
    }
}

#[async_trait]
impl SessionRecorder for FakeBackend {
    async fn record(&self, record: &MeditationSessionRecord) -> Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[derive(Default)]
struct QuietSink {
    preloads: Mutex<Vec<String>>,
}

impl AudioSink for QuietSink {
    fn preload_ambient(&self, track: &str) -> sentient_common::Result<()> {
        self.preloads.lock().unwrap().push(track.to_string());
        Ok(())
    }
    fn start_ambient(&self) -> sentient_common::Result<()> {
        Ok(())
    }
    fn pause_ambient(&self) -> sentient_common::Result<()> {
        Ok(())
    }
    fn load_narration(&self, _url: &str) -> sentient_common::Result<()> {
        Ok(())
    }
    fn start_narration(&self) -> sentient_common::Result<()> {
        Ok(())
    }
    fn pause_narration(&self) -> sentient_common::Result<()> {
        Ok(())
    }
    fn stop_all(&self) -> sentient_common::Result<()> {
        Ok(())
    }
}

fn test_entry(user_id: Uuid) -> MoodEntry {
    MoodEntry {
        id: Uuid::new_v4(),
        user_id: Some(user_id),
        checked_in_mood: "anxious".into(),
        destination_mood: Some("calm".into()),
        note: Some("long week".into()),
        created_at: chrono::Utc::now(),
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test(start_paused = true)]
async fn full_session_from_check_in_to_completion_record() {
    let user_id = Uuid::new_v4();
    let entry = test_entry(user_id);
    let entry_id = entry.id;
    let backend = Arc::new(FakeBackend::new(entry));
    let bundles = Arc::new(MemoryBundleStore::new());
    let sink = Arc::new(QuietSink::default());
    let (tx, mut rx) = broadcast::channel(256);

    // Prepare
    let preparer = Preparer::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        bundles.clone(),
        sink.clone(),
        tx.clone(),
    );
    let outcome = preparer.prepare(Some(entry_id), Some(user_id)).await;
    assert_eq!(outcome, PrepareOutcome::Ready { entry_id });
    assert_eq!(sink.preloads.lock().unwrap().as_slice(), ["calm.mp3"]);

    // Initialize playback from the stored bundle
    let init = initialize(
        Some(entry_id),
        bundles.as_ref(),
        backend.as_ref(),
        backend.as_ref(),
        sink.clone(),
        tx.clone(),
    )
    .await;
    let InitOutcome::Ready(engine) = init else {
        panic!("expected ready engine");
    };

    // Play through all six 2-second phases on the virtual clock
    let handle = Arc::new(EngineHandle::new(
        engine,
        Some(backend.clone()),
        Some(user_id),
        tx,
    ));
    assert!(handle.toggle_play_pause());
    tokio::time::sleep(Duration::from_secs(14)).await;
    tokio::task::yield_now().await;

    assert_eq!(handle.with_engine(|e| e.state()), EngineState::Complete);

    // Exactly one completion record with the accumulated duration
    let records = backend.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].user_id, user_id);
    assert_eq!(records[0].mood_entry_id, entry_id);
    assert!(records[0].completed);
    assert_eq!(records[0].duration_seconds, 12);
    drop(records);

    // Event stream ends with the profile redirect
    let mut last_redirect = None;
    while let Ok(event) = rx.try_recv() {
        if let SessionEvent::RedirectScheduled { target, .. } = event {
            last_redirect = Some(target);
        }
    }
    assert_eq!(last_redirect, Some(RedirectTarget::Profile));
}

#[tokio::test]
async fn manual_end_mid_session_records_partial_duration() {
    let user_id = Uuid::new_v4();
    let entry = test_entry(user_id);
    let entry_id = entry.id;
    let backend = Arc::new(FakeBackend::new(entry));
    let bundles = Arc::new(MemoryBundleStore::new());
    let sink = Arc::new(QuietSink::default());
    let (tx, _rx) = broadcast::channel(256);

    let preparer = Preparer::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        bundles.clone(),
        sink.clone(),
        tx.clone(),
    );
    assert_eq!(
        preparer.prepare(Some(entry_id), Some(user_id)).await,
        PrepareOutcome::Ready { entry_id }
    );

    let init = initialize(
        Some(entry_id),
        bundles.as_ref(),
        backend.as_ref(),
        backend.as_ref(),
        sink,
        tx.clone(),
    )
    .await;
    let InitOutcome::Ready(mut engine) = init else {
        panic!("expected ready engine");
    };

    // Drive the virtual clock by hand: play 3 seconds, then end
    engine.toggle_play_pause();
    for _ in 0..3 {
        engine.tick();
    }
    let handle = Arc::new(EngineHandle::new(engine, Some(backend.clone()), Some(user_id), tx));
    handle.end_session().await;

    let records = backend.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].duration_seconds, 3);
    assert!(records[0].completed);
}

#[tokio::test]
async fn bundle_for_another_entry_is_not_replayed() {
    let user_id = Uuid::new_v4();
    let entry = test_entry(user_id);
    let entry_id = entry.id;
    let backend = Arc::new(FakeBackend::new(entry));
    let bundles = Arc::new(MemoryBundleStore::new());
    let sink = Arc::new(QuietSink::default());
    let (tx, _rx) = broadcast::channel(64);

    // Bundle belongs to a different entry
    let preparer = Preparer::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        bundles.clone(),
        sink.clone(),
        tx.clone(),
    );
    preparer.prepare(Some(entry_id), Some(user_id)).await;
    let mut stale = bundles.get().unwrap();
    stale.entry_id = Uuid::new_v4();
    bundles.put(stale);

    let init = initialize(
        Some(entry_id),
        bundles.as_ref(),
        backend.as_ref(),
        backend.as_ref(),
        sink,
        tx,
    )
    .await;
    assert!(matches!(
        init,
        InitOutcome::Redirect(RedirectTarget::Ready)
    ));
}
