//! Session bundle hand-off between preparation and playback
//!
//! The bundle is the ephemeral aggregate of {entry id, six phases, six
//! narration URLs} produced by preparation and consumed exactly once by
//! the playback engine. It lives for one session, is replaced by the next
//! preparation and is cleared on logout. It is never persisted.

use sentient_common::phases::PHASE_COUNT;
use sentient_common::MeditationPhase;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use uuid::Uuid;

/// One prepared meditation, ready for playback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionBundle {
    pub entry_id: Uuid,
    pub phases: Vec<MeditationPhase>,
    /// Signed retrieval URL per phase, same order as `phases`
    pub narration_urls: Vec<String>,
}

impl SessionBundle {
    /// A bundle is playable only with exactly six phases and a narration
    /// URL for each. Anything else is treated as bundle loss, which is
    /// recoverable (re-synthesis or redirect), never fatal.
    pub fn is_valid(&self) -> bool {
        self.phases.len() == PHASE_COUNT
            && self.narration_urls.len() == PHASE_COUNT
            && self.narration_urls.iter().all(|u| !u.trim().is_empty())
    }
}

/// Bundle hand-off store
pub trait BundleStore: Send + Sync {
    /// Store a bundle, replacing any previous one
    fn put(&self, bundle: SessionBundle);

    /// Current bundle, if any. Validity is the caller's check.
    fn get(&self) -> Option<SessionBundle>;

    fn clear(&self);
}

/// In-memory, single-session bundle store
#[derive(Debug, Default)]
pub struct MemoryBundleStore {
    slot: Mutex<Option<SessionBundle>>,
}

impl MemoryBundleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BundleStore for MemoryBundleStore {
    fn put(&self, bundle: SessionBundle) {
        *self.slot.lock().unwrap() = Some(bundle);
    }

    fn get(&self) -> Option<SessionBundle> {
        self.slot.lock().unwrap().clone()
    }

    fn clear(&self) {
        *self.slot.lock().unwrap() = None;
    }
}
