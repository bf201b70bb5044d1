//! Event types for the session event system
//!
//! Preparation and playback publish these over a broadcast channel; the UI
//! layer is a thin subscriber that renders progress, state changes and
//! redirects. Serialized with a `type` tag for any wire transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where the UI should send the user to recover or continue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectTarget {
    /// Mood check-in step (entry missing or never created)
    CheckIn,
    /// Destination-mood selection step
    DestinationPicker,
    /// Preparation step (bundle unrecoverably lost mid-playback)
    Ready,
    /// Profile view, after a completed session
    Profile,
    /// Login screen (no authenticated user)
    Login,
}

/// Session lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Preparation progress update
    PrepareProgress {
        percent: u8,
        step: String,
        timestamp: DateTime<Utc>,
    },

    /// Preparation finished; the bundle is stored and playback may start
    PrepareReady {
        entry_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Preparation failed; UI shows the message briefly then redirects
    PrepareFailed {
        message: String,
        redirect: RedirectTarget,
        timestamp: DateTime<Utc>,
    },

    /// Active phase changed (timer advance or manual skip)
    PhaseChanged {
        phase_index: usize,
        label: String,
        timestamp: DateTime<Utc>,
    },

    /// Play/pause toggled
    PlaybackStateChanged {
        playing: bool,
        timestamp: DateTime<Utc>,
    },

    /// Session reached Complete (naturally or via explicit end)
    SessionCompleted {
        duration_seconds: u32,
        timestamp: DateTime<Utc>,
    },

    /// UI should navigate after the given delay
    RedirectScheduled {
        target: RedirectTarget,
        delay_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = SessionEvent::PlaybackStateChanged {
            playing: true,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PlaybackStateChanged");
        assert_eq!(json["playing"], true);
    }

    #[test]
    fn redirect_targets_use_snake_case() {
        let json = serde_json::to_value(RedirectTarget::DestinationPicker).unwrap();
        assert_eq!(json, "destination_picker");
    }
}
