//! Mood transition table and emotion presentation data
//!
//! The transition table is authored content, not derived: high-arousal
//! negative states map toward low-arousal states, low-arousal negative
//! states toward positive valence, already-positive states toward
//! higher-energy positive states. Keep it as data.

/// Default destination set for null, empty or unknown starting moods
pub const FALLBACK_DESTINATIONS: [&str; 3] = ["calm", "peaceful", "content"];

/// Resolve the valid destination moods for a starting mood.
///
/// Lookup is case-insensitive, deterministic and total: unknown or absent
/// input resolves to [`FALLBACK_DESTINATIONS`]. Order within each set is
/// significant and presented to the user as authored.
pub fn destinations_for(start: Option<&str>) -> &'static [&'static str] {
    let Some(start) = start else {
        return &FALLBACK_DESTINATIONS;
    };

    match start.trim().to_lowercase().as_str() {
        // High frequency, negative: reduce arousal
        "anxious" => &["calm", "grounded", "peaceful"],
        "worried" => &["calm", "accepting", "peaceful"],
        "stressed" => &["relaxed", "calm", "peaceful"],

        // High frequency, negative: reduce intensity or shift valence
        "angry" => &["calm", "accepting", "peaceful"],
        "frustrated" => &["patient", "calm", "accepting"],
        "irritated" => &["calm", "patient", "accepting"],

        // Low frequency, negative: shift valence to positive
        "sad" => &["accepting", "content", "peaceful"],
        "depressed" => &["accepting", "hopeful", "calm"],
        "lonely" => &["connected", "accepting", "peaceful"],

        // Mid-range states can move multiple directions
        "bored" => &["curious", "interested", "content"],
        "confused" => &["clear", "focused", "understanding"],
        "tired" => &["rested", "peaceful", "calm"],

        // Already positive states
        "content" => &["grateful", "joyful", "energized"],
        "calm" => &["peaceful", "grateful", "content"],
        "happy" => &["joyful", "grateful", "energized"],

        _ => &FALLBACK_DESTINATIONS,
    }
}

/// Display metadata for a mood tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmotionMeta {
    pub label: String,
    pub description: &'static str,
    pub emoji: &'static str,
}

/// Display metadata for an emotion, with a generic fallback for tags the
/// table does not know.
pub fn metadata_for(emotion: &str) -> EmotionMeta {
    let known: Option<(&str, &str, &str)> = match emotion {
        "calm" => Some(("Calm", "Peace and serenity", "\u{1F33F}")),
        "peaceful" => Some(("Peaceful", "Inner stillness", "\u{262E}\u{FE0F}")),
        "grounded" => Some(("Grounded", "Centered and stable", "\u{1F331}")),
        "relaxed" => Some(("Relaxed", "Ease and comfort", "\u{1F60C}")),
        "rested" => Some(("Rested", "Refreshed and renewed", "\u{1F6CF}\u{FE0F}")),
        "accepting" => Some(("Accepting", "Allowing what is", "\u{1F932}")),
        "patient" => Some(("Patient", "Steady and calm", "\u{1F422}")),
        "content" => Some(("Content", "Gentle satisfaction", "\u{1F60A}")),
        "hopeful" => Some(("Hopeful", "Looking forward", "\u{1F308}")),
        "connected" => Some(("Connected", "In touch with others", "\u{1F91D}")),
        "grateful" => Some(("Grateful", "Appreciating what is", "\u{1F64F}")),
        "clear" => Some(("Clear", "Mental clarity", "\u{1F48E}")),
        "focused" => Some(("Focused", "Sharp and attentive", "\u{1F3AF}")),
        "understanding" => Some(("Understanding", "Seeing with insight", "\u{1F4A1}")),
        "curious" => Some(("Curious", "Open to discovery", "\u{1FAB6}")),
        "interested" => Some(("Interested", "Engaged and attentive", "\u{1F440}")),
        "joyful" => Some(("Joyful", "Light and radiant", "\u{2600}\u{FE0F}")),
        "energized" => Some(("Energized", "Alive and vibrant", "\u{26A1}")),
        _ => None,
    };

    match known {
        Some((label, description, emoji)) => EmotionMeta {
            label: label.to_string(),
            description,
            emoji,
        },
        None => EmotionMeta {
            label: emotion.to_string(),
            description: "Finding balance",
            emoji: "\u{2728}",
        },
    }
}

/// Moods offered on the check-in screen
pub const CHECK_IN_MOODS: [&str; 6] = [
    "calm",
    "happy",
    "anxious",
    "sad",
    "frustrated",
    "confused",
];

/// Ambient music track for a destination mood. Moods without a dedicated
/// track borrow a close one; unknown moods fall back to the calm track.
pub fn music_track_for(destination: &str) -> &'static str {
    match destination {
        "accepting" => "accepting.mp3",
        "calm" => "calm.mp3",
        "peaceful" => "peaceful.mp3",
        "grateful" => "grateful.mp3",
        "content" => "content.mp3",
        "grounded" => "grounded.mp3",
        "connected" => "connected.mp3",
        "patient" => "patient.mp3",
        "hopeful" => "hopeful.mp3",
        "joyful" => "joyful.mp3",
        "energized" => "energized.mp3",
        "rested" => "rested.mp3",
        "understanding" => "understanding.mp3",
        "focused" => "focused.mp3",
        "relaxed" => "calm.mp3",
        "clear" => "focused.mp3",
        _ => "calm.mp3",
    }
}
