//! Meditation script types, parsing and normalization
//!
//! A generated script is an ordered sequence of exactly six phases. Order is
//! significant: it encodes the emotional transition from the checked-in mood
//! to the destination mood and must never be reordered downstream.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A valid script always has exactly this many phases
pub const PHASE_COUNT: usize = 6;

/// Attached to every phase during normalization; model-proposed durations
/// are discarded.
pub const DEFAULT_PHASE_DURATION_SECS: u32 = 30;

/// Maximum narration text length accepted by the synthesizer
pub const MAX_NARRATION_CHARS: usize = 2000;

/// Presentation hints for one phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeditationTheme {
    /// Phase duration in seconds
    pub duration: u32,
}

impl Default for MeditationTheme {
    fn default() -> Self {
        Self {
            duration: DEFAULT_PHASE_DURATION_SECS,
        }
    }
}

/// One of six ordered steps in a generated meditation script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeditationPhase {
    /// Phase label, e.g. "Awareness"
    pub phase: String,
    /// Narration text for the phase
    pub text: String,
    pub theme: MeditationTheme,
}

impl MeditationPhase {
    /// Effective duration, guarding against a zero value that would stall
    /// the playback timer.
    pub fn duration_secs(&self) -> u32 {
        if self.theme.duration == 0 {
            DEFAULT_PHASE_DURATION_SECS
        } else {
            self.theme.duration
        }
    }
}

/// Strip literal code-fence markers the model sometimes wraps its output in.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    // Drop the opening fence line (``` or ```json), then any closing fence.
    let rest = match trimmed.find('\n') {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed.trim_start_matches('`'),
    };
    rest.trim_end_matches('`').trim()
}

/// Parse a raw model response into exactly six normalized phases.
///
/// Parse failures yield [`Error::MalformedResponse`] carrying the raw text;
/// a parsed array whose length is not exactly six yields
/// [`Error::UnexpectedShape`]. Neither is retried here.
///
/// Normalization: a missing or non-string label becomes `"Phase {n}"`
/// (1-based), missing or non-string narration becomes the empty string
/// (callers must treat empty narration as a synthesis failure downstream),
/// and every phase gets the default 30-second duration regardless of what
/// the model proposed.
pub fn parse_script(raw: &str) -> Result<Vec<MeditationPhase>> {
    let cleaned = strip_code_fences(raw);

    let values: Vec<Value> =
        serde_json::from_str(cleaned).map_err(|e| Error::MalformedResponse {
            reason: e.to_string(),
            raw: raw.to_string(),
        })?;

    if values.len() != PHASE_COUNT {
        return Err(Error::UnexpectedShape {
            count: values.len(),
            expected: PHASE_COUNT,
            raw: raw.to_string(),
        });
    }

    Ok(values
        .iter()
        .enumerate()
        .map(|(i, v)| MeditationPhase {
            phase: v
                .get("phase")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Phase {}", i + 1)),
            text: v
                .get("text")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default(),
            theme: MeditationTheme::default(),
        })
        .collect())
}
