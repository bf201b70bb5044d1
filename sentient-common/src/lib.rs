//! # Sentient Common Library
//!
//! Shared code for the Sentient meditation services including:
//! - Meditation phase types and script parsing
//! - Mood transition and display data
//! - Session event types (SessionEvent enum)
//! - Ambient color interpolation
//! - Common error types

pub mod colors;
pub mod emotions;
pub mod entry;
pub mod error;
pub mod events;
pub mod phases;

pub use entry::{MeditationSessionRecord, MoodEntry};
pub use error::{Error, Result};
pub use phases::{MeditationPhase, MeditationTheme, PHASE_COUNT};
