//! Ambient background colors
//!
//! The session background is linearly interpolated per HSL channel between
//! the color of the checked-in mood and the color of the destination mood,
//! parameterized by phase progress. Pure and deterministic so visual
//! regressions can be tested without a renderer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HslColor {
    pub hue: f32,
    pub sat: f32,
    pub light: f32,
}

impl HslColor {
    pub const fn new(hue: f32, sat: f32, light: f32) -> Self {
        Self { hue, sat, light }
    }

    /// CSS `hsl()` string
    pub fn to_css(&self) -> String {
        format!("hsl({}, {}%, {}%)", self.hue, self.sat, self.light)
    }
}

/// Color of the calm mood, the fallback for unknown starting moods
pub const CALM: HslColor = HslColor::new(180.0, 50.0, 55.0);

/// Color of the peaceful mood, the fallback for unknown destination moods
pub const PEACEFUL: HslColor = HslColor::new(240.0, 40.0, 50.0);

/// Color assigned to a mood tag, if one is authored
pub fn color_for(emotion: &str) -> Option<HslColor> {
    Some(match emotion {
        "sad" => HslColor::new(210.0, 60.0, 40.0),
        "anxious" => HslColor::new(150.0, 50.0, 45.0),
        "angry" => HslColor::new(0.0, 70.0, 50.0),
        "frustrated" => HslColor::new(30.0, 65.0, 48.0),
        "confused" => HslColor::new(280.0, 45.0, 50.0),
        "calm" => CALM,
        "content" => HslColor::new(45.0, 70.0, 60.0),
        "peaceful" => PEACEFUL,
        "grateful" => HslColor::new(270.0, 55.0, 58.0),
        "happy" => HslColor::new(50.0, 80.0, 65.0),
        _ => return None,
    })
}

/// Linear per-channel interpolation between two colors
pub fn interpolate(from: HslColor, to: HslColor, progress: f32) -> HslColor {
    HslColor {
        hue: from.hue + (to.hue - from.hue) * progress,
        sat: from.sat + (to.sat - from.sat) * progress,
        light: from.light + (to.light - from.light) * progress,
    }
}

/// Progress of a session through its phases: `index / (total - 1)`
pub fn phase_progress(phase_index: usize, total_phases: usize) -> f32 {
    phase_index as f32 / total_phases.saturating_sub(1).max(1) as f32
}

/// Background color for a session between two moods at a given phase
pub fn ambient_color(
    start_mood: &str,
    destination_mood: &str,
    phase_index: usize,
    total_phases: usize,
) -> HslColor {
    let from = color_for(start_mood).unwrap_or(CALM);
    let to = color_for(destination_mood).unwrap_or(PEACEFUL);
    interpolate(from, to, phase_progress(phase_index, total_phases))
}
