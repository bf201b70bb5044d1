//! Audio side effects behind a trait seam
//!
//! The playback engine never touches a decoder or an output device
//! directly; it drives an [`AudioSink`] with ambience and per-phase
//! narration commands. Real decoding and output belong to the embedding
//! application; tests use a recording fake.

use sentient_common::Result;

/// Ambience and narration playback commands issued by the session layer.
///
/// Implementations use interior mutability; all methods take `&self` so a
/// sink can be shared between the preparation pipeline (ambient preload)
/// and the playback engine.
pub trait AudioSink: Send + Sync {
    /// Fetch and cache the ambient track so playback can start without a
    /// network stall. Best-effort; callers swallow failures.
    fn preload_ambient(&self, track: &str) -> Result<()>;

    fn start_ambient(&self) -> Result<()>;

    fn pause_ambient(&self) -> Result<()>;

    /// Discard any current narration handle and install a new one, paused.
    fn load_narration(&self, url: &str) -> Result<()>;

    fn start_narration(&self) -> Result<()>;

    fn pause_narration(&self) -> Result<()>;

    /// Stop and release everything (session complete or torn down)
    fn stop_all(&self) -> Result<()>;
}

/// Sink that ignores every command. For headless use where no audio
/// device is wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn preload_ambient(&self, _track: &str) -> Result<()> {
        Ok(())
    }

    fn start_ambient(&self) -> Result<()> {
        Ok(())
    }

    fn pause_ambient(&self) -> Result<()> {
        Ok(())
    }

    fn load_narration(&self, _url: &str) -> Result<()> {
        Ok(())
    }

    fn start_narration(&self) -> Result<()> {
        Ok(())
    }

    fn pause_narration(&self) -> Result<()> {
        Ok(())
    }

    fn stop_all(&self) -> Result<()> {
        Ok(())
    }
}
