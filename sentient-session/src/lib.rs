//! sentient-session: client-side session layer
//!
//! Everything between a stored mood entry and a completed meditation:
//! the preparation pipeline (script generation, narration synthesis,
//! bundle hand-off), the playback state machine, and HTTP sources backed
//! by the sentient-api service.

pub mod audio;
pub mod bundle;
pub mod engine;
pub mod error;
pub mod http;
pub mod prepare;
pub mod sources;

pub use bundle::{BundleStore, MemoryBundleStore, SessionBundle};
pub use engine::{EngineState, PlaybackEngine, TickOutcome};
pub use error::{Result, SessionError};
pub use prepare::{PrepareOutcome, Preparer};
