//! Common error types for Sentient

use thiserror::Error;

/// Common result type for Sentient operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the generation, synthesis and playback pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Caller-supplied input malformed (maps to 400, never retried)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Upstream model returned non-parseable content (maps to 502).
    /// Carries the raw payload for diagnostics; not retried automatically.
    #[error("Invalid JSON returned from AI: {reason}")]
    MalformedResponse { reason: String, raw: String },

    /// Upstream model returned a parseable script of the wrong arity.
    /// Arity drift is a hard contract violation, never padded or truncated.
    #[error("AI did not return {expected} valid phases (got {count})")]
    UnexpectedShape {
        count: usize,
        expected: usize,
        raw: String,
    },

    /// Missing backend configuration (storage or speech credentials).
    /// Fatal until an operator fixes the deployment.
    #[error("Upstream not configured: {0}")]
    UpstreamUnavailable(String),

    /// Storage upload or signing failure. `phase` is the 1-based index of
    /// the failing item when the failure occurred inside a batch.
    #[error("{message}")]
    Persistence {
        phase: Option<usize>,
        message: String,
    },

    /// Expected record missing; recoverable by redirecting the user to an
    /// earlier pipeline step, not a hard error.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Persistence failure for one phase of a batch (1-based index)
    pub fn phase_failure(phase: usize, message: impl Into<String>) -> Self {
        Error::Persistence {
            phase: Some(phase),
            message: message.into(),
        }
    }
}
