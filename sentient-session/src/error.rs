//! Error types for sentient-session

use sentient_common::Error as CommonError;
use thiserror::Error;

/// Main error type for the session layer
#[derive(Error, Debug)]
pub enum SessionError {
    /// Pipeline errors from the shared taxonomy
    #[error(transparent)]
    Pipeline(#[from] CommonError),

    /// Transport failure talking to the API service
    #[error("API request failed: {0}")]
    Api(String),
}

/// Convenience Result type using SessionError
pub type Result<T> = std::result::Result<T, SessionError>;
