//! Error types for sentient-api
//!
//! Service error enum using thiserror, plus the mapping from pipeline
//! errors to HTTP responses: validation failures are 400, unusable model
//! output is 502 with the raw payload attached for diagnostics, missing
//! upstream configuration and persistence failures are 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sentient_common::Error as CommonError;
use serde::Serialize;
use thiserror::Error;

/// Main error type for sentient-api
#[derive(Error, Debug)]
pub enum ApiError {
    /// Pipeline errors from the shared taxonomy
    #[error(transparent)]
    Pipeline(#[from] CommonError),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Upstream HTTP transport errors
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience Result type using sentient-api ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

/// JSON error body; `raw` carries the unparsed model output on 502s
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Pipeline(CommonError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(CommonError::MalformedResponse { .. })
            | ApiError::Pipeline(CommonError::UnexpectedShape { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::Pipeline(CommonError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn raw_payload(&self) -> Option<String> {
        match self {
            ApiError::Pipeline(CommonError::MalformedResponse { raw, .. })
            | ApiError::Pipeline(CommonError::UnexpectedShape { raw, .. }) => Some(raw.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
            raw: self.raw_payload(),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %body.error, "request failed");
        }

        (status, Json(body)).into_response()
    }
}
