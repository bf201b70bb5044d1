//! HTTP server setup and routing
//!
//! Sets up the axum server with routes for the generation and narration
//! pipeline, mood entries and session records.

use crate::error::{ApiError, Result};
use crate::generate::ScriptGenerator;
use crate::narration::NarrationSynthesizer;
use axum::{
    routing::{get, post},
    Router,
};
use sentient_common::Error;
use sqlx::{Pool, Sqlite};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared application context passed to all handlers.
///
/// Pipeline components are optional: they exist only when their upstream
/// credentials were configured, and handlers that need an absent component
/// fail with a configuration error before any network call.
#[derive(Clone)]
pub struct AppContext {
    pub db_pool: Pool<Sqlite>,
    pub generator: Option<Arc<ScriptGenerator>>,
    pub synthesizer: Option<Arc<NarrationSynthesizer>>,
    /// Default narration voice, overridable per request
    pub tts_voice: String,
    /// Default speech model, overridable per request
    pub tts_model: String,
}

impl AppContext {
    pub fn generator(&self) -> Result<Arc<ScriptGenerator>> {
        self.generator
            .clone()
            .ok_or_else(|| Error::UpstreamUnavailable("OPENAI_API_KEY missing".into()).into())
    }

    pub fn synthesizer(&self) -> Result<Arc<NarrationSynthesizer>> {
        self.synthesizer
            .clone()
            .ok_or_else(|| Error::UpstreamUnavailable("OPENAI_API_KEY missing".into()).into())
    }
}

/// Build the application router with all routes
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Generation + narration pipeline
        .route("/api/generate", post(super::handlers::generate))
        .route("/api/tts", post(super::handlers::tts))
        .route("/api/tts-batch", post(super::handlers::tts_batch))
        // Mood transition resolver (destination picker feed)
        .route("/api/destinations", get(super::handlers::destinations))
        // Mood entries
        .route("/api/entries", post(super::handlers::create_entry))
        .route("/api/entries/:entry_id", get(super::handlers::get_entry))
        .route(
            "/api/entries/:entry_id/destination",
            post(super::handlers::set_destination),
        )
        .route(
            "/api/entries/:entry_id/note",
            post(super::handlers::set_note),
        )
        // Session records
        .route("/api/sessions", post(super::handlers::record_session))
        .route(
            "/api/users/:user_id/sessions",
            get(super::handlers::session_totals),
        )
        // Attach application context
        .with_state(ctx)
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}

/// Run the HTTP API server until shutdown
pub async fn run(ctx: AppContext, port: u16) -> Result<()> {
    let app = build_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::Http(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Http(format!("Server error: {e}")))?;

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
