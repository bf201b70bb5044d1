//! HTTP request handlers
//!
//! Implements the REST endpoints for the meditation pipeline. Wire shapes
//! follow the client contract: snake_case for generation, camelCase for the
//! narration endpoints.

use crate::api::server::AppContext;
use crate::db;
use crate::error::Result;
use crate::narration::AUDIO_CONTENT_TYPE;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use sentient_common::emotions::destinations_for;
use sentient_common::phases::MeditationPhase;
use sentient_common::{Error, MeditationSessionRecord, MoodEntry};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub checked_in_mood: String,
    pub destination_mood: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PhaseText {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsBatchRequest {
    #[serde(default)]
    pub entry_id: Option<String>,
    #[serde(default)]
    pub phases: Vec<PhaseText>,
    pub voice: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TtsBatchResponse {
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsMode {
    #[default]
    Stream,
    Upload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
    #[serde(rename = "as", default)]
    pub mode: TtsMode,
    pub entry_id: Option<String>,
    /// 0-based; required when mode is upload
    pub phase_index: Option<usize>,
    pub voice: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsUploadResponse {
    pub signed_url: String,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct DestinationsQuery {
    pub from: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DestinationsResponse {
    pub destinations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub checked_in_mood: String,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetDestinationRequest {
    pub destination_mood: String,
}

#[derive(Debug, Deserialize)]
pub struct SetNoteRequest {
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordSessionRequest {
    pub user_id: Uuid,
    pub mood_entry_id: Uuid,
    pub completed: bool,
    pub duration_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct RecordSessionResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SessionTotalsResponse {
    pub completed_sessions: i64,
    pub total_seconds: i64,
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "sentient_api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Pipeline Endpoints
// ============================================================================

/// POST /api/generate - Generate a six-phase meditation script
///
/// 400 when either mood is missing, 502 with the raw payload when the model
/// returns unusable content or the wrong number of phases.
pub async fn generate(
    State(ctx): State<AppContext>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<Vec<MeditationPhase>>> {
    let generator = ctx.generator()?;

    let phases = generator
        .generate(
            &req.checked_in_mood,
            req.destination_mood.as_deref().unwrap_or(""),
            req.note.as_deref(),
        )
        .await?;

    Ok(Json(phases))
}

/// POST /api/tts-batch - Synthesize narration for all six phases
///
/// Returns six signed URLs, or an error identifying the failing phase.
/// Never returns a partial URL list.
pub async fn tts_batch(
    State(ctx): State<AppContext>,
    Json(req): Json<TtsBatchRequest>,
) -> Result<Json<TtsBatchResponse>> {
    let synthesizer = ctx.synthesizer()?;

    let entry_id = req.entry_id.unwrap_or_default();
    let texts: Vec<String> = req.phases.into_iter().map(|p| p.text).collect();
    let voice = req.voice.unwrap_or_else(|| ctx.tts_voice.clone());
    let model = req.model.unwrap_or_else(|| ctx.tts_model.clone());

    let urls = synthesizer
        .synthesize_all(&entry_id, &texts, &voice, &model)
        .await?;

    Ok(Json(TtsBatchResponse { urls }))
}

/// POST /api/tts - Synthesize one phase
///
/// `as: "stream"` returns raw audio bytes (not cached); `as: "upload"`
/// uploads to the per-phase path and returns a signed URL.
pub async fn tts(
    State(ctx): State<AppContext>,
    Json(req): Json<TtsRequest>,
) -> Result<Response> {
    let synthesizer = ctx.synthesizer()?;
    let voice = req.voice.unwrap_or_else(|| ctx.tts_voice.clone());
    let model = req.model.unwrap_or_else(|| ctx.tts_model.clone());

    match req.mode {
        TtsMode::Stream => {
            let bytes = synthesizer
                .synthesize_stream(&req.text, &voice, &model)
                .await?;
            Ok((
                [
                    (header::CONTENT_TYPE, AUDIO_CONTENT_TYPE),
                    (header::CACHE_CONTROL, "no-store"),
                ],
                bytes,
            )
                .into_response())
        }
        TtsMode::Upload => {
            let entry_id = req.entry_id.unwrap_or_default();
            let phase_index = req.phase_index.ok_or_else(|| {
                Error::Validation("phaseIndex (0-based) is required when as='upload'".into())
            })?;

            let uploaded = synthesizer
                .synthesize_upload(&req.text, &entry_id, phase_index, &voice, &model)
                .await?;

            Ok(Json(TtsUploadResponse {
                signed_url: uploaded.signed_url,
                path: uploaded.path,
            })
            .into_response())
        }
    }
}

// ============================================================================
// Mood Transition Resolver
// ============================================================================

/// GET /api/destinations?from=mood - Valid destination moods for a start mood
pub async fn destinations(
    Query(query): Query<DestinationsQuery>,
) -> Json<DestinationsResponse> {
    let destinations = destinations_for(query.from.as_deref())
        .iter()
        .map(|d| d.to_string())
        .collect();
    Json(DestinationsResponse { destinations })
}

// ============================================================================
// Mood Entry Endpoints
// ============================================================================

/// POST /api/entries - Create a mood entry on check-in
pub async fn create_entry(
    State(ctx): State<AppContext>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<Json<MoodEntry>> {
    if req.checked_in_mood.trim().is_empty() {
        return Err(Error::Validation("checked_in_mood is required".into()).into());
    }

    let entry = db::entries::create_entry(
        &ctx.db_pool,
        req.user_id,
        req.checked_in_mood.trim(),
        req.note.as_deref(),
    )
    .await?;

    info!(entry_id = %entry.id, mood = %entry.checked_in_mood, "mood entry created");
    Ok(Json(entry))
}

/// GET /api/entries/:entry_id - Fetch a mood entry
pub async fn get_entry(
    State(ctx): State<AppContext>,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<MoodEntry>> {
    let entry = db::entries::get_entry(&ctx.db_pool, entry_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("mood entry {entry_id}")))?;
    Ok(Json(entry))
}

/// POST /api/entries/:entry_id/destination - Choose the destination mood
pub async fn set_destination(
    State(ctx): State<AppContext>,
    Path(entry_id): Path<Uuid>,
    Json(req): Json<SetDestinationRequest>,
) -> Result<Json<MoodEntry>> {
    if req.destination_mood.trim().is_empty() {
        return Err(Error::Validation("destination_mood is required".into()).into());
    }

    db::entries::set_destination(&ctx.db_pool, entry_id, req.destination_mood.trim()).await?;

    let entry = db::entries::get_entry(&ctx.db_pool, entry_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("mood entry {entry_id}")))?;
    Ok(Json(entry))
}

/// POST /api/entries/:entry_id/note - Edit the note before a destination is chosen
pub async fn set_note(
    State(ctx): State<AppContext>,
    Path(entry_id): Path<Uuid>,
    Json(req): Json<SetNoteRequest>,
) -> Result<Json<MoodEntry>> {
    db::entries::set_note(&ctx.db_pool, entry_id, req.note.as_deref()).await?;

    let entry = db::entries::get_entry(&ctx.db_pool, entry_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("mood entry {entry_id}")))?;
    Ok(Json(entry))
}

// ============================================================================
// Session Record Endpoints
// ============================================================================

/// POST /api/sessions - Record one completed (or ended) playback session
pub async fn record_session(
    State(ctx): State<AppContext>,
    Json(req): Json<RecordSessionRequest>,
) -> Result<Json<RecordSessionResponse>> {
    let id = db::sessions::insert_session(
        &ctx.db_pool,
        &MeditationSessionRecord {
            user_id: req.user_id,
            mood_entry_id: req.mood_entry_id,
            completed: req.completed,
            duration_seconds: req.duration_seconds,
        },
    )
    .await?;

    info!(session_id = %id, duration = req.duration_seconds, "session recorded");
    Ok(Json(RecordSessionResponse { id }))
}

/// GET /api/users/:user_id/sessions - Completed-session totals for a user
pub async fn session_totals(
    State(ctx): State<AppContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SessionTotalsResponse>> {
    let (completed_sessions, total_seconds) =
        db::sessions::user_totals(&ctx.db_pool, user_id).await?;
    Ok(Json(SessionTotalsResponse {
        completed_sessions,
        total_seconds,
    }))
}
