//! Sentient API service - Main entry point
//!
//! Orchestration service for the guided-meditation pipeline: script
//! generation, narration synthesis with signed-URL storage, and mood
//! entry / session record persistence.

use anyhow::{Context, Result};
use clap::Parser;
use sentient_api::api::{self, AppContext};
use sentient_api::clients::{ObjectStore, OpenAiClient, StorageClient};
use sentient_api::config::{
    Config, DEFAULT_AUDIO_BUCKET, DEFAULT_TEXT_MODEL, DEFAULT_TTS_MODEL, DEFAULT_TTS_VOICE,
};
use sentient_api::generate::ScriptGenerator;
use sentient_api::narration::NarrationSynthesizer;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for sentient-api
#[derive(Parser, Debug)]
#[command(name = "sentient-api")]
#[command(about = "Guided-meditation orchestration service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5730", env = "SENTIENT_PORT")]
    port: u16,

    /// SQLite database path
    #[arg(long, default_value = "sentient.db", env = "SENTIENT_DB_PATH")]
    db_path: PathBuf,

    /// Base URL of the OpenAI-compatible model endpoint
    #[arg(long, default_value = "https://api.openai.com", env = "OPENAI_BASE_URL")]
    model_base_url: String,

    /// API key for the text and speech models
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    model_api_key: Option<String>,

    /// Storage backend project URL
    #[arg(long, env = "SUPABASE_URL")]
    storage_url: Option<String>,

    /// Storage backend service-role key
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    storage_service_key: Option<String>,

    /// Storage bucket for narration artifacts
    #[arg(long, default_value = DEFAULT_AUDIO_BUCKET, env = "SENTIENT_AUDIO_BUCKET")]
    audio_bucket: String,

    /// Default narration voice
    #[arg(long, default_value = DEFAULT_TTS_VOICE, env = "SENTIENT_TTS_VOICE")]
    tts_voice: String,

    /// Default speech model
    #[arg(long, default_value = DEFAULT_TTS_MODEL, env = "SENTIENT_TTS_MODEL")]
    tts_model: String,

    /// Generative text model for scripts
    #[arg(long, default_value = DEFAULT_TEXT_MODEL, env = "SENTIENT_TEXT_MODEL")]
    text_model: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentient_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = Config {
        port: args.port,
        db_path: args.db_path,
        model_base_url: args.model_base_url,
        model_api_key: args.model_api_key,
        storage_url: args.storage_url,
        storage_service_key: args.storage_service_key,
        audio_bucket: args.audio_bucket,
        tts_voice: args.tts_voice,
        tts_model: args.tts_model,
        text_model: args.text_model,
    };

    info!("Starting Sentient API on port {}", config.port);

    // Database
    let connect_options = SqliteConnectOptions::new()
        .filename(&config.db_path)
        .create_if_missing(true);
    let db_pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await
        .context("Failed to open database")?;
    sentient_api::db::init::init_schema(&db_pool)
        .await
        .context("Failed to initialize database schema")?;
    info!("Database ready at {}", config.db_path.display());

    // Upstream clients; endpoints needing an absent client fail with a
    // configuration error at request time.
    let openai = match config.require_model_key() {
        Ok(key) => Some(Arc::new(OpenAiClient::new(
            &config.model_base_url,
            key,
            &config.text_model,
        )?)),
        Err(_) => {
            warn!("OPENAI_API_KEY not set; generation and narration disabled");
            None
        }
    };

    let store: Option<Arc<dyn ObjectStore>> = match config.require_storage() {
        Ok((url, key)) => Some(Arc::new(StorageClient::new(url, key, &config.audio_bucket)?)),
        Err(_) => {
            warn!("Storage backend not configured; narration uploads disabled");
            None
        }
    };

    let generator = openai
        .clone()
        .map(|model| Arc::new(ScriptGenerator::new(model, db_pool.clone())));
    let synthesizer =
        openai.map(|speech| Arc::new(NarrationSynthesizer::new(speech, store)));

    let ctx = AppContext {
        db_pool,
        generator,
        synthesizer,
        tts_voice: config.tts_voice.clone(),
        tts_model: config.tts_model.clone(),
    };

    api::server::run(ctx, config.port)
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}
