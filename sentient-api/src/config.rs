//! sentient-api configuration
//!
//! Loaded from command-line arguments and environment variables at startup.
//! Upstream credentials are optional at load time; endpoints that need a
//! missing credential fail with a configuration error before any network
//! call is made.

use std::path::PathBuf;

/// Default voice for narration synthesis
pub const DEFAULT_TTS_VOICE: &str = "alloy";

/// Default speech-synthesis model
pub const DEFAULT_TTS_MODEL: &str = "gpt-4o-mini-tts";

/// Default generative text model for script generation
pub const DEFAULT_TEXT_MODEL: &str = "gpt-4o-mini";

/// Signed narration URLs are valid for one hour
pub const SIGNED_URL_TTL_SECS: u64 = 60 * 60;

/// Narration synthesis processes phases with this much concurrency.
/// Must stay 1: batch failure reporting assumes phases finish in order.
pub const TTS_CONCURRENCY: usize = 1;

/// Storage bucket holding narration artifacts
pub const DEFAULT_AUDIO_BUCKET: &str = "sentient-audio";

/// API service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    /// Base URL of the OpenAI-compatible model endpoint
    pub model_base_url: String,
    pub model_api_key: Option<String>,
    /// Base URL of the storage backend (Supabase project URL)
    pub storage_url: Option<String>,
    pub storage_service_key: Option<String>,
    pub audio_bucket: String,
    pub tts_voice: String,
    pub tts_model: String,
    pub text_model: String,
}

impl Config {
    /// Speech/text model credentials, or a configuration error naming the
    /// missing variable. Checked pre-flight so misconfiguration never turns
    /// into a half-finished batch.
    pub fn require_model_key(&self) -> sentient_common::Result<&str> {
        self.model_api_key.as_deref().ok_or_else(|| {
            sentient_common::Error::UpstreamUnavailable("OPENAI_API_KEY missing".into())
        })
    }

    /// Storage credentials, or a configuration error
    pub fn require_storage(&self) -> sentient_common::Result<(&str, &str)> {
        match (self.storage_url.as_deref(), self.storage_service_key.as_deref()) {
            (Some(url), Some(key)) => Ok((url, key)),
            _ => Err(sentient_common::Error::UpstreamUnavailable(
                "Server storage not configured".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(key: Option<&str>, storage: bool) -> Config {
        Config {
            port: 5730,
            db_path: PathBuf::from(":memory:"),
            model_base_url: "https://api.openai.com".into(),
            model_api_key: key.map(str::to_string),
            storage_url: storage.then(|| "https://proj.supabase.co".into()),
            storage_service_key: storage.then(|| "service-role".into()),
            audio_bucket: DEFAULT_AUDIO_BUCKET.into(),
            tts_voice: DEFAULT_TTS_VOICE.into(),
            tts_model: DEFAULT_TTS_MODEL.into(),
            text_model: DEFAULT_TEXT_MODEL.into(),
        }
    }

    #[test]
    fn missing_model_key_is_fatal_config_error() {
        let config = config_with(None, true);
        assert!(matches!(
            config.require_model_key(),
            Err(sentient_common::Error::UpstreamUnavailable(_))
        ));
    }

    #[test]
    fn partial_storage_config_is_rejected() {
        let mut config = config_with(Some("sk-test"), true);
        config.storage_service_key = None;
        assert!(config.require_storage().is_err());

        let config = config_with(Some("sk-test"), true);
        assert!(config.require_storage().is_ok());
    }
}
