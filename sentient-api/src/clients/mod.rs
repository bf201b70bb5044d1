//! Upstream service clients
//!
//! Trait seams for the three external collaborators (generative text model,
//! speech model, object storage) with production implementations over HTTP.
//! Handlers and pipelines depend on the traits so tests can substitute
//! fakes without network access.

pub mod openai;
pub mod storage;

use async_trait::async_trait;
use sentient_common::Result;

pub use openai::OpenAiClient;
pub use storage::StorageClient;

/// Generative text model: one chat completion per script request
#[async_trait]
pub trait ScriptModel: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Speech model: narration text in, encoded audio bytes out
#[async_trait]
pub trait SpeechModel: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str, model: &str) -> Result<Vec<u8>>;
}

/// Object storage with signed, time-limited retrieval URLs
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload bytes to `path`, overwriting any prior artifact (idempotent
    /// re-runs land on the same path).
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// Mint a signed URL for `path`, valid for `ttl_secs`
    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String>;
}
