//! OpenAI-compatible model client
//!
//! Chat completions for script generation and the speech endpoint for
//! narration audio. Base URL is configurable so a compatible proxy can be
//! substituted in deployment.

use async_trait::async_trait;
use sentient_common::{Error, Result};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{ScriptModel, SpeechModel};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for an OpenAI-compatible API
pub struct OpenAiClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    text_model: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str, text_model: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            text_model: text_model.to_string(),
        })
    }
}

#[async_trait]
impl ScriptModel for OpenAiClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.text_model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        });

        tracing::debug!(model = %self.text_model, "requesting chat completion");

        let response = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("chat completion request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamUnavailable(format!(
                "chat completion failed (HTTP {status}): {error_text}"
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("chat completion decode: {e}")))?;

        let content = completion
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or("[]")
            .trim()
            .to_string();

        Ok(content)
    }
}

#[async_trait]
impl SpeechModel for OpenAiClient {
    async fn synthesize(&self, text: &str, voice: &str, model: &str) -> Result<Vec<u8>> {
        let body = json!({
            "model": model,
            "voice": voice,
            "input": text,
        });

        tracing::debug!(voice, model, chars = text.len(), "requesting speech synthesis");

        let response = self
            .http_client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("speech request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamUnavailable(format!(
                "speech synthesis failed (HTTP {status}): {error_text}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Internal(format!("speech body read: {e}")))?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation_normalizes_base_url() {
        let client = OpenAiClient::new("https://api.openai.com/", "sk-test", "gpt-4o-mini");
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url, "https://api.openai.com");
    }

    #[test]
    fn completion_response_decodes() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"[]"}}]}"#;
        let decoded: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(decoded.choices[0].message.content.as_deref(), Some("[]"));
    }
}
