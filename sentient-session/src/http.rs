//! HTTP implementations of the session data sources
//!
//! One reqwest client against the sentient-api service. Error bodies are
//! the service's `{error, raw?}` JSON shape; status codes are folded back
//! into the shared error taxonomy so the preparation pipeline reacts the
//! same way it would to an in-process failure.

use crate::error::{Result, SessionError};
use crate::sources::{EntrySource, NarrationSource, ScriptSource, SessionRecorder};
use async_trait::async_trait;
use reqwest::StatusCode;
use sentient_common::{Error, MeditationPhase, MeditationSessionRecord, MoodEntry};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    checked_in_mood: &'a str,
    destination_mood: &'a str,
    note: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchBody {
    entry_id: String,
    phases: Vec<BatchPhase>,
}

#[derive(Debug, Serialize)]
struct BatchPhase {
    text: String,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    raw: Option<String>,
}

#[derive(Debug, Serialize)]
struct RecordBody {
    user_id: Uuid,
    mood_entry_id: Uuid,
    completed: bool,
    duration_seconds: i64,
}

/// Client for the sentient-api HTTP service
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SessionError::Api(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Map a non-success response to the shared taxonomy by status
    async fn error_for(response: reqwest::Response) -> SessionError {
        let status = response.status();
        let body: ErrorBody = match response.json().await {
            Ok(body) => body,
            Err(_) => ErrorBody {
                error: format!("API returned {status}"),
                raw: None,
            },
        };

        match status {
            StatusCode::BAD_REQUEST => Error::Validation(body.error).into(),
            StatusCode::NOT_FOUND => Error::NotFound(body.error).into(),
            StatusCode::BAD_GATEWAY => Error::MalformedResponse {
                reason: body.error,
                raw: body.raw.unwrap_or_default(),
            }
            .into(),
            _ => SessionError::Api(format!("{status}: {}", body.error)),
        }
    }
}

#[async_trait]
impl EntrySource for ApiClient {
    async fn fetch_entry(&self, entry_id: Uuid) -> Result<Option<MoodEntry>> {
        let response = self
            .http_client
            .get(self.url(&format!("/api/entries/{entry_id}")))
            .send()
            .await
            .map_err(|e| SessionError::Api(format!("Entry request failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let entry = response
            .json()
            .await
            .map_err(|e| SessionError::Api(format!("Invalid entry response: {e}")))?;
        Ok(Some(entry))
    }
}

#[async_trait]
impl ScriptSource for ApiClient {
    async fn generate_script(
        &self,
        checked_in_mood: &str,
        destination_mood: &str,
        note: Option<&str>,
    ) -> Result<Vec<MeditationPhase>> {
        let response = self
            .http_client
            .post(self.url("/api/generate"))
            .json(&GenerateBody {
                checked_in_mood,
                destination_mood,
                note,
            })
            .send()
            .await
            .map_err(|e| SessionError::Api(format!("Generate request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| SessionError::Api(format!("Invalid generate response: {e}")))
    }
}

#[async_trait]
impl NarrationSource for ApiClient {
    async fn synthesize_batch(&self, entry_id: Uuid, texts: &[String]) -> Result<Vec<String>> {
        let response = self
            .http_client
            .post(self.url("/api/tts-batch"))
            .json(&BatchBody {
                entry_id: entry_id.to_string(),
                phases: texts
                    .iter()
                    .map(|text| BatchPhase { text: text.clone() })
                    .collect(),
            })
            .send()
            .await
            .map_err(|e| SessionError::Api(format!("Narration request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let body: BatchResponse = response
            .json()
            .await
            .map_err(|e| SessionError::Api(format!("Invalid narration response: {e}")))?;
        Ok(body.urls)
    }
}

#[async_trait]
impl SessionRecorder for ApiClient {
    async fn record(&self, record: &MeditationSessionRecord) -> Result<()> {
        let response = self
            .http_client
            .post(self.url("/api/sessions"))
            .json(&RecordBody {
                user_id: record.user_id,
                mood_entry_id: record.mood_entry_id,
                completed: record.completed,
                duration_seconds: record.duration_seconds,
            })
            .send()
            .await
            .map_err(|e| SessionError::Api(format!("Session record request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_normalized() {
        let client = ApiClient::new("http://localhost:5730/").unwrap();
        assert_eq!(
            client.url("/api/generate"),
            "http://localhost:5730/api/generate"
        );
    }

    #[test]
    fn batch_body_uses_wire_casing() {
        let body = BatchBody {
            entry_id: "e1".into(),
            phases: vec![BatchPhase { text: "t".into() }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("entryId").is_some());
        assert_eq!(json["phases"][0]["text"], "t");
    }
}
