//! Storage backend client (Supabase Storage REST API)
//!
//! Uploads narration artifacts with upsert semantics and mints time-limited
//! signed retrieval URLs. Uses the service-role key; row-level isolation of
//! the bucket is the backend's responsibility.

use async_trait::async_trait;
use sentient_common::{Error, Result};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::ObjectStore;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Supabase Storage client scoped to one bucket
pub struct StorageClient {
    http_client: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl StorageClient {
    pub fn new(base_url: &str, service_key: &str, bucket: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, path
        );

        tracing::debug!(path, bytes = bytes.len(), "uploading audio artifact");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::Persistence {
                phase: None,
                message: format!("upload request: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Persistence {
                phase: None,
                message: format!("upload failed (HTTP {status}): {error_text}"),
            });
        }

        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String> {
        let url = format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.base_url, self.bucket, path
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.service_key)
            .json(&json!({ "expiresIn": ttl_secs }))
            .send()
            .await
            .map_err(|e| Error::Persistence {
                phase: None,
                message: format!("sign request: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Persistence {
                phase: None,
                message: format!("signing failed (HTTP {status}): {error_text}"),
            });
        }

        let signed: SignResponse = response.json().await.map_err(|e| Error::Persistence {
            phase: None,
            message: format!("sign response decode: {e}"),
        })?;

        // The API returns a path relative to /storage/v1
        Ok(format!(
            "{}/storage/v1{}",
            self.base_url,
            signed.signed_url
        ))
    }
}
