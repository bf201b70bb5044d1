//! Narration synthesis pipeline
//!
//! Batch mode synthesizes all six phases strictly sequentially, uploads
//! each artifact to a deterministic per-phase path and mints signed URLs.
//! The batch is all-or-nothing: any single-phase failure aborts with the
//! failing phase identified, and callers never see a partial URL list.
//! Single mode serves one phase as raw bytes or as an upload + signed URL.

use crate::clients::{ObjectStore, SpeechModel};
use crate::config::{SIGNED_URL_TTL_SECS, TTS_CONCURRENCY};
use crate::error::Result;
use sentient_common::phases::{MAX_NARRATION_CHARS, PHASE_COUNT};
use sentient_common::Error;
use std::sync::Arc;
use tracing::{debug, info};

/// MIME type of synthesized narration
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Storage path for one phase's narration artifact (0-based index in,
/// 1-based path segment out). Re-runs for the same entry overwrite in
/// place rather than accumulating duplicates.
pub fn audio_path(entry_id: &str, phase_index: usize) -> String {
    format!("tts/{}/phase-{}.mp3", entry_id, phase_index + 1)
}

/// Result of a single-phase synthesis in upload mode
#[derive(Debug, Clone)]
pub struct UploadedNarration {
    pub signed_url: String,
    pub path: String,
}

/// Narration synthesizer over injected speech and storage backends.
///
/// Storage is optional: stream mode only needs the speech model. Batch and
/// upload modes fail pre-flight with a configuration error when storage is
/// absent.
pub struct NarrationSynthesizer {
    speech: Arc<dyn SpeechModel>,
    store: Option<Arc<dyn ObjectStore>>,
}

impl NarrationSynthesizer {
    pub fn new(speech: Arc<dyn SpeechModel>, store: Option<Arc<dyn ObjectStore>>) -> Self {
        Self { speech, store }
    }

    fn store(&self) -> Result<&Arc<dyn ObjectStore>> {
        self.store
            .as_ref()
            .ok_or_else(|| Error::UpstreamUnavailable("Server storage not configured".into()).into())
    }

    /// Synthesize narration for all six phases and return six signed URLs.
    ///
    /// Phases are processed strictly in order with concurrency
    /// [`TTS_CONCURRENCY`] (1).
    pub async fn synthesize_all(
        &self,
        entry_id: &str,
        texts: &[String],
        voice: &str,
        model: &str,
    ) -> Result<Vec<String>> {
        let store = self.store()?;
        validate_batch(entry_id, texts)?;

        // Concurrency is pinned at 1; widen here if the policy ever changes.
        debug_assert_eq!(TTS_CONCURRENCY, 1);

        let mut urls = Vec::with_capacity(texts.len());

        for (i, text) in texts.iter().enumerate() {
            let phase_number = i + 1;
            let path = audio_path(entry_id, i);

            debug!(phase = phase_number, %path, "synthesizing narration");

            let audio = self
                .speech
                .synthesize(text.trim(), voice, model)
                .await
                .map_err(|e| {
                    Error::phase_failure(phase_number, format!(
                        "Synthesis failed for phase {phase_number}: {e}"
                    ))
                })?;

            store
                .upload(&path, audio, AUDIO_CONTENT_TYPE)
                .await
                .map_err(|e| {
                    Error::phase_failure(phase_number, format!(
                        "Upload failed for phase {phase_number}: {e}"
                    ))
                })?;

            let url = store
                .signed_url(&path, SIGNED_URL_TTL_SECS)
                .await
                .map_err(|e| {
                    Error::phase_failure(phase_number, format!(
                        "Signing failed for phase {phase_number}: {e}"
                    ))
                })?;

            urls.push(url);
        }

        info!(entry_id, phases = urls.len(), "narration batch complete");
        Ok(urls)
    }

    /// Synthesize one phase and return the raw audio bytes
    pub async fn synthesize_stream(&self, text: &str, voice: &str, model: &str) -> Result<Vec<u8>> {
        validate_text(text)?;
        self.speech
            .synthesize(text.trim(), voice, model)
            .await
            .map_err(Into::into)
    }

    /// Synthesize one phase, upload it at its per-phase path and return a
    /// signed URL. `phase_index` is 0-based.
    pub async fn synthesize_upload(
        &self,
        text: &str,
        entry_id: &str,
        phase_index: usize,
        voice: &str,
        model: &str,
    ) -> Result<UploadedNarration> {
        validate_text(text)?;
        if entry_id.trim().is_empty() {
            return Err(Error::Validation("entryId is required when as='upload'".into()).into());
        }
        let store = self.store()?;

        let path = audio_path(entry_id.trim(), phase_index);
        let audio = self.speech.synthesize(text.trim(), voice, model).await?;
        store.upload(&path, audio, AUDIO_CONTENT_TYPE).await?;
        let signed_url = store.signed_url(&path, SIGNED_URL_TTL_SECS).await?;

        Ok(UploadedNarration { signed_url, path })
    }
}

fn validate_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::Validation("text is required".into()).into());
    }
    if text.chars().count() > MAX_NARRATION_CHARS {
        return Err(Error::Validation(format!(
            "text too long ({MAX_NARRATION_CHARS} chars max)"
        ))
        .into());
    }
    Ok(())
}

fn validate_batch(entry_id: &str, texts: &[String]) -> Result<()> {
    if entry_id.trim().is_empty() {
        return Err(Error::Validation("entryId is required".into()).into());
    }
    if texts.len() != PHASE_COUNT {
        return Err(Error::Validation(format!(
            "phases must be an array of {PHASE_COUNT} items"
        ))
        .into());
    }
    if texts.iter().any(|t| t.trim().is_empty()) {
        return Err(Error::Validation("Each phase must have non-empty text".into()).into());
    }
    if texts.iter().any(|t| t.chars().count() > MAX_NARRATION_CHARS) {
        return Err(Error::Validation(format!(
            "Phase text too long ({MAX_NARRATION_CHARS} chars max)"
        ))
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApiError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeSpeech {
        fail_on_phase: Option<usize>, // 1-based
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SpeechModel for FakeSpeech {
        async fn synthesize(
            &self,
            text: &str,
            _voice: &str,
            _model: &str,
        ) -> sentient_common::Result<Vec<u8>> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(text.to_string());
            if Some(calls.len()) == self.fail_on_phase {
                return Err(Error::UpstreamUnavailable("speech backend down".into()));
            }
            Ok(b"ID3fake-mpeg-bytes".to_vec())
        }
    }

    #[derive(Default)]
    struct FakeStore {
        uploads: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn upload(
            &self,
            path: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> sentient_common::Result<()> {
            self.uploads.lock().unwrap().push(path.to_string());
            Ok(())
        }

        async fn signed_url(&self, path: &str, ttl: u64) -> sentient_common::Result<String> {
            Ok(format!("https://signed.example/{path}?exp={ttl}"))
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Phase text {i}")).collect()
    }

    fn synthesizer(fail_on_phase: Option<usize>) -> (NarrationSynthesizer, Arc<FakeStore>) {
        let store = Arc::new(FakeStore::default());
        let speech = Arc::new(FakeSpeech {
            fail_on_phase,
            calls: Mutex::new(Vec::new()),
        });
        (
            NarrationSynthesizer::new(speech, Some(store.clone())),
            store,
        )
    }

    #[tokio::test]
    async fn missing_storage_is_fatal_before_any_synthesis() {
        let speech = Arc::new(FakeSpeech {
            fail_on_phase: None,
            calls: Mutex::new(Vec::new()),
        });
        let synth = NarrationSynthesizer::new(speech.clone(), None);

        let err = synth
            .synthesize_all("entry-1", &texts(6), "alloy", "m")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Pipeline(Error::UpstreamUnavailable(_))
        ));
        assert!(speech.calls.lock().unwrap().is_empty());

        // Stream mode still works without storage
        assert!(synth
            .synthesize_stream("Breathe.", "alloy", "m")
            .await
            .is_ok());
    }

    #[test]
    fn paths_are_one_based_and_deterministic() {
        assert_eq!(audio_path("e1", 0), "tts/e1/phase-1.mp3");
        assert_eq!(audio_path("e1", 5), "tts/e1/phase-6.mp3");
    }

    #[tokio::test]
    async fn batch_returns_six_urls_in_phase_order() {
        let (synth, store) = synthesizer(None);

        let urls = synth
            .synthesize_all("entry-1", &texts(6), "alloy", "tts-1")
            .await
            .unwrap();

        assert_eq!(urls.len(), 6);
        for (i, url) in urls.iter().enumerate() {
            assert!(url.contains(&format!("phase-{}.mp3", i + 1)));
        }
        assert_eq!(store.uploads.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn rerun_overwrites_same_paths() {
        let (synth, store) = synthesizer(None);

        synth
            .synthesize_all("entry-1", &texts(6), "alloy", "tts-1")
            .await
            .unwrap();
        synth
            .synthesize_all("entry-1", &texts(6), "alloy", "tts-1")
            .await
            .unwrap();

        let uploads = store.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 12);
        // Same six paths both times, no duplication scheme
        assert_eq!(uploads[0], uploads[6]);
        assert_eq!(uploads[5], uploads[11]);
    }

    #[tokio::test]
    async fn failure_mid_batch_identifies_phase_and_returns_nothing() {
        let (synth, store) = synthesizer(Some(4));

        let err = synth
            .synthesize_all("entry-1", &texts(6), "alloy", "tts-1")
            .await
            .unwrap_err();

        match err {
            ApiError::Pipeline(Error::Persistence { phase, message }) => {
                assert_eq!(phase, Some(4));
                assert!(message.contains("phase 4"));
            }
            other => panic!("expected phase-4 persistence failure, got {other:?}"),
        }
        // Phases 4..6 never uploaded
        assert_eq!(store.uploads.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn batch_validation_rejects_bad_input_preflight() {
        let (synth, store) = synthesizer(None);

        assert!(synth
            .synthesize_all("", &texts(6), "alloy", "m")
            .await
            .is_err());
        assert!(synth
            .synthesize_all("e", &texts(5), "alloy", "m")
            .await
            .is_err());

        let mut with_empty = texts(6);
        with_empty[2] = "   ".into();
        assert!(synth
            .synthesize_all("e", &with_empty, "alloy", "m")
            .await
            .is_err());

        let mut too_long = texts(6);
        too_long[0] = "x".repeat(MAX_NARRATION_CHARS + 1);
        assert!(synth
            .synthesize_all("e", &too_long, "alloy", "m")
            .await
            .is_err());

        // No uploads attempted for any rejected batch
        assert!(store.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn length_cap_counts_characters_not_bytes() {
        let (synth, _) = synthesizer(None);

        // Two-byte characters: past the cap in bytes, inside it in chars
        let accented = "é".repeat(MAX_NARRATION_CHARS - 500);
        assert!(synth
            .synthesize_stream(&accented, "alloy", "m")
            .await
            .is_ok());

        let over = "é".repeat(MAX_NARRATION_CHARS + 1);
        assert!(synth.synthesize_stream(&over, "alloy", "m").await.is_err());

        let mut batch = texts(6);
        batch[1] = "é".repeat(MAX_NARRATION_CHARS - 500);
        assert!(synth
            .synthesize_all("entry-1", &batch, "alloy", "m")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn stream_mode_returns_bytes() {
        let (synth, _) = synthesizer(None);
        let bytes = synth
            .synthesize_stream("Breathe in.", "alloy", "tts-1")
            .await
            .unwrap();
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn upload_mode_requires_entry_id() {
        let (synth, _) = synthesizer(None);
        assert!(synth
            .synthesize_upload("Breathe.", "  ", 0, "alloy", "m")
            .await
            .is_err());

        let uploaded = synth
            .synthesize_upload("Breathe.", "entry-9", 2, "alloy", "m")
            .await
            .unwrap();
        assert_eq!(uploaded.path, "tts/entry-9/phase-3.mp3");
        assert!(uploaded.signed_url.contains("phase-3.mp3"));
    }
}
