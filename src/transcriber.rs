//! Remote speech-to-text client.

use crate::config::TranscriptionConfig;
use crate::error::{ChunkscribeError, Result};
use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Capability interface for transcribing one audio segment.
///
/// Single blocking remote call per invocation, no internal retry. Segment
/// files are read-only inputs; implementations never mutate or delete them.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one segment file to text.
    ///
    /// # Returns
    /// The transcribed text, or `TranscriptionFailed` carrying the remote
    /// status code and response body verbatim.
    async fn transcribe(&self, segment: &Path) -> Result<String>;
}

/// Transcriber backed by an OpenAI-compatible `audio/transcriptions` endpoint.
pub struct OpenAiTranscriber {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    language: String,
    api_key: String,
}

impl OpenAiTranscriber {
    /// Build a client for the configured endpoint.
    ///
    /// Long segments take a while to transcribe, hence the generous timeout.
    pub fn new(config: &TranscriptionConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(600))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            language: config.language.clone(),
            api_key,
        })
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, segment: &Path) -> Result<String> {
        let bytes = tokio::fs::read(segment).await?;
        let file_name = segment
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "segment".to_string());

        debug!(segment = %segment.display(), bytes = bytes.len(), "sending segment");

        let file_part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/mpeg")?;
        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("language", self.language.clone())
            .part("file", file_part);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChunkscribeError::TranscriptionFailed {
                status: status.as_u16(),
                body,
            });
        }

        let payload: TranscriptionResponse = response.json().await?;
        Ok(payload.text)
    }
}
