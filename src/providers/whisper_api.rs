use async_trait::async_trait;
use anyhow::{Context, Result};
use log::{debug, error};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::app_config::TranscriptionConfig;
use crate::errors::ProviderError;
use crate::providers::{Transcriber, error_body};

/// Client for OpenAI-compatible `/audio/transcriptions` endpoints
///
/// Works against the hosted OpenAI API as well as self-hosted whisper servers
/// that mirror its request format.
#[derive(Debug)]
pub struct WhisperApiTranscriber {
    /// HTTP client for API requests
    client: Client,
    /// Base URL, without the `/audio/transcriptions` suffix
    endpoint: String,
    /// API key, omitted from the request when empty
    api_key: String,
    /// Model name
    model: String,
}

/// Transcription response (`response_format=json`)
#[derive(Debug, Deserialize)]
pub struct TranscriptionResponse {
    /// Transcribed text
    pub text: String,
}

impl WhisperApiTranscriber {
    /// Create a new transcription client
    pub fn new(config: &TranscriptionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build transcription HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    fn api_url(&self) -> String {
        format!("{}/audio/transcriptions", self.endpoint)
    }
}

#[async_trait]
impl Transcriber for WhisperApiTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, ProviderError> {
        let audio = tokio::fs::read(audio_path)
            .await
            .map_err(|source| ProviderError::InputUnreadable {
                path: audio_path.to_path_buf(),
                source,
            })?;

        let file_name = audio_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());

        debug!("Uploading {} ({} bytes) for transcription", file_name, audio.len());

        let part = Part::bytes(audio)
            .file_name(file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "json");

        let mut request = self.client.post(self.api_url()).multipart(form);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = error_body(response).await;
            error!("Transcription API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let body = response
            .json::<TranscriptionResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(body.text.trim().to_string())
    }
}
