use async_trait::async_trait;
use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;
use crate::providers::{Translator, error_body};

/// Client for the public Google Translate endpoint (`translate_a/single`)
#[derive(Debug)]
pub struct GoogleTranslator {
    /// HTTP client for API requests
    client: Client,
    /// Base URL of the service
    endpoint: String,
    /// Source language code, "auto" for detection
    source_language: String,
}

impl GoogleTranslator {
    /// Create a new translation client
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build translation HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            source_language: config.source_language.clone(),
        })
    }

    /// Extract the translated text from a `translate_a/single` response.
    ///
    /// The body is a nested array whose first element lists sentence pairs
    /// `[translated, original, ...]`; the translation is their concatenation.
    pub fn extract_text_from_response(body: &Value) -> Result<String, ProviderError> {
        let sentences = body
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::ParseError("missing sentence list".to_string()))?;

        let text: String = sentences
            .iter()
            .filter_map(|sentence| sentence.get(0).and_then(Value::as_str))
            .collect();

        if text.trim().is_empty() {
            return Err(ProviderError::ParseError("empty translation".to_string()));
        }

        Ok(text)
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate_segment(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        let api_url = format!("{}/translate_a/single", self.endpoint);

        let response = self
            .client
            .get(&api_url)
            .query(&[
                ("client", "gtx"),
                ("sl", self.source_language.as_str()),
                ("tl", target_language),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = error_body(response).await;
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let translated = Self::extract_text_from_response(&body)?;
        debug!("Translated {} chars into {} chars", text.chars().count(), translated.chars().count());
        Ok(translated)
    }
}
