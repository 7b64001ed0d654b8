use async_trait::async_trait;
use anyhow::{Context, Result};
use bytes::{Bytes, BytesMut};
use log::debug;
use reqwest::Client;
use std::time::Duration;

use crate::app_config::SynthesisConfig;
use crate::errors::ProviderError;
use crate::providers::{SpeechSynthesizer, error_body};

/// Client for the Google Translate text-to-speech endpoint
///
/// The endpoint only accepts short inputs, so each chunk is sent as a series
/// of word-aligned requests and the returned MP3 frames are appended in order.
#[derive(Debug)]
pub struct GoogleTts {
    /// HTTP client for API requests
    client: Client,
    /// Base URL of the service
    endpoint: String,
    /// Maximum characters per request
    max_request_chars: usize,
    /// Slow speaking rate
    slow: bool,
}

impl GoogleTts {
    /// Create a new speech client
    pub fn new(config: &SynthesisConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build speech synthesis HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            max_request_chars: config.max_request_chars.max(1),
            slow: config.slow,
        })
    }

    /// Pack `text` into pieces of at most `max_chars` characters, breaking on
    /// whitespace. Words longer than `max_chars` are cut at character
    /// boundaries. Whitespace-only input yields no pieces.
    pub fn split_into_requests(text: &str, max_chars: usize) -> Vec<String> {
        let max_chars = max_chars.max(1);
        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for word in text.split_whitespace() {
            let word_len = word.chars().count();

            if word_len > max_chars {
                if !current.is_empty() {
                    pieces.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let chars: Vec<char> = word.chars().collect();
                for part in chars.chunks(max_chars) {
                    pieces.push(part.iter().collect());
                }
                continue;
            }

            let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
            if needed > max_chars {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }

            if !current.is_empty() {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }

        if !current.is_empty() {
            pieces.push(current);
        }

        pieces
    }

    async fn fetch_piece(&self, piece: &str, index: usize, total: usize, language: &str) -> Result<Bytes, ProviderError> {
        let api_url = format!("{}/translate_tts", self.endpoint);
        let speed = if self.slow { "0.3" } else { "1" };
        let total_str = total.to_string();
        let index_str = index.to_string();
        let len_str = piece.chars().count().to_string();

        let response = self
            .client
            .get(&api_url)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language),
                ("q", piece),
                ("ttsspeed", speed),
                ("total", total_str.as_str()),
                ("idx", index_str.as_str()),
                ("textlen", len_str.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = error_body(response).await;
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(ProviderError::ParseError("empty audio response".to_string()));
        }
        Ok(audio)
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Bytes, ProviderError> {
        let pieces = Self::split_into_requests(text, self.max_request_chars);
        if pieces.is_empty() {
            return Err(ProviderError::RequestFailed("no text to speak".to_string()));
        }

        let mut audio = BytesMut::new();
        for (index, piece) in pieces.iter().enumerate() {
            let frames = self.fetch_piece(piece, index, pieces.len(), language).await?;
            audio.extend_from_slice(&frames);
        }

        debug!("Synthesized {} request(s) into {} bytes", pieces.len(), audio.len());
        Ok(audio.freeze())
    }
}
