/*!
 * Collaborator interfaces and their shipped implementations.
 *
 * The pipeline only talks to these traits:
 * - `Transcriber`: audio file to text (OpenAI-compatible whisper API)
 * - `Translator`: one text segment to the target language (Google Translate)
 * - `SpeechSynthesizer`: text chunk to MP3 bytes (Google Translate TTS)
 * - `AudioConcatenator`: ordered audio files to one file (ffmpeg)
 *
 * Implementations must be safe for concurrent shared use: the service builds
 * one set at startup and every run borrows it through an `Arc`.
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::app_config::Config;
use crate::errors::ProviderError;

pub mod ffmpeg;
pub mod google_translate;
pub mod google_tts;
pub mod whisper_api;

pub use ffmpeg::FfmpegConcatenator;
pub use google_translate::GoogleTranslator;
pub use google_tts::GoogleTts;
pub use whisper_api::WhisperApiTranscriber;

/// Speech-to-text capability
#[async_trait]
pub trait Transcriber: Send + Sync + Debug {
    /// Transcribe the audio file at `audio_path` to text
    async fn transcribe(&self, audio_path: &Path) -> Result<String, ProviderError>;
}

/// Machine translation of a single segment
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate `text` into `target_language`, detecting the source language
    async fn translate_segment(&self, text: &str, target_language: &str) -> Result<String, ProviderError>;
}

/// Text-to-speech capability
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + Debug {
    /// Synthesize `text` spoken in `language`, returning encoded audio bytes
    async fn synthesize(&self, text: &str, language: &str) -> Result<Bytes, ProviderError>;
}

/// Joins audio files into one continuous stream without re-encoding
#[async_trait]
pub trait AudioConcatenator: Send + Sync + Debug {
    /// Concatenate the manifest's entries, in order, into `output`
    async fn concat(&self, manifest: &ConcatManifest, output: &Path) -> Result<(), ProviderError>;
}

/// Ordered list of audio files to concatenate, persisted in ffmpeg's concat
/// demuxer format
#[derive(Debug, Clone)]
pub struct ConcatManifest {
    /// Location of the manifest file
    pub path: PathBuf,
    /// Audio files in playback order
    pub entries: Vec<PathBuf>,
}

impl ConcatManifest {
    pub fn new(path: PathBuf, entries: Vec<PathBuf>) -> Self {
        Self { path, entries }
    }

    /// Render the manifest body: one `file '<path>'` line per entry.
    /// Single quotes inside a path are closed, escaped and reopened.
    pub fn render(&self) -> String {
        let mut body = String::new();
        for entry in &self.entries {
            let escaped = entry.to_string_lossy().replace('\'', r"'\''");
            body.push_str(&format!("file '{}'\n", escaped));
        }
        body
    }

    /// Write the manifest to `self.path`
    pub async fn write(&self) -> std::io::Result<()> {
        tokio::fs::write(&self.path, self.render()).await
    }
}

/// The full set of collaborators a pipeline runs against
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub transcriber: Arc<dyn Transcriber>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub concatenator: Arc<dyn AudioConcatenator>,
}

impl Collaborators {
    /// Build the shipped HTTP/ffmpeg implementations from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            transcriber: Arc::new(WhisperApiTranscriber::new(&config.transcription)?),
            translator: Arc::new(GoogleTranslator::new(&config.translation)?),
            synthesizer: Arc::new(GoogleTts::new(&config.synthesis)?),
            concatenator: Arc::new(FfmpegConcatenator::new(&config.concat)),
        })
    }
}

/// Read an error body from a failed response for inclusion in an error
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string())
}
