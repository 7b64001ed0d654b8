use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Default target language code (ISO), overridable per run
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Pipeline settings shared by the CLI and the service
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Speech-to-text backend
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Machine translation backend
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Text-to-speech backend
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Audio concatenation tool
    #[serde(default)]
    pub concat: ConcatConfig,

    /// HTTP service settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Settings for the orchestrated pipeline itself
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Directory holding run-scoped temporary files
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Maximum characters per synthesis chunk
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Delay in milliseconds before every segment translation attempt
    #[serde(default = "default_segment_delay_ms")]
    pub segment_delay_ms: u64,
}

impl PipelineConfig {
    pub fn segment_delay(&self) -> Duration {
        Duration::from_millis(self.segment_delay_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            max_chunk_chars: default_max_chunk_chars(),
            segment_delay_ms: default_segment_delay_ms(),
        }
    }
}

/// OpenAI-compatible transcription service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranscriptionConfig {
    /// Base URL exposing `/audio/transcriptions`
    #[serde(default = "default_transcription_endpoint")]
    pub endpoint: String,

    /// API key (sent as a bearer token when non-empty)
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Model name (e.g., "whisper-1", or "base" on a local server)
    #[serde(default = "default_transcription_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_transcription_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_transcription_endpoint(),
            api_key: String::new(),
            model: default_transcription_model(),
            timeout_secs: default_transcription_timeout_secs(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Service endpoint URL
    #[serde(default = "default_translation_endpoint")]
    pub endpoint: String,

    /// Source language code, "auto" for detection
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_translation_endpoint(),
            source_language: default_source_language(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Speech synthesis service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SynthesisConfig {
    /// Service endpoint URL
    #[serde(default = "default_synthesis_endpoint")]
    pub endpoint: String,

    /// Maximum characters the service accepts in a single request
    #[serde(default = "default_max_request_chars")]
    pub max_request_chars: usize,

    /// Use the slower speaking rate
    #[serde(default)]
    pub slow: bool,

    /// Request timeout in seconds
    #[serde(default = "default_synthesis_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            endpoint: default_synthesis_endpoint(),
            max_request_chars: default_max_request_chars(),
            slow: false,
            timeout_secs: default_synthesis_timeout_secs(),
        }
    }
}

/// ffmpeg concatenation configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConcatConfig {
    /// Path or name of the ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Timeout for a single concatenation in seconds
    #[serde(default = "default_concat_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ConcatConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            timeout_secs: default_concat_timeout_secs(),
        }
    }
}

/// HTTP service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum number of pipeline runs executing at once
    #[serde(default = "default_max_concurrent_runs")]
    pub max_concurrent_runs: usize,

    /// Maximum accepted request body size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_concurrent_runs: default_max_concurrent_runs(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_target_language() -> String {
    "es".to_string()
}

fn default_source_language() -> String {
    "auto".to_string()
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("linguawave")
}

fn default_max_chunk_chars() -> usize {
    5000
}

fn default_segment_delay_ms() -> u64 {
    500 // 500ms pause before each segment to stay under the translation rate limit
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_transcription_timeout_secs() -> u64 {
    300
}

fn default_synthesis_timeout_secs() -> u64 {
    60
}

fn default_concat_timeout_secs() -> u64 {
    120
}

fn default_transcription_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_translation_endpoint() -> String {
    "https://translate.googleapis.com".to_string()
}

fn default_synthesis_endpoint() -> String {
    "https://translate.google.com".to_string()
}

fn default_max_request_chars() -> usize {
    100
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_concurrent_runs() -> usize {
    4
}

fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::normalize_target_language(&self.target_language)?;

        if self.translation.source_language != "auto" {
            crate::language_utils::normalize_target_language(&self.translation.source_language)
                .context("Invalid translation source language")?;
        }

        if self.pipeline.max_chunk_chars == 0 {
            return Err(anyhow!("pipeline.max_chunk_chars must be greater than zero"));
        }
        if self.synthesis.max_request_chars == 0 {
            return Err(anyhow!("synthesis.max_request_chars must be greater than zero"));
        }
        if self.server.max_concurrent_runs == 0 {
            return Err(anyhow!("server.max_concurrent_runs must be greater than zero"));
        }

        let transcription_url = parse_endpoint("transcription.endpoint", &self.transcription.endpoint)?;
        parse_endpoint("translation.endpoint", &self.translation.endpoint)?;
        parse_endpoint("synthesis.endpoint", &self.synthesis.endpoint)?;

        // The hosted API refuses unauthenticated requests; local whisper servers don't need a key
        if transcription_url.host_str() == Some("api.openai.com") && self.transcription.api_key.is_empty() {
            return Err(anyhow!(
                "transcription.api_key is required for the OpenAI transcription endpoint"
            ));
        }

        Ok(())
    }
}

fn parse_endpoint(key: &str, endpoint: &str) -> Result<Url> {
    Url::parse(endpoint).with_context(|| format!("Invalid URL for {}: {}", key, endpoint))
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: default_target_language(),
            pipeline: PipelineConfig::default(),
            transcription: TranscriptionConfig::default(),
            translation: TranslationConfig::default(),
            synthesis: SynthesisConfig::default(),
            concat: ConcatConfig::default(),
            server: ServerConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
