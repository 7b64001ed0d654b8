/*!
 * Error types for the linguawave pipeline.
 *
 * This module contains custom error types for the collaborators and the
 * pipeline stages, using the thiserror crate for ergonomic error definitions.
 * Application-level code (CLI, configuration) wraps these in `anyhow`.
 */

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::PipelineStage;

/// Errors that can occur when calling an external collaborator
/// (transcription, translation, synthesis or concatenation backend)
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// An external tool (ffmpeg) could not be run or exited unsuccessfully
    #[error("{tool} failed: {message}")]
    ToolFailed {
        /// Name of the tool
        tool: String,
        /// Filtered diagnostic output
        message: String,
    },

    /// The collaborator could not read its input
    #[error("Failed to read input {path:?}: {source}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProviderError {
    /// Classify a non-success HTTP status returned by a collaborator API
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors produced by the segment splitter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    /// The chunk size must be at least one character
    #[error("Invalid chunk size {0}: must be greater than zero")]
    InvalidChunkSize(usize),
}

/// Errors that abort the synthesis stage
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// The translated text could not be split into chunks
    #[error(transparent)]
    Split(#[from] SplitError),

    /// The text contained no speakable characters
    #[error("Nothing to synthesize: text is empty")]
    NothingToSynthesize,

    /// Synthesis of one chunk failed
    #[error("Synthesis of chunk {ordinal} failed: {source}")]
    Chunk {
        ordinal: usize,
        #[source]
        source: ProviderError,
    },

    /// Concatenating the chunk files failed
    #[error("Audio concatenation failed: {0}")]
    Concat(#[source] ProviderError),

    /// A filesystem operation on a chunk, manifest or output file failed
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl SynthesisError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// A temporary file that could not be removed
#[derive(Error, Debug)]
#[error("Failed to remove temporary file {path:?}: {source}")]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Errors that abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Missing or invalid input, rejected before any stage runs
    #[error("Invalid input: {0}")]
    Input(String),

    /// The transcription collaborator failed
    #[error("Transcription failed: {0}")]
    Transcription(#[source] ProviderError),

    /// The synthesis stage failed
    #[error("Speech synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// The run-scoped input or output file could not be handled
    #[error("{context}: {source}")]
    Io {
        stage: PipelineStage,
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// The stage that was active when the run failed
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Input(_) => PipelineStage::Idle,
            Self::Transcription(_) => PipelineStage::Transcribing,
            Self::Synthesis(_) => PipelineStage::Synthesizing,
            Self::Io { stage, .. } => *stage,
        }
    }

    /// Whether the failure was caused by the caller's input
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}
