/*!
 * # LinguaWave - speech translation pipeline
 *
 * Transcribes audio, translates the transcript and speaks the translation
 * back, from the command line or over HTTP.
 *
 * ## Features
 *
 * - Speech-to-text through any OpenAI-compatible transcription endpoint
 * - Sentence-by-sentence machine translation with per-sentence fallback
 * - Chunked text-to-speech reassembled into one MP3 with ffmpeg
 * - Run-scoped temporary files, removed on every exit path
 * - HTTP API with a bounded pool of concurrent runs
 *
 * ## Architecture
 *
 * - `app_config`: Configuration management
 * - `errors`: Error types for collaborators and pipeline stages
 * - `language_utils`: ISO language code utilities
 * - `file_utils`: File system operations and temp file naming
 * - `providers`: Collaborator traits and their implementations:
 *   - `providers::whisper_api`: transcription
 *   - `providers::google_translate`: translation
 *   - `providers::google_tts`: speech synthesis
 *   - `providers::ffmpeg`: audio concatenation
 * - `pipeline`: Splitting, the translation and synthesis stages, the orchestrator
 * - `app_controller`: Command-line run driver
 * - `server`: HTTP API
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod pipeline;
pub mod providers;
pub mod server;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{CleanupError, PipelineError, ProviderError, SplitError, SynthesisError};
pub use language_utils::{get_language_name, normalize_target_language};
pub use pipeline::{Pipeline, PipelineResult, PipelineStage};
