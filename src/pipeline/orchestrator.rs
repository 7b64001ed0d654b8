/*!
 * Pipeline orchestrator.
 *
 * A run transcribes its input once, translates the transcript segment by
 * segment, and optionally synthesizes the translation into one audio file.
 * Stages run strictly in sequence; the first fatal error ends the run.
 * Every temporary file the run creates (stored uploads, in-memory outputs,
 * chunk files) is owned by a janitor and removed before the run returns.
 */

use bytes::Bytes;
use log::{error, info};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use anyhow::Result;

use crate::app_config::{Config, PipelineConfig};
use crate::errors::PipelineError;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::pipeline::PipelineStage;
use crate::pipeline::janitor::ResourceJanitor;
use crate::pipeline::synthesis_stage::SynthesisStage;
use crate::pipeline::translation_stage::{TranslationReport, TranslationStage};
use crate::providers::{Collaborators, Transcriber};

/// Audio a run starts from
#[derive(Debug, Clone)]
pub enum AudioInput {
    /// An existing file on disk
    File(PathBuf),
    /// Uploaded bytes, stored in a run-scoped temporary file for the run's duration
    Upload { file_name: String, bytes: Bytes },
}

/// Where synthesized audio should end up
#[derive(Debug, Clone)]
pub enum OutputTarget {
    /// Write to this path
    File(PathBuf),
    /// Return the bytes; no file is left behind
    InMemory,
}

/// Synthesized audio, matching the requested [`OutputTarget`]
#[derive(Debug, Clone)]
pub enum AudioArtifact {
    File(PathBuf),
    Bytes(Bytes),
}

/// Result of a full transcribe → translate → synthesize run
#[derive(Debug)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub original_text: String,
    pub translated_text: String,
    /// Normalized target language code
    pub target_language: String,
    /// Ordinals of segments that kept their original text
    pub degraded_ordinals: Vec<usize>,
    pub audio: AudioArtifact,
}

/// Result of a text-only (transcribe → translate) run
#[derive(Debug)]
pub struct TranscriptTranslation {
    pub run_id: Uuid,
    pub original_text: String,
    /// Normalized target language code
    pub target_language: String,
    pub report: TranslationReport,
}

impl TranscriptTranslation {
    pub fn translated_text(&self) -> String {
        self.report.text()
    }
}

/// Progress notifications for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    StageChanged {
        run_id: Uuid,
        from: PipelineStage,
        to: PipelineStage,
    },
    SegmentTranslated {
        run_id: Uuid,
        ordinal: usize,
        total: usize,
        fallback: bool,
    },
    ChunkSynthesized {
        run_id: Uuid,
        ordinal: usize,
        total: usize,
    },
}

/// Callback receiving [`PipelineEvent`]s; must be callable from any task
pub type PipelineObserver = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

#[derive(Clone, Copy)]
struct EventSink<'a> {
    observer: Option<&'a PipelineObserver>,
}

impl EventSink<'_> {
    fn emit(&self, event: PipelineEvent) {
        if let Some(observer) = self.observer {
            observer(&event);
        }
    }
}

/// Stage bookkeeping for one run
struct RunState<'a> {
    run_id: Uuid,
    stage: PipelineStage,
    events: EventSink<'a>,
}

impl<'a> RunState<'a> {
    fn new(observer: Option<&'a PipelineObserver>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            stage: PipelineStage::Idle,
            events: EventSink { observer },
        }
    }

    fn advance(&mut self, next: PipelineStage) {
        debug_assert!(
            self.stage.can_transition_to(next),
            "illegal pipeline transition {} -> {}",
            self.stage,
            next
        );
        info!("Run {}: {} -> {}", self.run_id, self.stage, next);
        self.events.emit(PipelineEvent::StageChanged {
            run_id: self.run_id,
            from: self.stage,
            to: next,
        });
        self.stage = next;
    }

    fn fail(&mut self, error: PipelineError) -> PipelineError {
        error!("Run {} failed while {}: {}", self.run_id, self.stage, error);
        self.advance(PipelineStage::Failed);
        error
    }
}

/// Sequences transcription, translation and synthesis over shared collaborators.
///
/// A `Pipeline` holds no per-run state and can serve concurrent runs.
pub struct Pipeline {
    transcriber: Arc<dyn Transcriber>,
    translation: TranslationStage,
    synthesis: SynthesisStage,
    work_dir: PathBuf,
    observer: Option<PipelineObserver>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("transcriber", &self.transcriber)
            .field("translation", &self.translation)
            .field("synthesis", &self.synthesis)
            .field("work_dir", &self.work_dir)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl Pipeline {
    pub fn new(collaborators: Collaborators, config: &PipelineConfig) -> Self {
        Self {
            transcriber: collaborators.transcriber,
            translation: TranslationStage::new(collaborators.translator, config.segment_delay()),
            synthesis: SynthesisStage::new(
                collaborators.synthesizer,
                collaborators.concatenator,
                config.work_dir.clone(),
                config.max_chunk_chars,
            ),
            work_dir: config.work_dir.clone(),
            observer: None,
        }
    }

    /// Build a pipeline over the shipped collaborators
    pub fn from_config(config: &Config) -> Result<Self> {
        let collaborators = Collaborators::from_config(config)?;
        Ok(Self::new(collaborators, &config.pipeline))
    }

    /// Attach a progress observer
    pub fn with_observer(mut self, observer: PipelineObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Transcribe, translate and synthesize `input`
    pub async fn run(
        &self,
        input: AudioInput,
        target_language: &str,
        output: OutputTarget,
    ) -> Result<PipelineResult, PipelineError> {
        let mut run = RunState::new(self.observer.as_ref());
        let mut janitor = ResourceJanitor::new();

        let result = self
            .run_to_completion(&mut run, &mut janitor, input, target_language, output)
            .await;

        janitor.release().await;
        match result {
            Ok(result) => {
                run.advance(PipelineStage::Done);
                info!(
                    "Run {} finished ({} degraded segment(s))",
                    run.run_id,
                    result.degraded_ordinals.len()
                );
                Ok(result)
            }
            Err(e) => Err(run.fail(e)),
        }
    }

    /// Transcribe and translate `input` without synthesizing speech
    pub async fn transcribe_and_translate(
        &self,
        input: AudioInput,
        target_language: &str,
    ) -> Result<TranscriptTranslation, PipelineError> {
        let mut run = RunState::new(self.observer.as_ref());
        let mut janitor = ResourceJanitor::new();

        let result = self.transcribe_then_translate(&mut run, &mut janitor, input, target_language).await;

        janitor.release().await;
        match result {
            Ok((original_text, report, target_language)) => {
                run.advance(PipelineStage::Done);
                Ok(TranscriptTranslation {
                    run_id: run.run_id,
                    original_text,
                    target_language,
                    report,
                })
            }
            Err(e) => Err(run.fail(e)),
        }
    }

    async fn run_to_completion(
        &self,
        run: &mut RunState<'_>,
        janitor: &mut ResourceJanitor,
        input: AudioInput,
        target_language: &str,
        output: OutputTarget,
    ) -> Result<PipelineResult, PipelineError> {
        let (original_text, report, target_language) =
            self.transcribe_then_translate(run, janitor, input, target_language).await?;
        let translated_text = report.text();

        run.advance(PipelineStage::Synthesizing);

        let output_path = match &output {
            OutputTarget::File(path) => path.clone(),
            OutputTarget::InMemory => {
                let path = FileManager::run_scoped_path(&self.work_dir, run.run_id, "output.mp3");
                janitor.track(path.clone());
                path
            }
        };

        let run_id = run.run_id;
        let events = run.events;
        let written = self
            .synthesis
            .synthesize_with_progress(&translated_text, &output_path, &target_language, run_id, |ordinal, total| {
                events.emit(PipelineEvent::ChunkSynthesized { run_id, ordinal, total })
            })
            .await?;

        let audio = match output {
            OutputTarget::File(_) => AudioArtifact::File(written),
            OutputTarget::InMemory => {
                let bytes = tokio::fs::read(&written).await.map_err(|source| PipelineError::Io {
                    stage: PipelineStage::Synthesizing,
                    context: "Failed to read synthesized audio".to_string(),
                    source,
                })?;
                AudioArtifact::Bytes(Bytes::from(bytes))
            }
        };

        Ok(PipelineResult {
            run_id,
            original_text,
            translated_text,
            target_language,
            degraded_ordinals: report.degraded_ordinals(),
            audio,
        })
    }

    /// Shared front half of both run kinds; returns (transcript, report, normalized language)
    async fn transcribe_then_translate(
        &self,
        run: &mut RunState<'_>,
        janitor: &mut ResourceJanitor,
        input: AudioInput,
        target_language: &str,
    ) -> Result<(String, TranslationReport, String), PipelineError> {
        let target_language = language_utils::normalize_target_language(target_language)
            .map_err(|e| PipelineError::Input(e.to_string()))?;

        let audio_path = self.prepare_input(run.run_id, janitor, input).await?;

        run.advance(PipelineStage::Transcribing);
        let transcript = self
            .transcriber
            .transcribe(&audio_path)
            .await
            .map_err(PipelineError::Transcription)?;
        info!("Transcribed {} character(s)", transcript.chars().count());

        run.advance(PipelineStage::Translating);
        let run_id = run.run_id;
        let events = run.events;
        let report = self
            .translation
            .translate_with_progress(&transcript, &target_language, |outcome, total| {
                events.emit(PipelineEvent::SegmentTranslated {
                    run_id,
                    ordinal: outcome.ordinal(),
                    total,
                    fallback: outcome.is_fallback(),
                })
            })
            .await;

        Ok((transcript, report, target_language))
    }

    /// Resolve the audio file the transcriber reads, storing uploads first
    async fn prepare_input(
        &self,
        run_id: Uuid,
        janitor: &mut ResourceJanitor,
        input: AudioInput,
    ) -> Result<PathBuf, PipelineError> {
        match input {
            AudioInput::File(path) => {
                if !FileManager::file_exists(&path) {
                    return Err(PipelineError::Input(format!("Input file not found: {}", path.display())));
                }
                Ok(path)
            }
            AudioInput::Upload { file_name, bytes } => {
                if bytes.is_empty() {
                    return Err(PipelineError::Input(format!("Uploaded file {} is empty", file_name)));
                }

                let name = match FileManager::extension_of(&file_name) {
                    Some(ext) if ext.chars().all(|c| c.is_ascii_alphanumeric()) => format!("input.{}", ext),
                    _ => "input".to_string(),
                };
                let path = FileManager::run_scoped_path(&self.work_dir, run_id, &name);
                let store_error = |source| PipelineError::Io {
                    stage: PipelineStage::Idle,
                    context: format!("Failed to store upload {}", file_name),
                    source,
                };

                tokio::fs::create_dir_all(&self.work_dir).await.map_err(store_error)?;
                janitor.track(path.clone());
                tokio::fs::write(&path, &bytes).await.map_err(store_error)?;
                Ok(path)
            }
        }
    }
}
