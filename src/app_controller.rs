use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::pipeline::{AudioInput, OutputTarget, Pipeline, PipelineEvent, PipelineResult, PipelineStage};
use crate::providers::Collaborators;

// @module: Application controller for command-line runs

/// Drives a single pipeline run from the command line
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Shared collaborators, built once
    collaborators: Collaborators,
}

impl Controller {
    // @method: Create a new controller over the shipped collaborators
    pub fn with_config(config: Config) -> Result<Self> {
        let collaborators = Collaborators::from_config(&config).context("Failed to set up collaborators")?;
        Ok(Self::with_collaborators(config, collaborators))
    }

    /// Create a controller over caller-supplied collaborators
    pub fn with_collaborators(config: Config, collaborators: Collaborators) -> Self {
        Self { config, collaborators }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate `input_file` into spoken `target_language` audio at `output_file`.
    ///
    /// Relative paths resolve against the current working directory.
    pub async fn run(
        &self,
        input_file: PathBuf,
        output_file: PathBuf,
        target_language: &str,
        show_progress: bool,
    ) -> Result<PipelineResult> {
        let start_time = Instant::now();

        let input_file = FileManager::resolve_against_cwd(&input_file)?;
        let output_file = FileManager::resolve_against_cwd(&output_file)?;

        let language_name = language_utils::get_language_name(target_language)
            .unwrap_or_else(|_| target_language.to_string());
        info!("LinguaWave: {} -> {} ({})", input_file.display(), language_name, target_language);

        let progress_bar = if show_progress {
            Self::spinner()
        } else {
            ProgressBar::hidden()
        };

        let pipeline = Pipeline::new(self.collaborators.clone(), &self.config.pipeline)
            .with_observer(Self::progress_observer(progress_bar.clone()));

        let outcome = pipeline
            .run(AudioInput::File(input_file), target_language, OutputTarget::File(output_file.clone()))
            .await;
        progress_bar.finish_and_clear();

        let result = outcome?;

        if !result.degraded_ordinals.is_empty() {
            warn!(
                "{} segment(s) could not be translated and kept their original text: {:?}",
                result.degraded_ordinals.len(),
                result.degraded_ordinals
            );
        }

        info!(
            "Transcript: {} chars, translation: {} chars",
            result.original_text.chars().count(),
            result.translated_text.chars().count()
        );
        info!("Success: {}", output_file.display());
        info!("Total time: {}", Self::format_duration(start_time.elapsed()));

        Ok(result)
    }

    fn spinner() -> ProgressBar {
        let progress_bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        progress_bar.set_style(style);
        progress_bar.enable_steady_tick(Duration::from_millis(120));
        progress_bar.set_message("Starting");
        progress_bar
    }

    fn progress_observer(progress_bar: ProgressBar) -> Arc<dyn Fn(&PipelineEvent) + Send + Sync> {
        let translated = AtomicUsize::new(0);
        Arc::new(move |event: &PipelineEvent| match event {
            PipelineEvent::StageChanged { to, .. } => {
                let message = match to {
                    PipelineStage::Transcribing => "Transcribing audio".to_string(),
                    PipelineStage::Translating => "Translating".to_string(),
                    PipelineStage::Synthesizing => "Synthesizing speech".to_string(),
                    other => other.to_string(),
                };
                progress_bar.set_message(message);
            }
            PipelineEvent::SegmentTranslated { total, .. } => {
                let done = translated.fetch_add(1, Ordering::Relaxed) + 1;
                progress_bar.set_message(format!("Translating segment {}/{}", done, total));
            }
            PipelineEvent::ChunkSynthesized { ordinal, total, .. } => {
                progress_bar.set_message(format!("Synthesized chunk {}/{}", ordinal + 1, total));
            }
        })
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
