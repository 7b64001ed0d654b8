/*!
 * Chunked speech synthesis and reassembly.
 *
 * The translated text is cut into size-capped chunks, each chunk is spoken
 * into its own run-scoped temporary file, and the files are joined in
 * ordinal order into the requested output. A single chunk is moved into
 * place as-is. Chunk files and the concat manifest never outlive the call.
 */

use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::SynthesisError;
use crate::file_utils::FileManager;
use crate::pipeline::janitor::ResourceJanitor;
use crate::pipeline::splitter::split_for_synthesis;
use crate::providers::{AudioConcatenator, ConcatManifest, SpeechSynthesizer};

/// Drives text chunks through a [`SpeechSynthesizer`] and an [`AudioConcatenator`]
#[derive(Debug, Clone)]
pub struct SynthesisStage {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    concatenator: Arc<dyn AudioConcatenator>,
    /// Directory for chunk files and the manifest
    work_dir: PathBuf,
    /// Maximum characters per chunk
    max_chunk_chars: usize,
}

impl SynthesisStage {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        concatenator: Arc<dyn AudioConcatenator>,
        work_dir: PathBuf,
        max_chunk_chars: usize,
    ) -> Self {
        Self {
            synthesizer,
            concatenator,
            work_dir,
            max_chunk_chars,
        }
    }

    pub async fn synthesize(
        &self,
        text: &str,
        output_path: &Path,
        language: &str,
        run_id: Uuid,
    ) -> Result<PathBuf, SynthesisError> {
        self.synthesize_with_progress(text, output_path, language, run_id, |_, _| {})
            .await
    }

    /// Synthesize `text` into `output_path`, calling `on_chunk(ordinal, total)`
    /// after each chunk is written
    pub async fn synthesize_with_progress<F>(
        &self,
        text: &str,
        output_path: &Path,
        language: &str,
        run_id: Uuid,
        on_chunk: F,
    ) -> Result<PathBuf, SynthesisError>
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let chunks: Vec<&str> = split_for_synthesis(text, self.max_chunk_chars)?
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .collect();

        if chunks.is_empty() {
            return Err(SynthesisError::NothingToSynthesize);
        }

        // ffmpeg resolves relative manifest entries against the manifest's own directory
        let work_dir = std::path::absolute(&self.work_dir)
            .map_err(|e| SynthesisError::io("Failed to resolve work directory", e))?;
        tokio::fs::create_dir_all(&work_dir)
            .await
            .map_err(|e| SynthesisError::io(format!("Failed to create work directory {:?}", work_dir), e))?;

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SynthesisError::io(format!("Failed to create output directory {:?}", parent), e))?;
        }

        let mut janitor = ResourceJanitor::new();
        let result = self
            .write_and_join(&mut janitor, chunks, &work_dir, output_path, language, run_id, on_chunk)
            .await;
        janitor.release().await;

        result.map(|()| output_path.to_path_buf())
    }

    #[allow(clippy::too_many_arguments)]
    async fn write_and_join<F>(
        &self,
        janitor: &mut ResourceJanitor,
        chunks: Vec<&str>,
        work_dir: &Path,
        output_path: &Path,
        language: &str,
        run_id: Uuid,
        on_chunk: F,
    ) -> Result<(), SynthesisError>
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let total = chunks.len();
        debug!("Synthesizing {} chunk(s) for run {}", total, run_id);

        let mut chunk_paths = Vec::with_capacity(total);

        for (ordinal, chunk) in chunks.into_iter().enumerate() {
            let audio = self
                .synthesizer
                .synthesize(chunk, language)
                .await
                .map_err(|source| SynthesisError::Chunk { ordinal, source })?;

            let chunk_path = FileManager::run_scoped_path(work_dir, run_id, &format!("chunk_{:04}.mp3", ordinal));
            janitor.track(chunk_path.clone());
            tokio::fs::write(&chunk_path, &audio)
                .await
                .map_err(|e| SynthesisError::io(format!("Failed to write chunk {}", ordinal), e))?;

            debug!("Chunk {}/{}: {} chars, {} bytes", ordinal + 1, total, chunk.chars().count(), audio.len());
            chunk_paths.push(chunk_path);
            on_chunk(ordinal, total);
        }

        if let [single] = chunk_paths.as_slice() {
            return FileManager::move_file(single, output_path)
                .await
                .map_err(|e| SynthesisError::io(format!("Failed to move audio to {:?}", output_path), e));
        }

        let manifest_path = FileManager::run_scoped_path(work_dir, run_id, "concat.txt");
        janitor.track(manifest_path.clone());

        let manifest = ConcatManifest::new(manifest_path, chunk_paths);
        manifest
            .write()
            .await
            .map_err(|e| SynthesisError::io("Failed to write concat manifest", e))?;

        if let Err(e) = self.concatenator.concat(&manifest, output_path).await {
            // A failed concat may leave a truncated file at the destination
            if let Err(remove_error) = FileManager::remove_if_exists(output_path).await {
                warn!("Failed to remove partial output {:?}: {}", output_path, remove_error);
            }
            return Err(SynthesisError::Concat(e));
        }

        Ok(())
    }
}
