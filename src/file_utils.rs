use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

// @module: File and directory utilities

/// Extensions accepted for uploaded audio when the content type is not `audio/*`
pub const ALLOWED_AUDIO_EXTENSIONS: [&str; 7] = ["wav", "mp3", "aiff", "flac", "ogg", "m4a", "mp4"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    /// Resolve a possibly relative path against the current working directory
    pub fn resolve_against_cwd<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
        let path = path.as_ref();
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Ok(cwd.join(path))
    }

    /// Path of a run-scoped temporary file: `{dir}/linguawave_{run_id}_{name}`
    ///
    /// Concurrent runs share the work directory, so every temporary file name
    /// carries the run id.
    pub fn run_scoped_path(dir: &Path, run_id: Uuid, name: &str) -> PathBuf {
        dir.join(format!("linguawave_{}_{}", run_id.simple(), name))
    }

    /// Move a file, falling back to copy-and-delete when a rename is not possible
    /// (for example across filesystems). Bytes are not modified.
    pub async fn move_file(from: &Path, to: &Path) -> io::Result<()> {
        if let Some(parent) = to.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        match tokio::fs::rename(from, to).await {
            Ok(()) => Ok(()),
            Err(_) => {
                tokio::fs::copy(from, to).await?;
                tokio::fs::remove_file(from).await
            }
        }
    }

    /// Remove a file, treating an already missing file as removed
    pub async fn remove_if_exists(path: &Path) -> io::Result<()> {
        match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Lower-cased extension of a file name, without the dot
    pub fn extension_of(file_name: &str) -> Option<String> {
        Path::new(file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Check an upload against the audio allow-list.
    ///
    /// The upload is rejected only when both the declared content type and the
    /// file extension fail: a content type starting with `audio/` or an
    /// allowed extension is enough.
    pub fn is_allowed_audio(content_type: Option<&str>, file_name: &str) -> bool {
        let content_type_ok = content_type
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("audio/"))
            .unwrap_or(false);

        let extension_ok = Self::extension_of(file_name)
            .map(|ext| ALLOWED_AUDIO_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);

        content_type_ok || extension_ok
    }

    /// Attachment name for synthesized audio: `translated_<original>.mp3`
    pub fn translated_audio_file_name(original_file_name: &str) -> String {
        let safe: String = original_file_name
            .chars()
            .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
            .collect();
        format!("translated_{}.mp3", safe)
    }
}
