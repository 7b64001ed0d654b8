use async_trait::async_trait;
use log::{debug, error};
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

use crate::app_config::ConcatConfig;
use crate::errors::ProviderError;
use crate::providers::{AudioConcatenator, ConcatManifest};

/// Concatenates audio files with ffmpeg's concat demuxer (`-c copy`, no re-encoding)
#[derive(Debug, Clone)]
pub struct FfmpegConcatenator {
    /// ffmpeg executable
    ffmpeg_path: String,
    /// Maximum time a single concatenation may take
    timeout: Duration,
}

impl FfmpegConcatenator {
    pub fn new(config: &ConcatConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Keep only the meaningful lines of ffmpeg's stderr
    fn filter_ffmpeg_stderr(stderr: &str) -> String {
        let lines: Vec<&str> = stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| {
                !line.starts_with("ffmpeg version")
                    && !line.starts_with("built with")
                    && !line.starts_with("configuration:")
                    && !line.starts_with("lib")
            })
            .collect();

        if lines.is_empty() {
            "no diagnostic output".to_string()
        } else {
            lines.join("; ")
        }
    }

    fn tool_failed(message: impl Into<String>) -> ProviderError {
        ProviderError::ToolFailed {
            tool: "ffmpeg".to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl AudioConcatenator for FfmpegConcatenator {
    async fn concat(&self, manifest: &ConcatManifest, output: &Path) -> Result<(), ProviderError> {
        debug!("Concatenating {} file(s) into {:?}", manifest.entries.len(), output);

        let ffmpeg_future = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .args(["-hide_banner", "-loglevel", "error"])
            .args(["-f", "concat", "-safe", "0"])
            .arg("-i")
            .arg(&manifest.path)
            .args(["-c", "copy"])
            .arg(output)
            .kill_on_drop(true)
            .output();

        let result = tokio::select! {
            result = ffmpeg_future => {
                result.map_err(|e| Self::tool_failed(format!("failed to execute {}: {}", self.ffmpeg_path, e)))?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(Self::tool_failed(format!("timed out after {}s", self.timeout.as_secs())));
            }
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let filtered = Self::filter_ffmpeg_stderr(&stderr);
            error!("Audio concatenation failed: {}", filtered);
            return Err(Self::tool_failed(filtered));
        }

        if !output.is_file() {
            return Err(Self::tool_failed(format!("no output written to {:?}", output)));
        }

        Ok(())
    }
}
