use log::{debug, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::CleanupError;

/// Scope guard for run-scoped temporary files.
///
/// Paths are tracked before the file is created; dropping the janitor
/// removes whatever exists. A path that was never created, or is already
/// gone, counts as cleaned up.
#[derive(Debug, Default)]
pub struct ResourceJanitor {
    tracked: Vec<PathBuf>,
}

impl ResourceJanitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` for deletion
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.tracked.push(path.into());
    }

    /// Stop tracking `path`, e.g. after it was moved into its final place
    pub fn forget(&mut self, path: &Path) {
        self.tracked.retain(|tracked| tracked != path);
    }

    /// Number of paths still tracked
    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Delete every tracked path. Safe to call more than once.
    ///
    /// Failures are logged and returned; they never panic.
    pub async fn release(&mut self) -> Vec<CleanupError> {
        let mut failures = Vec::new();

        for path in self.tracked.drain(..) {
            let removed = tokio::fs::remove_file(&path).await;
            if let Some(failure) = Self::record(path, removed) {
                failures.push(failure);
            }
        }

        failures
    }

    fn record(path: PathBuf, removed: std::io::Result<()>) -> Option<CleanupError> {
        match removed {
            Ok(()) => {
                debug!("Removed temporary file {:?}", path);
                None
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(source) => {
                warn!("Failed to remove temporary file {:?}: {}", path, source);
                Some(CleanupError { path, source })
            }
        }
    }
}

// Reached on panics and cancelled runs, where awaiting is not possible
impl Drop for ResourceJanitor {
    fn drop(&mut self) {
        for path in self.tracked.drain(..) {
            let removed = std::fs::remove_file(&path);
            let _ = Self::record(path, removed);
        }
    }
}
