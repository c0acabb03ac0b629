//! Tracks local files created during a run and removes them at the end,
//! whatever the outcome.

use crate::{
    errors::{CleanupError, CleanupFailure},
    models::artifact::LocalArtifact,
};
use std::io::ErrorKind;
use tokio::fs;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct TempResourceManager {
    artifacts: Vec<LocalArtifact>,
}

impl TempResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a freshly created local file.
    ///
    /// Tracking the same path twice is a no-op. A second artifact of an
    /// already-tracked kind is kept next to the first, so both get released.
    pub fn track(&mut self, artifact: LocalArtifact) {
        if self.artifacts.iter().any(|a| a.path() == artifact.path()) {
            return;
        }
        if self.artifacts.iter().any(|a| a.kind() == artifact.kind()) {
            warn!(
                path = %artifact.path().display(),
                kind = ?artifact.kind(),
                "a second artifact of the same kind is being tracked"
            );
        }
        self.artifacts.push(artifact);
    }

    pub fn tracked(&self) -> &[LocalArtifact] {
        &self.artifacts
    }

    /// Delete every tracked file. The manager is empty afterwards, even when
    /// some deletions failed.
    pub async fn release(&mut self) -> Result<(), CleanupError> {
        let artifacts = std::mem::take(&mut self.artifacts);
        release_all(&artifacts).await
    }
}

/// Remove each file independently; one failure does not stop the others.
/// Files that are already gone count as removed.
pub async fn release_all(artifacts: &[LocalArtifact]) -> Result<(), CleanupError> {
    let mut failures = Vec::new();
    for artifact in artifacts {
        let path = artifact.path();
        match fs::remove_file(path).await {
            Ok(_) => debug!("deleted {}", path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("{} already removed", path.display());
            }
            Err(err) => {
                warn!("failed to delete {}: {}", path.display(), err);
                failures.push(CleanupFailure {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(CleanupError { failures })
    }
}
