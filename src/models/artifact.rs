//! Files materialized on local disk during a single run.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// The downloaded original.
    Source,
    /// The derived thumbnail.
    Thumbnail,
}

/// A local file owned by the run that created it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalArtifact {
    path: PathBuf,
    kind: ArtifactKind,
}

impl LocalArtifact {
    pub fn new(path: impl Into<PathBuf>, kind: ArtifactKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Final path component; used as the remote object name on upload.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}
