//! Generated header artifact

use crate::schema::render_header;
use crate::{StoreError, StoreResult};
use std::fs;
use std::path::{Path, PathBuf};

/// The generated `git_version.h`. Fully derived, never hand-edited.
#[derive(Debug, Clone)]
pub struct HeaderArtifact {
    path: PathBuf,
}

impl HeaderArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render and overwrite the header with `hash` embedded.
    /// Parent directories are not created.
    pub fn write(&self, hash: &str) -> StoreResult<()> {
        fs::write(&self.path, render_header(hash)).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
