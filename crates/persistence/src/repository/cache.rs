//! Cache record — the last revision written into the header

use crate::{StoreError, StoreResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Side file holding the last revision the header was generated for
#[derive(Debug, Clone)]
pub struct CacheRecord {
    path: PathBuf,
}

impl CacheRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached revision, trimmed.
    ///
    /// Returns `None` when the file does not exist. Any other read failure,
    /// including non-UTF-8 content, is an error.
    pub fn load(&self) -> StoreResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let hash = content.trim().to_string();
                debug!(path = %self.path.display(), hash = %hash, "Loaded cached revision");
                Ok(Some(hash))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No cached revision");
                Ok(None)
            }
            Err(source) => Err(StoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Overwrite the record with `hash` (no trailing newline).
    /// Parent directories are not created.
    pub fn store(&self, hash: &str) -> StoreResult<()> {
        fs::write(&self.path, hash).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
