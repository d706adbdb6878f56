//! Persistence layer for git-stamp
//!
//! Owns the two files the stamper keeps in lockstep:
//! - the cache record (`.last_git_hash`) holding the last written revision
//! - the generated C header (`include/git_version.h`) exposing it to firmware

pub mod repository;
pub mod schema;

pub use repository::{CacheRecord, HeaderArtifact};

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Default cache record location, relative to the build working directory
pub const DEFAULT_CACHE_PATH: &str = ".last_git_hash";

/// Default header location, relative to the build working directory
pub const DEFAULT_HEADER_PATH: &str = "include/git_version.h";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

pub type StoreResult<T> = Result<T, StoreError>;
