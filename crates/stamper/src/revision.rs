//! Revision sources — where the current short hash comes from
//!
//! The git CLI is the normal source; a fixed revision can stand in for build
//! environments without a checkout. Failures never escape [`resolve_revision`]:
//! they degrade to [`SENTINEL`] so a missing git context cannot abort a build.

use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use thiserror::Error;
use tracing::{debug, warn};

/// Revision used when the source cannot produce one
pub const SENTINEL: &str = "unknown";

/// Number of hash characters the firmware copies into its version response
pub const FIRMWARE_HASH_LEN: usize = 7;

#[derive(Error, Debug)]
pub enum RevisionError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("git output is not valid UTF-8")]
    NonUtf8,

    #[error("revision is empty")]
    Empty,

    #[error("revision {0:?} contains characters not allowed in a C string literal")]
    Invalid(String),

    #[error("revision {revision:?} is shorter than the {min} characters the firmware reads")]
    TooShort { revision: String, min: usize },
}

/// Anything that can report the short identifier of the current commit
pub trait RevisionSource {
    fn short_hash(&self) -> Result<String, RevisionError>;
}

/// `git rev-parse --short HEAD`, optionally run inside `repo_dir`.
/// With a ceiling set, repository discovery stops below that directory.
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    repo_dir: Option<PathBuf>,
    ceiling: Option<PathBuf>,
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: Some(repo_dir.into()),
            ceiling: None,
        }
    }

    /// Passed to git as `GIT_CEILING_DIRECTORIES`
    pub fn with_ceiling(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ceiling = Some(dir.into());
        self
    }
}

impl RevisionSource for GitCli {
    fn short_hash(&self) -> Result<String, RevisionError> {
        let mut cmd = Command::new("git");
        cmd.args(["rev-parse", "--short", "HEAD"]);
        if let Some(dir) = &self.repo_dir {
            cmd.current_dir(dir);
        }
        if let Some(ceiling) = &self.ceiling {
            cmd.env("GIT_CEILING_DIRECTORIES", ceiling);
        }

        let output = cmd.output()?;
        if !output.status.success() {
            return Err(RevisionError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| RevisionError::NonUtf8)?;
        validate_revision(stdout.trim())
    }
}

/// A revision supplied up front (e.g. by CI), validated on construction.
/// Must be at least [`FIRMWARE_HASH_LEN`] characters long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRevision(String);

impl FixedRevision {
    pub fn new(revision: &str) -> Result<Self, RevisionError> {
        let revision = validate_revision(revision.trim())?;
        if revision.len() < FIRMWARE_HASH_LEN {
            return Err(RevisionError::TooShort {
                revision,
                min: FIRMWARE_HASH_LEN,
            });
        }
        Ok(Self(revision))
    }
}

impl RevisionSource for FixedRevision {
    fn short_hash(&self) -> Result<String, RevisionError> {
        Ok(self.0.clone())
    }
}

/// Accept only revisions that embed safely between the header's quotes.
pub fn validate_revision(revision: &str) -> Result<String, RevisionError> {
    if revision.is_empty() {
        return Err(RevisionError::Empty);
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if !revision.chars().all(allowed) {
        return Err(RevisionError::Invalid(revision.to_string()));
    }
    Ok(revision.to_string())
}

/// Query `source`, substituting [`SENTINEL`] on any failure.
pub fn resolve_revision<S: RevisionSource + ?Sized>(source: &S) -> String {
    let revision = match source.short_hash() {
        Ok(hash) => hash,
        Err(e) => {
            warn!(error = %e, "Error fetching git hash, using \"{}\"", SENTINEL);
            return SENTINEL.to_string();
        }
    };

    if revision.len() != FIRMWARE_HASH_LEN {
        warn!(
            hash = %revision,
            expected = FIRMWARE_HASH_LEN,
            "Revision length differs from what the firmware reports"
        );
    }
    debug!(hash = %revision, "Resolved current revision");
    revision
}
