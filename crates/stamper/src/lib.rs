//! Git Stamper — embed the current short commit hash in a firmware header
//!
//! Provides:
//! - revision sources (git CLI, fixed override) with an `"unknown"` fallback
//! - the stamp decision: regenerate only when the cached revision changed
//! - a dry-run check reporting whether the header is stale

pub mod revision;
pub mod stamp;

// Re-exports for convenience
pub use revision::{
    resolve_revision, validate_revision, FixedRevision, GitCli, RevisionError, RevisionSource,
    FIRMWARE_HASH_LEN, SENTINEL,
};
pub use stamp::{check, decide, stamp, StampDecision, StampOutcome};
