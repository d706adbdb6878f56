//! Stamp — keep the generated header in sync with the current revision
//!
//! Compares the freshly resolved revision with the cache record and only
//! touches the filesystem when they differ (or no cache exists yet).

use crate::revision::{resolve_revision, RevisionSource};
use persistence::{CacheRecord, HeaderArtifact, StoreResult};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StampDecision {
    /// Cache already holds the current revision
    Unchanged,
    /// Header and cache must be rewritten
    Regenerate { previous: Option<String> },
}

/// Plain string comparison of the cached revision against the current one.
/// An absent cache always regenerates.
pub fn decide(cached: Option<String>, current: &str) -> StampDecision {
    match cached {
        Some(previous) if previous == current => StampDecision::Unchanged,
        previous => StampDecision::Regenerate { previous },
    }
}

/// Result of a stamp or check run
#[derive(Debug, Clone, Serialize)]
pub struct StampOutcome {
    pub revision: String,
    pub previous: Option<String>,
    /// Cache record differs from `revision` (before any write of this run).
    /// The header file itself is not inspected.
    pub stale: bool,
    pub written: bool,
    pub cache_path: PathBuf,
    pub header_path: PathBuf,
}

fn plan<S: RevisionSource + ?Sized>(
    source: &S,
    cache: &CacheRecord,
) -> StoreResult<(String, StampDecision)> {
    let current = resolve_revision(source);
    let decision = decide(cache.load()?, &current);
    Ok((current, decision))
}

/// Synchronize the header with the current revision.
///
/// Revision failures are absorbed (sentinel); filesystem failures propagate.
/// The header is written before the cache record, so a failed header write
/// leaves the old cache in place and the next run regenerates.
pub fn stamp<S: RevisionSource + ?Sized>(
    source: &S,
    cache: &CacheRecord,
    header: &HeaderArtifact,
) -> StoreResult<StampOutcome> {
    let (revision, decision) = plan(source, cache)?;

    let previous = match decision {
        StampDecision::Unchanged => {
            info!(hash = %revision, "Git hash unchanged; skipping header update");
            return Ok(outcome(revision.clone(), Some(revision), false, false, cache, header));
        }
        StampDecision::Regenerate { previous } => previous,
    };

    header.write(&revision)?;
    cache.store(&revision)?;
    info!(
        "Updated {} with git hash: {}",
        header.path().display(),
        revision
    );

    Ok(outcome(revision, previous, true, true, cache, header))
}

/// Same decision as [`stamp`], without writing anything.
pub fn check<S: RevisionSource + ?Sized>(
    source: &S,
    cache: &CacheRecord,
    header: &HeaderArtifact,
) -> StoreResult<StampOutcome> {
    let (revision, decision) = plan(source, cache)?;
    Ok(match decision {
        StampDecision::Unchanged => {
            outcome(revision.clone(), Some(revision), false, false, cache, header)
        }
        StampDecision::Regenerate { previous } => {
            outcome(revision, previous, true, false, cache, header)
        }
    })
}

fn outcome(
    revision: String,
    previous: Option<String>,
    stale: bool,
    written: bool,
    cache: &CacheRecord,
    header: &HeaderArtifact,
) -> StampOutcome {
    StampOutcome {
        revision,
        previous,
        stale,
        written,
        cache_path: cache.path().to_path_buf(),
        header_path: header.path().to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::{RevisionError, SENTINEL};
    use persistence::schema::render_header;
    use persistence::StoreError;
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    /// Fake source: `None` simulates a failing git query
    struct FakeSource(Option<&'static str>);

    impl RevisionSource for FakeSource {
        fn short_hash(&self) -> Result<String, RevisionError> {
            self.0.map(str::to_string).ok_or(RevisionError::Empty)
        }
    }

    fn workspace() -> (TempDir, CacheRecord, HeaderArtifact) {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("include")).unwrap();
        let cache = CacheRecord::new(dir.path().join(".last_git_hash"));
        let header = HeaderArtifact::new(dir.path().join("include/git_version.h"));
        (dir, cache, header)
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_decide_absent_cache_regenerates() {
        assert_eq!(
            decide(None, "abc1234"),
            StampDecision::Regenerate { previous: None }
        );
    }

    #[test]
    fn test_decide_equal_is_unchanged() {
        assert_eq!(
            decide(Some("abc1234".into()), "abc1234"),
            StampDecision::Unchanged
        );
    }

    #[test]
    fn test_decide_different_regenerates() {
        assert_eq!(
            decide(Some("abc1234".into()), "def5678"),
            StampDecision::Regenerate {
                previous: Some("abc1234".into())
            }
        );
    }

    #[test]
    fn test_first_run_creates_both_files() {
        let (_dir, cache, header) = workspace();

        let outcome = stamp(&FakeSource(Some("abc1234")), &cache, &header).unwrap();

        assert!(outcome.written);
        assert_eq!(outcome.previous, None);
        assert_eq!(read(cache.path()), "abc1234");
        assert_eq!(read(header.path()), render_header("abc1234"));
        assert!(read(header.path()).contains("#define GIT_HASH \"abc1234\""));
    }

    #[test]
    fn test_unchanged_hash_touches_nothing() {
        let (_dir, cache, header) = workspace();
        fs::write(cache.path(), "abc1234").unwrap();
        fs::write(header.path(), "// hand-placed marker\n").unwrap();
        let cache_mtime = fs::metadata(cache.path()).unwrap().modified().unwrap();
        let header_mtime = fs::metadata(header.path()).unwrap().modified().unwrap();

        let outcome = stamp(&FakeSource(Some("abc1234")), &cache, &header).unwrap();

        assert!(!outcome.written);
        assert!(!outcome.stale);
        assert_eq!(read(cache.path()), "abc1234");
        assert_eq!(read(header.path()), "// hand-placed marker\n");
        assert_eq!(
            fs::metadata(cache.path()).unwrap().modified().unwrap(),
            cache_mtime
        );
        assert_eq!(
            fs::metadata(header.path()).unwrap().modified().unwrap(),
            header_mtime
        );
    }

    #[test]
    fn test_cache_with_trailing_newline_still_matches() {
        let (_dir, cache, header) = workspace();
        fs::write(cache.path(), "abc1234\n").unwrap();

        let outcome = stamp(&FakeSource(Some("abc1234")), &cache, &header).unwrap();
        assert!(!outcome.written);
        assert!(!header.path().exists());
    }

    #[test]
    fn test_changed_hash_rewrites_both() {
        let (_dir, cache, header) = workspace();
        stamp(&FakeSource(Some("abc1234")), &cache, &header).unwrap();

        let outcome = stamp(&FakeSource(Some("def5678")), &cache, &header).unwrap();

        assert!(outcome.written);
        assert_eq!(outcome.previous.as_deref(), Some("abc1234"));
        assert_eq!(read(cache.path()), "def5678");
        assert!(read(header.path()).contains("#define GIT_HASH \"def5678\""));
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let (_dir, cache, header) = workspace();
        let source = FakeSource(Some("abc1234"));

        assert!(stamp(&source, &cache, &header).unwrap().written);
        let header_after_first = read(header.path());
        let cache_after_first = read(cache.path());

        assert!(!stamp(&source, &cache, &header).unwrap().written);
        assert_eq!(read(header.path()), header_after_first);
        assert_eq!(read(cache.path()), cache_after_first);
    }

    #[test]
    fn test_query_failure_writes_sentinel() {
        let (_dir, cache, header) = workspace();
        fs::write(cache.path(), "abc1234").unwrap();

        let outcome = stamp(&FakeSource(None), &cache, &header).unwrap();

        assert!(outcome.written);
        assert_eq!(outcome.revision, SENTINEL);
        assert_eq!(read(cache.path()), SENTINEL);
        assert!(read(header.path()).contains("#define GIT_HASH \"unknown\""));
    }

    #[test]
    fn test_two_failures_in_a_row_skip_second_write() {
        let (_dir, cache, header) = workspace();

        assert!(stamp(&FakeSource(None), &cache, &header).unwrap().written);
        assert!(!stamp(&FakeSource(None), &cache, &header).unwrap().written);
    }

    #[test]
    fn test_missing_include_dir_propagates_and_keeps_cache() {
        let dir = tempdir().unwrap();
        let cache = CacheRecord::new(dir.path().join(".last_git_hash"));
        let header = HeaderArtifact::new(dir.path().join("include/git_version.h"));

        let err = stamp(&FakeSource(Some("abc1234")), &cache, &header).unwrap_err();

        assert!(matches!(err, StoreError::Write { .. }));
        assert!(!cache.path().exists());
    }

    #[test]
    fn test_check_reports_stale_without_writing() {
        let (_dir, cache, header) = workspace();
        fs::write(cache.path(), "abc1234").unwrap();

        let outcome = check(&FakeSource(Some("def5678")), &cache, &header).unwrap();

        assert!(outcome.stale);
        assert!(!outcome.written);
        assert_eq!(outcome.previous.as_deref(), Some("abc1234"));
        assert_eq!(read(cache.path()), "abc1234");
        assert!(!header.path().exists());
    }

    #[test]
    fn test_check_staleness_follows_cache_not_header() {
        let (_dir, cache, header) = workspace();
        stamp(&FakeSource(Some("abc1234")), &cache, &header).unwrap();
        fs::remove_file(header.path()).unwrap();

        let outcome = check(&FakeSource(Some("abc1234")), &cache, &header).unwrap();
        assert!(!outcome.stale);
        assert!(!header.path().exists());
    }

    #[test]
    fn test_check_up_to_date() {
        let (_dir, cache, header) = workspace();
        stamp(&FakeSource(Some("abc1234")), &cache, &header).unwrap();

        let outcome = check(&FakeSource(Some("abc1234")), &cache, &header).unwrap();
        assert!(!outcome.stale);
    }
}
