//! Watched-root validation
//!
//! Roots arrive from several sources as comma-separated lists. Before the
//! monitor starts they are merged, validated and normalized here.

use std::path::{Path, PathBuf};
use tracing::error;

/// Outcome of validating candidate roots
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RootSet {
    /// Canonical, existing, non-overlapping directories
    pub valid: Vec<PathBuf>,
    /// Candidates that were dropped, with the reason
    pub rejected: Vec<(PathBuf, String)>,
}

impl RootSet {
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }
}

/// Split a comma-separated root list, trimming entries and dropping empties
pub fn split_root_list(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Validate and normalize candidate roots
///
/// Each candidate must exist and be a directory. Survivors are canonicalized;
/// duplicates and roots nested inside another root are removed since the
/// monitor watches recursively.
pub fn resolve_roots<I>(candidates: I) -> RootSet
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut set = RootSet::default();
    let mut canonical = Vec::new();

    for candidate in candidates {
        match validate(&candidate) {
            Ok(path) => canonical.push(path),
            Err(reason) => {
                error!(root = %candidate.display(), %reason, "Watched folder rejected");
                set.rejected.push((candidate, reason));
            }
        }
    }

    // Shorter paths sort before their descendants
    canonical.sort();
    canonical.dedup();
    for path in canonical {
        if set.valid.iter().any(|kept| path.starts_with(kept)) {
            continue;
        }
        set.valid.push(path);
    }

    set
}

fn validate(candidate: &Path) -> Result<PathBuf, String> {
    let meta = std::fs::metadata(candidate).map_err(|e| format!("not accessible: {e}"))?;
    if !meta.is_dir() {
        return Err("not a directory".to_string());
    }
    std::fs::canonicalize(candidate).map_err(|e| format!("cannot normalize: {e}"))
}
