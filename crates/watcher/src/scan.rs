//! Backlog scan
//!
//! Enumerates image files already present under the watched roots so that
//! work which arrived while the process was down is picked up at startup.

use ew_core::ImageFilter;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Collect every pre-existing file under `roots` accepted by `filter`
///
/// Unreadable directory entries are logged and skipped; the scan never
/// fails as a whole.
pub fn collect_backlog(roots: &[PathBuf], filter: &ImageFilter) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for root in roots {
        let before = found.len();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(root = %root.display(), error = %e, "Skipping unreadable entry during backlog scan");
                    continue;
                }
            };

            // Only regular files
            if !entry.file_type().is_file() {
                continue;
            }

            if filter.matches(entry.path()) {
                found.push(entry.into_path());
            }
        }
        debug!(root = %root.display(), files = found.len() - before, "Scanned root");
    }

    info!(files = found.len(), roots = roots.len(), "Backlog scan complete");
    found
}
