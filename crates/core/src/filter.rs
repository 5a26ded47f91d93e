//! Image extension filtering
//!
//! The same filter gates both live monitor events and the startup backlog
//! scan, so a file is either eligible everywhere or nowhere.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Extensions accepted when no explicit list is configured
pub const DEFAULT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Case-insensitive allow-list of image file extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ImageFilter {
    extensions: BTreeSet<String>,
}

impl ImageFilter {
    /// Build a filter from extension names (with or without a leading dot)
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    /// Check whether a path names an eligible image file
    ///
    /// Only the name is inspected; whether the path is a regular file is the
    /// caller's concern.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        // MacOS resource forks carry the image extension but no image
        if name.starts_with("._") {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_ascii_lowercase()))
            .unwrap_or(false)
    }

    /// Allowed extensions in sorted order
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

impl From<Vec<String>> for ImageFilter {
    fn from(extensions: Vec<String>) -> Self {
        Self::new(extensions)
    }
}

impl From<ImageFilter> for Vec<String> {
    fn from(filter: ImageFilter) -> Self {
        filter.extensions.into_iter().collect()
    }
}
