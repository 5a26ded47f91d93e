//! Folder and item model exchanged with the asset library

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

/// Remote folder identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(String);

impl FolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FolderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A folder as reported by the listing call
///
/// Folders are told apart by name plus marker tags. `parent` is recorded
/// when the listing nests the folder, but it is not trusted for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    pub id: FolderId,
    pub name: String,
    pub parent: Option<FolderId>,
    pub marker_tags: Vec<String>,
}

impl FolderNode {
    /// Name equals `name` and the marker tags include `marker`
    pub fn matches(&self, name: &str, marker: &str) -> bool {
        self.name == name && self.marker_tags.iter().any(|t| t == marker)
    }
}

/// What to do when creating a folder whose name is already taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Create unconditionally
    Allow,
    /// Re-list first and refuse if a folder with the same name carries this
    /// marker tag
    RejectIfTagged(String),
}

/// Folder creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFolder {
    pub name: String,
    pub parent: Option<FolderId>,
    pub duplicates: DuplicatePolicy,
}

impl NewFolder {
    /// Top-level folder, duplicates allowed
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            duplicates: DuplicatePolicy::Allow,
        }
    }

    /// Subfolder of `parent` that refuses to duplicate a `marker`-tagged sibling
    pub fn child_unique(name: impl Into<String>, parent: FolderId, marker: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent),
            duplicates: DuplicatePolicy::RejectIfTagged(marker.into()),
        }
    }
}

/// Item registration request: the service imports the file from `path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub path: PathBuf,
    pub display_name: String,
    pub annotation: Option<String>,
    pub tags: Vec<String>,
    pub folder_id: FolderId,
}
