//! Asset API port
//!
//! The upload pipeline depends only on this trait. The HTTP client
//! implements it for the real service; tests substitute in-memory fakes.
//!
//! Contract assumed of implementations:
//! - `list_folders` returns every folder, nested ones included
//! - `create_folder` may race with other creators; it is not atomic
//! - `add_item` is at-least-once: repeating it may duplicate an entry in the
//!   library but never corrupts or loses data

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{FolderNode, NewFolder, NewItem};

#[async_trait]
pub trait AssetApi: Send + Sync {
    /// List all folders, flattened
    async fn list_folders(&self) -> Result<Vec<FolderNode>, ApiError>;

    /// Create a folder, honoring the request's duplicate policy
    async fn create_folder(&self, request: &NewFolder) -> Result<FolderNode, ApiError>;

    /// Register a local file as a new item in a folder
    async fn add_item(&self, item: &NewItem) -> Result<(), ApiError>;
}
