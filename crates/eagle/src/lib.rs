//! Eagle asset library integration
//!
//! Provides the remote side of the upload pipeline:
//! - [`AssetApi`] - the three operations the pipeline needs
//! - [`EagleClient`] - HTTP implementation against Eagle's local API
//! - [`FolderResolver`] - category + date-bucket resolution with a per-run cache

pub mod api;
pub mod client;
pub mod error;
pub mod folders;
pub mod types;

pub use api::AssetApi;
pub use client::{EagleClient, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use folders::{resolve_category, CategoryFolder, FolderResolver};
pub use types::{DuplicatePolicy, FolderId, FolderNode, NewFolder, NewItem};
