//! Category and date-bucket folder resolution
//!
//! Uploads land in `<category>/<YYYY-MM-DD>`. The category folder is resolved
//! once at startup. Date buckets are resolved lazily on first use and cached
//! for the life of the process; the cache is never invalidated.
//!
//! Concurrent first use of a date inside one process is single-flighted: the
//! first caller performs the list/create round trip, the rest wait for its
//! result. Across processes the list-then-create sequence is not atomic, so
//! two instances can still race to create the same bucket.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::api::AssetApi;
use crate::error::ApiError;
use crate::types::{FolderId, NewFolder};

/// The resolved top-level folder for this integration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFolder {
    pub id: FolderId,
    pub name: String,
}

impl CategoryFolder {
    /// Tag that marks date buckets as belonging to this category
    pub fn marker(&self) -> &str {
        &self.name
    }
}

/// Find the folder named `name`, creating it if absent
///
/// Matching is exact and case-sensitive. Errors here are fatal to the caller:
/// without a category there is nowhere to upload.
pub async fn resolve_category<A>(api: &A, name: &str) -> Result<CategoryFolder, ApiError>
where
    A: AssetApi + ?Sized,
{
    let folders = api.list_folders().await?;
    if let Some(existing) = folders.into_iter().find(|f| f.name == name) {
        info!(category = name, id = %existing.id, "Using existing category folder");
        return Ok(CategoryFolder {
            id: existing.id,
            name: name.to_string(),
        });
    }

    let created = api.create_folder(&NewFolder::root(name)).await?;
    info!(category = name, id = %created.id, "Created category folder");
    Ok(CategoryFolder {
        id: created.id,
        name: name.to_string(),
    })
}

/// Per-run date bucket cache on top of an [`AssetApi`]
pub struct FolderResolver<A: ?Sized> {
    api: Arc<A>,
    category: CategoryFolder,
    buckets: DashMap<String, Arc<OnceCell<FolderId>>>,
}

impl<A> FolderResolver<A>
where
    A: AssetApi + ?Sized,
{
    pub fn new(api: Arc<A>, category: CategoryFolder) -> Self {
        Self {
            api,
            category,
            buckets: DashMap::new(),
        }
    }

    pub fn category(&self) -> &CategoryFolder {
        &self.category
    }

    /// Number of dates resolved so far
    pub fn cached(&self) -> usize {
        self.buckets.iter().filter(|e| e.value().initialized()).count()
    }

    /// Folder id for the bucket named `date`
    ///
    /// A cache hit makes no remote calls. A miss lists folders once and, if
    /// no folder matches by name and category marker, creates one under the
    /// category. A failed resolution is not cached; the next caller retries.
    pub async fn resolve_date(&self, date: &str) -> Result<FolderId, ApiError> {
        let cell = {
            let entry = self.buckets.entry(date.to_string()).or_default();
            Arc::clone(entry.value())
        };

        if let Some(id) = cell.get() {
            return Ok(id.clone());
        }

        let id = cell.get_or_try_init(|| self.lookup_or_create(date)).await?;
        Ok(id.clone())
    }

    async fn lookup_or_create(&self, date: &str) -> Result<FolderId, ApiError> {
        let marker = self.category.marker();
        let folders = self.api.list_folders().await?;
        if let Some(found) = folders.into_iter().find(|f| f.matches(date, marker)) {
            debug!(date, id = %found.id, "Found date folder");
            return Ok(found.id);
        }

        let request = NewFolder::child_unique(date, self.category.id.clone(), marker);
        match self.api.create_folder(&request).await {
            Ok(created) => {
                info!(date, id = %created.id, "Created date folder");
                Ok(created.id)
            }
            // Another writer got there between our listing and the create
            Err(ApiError::DuplicateFolder { existing, .. }) => {
                debug!(date, id = %existing, "Date folder appeared concurrently");
                Ok(existing)
            }
            Err(e) => Err(e),
        }
    }
}
