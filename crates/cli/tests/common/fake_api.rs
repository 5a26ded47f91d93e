//! In-memory Eagle with call recording

use async_trait::async_trait;
use ew_eagle::{ApiError, AssetApi, DuplicatePolicy, FolderId, FolderNode, NewFolder, NewItem};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    CreateFolder {
        name: String,
        parent: Option<FolderId>,
    },
    AddItem {
        name: String,
        folder: FolderId,
    },
}

#[derive(Default)]
pub struct FakeApi {
    folders: Mutex<Vec<FolderNode>>,
    calls: Mutex<Vec<Call>>,
    items: Mutex<Vec<NewItem>>,
    fail_uploads: AtomicBool,
    next_id: AtomicUsize,
}

#[allow(dead_code)]
impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_folders(folders: Vec<FolderNode>) -> Arc<Self> {
        let api = Self::default();
        *api.folders.lock().unwrap() = folders;
        Arc::new(api)
    }

    /// Make every upload answer HTTP 500
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn lists(&self) -> usize {
        self.count(|c| matches!(c, Call::List))
    }

    pub fn creates(&self) -> usize {
        self.count(|c| matches!(c, Call::CreateFolder { .. }))
    }

    pub fn uploads(&self) -> usize {
        self.count(|c| matches!(c, Call::AddItem { .. }))
    }

    /// Items that were accepted
    pub fn items(&self) -> Vec<NewItem> {
        self.items.lock().unwrap().clone()
    }

    pub fn folders(&self) -> Vec<FolderNode> {
        self.folders.lock().unwrap().clone()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AssetApi for FakeApi {
    async fn list_folders(&self) -> Result<Vec<FolderNode>, ApiError> {
        self.record(Call::List);
        Ok(self.folders())
    }

    async fn create_folder(&self, request: &NewFolder) -> Result<FolderNode, ApiError> {
        self.record(Call::CreateFolder {
            name: request.name.clone(),
            parent: request.parent.clone(),
        });

        let mut folders = self.folders.lock().unwrap();
        let mut marker_tags = Vec::new();
        if let DuplicatePolicy::RejectIfTagged(marker) = &request.duplicates {
            if let Some(found) = folders.iter().find(|f| f.matches(&request.name, marker)) {
                return Err(ApiError::DuplicateFolder {
                    name: request.name.clone(),
                    existing: found.id.clone(),
                });
            }
            marker_tags.push(marker.clone());
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let node = FolderNode {
            id: FolderId::new(format!("F{id}")),
            name: request.name.clone(),
            parent: request.parent.clone(),
            marker_tags,
        };
        folders.push(node.clone());
        Ok(node)
    }

    async fn add_item(&self, item: &NewItem) -> Result<(), ApiError> {
        self.record(Call::AddItem {
            name: item.display_name.clone(),
            folder: item.folder_id.clone(),
        });

        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                endpoint: "/api/item/addFromPath",
                status: 500,
                body: "library is locked".to_string(),
            });
        }
        self.items.lock().unwrap().push(item.clone());
        Ok(())
    }
}
