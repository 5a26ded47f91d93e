//! Eagle local API client
//!
//! Eagle serves a JSON API on loopback. Every response is wrapped in an
//! envelope:
//!
//! ```text
//! {"status": "success", "data": ...}
//! {"status": "error", "message": "..."}
//! ```
//!
//! The envelope is decoded into explicit variants here so nothing above this
//! module ever inspects raw JSON.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::AssetApi;
use crate::error::ApiError;
use crate::types::{DuplicatePolicy, FolderId, FolderNode, NewFolder, NewItem};

/// Eagle's fixed loopback address
pub const DEFAULT_BASE_URL: &str = "http://localhost:41595";

/// Default TCP connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Default whole-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const FOLDER_LIST: &str = "/api/folder/list";
const FOLDER_CREATE: &str = "/api/folder/create";
const ITEM_ADD_FROM_PATH: &str = "/api/item/addFromPath";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Envelope<T> {
    Success {
        data: Option<T>,
    },
    Error {
        #[serde(default)]
        message: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFolder {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    children: Vec<WireFolder>,
    #[serde(default)]
    extend_tags: Vec<String>,
    #[serde(default)]
    parent: Option<String>,
}

impl WireFolder {
    fn into_node(self, nested_under: Option<&FolderId>) -> (FolderNode, Vec<WireFolder>) {
        let parent = self
            .parent
            .filter(|p| !p.is_empty())
            .map(FolderId::new)
            .or_else(|| nested_under.cloned());
        let node = FolderNode {
            id: FolderId::new(self.id),
            name: self.name,
            parent,
            marker_tags: self.extend_tags,
        };
        (node, self.children)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateFolderBody<'a> {
    folder_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddFromPathBody<'a> {
    path: String,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotation: Option<&'a str>,
    tags: &'a [String],
    folder_id: &'a str,
}

/// Depth-first flattening of the nested listing
fn flatten(roots: Vec<WireFolder>) -> Vec<FolderNode> {
    let mut out = Vec::new();
    let mut stack: Vec<(WireFolder, Option<FolderId>)> =
        roots.into_iter().rev().map(|f| (f, None)).collect();

    while let Some((wire, nested_under)) = stack.pop() {
        let (node, children) = wire.into_node(nested_under.as_ref());
        let id = node.id.clone();
        out.push(node);
        stack.extend(children.into_iter().rev().map(|c| (c, Some(id.clone()))));
    }
    out
}

// ============================================================================
// EagleClient
// ============================================================================

/// HTTP client for Eagle's local API
#[derive(Debug, Clone)]
pub struct EagleClient {
    client: Client,
    base_url: String,
}

impl EagleClient {
    /// Client for `base_url` with default timeouts
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeouts(base_url, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Client for `base_url` with explicit connect and request timeouts
    ///
    /// A timeout surfaces as [`ApiError::Transport`] for the affected call.
    pub fn with_timeouts(
        base_url: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|source| ApiError::Transport {
                endpoint: "client",
                source,
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        endpoint: &'static str,
        body: &B,
    ) -> Result<Response, ApiError> {
        self.client
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint, source })
    }

    async fn create_folder_unchecked(&self, request: &NewFolder) -> Result<FolderNode, ApiError> {
        let body = CreateFolderBody {
            folder_name: &request.name,
            parent: request.parent.as_ref().map(FolderId::as_str),
        };
        let response = self.post_json(FOLDER_CREATE, &body).await?;
        let created: WireFolder = decode(FOLDER_CREATE, response)
            .await?
            .ok_or_else(|| ApiError::Decode {
                endpoint: FOLDER_CREATE,
                reason: "missing folder in response".to_string(),
            })?;

        let (mut node, _) = created.into_node(request.parent.as_ref());
        if node.name.is_empty() {
            node.name = request.name.clone();
        }
        info!(name = %node.name, id = %node.id, parent = ?request.parent, "Created folder");
        Ok(node)
    }
}

/// Turn an HTTP response into the envelope's payload or a typed error
async fn decode<T: DeserializeOwned>(
    endpoint: &'static str,
    response: Response,
) -> Result<Option<T>, ApiError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| ApiError::Transport { endpoint, source })?;

    if !status.is_success() {
        return Err(ApiError::Status {
            endpoint,
            status: status.as_u16(),
            body,
        });
    }

    match serde_json::from_str::<Envelope<T>>(&body) {
        Ok(Envelope::Success { data }) => Ok(data),
        Ok(Envelope::Error { message }) => Err(ApiError::Rejected {
            endpoint,
            message: message.unwrap_or(body),
        }),
        Err(e) => Err(ApiError::Decode {
            endpoint,
            reason: e.to_string(),
        }),
    }
}

#[async_trait]
impl AssetApi for EagleClient {
    async fn list_folders(&self) -> Result<Vec<FolderNode>, ApiError> {
        debug!("Listing folders");
        let response = self
            .client
            .get(self.url(FOLDER_LIST))
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: FOLDER_LIST,
                source,
            })?;

        let roots: Vec<WireFolder> = decode(FOLDER_LIST, response).await?.unwrap_or_default();
        let folders = flatten(roots);
        debug!(count = folders.len(), "Listed folders");
        Ok(folders)
    }

    async fn create_folder(&self, request: &NewFolder) -> Result<FolderNode, ApiError> {
        if let DuplicatePolicy::RejectIfTagged(marker) = &request.duplicates {
            let existing = self.list_folders().await?;
            if let Some(found) = existing.iter().find(|f| f.matches(&request.name, marker)) {
                warn!(
                    name = %request.name,
                    existing = %found.id,
                    "Refusing to create duplicate folder"
                );
                return Err(ApiError::DuplicateFolder {
                    name: request.name.clone(),
                    existing: found.id.clone(),
                });
            }
        }

        self.create_folder_unchecked(request).await
    }

    async fn add_item(&self, item: &NewItem) -> Result<(), ApiError> {
        let body = AddFromPathBody {
            path: item.path.to_string_lossy().into_owned(),
            name: &item.display_name,
            annotation: item.annotation.as_deref().filter(|a| !a.is_empty()),
            tags: &item.tags,
            folder_id: item.folder_id.as_str(),
        };
        debug!(path = %item.path.display(), folder = %item.folder_id, "Adding item");

        let response = self.post_json(ITEM_ADD_FROM_PATH, &body).await?;
        decode::<serde_json::Value>(ITEM_ADD_FROM_PATH, response).await?;
        Ok(())
    }
}
