//! Per-file upload pipeline
//!
//! Stages run strictly in order for one file:
//! stabilize, hash, claim, read metadata, resolve folder, upload, commit.
//!
//! A digest is committed to the ledger only after the upload succeeded. Any
//! earlier exit drops the claim, which releases the digest so a later event
//! for the same content can try again.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use ew_core::{hash_file, read_embedded_metadata, ContentDigest, MetadataError};
use ew_eagle::{ApiError, AssetApi, CategoryFolder, FolderId, FolderResolver, NewItem};
use ew_journal::{DedupLedger, LedgerError};
use ew_watcher::{Stability, StabilityGate};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::stats::PipelineStats;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read metadata from {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: MetadataError,
    },

    #[error("failed to resolve folder {date}: {source}")]
    Folder {
        date: String,
        #[source]
        source: ApiError,
    },

    #[error("failed to upload {}: {source}", path.display())]
    Upload {
        path: PathBuf,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("background task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// HTTP status of a remote failure, when there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            PipelineError::Folder { source, .. } | PipelineError::Upload { source, .. } => {
                source.status()
            }
            _ => None,
        }
    }
}

/// Why a file was skipped without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonReason {
    /// Size kept changing until the stability timeout
    Unstable,
    /// File disappeared before it could be read
    Vanished,
    /// Opening or reading the file failed partway
    Unreadable,
}

impl AbandonReason {
    /// Classify a read failure on a watched file
    pub fn from_io(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => AbandonReason::Vanished,
            _ => AbandonReason::Unreadable,
        }
    }
}

/// Result of pushing one file through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Uploaded {
        digest: ContentDigest,
        folder: FolderId,
    },
    /// Content already uploaded, or being uploaded by another task
    Duplicate { digest: ContentDigest },
    Abandoned(AbandonReason),
}

/// Date bucket name for a modification time, in local time
pub fn date_bucket(modified: SystemTime) -> String {
    DateTime::<Local>::from(modified)
        .format("%Y-%m-%d")
        .to_string()
}

/// Name shown for the item in the library
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn fingerprint(path: &Path) -> io::Result<(ContentDigest, SystemTime)> {
    let modified = std::fs::metadata(path)?.modified()?;
    let digest = hash_file(path)?;
    Ok((digest, modified))
}

/// Shared state for every upload task in a run
pub struct Pipeline {
    gate: StabilityGate,
    ledger: Arc<DedupLedger>,
    api: Arc<dyn AssetApi>,
    folders: FolderResolver<dyn AssetApi>,
    stats: PipelineStats,
}

impl Pipeline {
    pub fn new(
        api: Arc<dyn AssetApi>,
        category: CategoryFolder,
        ledger: Arc<DedupLedger>,
        gate: StabilityGate,
    ) -> Self {
        Self {
            gate,
            ledger,
            folders: FolderResolver::new(Arc::clone(&api), category),
            api,
            stats: PipelineStats::default(),
        }
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    pub fn folders(&self) -> &FolderResolver<dyn AssetApi> {
        &self.folders
    }

    /// Process one file and record the outcome
    ///
    /// Never fails: errors are logged and counted, and the task ends.
    pub async fn run(&self, path: PathBuf) {
        match self.process(&path).await {
            Ok(Outcome::Uploaded { digest, folder }) => {
                info!(path = %path.display(), digest = %digest.short(), folder_id = %folder, "Uploaded");
                self.stats.record_uploaded();
            }
            Ok(Outcome::Duplicate { digest }) => {
                debug!(path = %path.display(), digest = %digest.short(), "Already processed");
                self.stats.record_duplicate();
            }
            Ok(Outcome::Abandoned(reason)) => {
                warn!(path = %path.display(), ?reason, "Skipped file");
                self.stats.record_abandoned();
            }
            Err(e) => {
                error!(path = %path.display(), status = ?e.status(), error = %e, "Upload task failed");
                self.stats.record_failed();
            }
        }
    }

    /// Push one file through every stage
    pub async fn process(&self, path: &Path) -> Result<Outcome, PipelineError> {
        if let Stability::TimedOut = self.gate.wait(path).await {
            return Ok(Outcome::Abandoned(AbandonReason::Unstable));
        }

        let owned = path.to_path_buf();
        let (digest, modified) = match tokio::task::spawn_blocking(move || fingerprint(&owned)).await? {
            Ok(found) => found,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Hash read failed");
                return Ok(Outcome::Abandoned(AbandonReason::from_io(&e)));
            }
        };

        let Some(claim) = self.ledger.try_claim(digest) else {
            return Ok(Outcome::Duplicate { digest });
        };

        let owned = path.to_path_buf();
        let metadata = match tokio::task::spawn_blocking(move || read_embedded_metadata(&owned)).await? {
            Ok(metadata) => metadata,
            Err(source) => match source.io_error() {
                Some(e) => {
                    debug!(path = %path.display(), error = %e, "Metadata read failed");
                    return Ok(Outcome::Abandoned(AbandonReason::from_io(e)));
                }
                None => {
                    return Err(PipelineError::Metadata {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            },
        };

        let date = date_bucket(modified);
        let folder = self
            .folders
            .resolve_date(&date)
            .await
            .map_err(|source| PipelineError::Folder {
                date: date.clone(),
                source,
            })?;

        let item = NewItem {
            path: path.to_path_buf(),
            display_name: display_name(path),
            annotation: metadata.annotation,
            tags: metadata.tags,
            folder_id: folder.clone(),
        };
        self.api
            .add_item(&item)
            .await
            .map_err(|source| PipelineError::Upload {
                path: path.to_path_buf(),
                source,
            })?;

        tokio::task::spawn_blocking(move || claim.commit()).await??;
        Ok(Outcome::Uploaded { digest, folder })
    }
}
