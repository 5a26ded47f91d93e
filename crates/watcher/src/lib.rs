//! File system watching for Eaglewatch
//!
//! This crate turns directory activity into units of work:
//! - Portable polling monitor (works on network mounts and VM shares)
//! - Stability gate so files are never read mid-write
//! - Backlog scan of files that existed before monitoring began
//! - Watched-root validation and normalization
//!
//! No event suppression happens here. Several events for one path each
//! become a unit of work; deduplication is the ledger's job.

pub mod roots;
pub mod scan;
pub mod stability;

pub use roots::{resolve_roots, split_root_list, RootSet};
pub use scan::collect_backlog;
pub use stability::{GateState, Stability, StabilityGate};

use ew_core::ImageFilter;
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Config, Event, PollWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("no directories to watch")]
    NoRoots,
    #[error("failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
    #[error("failed to start poll watcher: {0}")]
    Init(#[from] notify::Error),
}

/// File system event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Path that changed
    pub path: PathBuf,
    /// Type of change
    pub kind: EventKind,
}

/// Type of file system event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// File created
    Create,
    /// File content or timestamps changed
    Modify,
    /// File moved or renamed into place (destination side)
    MovedTo,
}

/// Recursive polling monitor over a set of root directories
///
/// Polling instead of native notification keeps behavior identical across
/// local disks, network mounts and virtualized filesystems. Dropping the
/// monitor (or calling [`PollMonitor::stop`]) ends polling.
pub struct PollMonitor {
    watcher: PollWatcher,
    roots: Vec<PathBuf>,
}

impl PollMonitor {
    /// Start watching `roots`, sending matching events to `events`
    pub fn start(
        roots: &[PathBuf],
        filter: ImageFilter,
        poll_interval: Duration,
        events: mpsc::UnboundedSender<WatchEvent>,
    ) -> Result<Self, WatchError> {
        if roots.is_empty() {
            return Err(WatchError::NoRoots);
        }

        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for mapped in map_event(event, &filter) {
                    debug!(path = %mapped.path.display(), kind = ?mapped.kind, "File event");
                    // Receiver gone means shutdown is underway
                    let _ = events.send(mapped);
                }
            }
            Err(err) => {
                error!(error = %err, "Poll watcher error");
            }
        };

        let config = Config::default()
            .with_poll_interval(poll_interval)
            .with_compare_contents(false);
        let mut watcher = PollWatcher::new(handler, config)?;

        for root in roots {
            watcher
                .watch(root, RecursiveMode::Recursive)
                .map_err(|source| WatchError::Watch {
                    path: root.clone(),
                    source,
                })?;
            info!(root = %root.display(), "Watching");
        }

        Ok(Self {
            watcher,
            roots: roots.to_vec(),
        })
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Stop polling all roots
    pub fn stop(mut self) {
        for root in &self.roots {
            if let Err(e) = self.watcher.unwatch(root) {
                debug!(root = %root.display(), error = %e, "Unwatch failed");
            }
        }
        info!("Monitor stopped");
    }
}

/// Map a raw notify event to zero or more work-producing events
///
/// Only creations, modifications and move destinations of paths accepted by
/// `filter` survive. Removals and directory events are dropped.
pub fn map_event(event: Event, filter: &ImageFilter) -> Vec<WatchEvent> {
    let kind_and_paths: Option<(EventKind, Vec<PathBuf>)> = match event.kind {
        notify::EventKind::Create(CreateKind::Folder) => None,
        notify::EventKind::Create(_) => Some((EventKind::Create, event.paths)),
        notify::EventKind::Modify(ModifyKind::Name(RenameMode::From)) => None,
        notify::EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            // paths = [from, to]
            Some((EventKind::MovedTo, event.paths.into_iter().skip(1).collect()))
        }
        notify::EventKind::Modify(ModifyKind::Name(_)) => Some((EventKind::MovedTo, event.paths)),
        notify::EventKind::Modify(_) => Some((EventKind::Modify, event.paths)),
        _ => None,
    };

    let Some((kind, paths)) = kind_and_paths else {
        return Vec::new();
    };

    paths
        .into_iter()
        .filter(|p| filter.matches(p) && !is_directory(p))
        .map(|path| WatchEvent { path, kind })
        .collect()
}

fn is_directory(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}
