//! Shared utilities for CLI commands

use std::path::Path;

use anyhow::{Context, Result};
use ew_journal::DedupLedger;

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Replay the ledger if it already exists, without writing to it
pub fn open_existing_ledger(path: &Path) -> Result<Option<DedupLedger>> {
    if !path.exists() {
        return Ok(None);
    }
    DedupLedger::open_read_only(path)
        .map(Some)
        .with_context(|| format!("Failed to open ledger {}", path.display()))
}
