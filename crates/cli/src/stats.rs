//! Pipeline counters

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide task counters
#[derive(Debug, Default)]
pub struct PipelineStats {
    submitted: AtomicU64,
    uploaded: AtomicU64,
    duplicates: AtomicU64,
    abandoned: AtomicU64,
    failed: AtomicU64,
}

impl PipelineStats {
    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_uploaded(&self) {
        self.uploaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            uploaded: self.uploaded.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PipelineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub submitted: u64,
    pub uploaded: u64,
    pub duplicates: u64,
    pub abandoned: u64,
    pub failed: u64,
}

impl StatsSnapshot {
    /// Tasks that reached a final outcome
    pub fn finished(&self) -> u64 {
        self.uploaded + self.duplicates + self.abandoned + self.failed
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} submitted, {} uploaded, {} duplicate, {} abandoned, {} failed",
            self.submitted, self.uploaded, self.duplicates, self.abandoned, self.failed
        )
    }
}
