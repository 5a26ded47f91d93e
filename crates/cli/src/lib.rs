//! Eaglewatch application layer
//!
//! Wires the watcher, ledger and Eagle client into a running pipeline:
//! - [`config`] - layered settings
//! - [`pipeline`] - per-file stages from stability to ledger commit
//! - [`pool`] - bounded worker pool
//! - [`daemon`] - startup checks, `watch` and `scan` runs

pub mod config;
pub mod daemon;
pub mod pipeline;
pub mod pool;
pub mod stats;

pub use config::{Overrides, Settings};
pub use pipeline::{AbandonReason, Outcome, Pipeline, PipelineError};
pub use pool::WorkerPool;
pub use stats::{PipelineStats, StatsSnapshot};
