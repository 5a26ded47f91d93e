//! Upload journal
//!
//! This crate provides the deduplication ledger: the record of content
//! digests that have already been delivered to the asset library.
//! - In-memory tier guarding concurrent work within one run
//! - Append-only text log guarding across restarts

pub mod ledger;

// Re-exports
pub use ledger::{Claim, DedupLedger, LedgerError};
