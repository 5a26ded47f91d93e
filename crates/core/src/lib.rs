//! Eaglewatch core - content identity and image inspection primitives
//!
//! This crate provides the building blocks shared by every pipeline stage:
//! - BLAKE3 content digests (the deduplication key)
//! - Streaming file hashing with bounded memory
//! - Image extension filtering
//! - Embedded PNG text metadata (annotation + tags)

pub mod filter;
pub mod hash;
pub mod metadata;

// Re-export main types for convenience
pub use filter::ImageFilter;
pub use hash::{hash_bytes, hash_file, ContentDigest, DigestParseError, HASH_BLOCK_SIZE};
pub use metadata::{read_embedded_metadata, EmbeddedMetadata, MetadataError};
