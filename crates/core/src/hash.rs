//! BLAKE3 content digests used as the deduplication key

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Read block size for streaming hashes (64 KiB)
pub const HASH_BLOCK_SIZE: usize = 64 * 1024;

/// A BLAKE3 digest of a file's bytes (32 bytes)
///
/// Equal bytes always produce equal digests, so this is the sole identity of
/// "this content has already been handled".
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ContentDigest([u8; 32]);

/// Error returned when a hex string is not a valid digest
#[derive(Debug, thiserror::Error)]
pub enum DigestParseError {
    #[error("invalid digest length: expected 64 hex characters, got {0}")]
    Length(usize),
    #[error("invalid digest encoding: {0}")]
    Encoding(#[from] hex::FromHexError),
}

impl ContentDigest {
    /// Create a digest from raw bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the digest as a byte slice
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding (64 characters)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string (either case)
    pub fn from_hex(s: &str) -> Result<Self, DigestParseError> {
        if s.len() != 64 {
            return Err(DigestParseError::Length(s.len()));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// First 12 hex characters, for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl FromStr for ContentDigest {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl std::fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hash an in-memory buffer
pub fn hash_bytes(data: &[u8]) -> ContentDigest {
    ContentDigest::from_bytes(*blake3::hash(data).as_bytes())
}

/// Hash a file by streaming it in [`HASH_BLOCK_SIZE`] blocks
///
/// Memory use is bounded regardless of file size. Fails if the file cannot be
/// opened or a read fails partway (e.g. the file was deleted concurrently).
pub fn hash_file(path: &Path) -> io::Result<ContentDigest> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();

    let mut buffer = vec![0u8; HASH_BLOCK_SIZE];
    loop {
        let n = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
    }

    Ok(ContentDigest::from_bytes(*hasher.finalize().as_bytes()))
}
