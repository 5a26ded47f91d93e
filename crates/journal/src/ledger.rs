//! Deduplication ledger backed by an append-only digest log
//!
//! On-disk format: plain text, one lowercase hex digest per line, never
//! rewritten. A missing file is an empty ledger.
//!
//! Two tiers live in memory:
//! - `committed` - digests whose upload was confirmed (mirrors the log)
//! - `in_flight` - digests claimed by a worker that has not finished yet
//!
//! A digest in either tier blocks a new claim. Only `committed` survives a
//! restart.

use ew_core::ContentDigest;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("ledger at {} was opened read-only", path.display())]
    ReadOnly { path: PathBuf },
}

impl LedgerError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

struct Digests {
    committed: HashSet<ContentDigest>,
    in_flight: HashSet<ContentDigest>,
}

struct LedgerInner {
    path: PathBuf,
    digests: Mutex<Digests>,
    // Separate lock so appends never hold up claims
    log: Mutex<Option<File>>,
}

/// Process-wide record of handled content digests
///
/// Claims go through one mutex, so two workers holding identical content
/// can never both obtain a [`Claim`].
pub struct DedupLedger {
    inner: Arc<LedgerInner>,
}

impl DedupLedger {
    /// Open the ledger at `path`, replaying every digest already recorded
    ///
    /// Parent directories are created as needed. Lines that are not valid
    /// digests are skipped with a warning.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| LedgerError::io(parent, e))?;
        }

        let committed = load(path)?;

        let mut log = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| LedgerError::io(path, e))?;
        terminate_torn_line(&mut log).map_err(|e| LedgerError::io(path, e))?;

        info!(
            path = %path.display(),
            digests = committed.len(),
            "Loaded dedup ledger"
        );

        Ok(Self::from_parts(path, committed, Some(log)))
    }

    /// Replay the ledger at `path` without creating or touching the file
    ///
    /// A missing file is an empty ledger. Claims still work in memory but
    /// cannot be committed.
    pub fn open_read_only(path: &Path) -> Result<Self, LedgerError> {
        let committed = load(path)?;
        debug!(path = %path.display(), digests = committed.len(), "Replayed ledger read-only");
        Ok(Self::from_parts(path, committed, None))
    }

    fn from_parts(path: &Path, committed: HashSet<ContentDigest>, log: Option<File>) -> Self {
        Self {
            inner: Arc::new(LedgerInner {
                path: path.to_path_buf(),
                digests: Mutex::new(Digests {
                    committed,
                    in_flight: HashSet::new(),
                }),
                log: Mutex::new(log),
            }),
        }
    }

    /// Atomically check for `digest` and, if absent, reserve it
    ///
    /// Returns `None` when the digest was already committed or is being
    /// handled by another worker.
    pub fn try_claim(&self, digest: ContentDigest) -> Option<Claim> {
        let mut digests = self.inner.digests.lock();
        if digests.committed.contains(&digest) || !digests.in_flight.insert(digest) {
            return None;
        }
        debug!(digest = %digest.short(), "Claimed digest");
        Some(Claim {
            ledger: Arc::clone(&self.inner),
            digest,
            committed: false,
        })
    }

    /// Whether `digest` is committed or currently claimed
    pub fn is_processed(&self, digest: &ContentDigest) -> bool {
        let digests = self.inner.digests.lock();
        digests.committed.contains(digest) || digests.in_flight.contains(digest)
    }

    /// Whether `digest` has a confirmed upload on record
    pub fn is_committed(&self, digest: &ContentDigest) -> bool {
        self.inner.digests.lock().committed.contains(digest)
    }

    /// Number of committed digests
    pub fn len(&self) -> usize {
        self.inner.digests.lock().committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of outstanding claims
    pub fn in_flight(&self) -> usize {
        self.inner.digests.lock().in_flight.len()
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }
}

impl LedgerInner {
    fn commit(&self, digest: ContentDigest) -> Result<(), LedgerError> {
        {
            let mut digests = self.digests.lock();
            digests.in_flight.remove(&digest);
            // The upload already happened; keep it out of this run even if
            // the log write below fails.
            digests.committed.insert(digest);
        }

        let mut log = self.log.lock();
        let log = log.as_mut().ok_or_else(|| LedgerError::ReadOnly {
            path: self.path.clone(),
        })?;
        let line = format!("{}\n", digest.to_hex());
        log.write_all(line.as_bytes())
            .map_err(|e| LedgerError::io(&self.path, e))?;
        log.sync_data().map_err(|e| LedgerError::io(&self.path, e))
    }

    fn release(&self, digest: &ContentDigest) {
        if self.digests.lock().in_flight.remove(digest) {
            debug!(digest = %digest.short(), "Released digest claim");
        }
    }
}

/// Exclusive reservation of a digest held by one worker
///
/// Call [`Claim::commit`] once the upload is confirmed. It blocks on an
/// fsync, so async callers should run it on the blocking pool. Dropping the
/// claim without committing releases the digest so a later event can retry
/// it.
#[must_use = "dropping a claim releases the digest"]
pub struct Claim {
    ledger: Arc<LedgerInner>,
    digest: ContentDigest,
    committed: bool,
}

impl Claim {
    pub fn digest(&self) -> ContentDigest {
        self.digest
    }

    /// Durably record the digest as uploaded
    pub fn commit(mut self) -> Result<(), LedgerError> {
        self.committed = true;
        self.ledger.commit(self.digest)
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        if !self.committed {
            self.ledger.release(&self.digest);
        }
    }
}

impl std::fmt::Debug for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Claim")
            .field("digest", &self.digest)
            .field("committed", &self.committed)
            .finish()
    }
}

fn load(path: &Path) -> Result<HashSet<ContentDigest>, LedgerError> {
    match File::open(path) {
        Ok(file) => replay(path, file),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashSet::new()),
        Err(e) => Err(LedgerError::io(path, e)),
    }
}

fn replay(path: &Path, file: File) -> Result<HashSet<ContentDigest>, LedgerError> {
    let mut digests = HashSet::new();
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| LedgerError::io(path, e))?;
        let entry = line.trim();
        if entry.is_empty() {
            continue;
        }
        match entry.parse::<ContentDigest>() {
            Ok(digest) => {
                digests.insert(digest);
            }
            Err(e) => warn!(
                path = %path.display(),
                line = lineno + 1,
                error = %e,
                "Skipping unreadable ledger entry"
            ),
        }
    }
    Ok(digests)
}

/// Ensure the next append starts on a fresh line after a crash mid-write
fn terminate_torn_line(log: &mut File) -> io::Result<()> {
    let len = log.metadata()?.len();
    if len == 0 {
        return Ok(());
    }
    let mut last = [0u8; 1];
    log.seek(SeekFrom::Start(len - 1))?;
    log.read_exact(&mut last)?;
    if last[0] != b'\n' {
        log.write_all(b"\n")?;
        log.sync_data()?;
    }
    Ok(())
}
