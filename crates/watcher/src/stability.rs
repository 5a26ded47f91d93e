//! Stability gate
//!
//! A file is sampled at a fixed interval until two consecutive size samples
//! agree. Writers that are still appending never produce two equal samples,
//! so their files are left alone until a later event brings them back.

use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default spacing between size samples
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Default time allowed to reach stability
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Gate states
///
/// `Unstable` is the only non-terminal state:
/// `Unstable -> Stable` on two equal samples of an existing file,
/// `Unstable -> TimedOut` once the deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unstable { last: Option<u64> },
    Stable { size: u64 },
    TimedOut,
}

impl GateState {
    pub fn new() -> Self {
        GateState::Unstable { last: None }
    }

    /// Advance with a fresh sample (`None` = missing or not a regular file)
    pub fn step(self, sample: Option<u64>, expired: bool) -> GateState {
        match self {
            GateState::Unstable { last } => match (last, sample) {
                (Some(prev), Some(now)) if prev == now => GateState::Stable { size: now },
                _ if expired => GateState::TimedOut,
                _ => GateState::Unstable { last: sample },
            },
            terminal => terminal,
        }
    }
}

impl Default for GateState {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of waiting on a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    Stable { size: u64 },
    TimedOut,
}

/// Bounded wait for a file to stop changing size
#[derive(Debug, Clone, Copy)]
pub struct StabilityGate {
    interval: Duration,
    timeout: Duration,
}

impl StabilityGate {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sample `path` until it is stable or the timeout elapses
    ///
    /// A timeout is not an error; the caller abandons the file.
    pub async fn wait(&self, path: &Path) -> Stability {
        let deadline = Instant::now() + self.timeout;
        let mut state = GateState::new();
        let mut samples = 0u32;

        loop {
            let sample = sample_size(path);
            samples += 1;
            state = state.step(sample, Instant::now() >= deadline);

            match state {
                GateState::Stable { size } => {
                    debug!(path = %path.display(), size, samples, "File stable");
                    return Stability::Stable { size };
                }
                GateState::TimedOut => {
                    warn!(
                        path = %path.display(),
                        timeout_ms = self.timeout.as_millis() as u64,
                        samples,
                        "Timed out waiting for file to stabilize"
                    );
                    return Stability::TimedOut;
                }
                GateState::Unstable { .. } => {}
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}

impl Default for StabilityGate {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL, DEFAULT_TIMEOUT)
    }
}

fn sample_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}
