//! Layered settings
//!
//! Precedence, lowest first: built-in defaults, TOML file, environment,
//! command-line flags. Watched roots are the exception: every layer adds to
//! the list instead of replacing it.

use anyhow::{Context, Result};
use ew_core::ImageFilter;
use ew_eagle::DEFAULT_BASE_URL;
use ew_watcher::{resolve_roots, split_root_list, stability, RootSet, StabilityGate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix shared by all watched-root environment variables
pub const DEFAULT_ENV_PREFIX: &str = "EAGLE_WATCH_FOLDER";

/// Older root variable prefix, still honored alongside `env_prefix`
pub const LEGACY_ENV_PREFIX: &str = "EAGLE_GOOGLE_DRIVE_FOLDER";

/// Ledger path override
pub const LEDGER_ENV: &str = "EAGLE_WATCH_LEDGER";

/// API base URL override
pub const API_URL_ENV: &str = "EAGLE_API_URL";

pub const DEFAULT_CATEGORY: &str = "stable diffusion";

const APP_DIR: &str = "eaglewatch";
const LEDGER_FILE: &str = "processed_files.txt";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub eagle: EagleSettings,
    pub watch: WatchSettings,
    pub stability: StabilitySettings,
    pub pool: PoolSettings,
    pub ledger: LedgerSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EagleSettings {
    pub base_url: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// Top-level folder name; also the marker tag of its date buckets
    pub category: String,
}

impl Default for EagleSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_ms: 3_000,
            request_timeout_ms: 10_000,
            category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchSettings {
    pub roots: Vec<PathBuf>,
    pub env_prefix: String,
    pub poll_interval_ms: u64,
    pub extensions: ImageFilter,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            poll_interval_ms: 1_000,
            extensions: ImageFilter::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StabilitySettings {
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

impl Default for StabilitySettings {
    fn default() -> Self {
        Self {
            interval_ms: stability::DEFAULT_INTERVAL.as_millis() as u64,
            timeout_ms: stability::DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            workers: 8,
            queue_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerSettings {
    pub path: PathBuf,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub roots: Vec<PathBuf>,
    pub ledger: Option<PathBuf>,
    pub workers: Option<usize>,
    pub api_url: Option<String>,
}

/// `<config_dir>/eaglewatch/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// `<data_dir>/eaglewatch/processed_files.txt`
pub fn default_ledger_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(LEDGER_FILE)
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid configuration")
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("In config file {}", path.display()))
    }

    /// Apply environment variables
    ///
    /// Every variable named `<env_prefix>*` or `EAGLE_GOOGLE_DRIVE_FOLDER*`
    /// contributes a comma-separated list of roots. Variables are taken in
    /// name order so the merged list is stable between runs.
    pub fn apply_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut root_vars = Vec::new();
        for (key, value) in vars {
            if key.starts_with(&self.watch.env_prefix) || key.starts_with(LEGACY_ENV_PREFIX) {
                root_vars.push((key, value));
            } else if key == LEDGER_ENV && !value.trim().is_empty() {
                self.ledger.path = PathBuf::from(value.trim());
            } else if key == API_URL_ENV && !value.trim().is_empty() {
                self.eagle.base_url = value.trim().to_string();
            }
        }

        root_vars.sort();
        for (_, value) in root_vars {
            self.watch.roots.extend(split_root_list(&value));
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        self.watch.roots.extend(overrides.roots.iter().cloned());
        if let Some(ledger) = &overrides.ledger {
            self.ledger.path = ledger.clone();
        }
        if let Some(workers) = overrides.workers {
            self.pool.workers = workers;
        }
        if let Some(url) = &overrides.api_url {
            self.eagle.base_url = url.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pool.workers == 0 {
            anyhow::bail!("pool.workers must be at least 1");
        }
        if self.pool.queue_capacity == 0 {
            anyhow::bail!("pool.queue_capacity must be at least 1");
        }
        if self.watch.extensions.is_empty() {
            anyhow::bail!("watch.extensions must name at least one extension");
        }
        if self.eagle.category.trim().is_empty() {
            anyhow::bail!("eagle.category must not be empty");
        }
        if self.watch.poll_interval_ms == 0 || self.stability.interval_ms == 0 {
            anyhow::bail!("polling intervals must be greater than zero");
        }
        if self.stability.timeout_ms == 0 {
            anyhow::bail!("stability.timeout_ms must be greater than zero");
        }
        Ok(())
    }

    /// Merge roots from every layer and keep the usable ones
    pub fn watched_roots(&self) -> RootSet {
        resolve_roots(self.watch.roots.iter().cloned())
    }

    pub fn stability_gate(&self) -> StabilityGate {
        StabilityGate::new(
            Duration::from_millis(self.stability.interval_ms),
            Duration::from_millis(self.stability.timeout_ms),
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.watch.poll_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.eagle.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.eagle.request_timeout_ms)
    }
}

/// Build the effective settings from all layers
///
/// An explicit `config` path must exist. Without one, the default config
/// file is used only if present.
pub fn load(config: Option<&Path>, overrides: &Overrides) -> Result<Settings> {
    let mut settings = match config {
        Some(path) => Settings::load_file(path)?,
        None => match default_config_path() {
            Some(path) if path.is_file() => Settings::load_file(&path)?,
            _ => Settings::default(),
        },
    };

    settings.apply_env(std::env::vars());
    settings.apply_overrides(overrides);
    settings.validate()?;
    Ok(settings)
}
