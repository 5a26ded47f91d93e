//! Scratch folders and settings for pipeline tests

use chrono::{Local, TimeZone};
use ew_cli::daemon::{self, Startup};
use ew_cli::Settings;
use ew_eagle::AssetApi;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A watched folder and a ledger in one temp directory
pub struct TestEnv {
    _dir: TempDir,
    pub root: PathBuf,
    pub ledger: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("renders");
        fs::create_dir(&root).unwrap();
        let root = fs::canonicalize(root).unwrap();
        let ledger = dir.path().join("state").join("processed_files.txt");
        Self {
            _dir: dir,
            root,
            ledger,
        }
    }

    /// Settings with short timings for tests
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.watch.roots = vec![self.root.clone()];
        settings.watch.poll_interval_ms = 50;
        settings.ledger.path = self.ledger.clone();
        settings.stability.interval_ms = 20;
        settings.stability.timeout_ms = 400;
        settings.pool.workers = 4;
        settings
    }

    pub fn write(&self, relative: &str, bytes: &[u8]) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, bytes).unwrap();
        path
    }

    /// Back-date a file to noon local time on the given day
    pub fn set_date(&self, path: &Path, year: i32, month: u32, day: u32) {
        let when = Local.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap();
        filetime::set_file_mtime(path, filetime::FileTime::from_system_time(when.into())).unwrap();
    }

    /// Ledger lines as written on disk
    pub fn ledger_lines(&self) -> Vec<String> {
        fs::read_to_string(&self.ledger)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub async fn start(&self, api: Arc<dyn AssetApi>) -> Startup {
        daemon::prepare(&self.settings(), api).await.unwrap()
    }
}

/// PNG bytes carrying annotation and tags text chunks
#[allow(dead_code)]
pub fn png_with_text(annotation: &str, tags: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, 1, 1);
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::Eight);
        encoder
            .add_text_chunk("Annotation".to_string(), annotation.to_string())
            .unwrap();
        encoder.add_text_chunk("Tags".to_string(), tags.to_string()).unwrap();
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&[0x7f]).unwrap();
    }
    bytes
}
