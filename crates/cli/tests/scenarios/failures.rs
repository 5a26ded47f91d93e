//! Failure isolation and retry behavior

use crate::common::{FakeApi, TestEnv};
use ew_cli::daemon;
use ew_cli::{AbandonReason, Outcome, PipelineError};
use std::fs;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_failed_upload_not_committed_and_retried_next_run() {
    let env = TestEnv::new();
    env.write("a.png", b"upload me");

    let api = FakeApi::new();
    api.fail_uploads(true);
    let stats = daemon::run_scan(&env.settings(), api.clone()).await.unwrap();

    assert_eq!(api.uploads(), 1);
    assert_eq!(stats.failed, 1);
    assert!(env.ledger_lines().is_empty());

    let retry = FakeApi::new();
    let stats = daemon::run_scan(&env.settings(), retry.clone()).await.unwrap();

    assert_eq!(retry.uploads(), 1);
    assert_eq!(stats.uploaded, 1);
    assert_eq!(env.ledger_lines().len(), 1);
}

#[tokio::test]
async fn test_failed_upload_retried_within_same_run() {
    let env = TestEnv::new();
    let path = env.write("a.png", b"upload me");
    let api = FakeApi::new();
    let startup = env.start(api.clone()).await;

    api.fail_uploads(true);
    let err = startup.pipeline.process(&path).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(matches!(err, PipelineError::Upload { .. }));
    assert_eq!(startup.pipeline.ledger().in_flight(), 0);

    api.fail_uploads(false);
    let outcome = startup.pipeline.process(&path).await.unwrap();

    assert!(matches!(outcome, Outcome::Uploaded { .. }));
    assert_eq!(api.uploads(), 2);
    assert_eq!(api.items().len(), 1);
}

#[tokio::test]
async fn test_one_failure_does_not_stop_siblings() {
    let env = TestEnv::new();
    env.write("good-1.png", b"one");
    env.write("broken.png", b"\x89PNG\r\n\x1a\nthis is not a chunk stream");
    env.write("good-2.jpg", b"two");
    let api = FakeApi::new();

    let stats = daemon::run_scan(&env.settings(), api.clone()).await.unwrap();

    assert_eq!(stats.uploaded, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(api.uploads(), 2);
}

#[tokio::test]
async fn test_corrupt_png_releases_claim() {
    let env = TestEnv::new();
    let path = env.write("broken.png", b"\x89PNG\r\n\x1a\nthis is not a chunk stream");
    let api = FakeApi::new();
    let startup = env.start(api.clone()).await;

    let err = startup.pipeline.process(&path).await.unwrap_err();

    assert!(matches!(err, PipelineError::Metadata { .. }));
    assert_eq!(api.uploads(), 0);
    assert_eq!(startup.pipeline.ledger().in_flight(), 0);
    assert!(startup.pipeline.ledger().is_empty());
}

#[tokio::test]
async fn test_vanished_file_abandoned() {
    let env = TestEnv::new();
    let api = FakeApi::new();
    let startup = env.start(api.clone()).await;

    let outcome = startup
        .pipeline
        .process(&env.root.join("gone.png"))
        .await
        .unwrap();

    // A path that never exists never stabilizes
    assert_eq!(outcome, Outcome::Abandoned(AbandonReason::Unstable));
    assert_eq!(api.uploads(), 0);
}

// Zero-length regular file whose first read fails with EIO
#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_read_error_abandons_instead_of_failing() {
    let env = TestEnv::new();
    let api = FakeApi::new();
    let startup = env.start(api.clone()).await;
    let path = std::path::Path::new("/proc/self/mem");

    let outcome = startup.pipeline.process(path).await.unwrap();
    assert_eq!(outcome, Outcome::Abandoned(AbandonReason::Unreadable));

    startup.pipeline.run(path.to_path_buf()).await;
    let stats = startup.pipeline.stats().snapshot();
    assert_eq!(stats.abandoned, 1);
    assert_eq!(stats.failed, 0);

    assert_eq!(api.uploads(), 0);
    assert_eq!(startup.pipeline.ledger().in_flight(), 0);
    assert!(startup.pipeline.ledger().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_growing_file_never_uploaded() {
    let env = TestEnv::new();
    let path = env.root.join("still-writing.png");
    let api = FakeApi::new();
    let startup = env.start(api.clone()).await;

    let stop = Arc::new(AtomicBool::new(false));
    let writer = {
        let path = path.clone();
        let stop = Arc::clone(&stop);
        std::thread::spawn(move || {
            let mut file = fs::File::create(&path).unwrap();
            while !stop.load(Ordering::Relaxed) {
                file.write_all(&[1u8; 128]).unwrap();
                file.flush().unwrap();
                std::thread::sleep(Duration::from_millis(2));
            }
        })
    };

    let outcome = startup.pipeline.process(&path).await.unwrap();
    stop.store(true, Ordering::Relaxed);
    writer.join().unwrap();

    assert_eq!(outcome, Outcome::Abandoned(AbandonReason::Unstable));
    assert_eq!(api.uploads(), 0);
    assert!(startup.pipeline.ledger().is_empty());
}

#[tokio::test]
async fn test_no_valid_roots_is_fatal() {
    let env = TestEnv::new();
    let mut settings = env.settings();
    settings.watch.roots = vec![env.root.join("missing")];

    let result = daemon::run_scan(&settings, FakeApi::new()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_category_failure_is_fatal() {
    let env = TestEnv::new();
    let mut settings = env.settings();
    // Nothing listens here; connection is refused
    settings.eagle.base_url = "http://127.0.0.1:9".to_string();
    settings.eagle.connect_timeout_ms = 200;
    let client = daemon::eagle_client(&settings).unwrap();

    let result = daemon::run_scan(&settings, Arc::new(client)).await;
    assert!(result.is_err());
    assert!(env.ledger_lines().is_empty());
}
