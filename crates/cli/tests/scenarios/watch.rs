//! Live monitoring end to end

use crate::common::{FakeApi, TestEnv};
use ew_cli::daemon;
use std::time::Duration;
use tokio::sync::oneshot;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_watch_uploads_new_files_once_and_drains() {
    let env = TestEnv::new();
    env.write("existing.png", b"present at startup");
    let api = FakeApi::new();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let driver = {
        let api = api.clone();
        let root = env.root.clone();
        async move {
            // Let the monitor take its baseline
            tokio::time::sleep(Duration::from_millis(300)).await;
            std::fs::write(root.join("a.png"), b"dropped later").unwrap();
            std::fs::write(root.join("b.png"), b"dropped later").unwrap();

            let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
            while api.uploads() < 2 && tokio::time::Instant::now() < deadline {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            // Give the duplicate event time to land too
            tokio::time::sleep(Duration::from_millis(500)).await;
            let _ = stop_tx.send(());
        }
    };

    let shutdown = async {
        let _ = stop_rx.await;
    };

    let settings = env.settings();
    let (stats, ()) = tokio::join!(daemon::run_watch(&settings, api.clone(), shutdown), driver);
    let stats = stats.unwrap();

    let mut names: Vec<String> = api.items().into_iter().map(|i| i.display_name).collect();
    names.sort();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"existing.png".to_string()));
    assert!(names.iter().any(|n| n == "a.png" || n == "b.png"));
    assert_eq!(stats.uploaded, 2);
    assert_eq!(stats.failed, 0);
    assert_eq!(env.ledger_lines().len(), 2);
}
