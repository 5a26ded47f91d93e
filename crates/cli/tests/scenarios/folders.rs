//! Category and date-bucket resolution as seen by the fake Eagle

use crate::common::{Call, FakeApi, TestEnv};
use ew_cli::daemon;
use ew_eagle::{FolderId, FolderNode};

fn folder(id: &str, name: &str, tags: &[&str]) -> FolderNode {
    FolderNode {
        id: FolderId::new(id),
        name: name.to_string(),
        parent: None,
        marker_tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_missing_category_created_before_buckets() {
    let env = TestEnv::new();
    let path = env.write("a.png", b"pixels");
    env.set_date(&path, 2024, 5, 1);
    let api = FakeApi::new();

    daemon::run_scan(&env.settings(), api.clone()).await.unwrap();

    let creates: Vec<Call> = api
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::CreateFolder { .. }))
        .collect();
    assert_eq!(
        creates,
        vec![
            Call::CreateFolder {
                name: "stable diffusion".to_string(),
                parent: None,
            },
            Call::CreateFolder {
                name: "2024-05-01".to_string(),
                parent: Some(FolderId::new("F0")),
            },
        ]
    );
    assert_eq!(api.items()[0].folder_id, FolderId::new("F1"));
}

#[tokio::test]
async fn test_existing_category_reused() {
    let env = TestEnv::new();
    env.write("a.png", b"pixels");
    let api = FakeApi::with_folders(vec![folder("CAT", "stable diffusion", &[])]);

    daemon::run_scan(&env.settings(), api.clone()).await.unwrap();

    let category_creates = api
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::CreateFolder { parent: None, .. }))
        .count();
    assert_eq!(category_creates, 0);
}

#[tokio::test]
async fn test_same_date_second_file_hits_cache() {
    let env = TestEnv::new();
    let first = env.write("first.png", b"one");
    let second = env.write("second.png", b"two");
    env.set_date(&first, 2024, 6, 2);
    env.set_date(&second, 2024, 6, 2);
    let api = FakeApi::new();
    let startup = env.start(api.clone()).await;

    startup.pipeline.process(&first).await.unwrap();
    let lists_after_first = api.lists();
    let creates_after_first = api.creates();

    startup.pipeline.process(&second).await.unwrap();

    assert_eq!(api.lists(), lists_after_first);
    assert_eq!(api.creates(), creates_after_first);
    let items = api.items();
    assert_eq!(items[0].folder_id, items[1].folder_id);
}

#[tokio::test]
async fn test_untagged_namesake_not_used_as_bucket() {
    let env = TestEnv::new();
    let path = env.write("a.png", b"pixels");
    env.set_date(&path, 2024, 7, 4);
    let api = FakeApi::with_folders(vec![
        folder("CAT", "stable diffusion", &[]),
        folder("OTHER", "2024-07-04", &["holiday"]),
        folder("OURS", "2024-07-04", &["stable diffusion"]),
    ]);

    daemon::run_scan(&env.settings(), api.clone()).await.unwrap();

    assert_eq!(api.items()[0].folder_id, FolderId::new("OURS"));
    assert_eq!(api.creates(), 0);
}

#[tokio::test]
async fn test_files_on_different_dates_get_separate_buckets() {
    let env = TestEnv::new();
    let may = env.write("may.png", b"may");
    let june = env.write("june.png", b"june");
    env.set_date(&may, 2024, 5, 31);
    env.set_date(&june, 2024, 6, 1);
    let api = FakeApi::new();

    daemon::run_scan(&env.settings(), api.clone()).await.unwrap();

    let mut buckets: Vec<String> = api
        .folders()
        .into_iter()
        .filter(|f| f.parent.is_some())
        .map(|f| f.name)
        .collect();
    buckets.sort();
    assert_eq!(buckets, vec!["2024-05-31".to_string(), "2024-06-01".to_string()]);
}
