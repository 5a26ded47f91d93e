//! Category and date-bucket resolution through the HTTP client

use std::sync::Arc;

use eaglewatch_eagle::{resolve_category, FolderId, FolderResolver};
use wiremock::matchers::{method, path};
use wiremock::Mock;

use crate::common;

#[tokio::test]
async fn test_missing_category_created_before_buckets() {
    let (server, client) = common::setup_eagle_mock().await;
    common::mount_folder_list(&server, serde_json::json!([])).await;
    Mock::given(method("POST"))
        .and(path("/api/folder/create"))
        .respond_with(common::success(serde_json::json!({
            "id": "CAT",
            "name": "stable diffusion"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let category = resolve_category(&client, "stable diffusion").await.unwrap();
    assert_eq!(category.id, FolderId::new("CAT"));
}

#[tokio::test]
async fn test_bucket_lookup_cached_across_calls() {
    let (server, client) = common::setup_eagle_mock().await;
    Mock::given(method("GET"))
        .and(path("/api/folder/list"))
        .respond_with(common::success(common::category_tree()))
        .expect(2)
        .mount(&server)
        .await;

    let client = Arc::new(client);
    let category = resolve_category(client.as_ref(), "stable diffusion").await.unwrap();
    let resolver = FolderResolver::new(Arc::clone(&client), category);

    for _ in 0..3 {
        let id = resolver.resolve_date("2024-05-01").await.unwrap();
        assert_eq!(id, FolderId::new("D0501"));
    }
    // One listing for the category, one for the bucket
    server.verify().await;
}
