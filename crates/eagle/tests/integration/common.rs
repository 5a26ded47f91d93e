//! Shared wiremock helpers for Eagle API tests

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use eaglewatch_eagle::EagleClient;

/// Start a mock server and a client pointed at it
pub async fn setup_eagle_mock() -> (MockServer, EagleClient) {
    let server = MockServer::start().await;
    let client = EagleClient::with_timeouts(
        server.uri(),
        Duration::from_secs(2),
        Duration::from_secs(2),
    )
    .expect("client builds");
    (server, client)
}

/// URL of a local port with nothing listening on it
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

/// Wrap `data` in Eagle's success envelope
pub fn success(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "status": "success",
        "data": data
    }))
}

/// Mount `GET /api/folder/list` returning `folders`
pub async fn mount_folder_list(server: &MockServer, folders: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/folder/list"))
        .respond_with(success(folders))
        .mount(server)
        .await;
}

/// The listing used by most tests: a category with one tagged date bucket
pub fn category_tree() -> serde_json::Value {
    serde_json::json!([
        {
            "id": "CAT",
            "name": "stable diffusion",
            "extendTags": [],
            "children": [
                {
                    "id": "D0501",
                    "name": "2024-05-01",
                    "extendTags": ["stable diffusion"],
                    "children": []
                }
            ]
        },
        {
            "id": "LOOSE",
            "name": "2024-05-02",
            "extendTags": [],
            "children": []
        }
    ])
}
