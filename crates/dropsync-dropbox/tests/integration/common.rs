//! Shared test helpers for Dropbox API integration tests
//!
//! Provides wiremock-based mock server setup for Dropbox API endpoints.
//! Each helper mounts the necessary mock endpoints on a server that
//! serves both the RPC and the content endpoint families.

use wiremock::matchers::{body_json, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use dropsync_dropbox::client::{DropboxClient, API_ARG_HEADER};
use dropsync_dropbox::provider::DropboxRemoteStore;

/// Sets up a mock server with the account endpoint and returns
/// a (MockServer, DropboxClient) tuple.
pub async fn setup_dropbox_mock() -> (MockServer, DropboxClient) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/get_current_account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "account_id": "dbid:test-account-001",
            "name": {
                "given_name": "Test",
                "surname": "User",
                "display_name": "Test User"
            },
            "email": "test@example.com",
            "email_verified": true
        })))
        .mount(&server)
        .await;

    let client = DropboxClient::with_base_url("test-access-token", server.uri());

    (server, client)
}

/// Same as [`setup_dropbox_mock`] but wrapped in the port implementation
pub async fn setup_store_mock() -> (MockServer, DropboxRemoteStore) {
    let (server, client) = setup_dropbox_mock().await;
    (server, DropboxRemoteStore::new(client))
}

/// JSON for a file entry as returned by listing and upload endpoints
pub fn file_json(name: &str, size: u64, client_modified: &str) -> serde_json::Value {
    serde_json::json!({
        ".tag": "file",
        "name": name,
        "id": format!("id:{}", name),
        "client_modified": client_modified,
        "server_modified": client_modified,
        "rev": "015f2b6a5e7a3c10000000001",
        "size": size,
        "path_lower": format!("/{}", name.to_lowercase()),
        "path_display": format!("/{}", name)
    })
}

/// JSON for a folder entry
pub fn folder_json(name: &str) -> serde_json::Value {
    serde_json::json!({
        ".tag": "folder",
        "name": name,
        "id": format!("id:{}", name),
        "path_lower": format!("/{}", name.to_lowercase()),
        "path_display": format!("/{}", name)
    })
}

/// Mounts a list_folder endpoint for `folder` returning a single page
pub async fn mount_list_folder(
    server: &MockServer,
    folder: &str,
    entries: serde_json::Value,
    cursor: &str,
    has_more: bool,
) {
    Mock::given(method("POST"))
        .and(path("/files/list_folder"))
        .and(body_json(serde_json::json!({
            "path": folder,
            "recursive": false,
            "include_deleted": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "entries": entries,
            "cursor": cursor,
            "has_more": has_more
        })))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

/// Mounts a list_folder/continue endpoint answering `cursor`
pub async fn mount_list_continue(
    server: &MockServer,
    cursor: &str,
    entries: serde_json::Value,
    next_cursor: &str,
    has_more: bool,
) {
    Mock::given(method("POST"))
        .and(path("/files/list_folder/continue"))
        .and(body_json(serde_json::json!({ "cursor": cursor })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "entries": entries,
            "cursor": next_cursor,
            "has_more": has_more
        })))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

/// Mounts a content endpoint that requires the argument header
pub async fn mount_content(server: &MockServer, endpoint: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .and(header_exists(API_ARG_HEADER))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Parses the `Dropbox-API-Arg` header of a received request
pub fn api_arg(request: &Request) -> serde_json::Value {
    let raw = request
        .headers
        .get(API_ARG_HEADER)
        .expect("request has no Dropbox-API-Arg header")
        .to_str()
        .expect("Dropbox-API-Arg header is not ASCII");
    serde_json::from_str(raw).expect("Dropbox-API-Arg header is not JSON")
}

/// All received requests for one endpoint path, in arrival order
pub async fn requests_to(server: &MockServer, endpoint: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .into_iter()
        .filter(|r| r.url.path() == endpoint)
        .collect()
}
