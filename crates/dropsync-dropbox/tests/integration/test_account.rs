//! Integration tests for the token liveness probe

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dropsync_dropbox::client::DropboxClient;
use dropsync_dropbox::DropboxError;

use crate::common;

#[tokio::test]
async fn test_get_current_account_returns_profile() {
    let (_server, client) = common::setup_dropbox_mock().await;

    let account = client
        .get_current_account()
        .await
        .expect("get_current_account failed");

    assert_eq!(account.account_id, "dbid:test-account-001");
    assert_eq!(account.display_name, "Test User");
    assert_eq!(account.email, "test@example.com");
}

#[tokio::test]
async fn test_invalid_token_maps_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/get_current_account"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error_summary": "invalid_access_token/...",
            "error": {".tag": "invalid_access_token"}
        })))
        .mount(&server)
        .await;

    let client = DropboxClient::with_base_url("bad-token", server.uri());
    let err = client.get_current_account().await.unwrap_err();

    let dbx = err
        .downcast_ref::<DropboxError>()
        .expect("error should carry a DropboxError");
    assert!(dbx.is_auth());
}

#[tokio::test]
async fn test_probe_sends_bearer_token() {
    let (server, client) = common::setup_dropbox_mock().await;

    client.get_current_account().await.unwrap();

    let requests = common::requests_to(&server, "/users/get_current_account").await;
    assert_eq!(requests.len(), 1);
    let auth = requests[0].headers.get("authorization").unwrap();
    assert_eq!(auth.to_str().unwrap(), "Bearer test-access-token");
}
