//! Integration tests for downloads, single-call uploads and upload sessions

use chrono::{TimeZone, Utc};
use dropsync_core::domain::{RemotePath, TransferSession, WriteMode};
use dropsync_core::ports::IRemoteStore;
use wiremock::ResponseTemplate;

use dropsync_dropbox::client::API_RESULT_HEADER;

use crate::common;

#[tokio::test]
async fn test_download_returns_metadata_and_bytes() {
    let (server, store) = common::setup_store_mock().await;
    let meta = common::file_json("c.txt", 5, "2024-03-01T08:30:00Z");
    common::mount_content(
        &server,
        "/files/download",
        ResponseTemplate::new(200)
            .insert_header(API_RESULT_HEADER, meta.to_string().as_str())
            .set_body_bytes(b"hello".to_vec()),
    )
    .await;

    let path = RemotePath::from_segments(["Downloads", "c.txt"]);
    let (meta, data) = store.download(&path).await.expect("download failed");

    assert_eq!(data, b"hello");
    assert_eq!(meta.size, 5);
    assert_eq!(
        meta.client_modified,
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap()
    );

    let requests = common::requests_to(&server, "/files/download").await;
    assert_eq!(common::api_arg(&requests[0])["path"], "/Downloads/c.txt");
}

#[tokio::test]
async fn test_download_without_result_header_fails() {
    let (server, store) = common::setup_store_mock().await;
    common::mount_content(
        &server,
        "/files/download",
        ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()),
    )
    .await;

    let result = store.download(&RemotePath::from_segments(["x"])).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_upload_sends_commit_info() {
    let (server, store) = common::setup_store_mock().await;
    common::mount_content(
        &server,
        "/files/upload",
        ResponseTemplate::new(200).set_body_json(common::file_json(
            "a.txt",
            10,
            "2024-01-01T10:00:00Z",
        )),
    )
    .await;

    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
    let meta = store
        .upload(
            &RemotePath::from_segments(["Downloads", "a.txt"]),
            b"0123456789".to_vec(),
            WriteMode::Add,
            ts,
        )
        .await
        .expect("upload failed");
    assert_eq!(meta.name, "a.txt");

    let requests = common::requests_to(&server, "/files/upload").await;
    assert_eq!(requests.len(), 1);
    let arg = common::api_arg(&requests[0]);
    assert_eq!(arg["path"], "/Downloads/a.txt");
    assert_eq!(arg["mode"], "add");
    assert_eq!(arg["client_modified"], "2024-01-01T10:00:00Z");
    assert_eq!(requests[0].body, b"0123456789");
}

#[tokio::test]
async fn test_upload_non_ascii_path_is_header_safe() {
    let (server, store) = common::setup_store_mock().await;
    common::mount_content(
        &server,
        "/files/upload",
        ResponseTemplate::new(200).set_body_json(common::file_json(
            "caf\u{e9}.txt",
            1,
            "2024-01-01T10:00:00Z",
        )),
    )
    .await;

    store
        .upload(
            &RemotePath::from_segments(["caf\u{e9}.txt"]),
            b"x".to_vec(),
            WriteMode::Overwrite,
            Utc::now(),
        )
        .await
        .unwrap();

    let requests = common::requests_to(&server, "/files/upload").await;
    assert_eq!(common::api_arg(&requests[0])["path"], "/caf\u{e9}.txt");
}

#[tokio::test]
async fn test_upload_conflict_surfaces_error_summary() {
    let (server, store) = common::setup_store_mock().await;
    common::mount_content(
        &server,
        "/files/upload",
        ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "error_summary": "path/conflict/file/..",
            "error": {".tag": "path"}
        })),
    )
    .await;

    let err = store
        .upload(
            &RemotePath::from_segments(["A.txt"]),
            b"x".to_vec(),
            WriteMode::Add,
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("path/conflict/file"));
}

#[tokio::test]
async fn test_upload_session_round() {
    let (server, store) = common::setup_store_mock().await;
    common::mount_content(
        &server,
        "/files/upload_session/start",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"session_id": "sess-1"})),
    )
    .await;
    common::mount_content(
        &server,
        "/files/upload_session/append_v2",
        ResponseTemplate::new(200).set_body_json(serde_json::Value::Null),
    )
    .await;
    common::mount_content(
        &server,
        "/files/upload_session/finish",
        ResponseTemplate::new(200).set_body_json(common::file_json(
            "big.bin",
            12,
            "2024-01-01T10:00:00Z",
        )),
    )
    .await;

    let session_id = store
        .upload_session_start(b"aaaa".to_vec())
        .await
        .expect("start failed");
    assert_eq!(session_id, "sess-1");

    store
        .upload_session_append(b"bbbb".to_vec(), &session_id, 4)
        .await
        .expect("append failed");

    let mut session = TransferSession::new(
        session_id,
        RemotePath::from_segments(["big.bin"]),
        WriteMode::Add,
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
    );
    session.advance(8);
    let meta = store
        .upload_session_finish(b"cccc".to_vec(), &session)
        .await
        .expect("finish failed");
    assert_eq!(meta.size, 12);

    let append = common::requests_to(&server, "/files/upload_session/append_v2").await;
    let arg = common::api_arg(&append[0]);
    assert_eq!(arg["cursor"]["session_id"], "sess-1");
    assert_eq!(arg["cursor"]["offset"], 4);

    let finish = common::requests_to(&server, "/files/upload_session/finish").await;
    let arg = common::api_arg(&finish[0]);
    assert_eq!(arg["cursor"]["offset"], 8);
    assert_eq!(arg["commit"]["path"], "/big.bin");
    assert_eq!(arg["commit"]["client_modified"], "2024-01-01T10:00:00Z");
    assert_eq!(finish[0].body, b"cccc");
}
