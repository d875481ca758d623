//! Integration tests for the Remote Lister's cursor protocol

use std::sync::Arc;

use dropsync_core::domain::RemotePath;
use dropsync_sync::lister::RemoteLister;
use dropsync_sync::SyncError;

use crate::common::{self, Call, MemoryRemoteStore};

fn populated(page_size: usize, count: usize) -> Arc<MemoryRemoteStore> {
    let store = MemoryRemoteStore::with_page_size(page_size);
    store.add_folder("/Docs");
    for i in 0..count {
        store.add_file(&format!("/Docs/f{:02}.txt", i), b"x", common::ts(0));
    }
    Arc::new(store)
}

#[tokio::test]
async fn test_k_pages_issue_k_minus_one_continuations() {
    let store = populated(3, 7);
    let lister = RemoteLister::new(store.clone());

    let entries = lister
        .list_all(&RemotePath::from_segments(["Docs"]))
        .await
        .unwrap();

    let names: Vec<&str> = entries.iter().map(|e| e.name()).collect();
    let expected: Vec<String> = (0..7).map(|i| format!("f{:02}.txt", i)).collect();
    assert_eq!(names, expected);

    let calls = store.calls();
    let continues = calls
        .iter()
        .filter(|c| matches!(c, Call::ListContinue(_)))
        .count();
    assert_eq!(continues, 2);
    assert_eq!(calls[0], Call::ListFolder("/Docs".to_string()));
}

#[tokio::test]
async fn test_single_page_issues_no_continuation() {
    let store = populated(10, 4);
    let lister = RemoteLister::new(store.clone());

    let entries = lister
        .list_all(&RemotePath::from_segments(["Docs"]))
        .await
        .unwrap();

    assert_eq!(entries.len(), 4);
    assert_eq!(store.calls().len(), 1);
}

#[tokio::test]
async fn test_page_limit_truncates_listing() {
    let store = populated(2, 6);
    let lister = RemoteLister::new(store.clone()).with_page_limit(2);

    let entries = lister
        .list_all(&RemotePath::from_segments(["Docs"]))
        .await
        .unwrap();

    assert_eq!(entries.len(), 4);
    assert_eq!(store.calls().len(), 2);
}

#[tokio::test]
async fn test_listing_failure_is_an_empty_directory() {
    let store = populated(10, 3);
    store.fail_listing("/Docs");
    let lister = RemoteLister::new(store.clone());
    let path = RemotePath::from_segments(["Docs"]);

    let err = lister.list_all(&path).await.unwrap_err();
    assert!(matches!(err, SyncError::Listing { .. }));
    assert!(err.is_recoverable());

    assert!(lister.list_or_empty(&path).await.is_empty());
    assert!(lister.listing(&path).await.is_empty());
}

#[tokio::test]
async fn test_probe_distinguishes_missing_folder() {
    let store = populated(10, 1);
    let lister = RemoteLister::new(store);

    assert!(lister.probe(&RemotePath::from_segments(["Docs"])).await.is_ok());
    assert!(lister.probe(&RemotePath::root()).await.is_ok());
    assert!(lister
        .probe(&RemotePath::from_segments(["Missing"]))
        .await
        .is_err());
}

#[tokio::test]
async fn test_listing_map_uses_nfc_names() {
    let store = MemoryRemoteStore::new();
    store.add_file("/Docs/cafe\u{301}.txt", b"x", common::ts(0));
    let lister = RemoteLister::new(Arc::new(store));

    let listing = lister.listing(&RemotePath::from_segments(["Docs"])).await;
    assert!(listing.get("caf\u{e9}.txt").is_some());
}
