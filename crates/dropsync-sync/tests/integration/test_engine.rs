//! End-to-end runs of the SyncEngine against a temporary local root and
//! the in-memory remote store

use dropsync_core::config::Config;
use dropsync_core::domain::{ConflictKind, RemotePath, SkipReason, WriteMode};
use dropsync_core::ports::{Answer, Direction, Outcome};
use dropsync_sync::context::RunContext;
use dropsync_sync::engine::{RunStatus, SyncMode};
use dropsync_sync::SyncError;
use tempfile::TempDir;

use crate::common::{self, harness, Call, MemoryRemoteStore, ScriptedPolicy};

fn downloads_store() -> MemoryRemoteStore {
    let store = MemoryRemoteStore::new();
    store.add_folder("/Downloads");
    store
}

fn context(dir: &TempDir) -> RunContext {
    RunContext::new(dir.path(), RemotePath::from_user_folder("Downloads"))
}

// ============================================================================
// Upload pass
// ============================================================================

#[tokio::test]
async fn test_upload_new_and_skip_matching() {
    let dir = TempDir::new().unwrap();
    common::write_local(&dir.path().join("a.txt"), b"0123456789", common::ts(0));
    common::write_local(&dir.path().join("b.txt"), b"hello", common::ts(30));

    let store = downloads_store();
    store.add_file("/Downloads/b.txt", b"hello", common::ts(30));
    let h = harness(
        store,
        ScriptedPolicy::always(Answer::Yes),
        SyncMode::Upload,
        &Config::default(),
    );
    let mut ctx = context(&dir);

    let status = h.engine.run(&mut ctx).await.unwrap();

    assert_eq!(status, RunStatus::Completed);
    assert_eq!(
        h.store.transfer_calls(),
        vec![Call::Upload {
            path: "/Downloads/a.txt".into(),
            mode: WriteMode::Add,
            bytes: 10,
        }]
    );
    let (meta, _) = h.store.file("/Downloads/a.txt").unwrap();
    assert_eq!(meta.size, 10);
    assert_eq!(meta.client_modified, common::ts(0));

    assert_eq!(ctx.counters.uploaded_new, 1);
    assert_eq!(ctx.counters.uploaded_updated, 0);
    assert_eq!(ctx.counters.bytes_uploaded, 10);

    let events = h.reporter.events();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[1].outcome,
        Outcome::Skipped {
            reason: SkipReason::StatsMatch
        }
    );
}

#[tokio::test]
async fn test_upload_skips_hidden_and_temp_files() {
    let dir = TempDir::new().unwrap();
    common::write_local(&dir.path().join(".secret"), b"s", common::ts(0));
    common::write_local(&dir.path().join("~$report.docx"), b"t", common::ts(0));
    common::write_local(&dir.path().join("notes.txt"), b"n", common::ts(0));
    common::write_local(&dir.path().join("__pycache__/mod.pyc"), b"p", common::ts(0));

    let h = harness(
        downloads_store(),
        ScriptedPolicy::always(Answer::Yes),
        SyncMode::Upload,
        &Config::default(),
    );
    let mut ctx = context(&dir);
    h.engine.run(&mut ctx).await.unwrap();

    assert!(h.store.file("/Downloads/notes.txt").is_some());
    assert!(h.store.file("/Downloads/.secret").is_none());
    assert!(h.store.file("/Downloads/~$report.docx").is_none());
    assert!(h.store.file("/Downloads/__pycache__/mod.pyc").is_none());
    assert_eq!(ctx.counters.uploaded_new, 1);
}

#[tokio::test]
async fn test_include_hidden_uploads_dotfiles() {
    let dir = TempDir::new().unwrap();
    common::write_local(&dir.path().join(".secret"), b"s", common::ts(0));

    let mut config = Config::default();
    config.sync.include_hidden = true;
    let h = harness(
        downloads_store(),
        ScriptedPolicy::always(Answer::Yes),
        SyncMode::Upload,
        &config,
    );
    let mut ctx = context(&dir);
    h.engine.run(&mut ctx).await.unwrap();

    assert!(h.store.file("/Downloads/.secret").is_some());
}

#[tokio::test]
async fn test_declined_descend_prunes_subtree() {
    let dir = TempDir::new().unwrap();
    common::write_local(&dir.path().join("top.txt"), b"t", common::ts(0));
    common::write_local(&dir.path().join("skip/x.txt"), b"x", common::ts(0));
    common::write_local(&dir.path().join("keep/y.txt"), b"y", common::ts(0));

    let policy = ScriptedPolicy::new(|message, _| {
        if message == "Descend into skip" {
            Answer::No
        } else {
            Answer::Yes
        }
    });
    let h = harness(downloads_store(), policy, SyncMode::Upload, &Config::default());
    let mut ctx = context(&dir);

    h.engine.run(&mut ctx).await.unwrap();

    assert!(h.store.file("/Downloads/top.txt").is_some());
    assert!(h.store.file("/Downloads/keep/y.txt").is_some());
    assert!(h.store.file("/Downloads/skip/x.txt").is_none());
    assert!(!h
        .store
        .calls()
        .contains(&Call::ListFolder("/Downloads/skip".into())));
}

#[tokio::test]
async fn test_upload_failure_continues_with_next_file() {
    let dir = TempDir::new().unwrap();
    common::write_local(&dir.path().join("a.txt"), b"aaa", common::ts(0));
    common::write_local(&dir.path().join("b.txt"), b"bbb", common::ts(0));

    let store = downloads_store();
    store.fail_upload("/Downloads/a.txt");
    let h = harness(
        store,
        ScriptedPolicy::always(Answer::Yes),
        SyncMode::Upload,
        &Config::default(),
    );
    let mut ctx = context(&dir);

    let status = h.engine.run(&mut ctx).await.unwrap();

    assert_eq!(status, RunStatus::Completed);
    assert!(h.store.file("/Downloads/b.txt").is_some());
    assert_eq!(ctx.counters.uploaded_new, 1);

    let events = h.reporter.events();
    assert!(events[0].path.ends_with("a.txt"));
    assert!(matches!(events[0].outcome, Outcome::Failed { .. }));
    assert!(matches!(events[1].outcome, Outcome::Uploaded { .. }));
}

#[tokio::test]
async fn test_abort_stops_run_and_keeps_counters() {
    let dir = TempDir::new().unwrap();
    common::write_local(&dir.path().join("a.txt"), b"aaa", common::ts(0));
    common::write_local(&dir.path().join("b.txt"), b"bbb", common::ts(0));

    let store = downloads_store();
    store.add_file("/Downloads/z.txt", b"remote only", common::ts(0));
    let policy = ScriptedPolicy::new(|message, _| {
        if message == "Upload and save b.txt" {
            Answer::Abort
        } else {
            Answer::Yes
        }
    });
    let h = harness(store, policy, SyncMode::Full, &Config::default());
    let mut ctx = context(&dir);

    let status = h.engine.run(&mut ctx).await.unwrap();

    assert_eq!(status, RunStatus::Aborted);
    assert_eq!(ctx.counters.uploaded_new, 1);
    assert!(h.store.file("/Downloads/b.txt").is_none());
    // The download pass never started.
    assert!(!dir.path().join("z.txt").exists());
}

// ============================================================================
// Download pass
// ============================================================================

#[tokio::test]
async fn test_download_overwrites_older_local_file() {
    let dir = TempDir::new().unwrap();
    common::write_local(&dir.path().join("c.txt"), b"old", common::ts(1_000));

    let store = downloads_store();
    store.add_file("/Downloads/c.txt", b"remote", common::ts(2_000));
    let h = harness(
        store,
        ScriptedPolicy::always(Answer::Yes),
        SyncMode::Download,
        &Config::default(),
    );
    let mut ctx = context(&dir);

    h.engine.run(&mut ctx).await.unwrap();

    let target = dir.path().join("c.txt");
    assert_eq!(std::fs::read(&target).unwrap(), b"remote");
    assert_eq!(common::local_mtime(&target), common::ts(2_000));
    assert_eq!(ctx.counters.downloaded_updated, 1);
    assert_eq!(ctx.counters.bytes_downloaded, 6);
    assert_eq!(
        h.reporter.events()[0].outcome,
        Outcome::Downloaded {
            overwrite: true,
            bytes: 6
        }
    );
}

#[tokio::test]
async fn test_download_creates_nested_directories() {
    let dir = TempDir::new().unwrap();
    let store = downloads_store();
    store.add_file("/Downloads/sub/deep/d.txt", b"deep", common::ts(50));
    let h = harness(
        store,
        ScriptedPolicy::always(Answer::Yes),
        SyncMode::Download,
        &Config::default(),
    );
    let mut ctx = context(&dir);

    h.engine.run(&mut ctx).await.unwrap();

    let target = dir.path().join("sub/deep/d.txt");
    assert_eq!(std::fs::read(&target).unwrap(), b"deep");
    assert_eq!(common::local_mtime(&target), common::ts(50));
    assert_eq!(ctx.counters.downloaded_new, 1);
    assert_eq!(h.reporter.events()[0].path, "/Downloads/sub/deep/d.txt");
}

#[tokio::test]
async fn test_download_leaves_newer_local_file() {
    let dir = TempDir::new().unwrap();
    common::write_local(&dir.path().join("c.txt"), b"local", common::ts(5_000));

    let store = downloads_store();
    store.add_file("/Downloads/c.txt", b"remote", common::ts(2_000));
    let h = harness(
        store,
        ScriptedPolicy::always(Answer::Yes),
        SyncMode::Download,
        &Config::default(),
    );
    let mut ctx = context(&dir);

    h.engine.run(&mut ctx).await.unwrap();

    assert_eq!(std::fs::read(dir.path().join("c.txt")).unwrap(), b"local");
    assert_eq!(ctx.counters.transfers(), 0);
    assert!(h.store.transfer_calls().is_empty());
}

#[tokio::test]
async fn test_local_file_blocking_folder_skips_subtree() {
    let dir = TempDir::new().unwrap();
    common::write_local(&dir.path().join("sub"), b"a file", common::ts(0));

    let store = downloads_store();
    store.add_file("/Downloads/sub/inner.txt", b"inner", common::ts(0));
    store.add_file("/Downloads/top.txt", b"top", common::ts(0));
    let h = harness(
        store,
        ScriptedPolicy::always(Answer::Yes),
        SyncMode::Download,
        &Config::default(),
    );
    let mut ctx = context(&dir);

    let status = h.engine.run(&mut ctx).await.unwrap();

    assert_eq!(status, RunStatus::Completed);
    assert!(dir.path().join("top.txt").exists());
    assert!(dir.path().join("sub").is_file());
    assert!(!h
        .store
        .calls()
        .contains(&Call::ListFolder("/Downloads/sub".into())));
    assert!(h
        .reporter
        .events()
        .iter()
        .any(|e| e.path == "/Downloads/sub" && matches!(e.outcome, Outcome::Failed { .. })));
}

#[tokio::test]
async fn test_local_directory_blocks_file_download() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("c.txt")).unwrap();

    let store = downloads_store();
    store.add_file("/Downloads/c.txt", b"remote", common::ts(0));
    let h = harness(
        store,
        ScriptedPolicy::always(Answer::Yes),
        SyncMode::Download,
        &Config::default(),
    );
    let mut ctx = context(&dir);

    h.engine.run(&mut ctx).await.unwrap();

    assert!(dir.path().join("c.txt").is_dir());
    assert_eq!(
        h.reporter.events()[0].outcome,
        Outcome::Conflict {
            conflict: ConflictKind::LocalDirectory
        }
    );
}

#[tokio::test]
async fn test_unsafe_remote_name_is_reported_and_skipped() {
    let dir = TempDir::new().unwrap();
    let store = downloads_store();
    store.add_file("/Downloads/bad\0name", b"x", common::ts(0));
    store.add_file("/Downloads/ok.txt", b"ok", common::ts(0));
    let h = harness(
        store,
        ScriptedPolicy::always(Answer::Yes),
        SyncMode::Download,
        &Config::default(),
    );
    let mut ctx = context(&dir);

    let status = h.engine.run(&mut ctx).await.unwrap();

    assert_eq!(status, RunStatus::Completed);
    assert!(dir.path().join("ok.txt").exists());
    let failed: Vec<_> = h
        .reporter
        .events()
        .into_iter()
        .filter(|e| matches!(e.outcome, Outcome::Failed { .. }))
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].path, "/Downloads/bad\0name");
    assert_eq!(failed[0].direction, Direction::Download);
}

#[tokio::test]
async fn test_unlistable_root_skips_download_pass() {
    let dir = TempDir::new().unwrap();
    let store = MemoryRemoteStore::new();
    store.add_file("/Elsewhere/x.txt", b"x", common::ts(0));
    let h = harness(
        store,
        ScriptedPolicy::always(Answer::Yes),
        SyncMode::Download,
        &Config::default(),
    );
    let mut ctx = context(&dir);

    let status = h.engine.run(&mut ctx).await.unwrap();

    assert_eq!(status, RunStatus::Completed);
    assert_eq!(h.store.calls(), vec![Call::ListFolder("/Downloads".into())]);
    assert!(h.reporter.events().is_empty());
}

// ============================================================================
// Full sync
// ============================================================================

#[tokio::test]
async fn test_full_sync_uploads_before_downloading() {
    let dir = TempDir::new().unwrap();
    common::write_local(&dir.path().join("a.txt"), b"local", common::ts(0));

    let store = downloads_store();
    store.add_file("/Downloads/z.txt", b"remote", common::ts(0));
    let h = harness(
        store,
        ScriptedPolicy::always(Answer::Yes),
        SyncMode::Full,
        &Config::default(),
    );
    let mut ctx = context(&dir);

    let status = h.engine.run(&mut ctx).await.unwrap();

    assert_eq!(status, RunStatus::Completed);
    assert!(h.store.file("/Downloads/a.txt").is_some());
    assert_eq!(std::fs::read(dir.path().join("z.txt")).unwrap(), b"remote");

    let events = h.reporter.events();
    let directions: Vec<Direction> = events.iter().map(|e| e.direction).collect();
    assert_eq!(
        directions,
        vec![Direction::Upload, Direction::Download, Direction::Download]
    );
    // The file just uploaded carries the local mtime, so it is not newer.
    assert_eq!(
        events[1].outcome,
        Outcome::Skipped {
            reason: SkipReason::NotNewer
        }
    );
    assert_eq!(ctx.counters.uploaded_new, 1);
    assert_eq!(ctx.counters.downloaded_new, 1);
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_authenticate_accepts_valid_token() {
    let h = harness(
        MemoryRemoteStore::new(),
        ScriptedPolicy::defaults(),
        SyncMode::Upload,
        &Config::default(),
    );

    let account = h.engine.authenticate().await.unwrap();
    assert_eq!(account.display_name, "Memory User");
}

#[tokio::test]
async fn test_authenticate_rejects_bad_token() {
    let store = MemoryRemoteStore::new();
    store.reject_token();
    let h = harness(
        store,
        ScriptedPolicy::defaults(),
        SyncMode::Upload,
        &Config::default(),
    );

    let err = h.engine.authenticate().await.unwrap_err();
    assert!(matches!(err, SyncError::Auth(_)));
    assert!(!err.is_recoverable());
}
