// Validation, resolution and transfer failures

use crate::common::{options, path_str, run_sync, write, MemoryStore};
use bucketsync::sync::{DispatchPolicy, SyncOptions};
use bucketsync::SyncError;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_invalid_pairs_never_touch_storage() {
    let dir = TempDir::new().unwrap();
    let missing = path_str(&dir.path().join("missing"));
    let store = Arc::new(MemoryStore::new());

    let cases = [
        (missing.clone(), "s3://media-bucket".to_string()),
        (missing.clone(), path_str(&dir.path().join("also-missing"))),
        (path_str(dir.path()), "s3://Not_A_Bucket".to_string()),
        (path_str(dir.path()), path_str(dir.path())),
        ("s3://media-bucket".to_string(), "s3://other-bucket".to_string()),
    ];

    for (source, target) in cases {
        let err = run_sync(&store, &source, &target, 2, options(DispatchPolicy::Pool))
            .await
            .unwrap_err();
        assert!(err.is_validation(), "{} -> {} gave {}", source, target, err);
    }
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_unknown_bucket_is_reported() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "x.txt", "hi");
    let store = Arc::new(MemoryStore::new());

    let elsewhere = SyncOptions {
        regions: vec!["us-east-1".to_string(), "us-west-2".to_string()],
        ..options(DispatchPolicy::Pool)
    };
    let err = run_sync(&store, &path_str(dir.path()), "s3://media-bucket", 2, elsewhere)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::BucketNotFound { probed: 2, .. }));
    assert!(store.take_puts().is_empty());
}

#[tokio::test]
async fn test_failed_upload_reports_completed_paths() {
    let dir = TempDir::new().unwrap();
    for name in ["a", "b", "c", "d"] {
        write(dir.path(), &format!("{}.txt", name), name);
    }
    let store = Arc::new(MemoryStore::failing_puts(&["c.txt"]));

    let err = run_sync(&store, &path_str(dir.path()), "s3://media-bucket", 1, options(DispatchPolicy::Pool))
        .await
        .unwrap_err();

    match &err {
        SyncError::TransferFailed { path, completed, .. } => {
            assert_eq!(path, "c.txt");
            assert_eq!(completed, &vec!["a.txt".to_string(), "b.txt".to_string()]);
        }
        other => panic!("unexpected error: {}", other),
    }
    // Objects written before the failure stay in place; nothing after it is attempted.
    assert_eq!(store.keys(), vec!["a.txt", "b.txt"]);
}
