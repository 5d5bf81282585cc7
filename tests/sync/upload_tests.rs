// Local directory -> bucket

use crate::common::{options, path_str, run_sync, write, MemoryStore, HOME_REGION};
use bucketsync::sync::{Direction, DispatchPolicy, SyncOptions};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_upload_only_changed_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "x.txt", "hi");
    write(dir.path(), "y.txt", "bye");
    let store = Arc::new(MemoryStore::new());

    let report = run_sync(&store, &path_str(dir.path()), "s3://media-bucket", 4, options(DispatchPolicy::Pool))
        .await
        .unwrap();
    assert_eq!(store.take_puts(), vec!["x.txt", "y.txt"]);
    assert_eq!(report.direction, Direction::Upload);
    assert_eq!(report.bucket.region, HOME_REGION);
    assert_eq!(report.bytes_transferred, 5);

    // Second run with no changes transfers nothing.
    let report = run_sync(&store, &path_str(dir.path()), "s3://media-bucket", 4, options(DispatchPolicy::Pool))
        .await
        .unwrap();
    assert!(store.take_puts().is_empty());
    assert!(report.transferred.is_empty());
    assert_eq!(report.target_files, 2);

    write(dir.path(), "x.txt", "hello again");
    run_sync(&store, &path_str(dir.path()), "s3://media-bucket", 4, options(DispatchPolicy::Pool))
        .await
        .unwrap();
    assert_eq!(store.take_puts(), vec!["x.txt"]);
    assert_eq!(store.object("x.txt").unwrap(), b"hello again");
}

#[tokio::test]
async fn test_upload_with_batch_policy() {
    let dir = TempDir::new().unwrap();
    for name in ["a", "b", "c", "d", "e"] {
        write(dir.path(), &format!("{}.txt", name), name);
    }
    let store = Arc::new(MemoryStore::new());

    let report = run_sync(&store, &path_str(dir.path()), "s3://media-bucket", 2, options(DispatchPolicy::Batch))
        .await
        .unwrap();

    assert_eq!(report.transferred.len(), 5);
    assert_eq!(store.take_puts(), vec!["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"]);
}

#[tokio::test]
async fn test_upload_under_prefix_with_nested_dirs() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "index.html", "<html>");
    write(dir.path(), "assets/css/site.css", "body {}");
    let store = Arc::new(MemoryStore::new());
    // same name under a sibling prefix must not count as already synced
    store.seed("www-old/index.html", b"<html>");

    run_sync(&store, &path_str(dir.path()), "s3://media-bucket/www/", 2, options(DispatchPolicy::Pool))
        .await
        .unwrap();

    assert_eq!(store.take_puts(), vec!["www/assets/css/site.css", "www/index.html"]);
    assert_eq!(store.object("www/assets/css/site.css").unwrap(), b"body {}");
}

#[tokio::test]
async fn test_target_only_objects_are_kept() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "keep.txt", "k");
    let store = Arc::new(MemoryStore::new());
    store.seed("extra.txt", b"only remote");

    let report = run_sync(&store, &path_str(dir.path()), "s3://media-bucket", 1, options(DispatchPolicy::Pool))
        .await
        .unwrap();

    assert_eq!(report.transferred, vec!["keep.txt"]);
    assert_eq!(store.keys(), vec!["extra.txt", "keep.txt"]);
}

#[tokio::test]
async fn test_dry_run_transfers_nothing() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "x.txt", "hi");
    write(dir.path(), "y.txt", "bye");
    let store = Arc::new(MemoryStore::new());
    store.seed("y.txt", b"bye");

    let dry = SyncOptions {
        dry_run: true,
        ..options(DispatchPolicy::Pool)
    };
    let report = run_sync(&store, &path_str(dir.path()), "s3://media-bucket", 4, dry).await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.transferred, vec!["x.txt"]);
    assert!(store.take_puts().is_empty());
    assert!(store.object("x.txt").is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn test_upload_skips_symlinked_directory() {
    let dir = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    write(dir.path(), "x.txt", "hi");
    write(elsewhere.path(), "outside.txt", "not mine");
    std::os::unix::fs::symlink(elsewhere.path(), dir.path().join("linked")).unwrap();
    let store = Arc::new(MemoryStore::new());

    let report = run_sync(&store, &path_str(dir.path()), "s3://media-bucket", 2, options(DispatchPolicy::Pool))
        .await
        .unwrap();

    assert_eq!(report.source_files, 1);
    assert_eq!(store.take_puts(), vec!["x.txt"]);
}
