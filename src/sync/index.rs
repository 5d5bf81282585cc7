//! Fingerprint indices: relative path -> content fingerprint for one endpoint.
//!
//! Built fresh for every sync run and never persisted. Any read or listing
//! error fails the whole build; there is no partial index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::fs::{LocalFs, ObjectStore, ResolvedBucket};
use crate::sync::hash::{fingerprint_file, normalize_etag};

/// Mapping from forward-slash relative path to fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FingerprintIndex {
    entries: HashMap<String, String>,
}

impl FingerprintIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, fingerprint: impl Into<String>) {
        self.entries.insert(path.into(), fingerprint.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FingerprintIndex {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (path, fingerprint) in iter {
            index.insert(path, fingerprint);
        }
        index
    }
}

/// Walk `root` and fingerprint every regular file under it.
pub fn build_local_index(root: &Path) -> Result<FingerprintIndex> {
    let mut index = FingerprintIndex::new();

    for file in LocalFs::walk_files(root)? {
        let fingerprint = fingerprint_file(&file.path)?;
        index.insert(file.key, fingerprint);
    }

    debug!(root = %root.display(), files = index.len(), "indexed local tree");
    Ok(index)
}

/// Same as [`build_local_index`], run on the blocking thread pool.
pub async fn build_local_index_async(root: PathBuf) -> Result<FingerprintIndex> {
    tokio::task::spawn_blocking(move || build_local_index(&root)).await?
}

/// List every object under `prefix` and index it by its integrity tag.
pub async fn build_remote_index(
    store: &dyn ObjectStore,
    bucket: &ResolvedBucket,
    prefix: &str,
) -> Result<FingerprintIndex> {
    let entries = store
        .list_objects(bucket, prefix)
        .await
        .map_err(|err| SyncError::Index {
            endpoint: bucket.display_key(prefix),
            cause: err.to_string(),
        })?;

    let dir_prefix = if prefix.is_empty() {
        String::new()
    } else {
        format!("{}/", prefix.trim_matches('/'))
    };

    let mut index = FingerprintIndex::new();
    for entry in entries {
        let Some(relative) = entry.key.trim_start_matches('/').strip_prefix(&dir_prefix) else {
            continue;
        };
        if relative.is_empty() {
            continue;
        }

        let fingerprint = match entry.etag.as_deref() {
            Some(etag) => normalize_etag(etag),
            None => {
                warn!(key = %entry.key, "object has no ETag, it will always be transferred");
                String::new()
            }
        };
        index.insert(relative, fingerprint);
    }

    debug!(bucket = %bucket.name, prefix, objects = index.len(), "indexed bucket prefix");
    Ok(index)
}
