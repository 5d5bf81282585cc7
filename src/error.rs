//! Error types for sync operations.
//!
//! `SyncError` is what every public operation returns. Validation errors are
//! raised before any storage call is made; everything else aborts the sync
//! at the point of failure.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::fs::StoreError;

/// Main error type for a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Endpoint string is neither an existing local directory nor a well-formed remote locator.
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Local endpoint does not exist or is not a directory.
    #[error("local path not found or not a directory: {}", path.display())]
    LocalPathMissing { path: PathBuf },

    /// Both sides are local, or both are remote.
    #[error("exactly one endpoint must be remote (source {source_endpoint:?}, target {target_endpoint:?})")]
    SameKindEndpoints {
        source_endpoint: String,
        target_endpoint: String,
    },

    #[error("concurrency limit must be at least 1")]
    InvalidConcurrency,

    /// No candidate region answered the probe for this bucket.
    #[error("bucket {bucket:?} not found in any of {probed} probed regions")]
    BucketNotFound { bucket: String, probed: usize },

    /// Building a fingerprint index failed; no partial index is kept.
    #[error("failed to index {endpoint}: {cause}")]
    Index { endpoint: String, cause: String },

    /// A local file name cannot be expressed as an object key.
    #[error("file name is not valid UTF-8: {}", path.display())]
    NonUtf8Path { path: PathBuf },

    /// A remote key would resolve outside the local target root.
    #[error("refusing to write key {key:?} outside the target directory")]
    UnsafeKey { key: String },

    /// A transfer failed. `completed` lists the paths that finished before it.
    #[error("transfer of {path} failed after {} completed: {cause}", completed.len())]
    TransferFailed {
        path: String,
        cause: Box<SyncError>,
        completed: Vec<String>,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid configuration {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("transfer task panicked or was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),
}

impl SyncError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors raised before any storage call was attempted.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidEndpoint { .. }
                | SyncError::LocalPathMissing { .. }
                | SyncError::SameKindEndpoints { .. }
                | SyncError::InvalidConcurrency
        )
    }

    /// Paths that finished before a transfer failure. Empty for other errors.
    pub fn completed_paths(&self) -> &[String] {
        match self {
            SyncError::TransferFailed { completed, .. } => completed,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
