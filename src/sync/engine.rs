//! Sync engine for one-directional local <-> bucket synchronization.
//!
//! Validates the endpoint pair, resolves the bucket region, indexes both
//! sides, diffs them and hands the work set to the transfer scheduler.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::error::{Result, SyncError};
use crate::fs::{AuthContext, LocalFs, ObjectStore, ResolvedBucket, S3Store};
use crate::sync::diff::diff;
use crate::sync::endpoint::Endpoint;
use crate::sync::index::{build_local_index_async, build_remote_index, FingerprintIndex};
use crate::sync::locator::{default_regions, BucketLocator};
use crate::sync::scheduler::{
    DispatchPolicy, Direction, TransferExecutor, TransferScheduler, TransferTask,
};

/// A validated source/target pair. Immutable for the duration of a sync.
#[derive(Debug, Clone)]
pub struct SyncPair {
    source: Endpoint,
    target: Endpoint,
    auth: AuthContext,
    concurrency: usize,
}

impl SyncPair {
    /// Validate both endpoints and the concurrency limit.
    ///
    /// Exactly one side must be remote. Nothing here talks to storage.
    pub fn new(source: &str, target: &str, auth: AuthContext, concurrency: usize) -> Result<Self> {
        let source_endpoint = Endpoint::parse(source)?;
        let target_endpoint = Endpoint::parse(target)?;

        if source_endpoint.is_remote() == target_endpoint.is_remote() {
            return Err(SyncError::SameKindEndpoints {
                source_endpoint: source.to_string(),
                target_endpoint: target.to_string(),
            });
        }
        if concurrency == 0 {
            return Err(SyncError::InvalidConcurrency);
        }

        Ok(Self {
            source: source_endpoint,
            target: target_endpoint,
            auth,
            concurrency,
        })
    }

    pub fn source(&self) -> &Endpoint {
        &self.source
    }

    pub fn target(&self) -> &Endpoint {
        &self.target
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Remote -> local when the source is remote, local -> remote otherwise.
    pub fn direction(&self) -> Direction {
        if self.source.is_remote() {
            Direction::Download
        } else {
            Direction::Upload
        }
    }

    /// (local root, remote endpoint) regardless of direction.
    fn sides(&self) -> (PathBuf, &Endpoint) {
        let (local, remote) = match self.direction() {
            Direction::Upload => (&self.source, &self.target),
            Direction::Download => (&self.target, &self.source),
        };
        let root = local.local_root().map(PathBuf::from).unwrap_or_default();
        (root, remote)
    }
}

/// Engine options.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Candidate regions probed in order.
    pub regions: Vec<String>,
    pub policy: DispatchPolicy,
    /// Compute the work set but transfer nothing.
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            regions: default_regions(),
            policy: DispatchPolicy::Pool,
            dry_run: false,
        }
    }
}

/// Result of a successful sync.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub direction: Direction,
    pub bucket: ResolvedBucket,
    pub source_files: usize,
    pub target_files: usize,
    /// Paths transferred, or that would be in a dry run.
    pub transferred: Vec<String>,
    pub bytes_transferred: u64,
    pub dry_run: bool,
    pub duration: Duration,
}

/// Moves single files between the local root and the resolved bucket.
struct StoreTransfer {
    store: Arc<dyn ObjectStore>,
    bucket: ResolvedBucket,
    local_root: PathBuf,
    remote: Endpoint,
}

#[async_trait]
impl TransferExecutor for StoreTransfer {
    async fn execute(&self, task: &TransferTask) -> Result<u64> {
        let local_path = LocalFs::path_for_key(&self.local_root, &task.path)?;
        let key = self.remote.key_for(&task.path);

        match task.direction {
            Direction::Upload => {
                let data = tokio::task::spawn_blocking(move || LocalFs::read_file(&local_path)).await??;
                let len = data.len() as u64;
                self.store.put_object(&self.bucket, &key, data).await?;
                Ok(len)
            }
            Direction::Download => {
                let data = self.store.get_object(&self.bucket, &key).await?;
                let len = data.len() as u64;
                tokio::task::spawn_blocking(move || LocalFs::write_file(&local_path, &data)).await??;
                Ok(len)
            }
        }
    }
}

/// Sync engine for orchestrating sync operations.
pub struct SyncEngine {
    store: Arc<dyn ObjectStore>,
    options: SyncOptions,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn ObjectStore>, options: SyncOptions) -> Self {
        Self { store, options }
    }

    /// Perform a sync operation.
    pub async fn sync(&self, pair: &SyncPair) -> Result<SyncReport> {
        let started = Instant::now();
        let direction = pair.direction();
        let (local_root, remote) = pair.sides();
        let prefix = remote.prefix();

        info!(source = %pair.source(), target = %pair.target(), %direction, "starting sync");

        let bucket = BucketLocator::new(self.store.as_ref(), &self.options.regions)
            .locate(remote.bucket().unwrap_or_default())
            .await?;

        let local_index = build_local_index_async(local_root.clone()).await?;
        let remote_index = build_remote_index(self.store.as_ref(), &bucket, prefix).await?;

        let (source_index, target_index): (&FingerprintIndex, &FingerprintIndex) = match direction {
            Direction::Upload => (&local_index, &remote_index),
            Direction::Download => (&remote_index, &local_index),
        };
        let changed = diff(source_index, target_index);
        info!(
            source_files = source_index.len(),
            target_files = target_index.len(),
            changed = changed.len(),
            "computed work set"
        );

        let mut report = SyncReport {
            direction,
            bucket: bucket.clone(),
            source_files: source_index.len(),
            target_files: target_index.len(),
            transferred: Vec::new(),
            bytes_transferred: 0,
            dry_run: self.options.dry_run,
            duration: Duration::ZERO,
        };

        if self.options.dry_run {
            for path in &changed {
                info!(path = %path, "would transfer");
            }
            report.transferred = changed;
            report.duration = started.elapsed();
            return Ok(report);
        }

        let tasks: Vec<TransferTask> = changed
            .into_iter()
            .map(|path| Self::task_for(direction, &bucket, remote, &local_root, path))
            .collect();

        let executor = Arc::new(StoreTransfer {
            store: self.store.clone(),
            bucket,
            local_root,
            remote: remote.clone(),
        });

        let outcome = TransferScheduler::new(pair.concurrency(), self.options.policy)
            .run(tasks, executor)
            .await?;

        report.transferred = outcome.completed;
        report.bytes_transferred = outcome.bytes;
        report.duration = started.elapsed();

        info!(
            transferred = report.transferred.len(),
            bytes = report.bytes_transferred,
            elapsed_ms = report.duration.as_millis() as u64,
            "sync complete"
        );
        Ok(report)
    }

    fn task_for(
        direction: Direction,
        bucket: &ResolvedBucket,
        remote: &Endpoint,
        local_root: &Path,
        path: String,
    ) -> TransferTask {
        let remote = bucket.display_key(&remote.key_for(&path));
        let local = local_root.join(&path).display().to_string();

        let (source, destination) = match direction {
            Direction::Upload => (local, remote),
            Direction::Download => (remote, local),
        };

        TransferTask {
            path,
            direction,
            source,
            destination,
        }
    }
}

/// Synchronous entry point: sync `source` to `target` against AWS S3.
///
/// Builds its own tokio runtime; do not call from inside an async context.
pub fn sync(source: &str, target: &str, auth: AuthContext, concurrency: usize) -> Result<SyncReport> {
    let pair = SyncPair::new(source, target, auth, concurrency)?;
    let store: Arc<dyn ObjectStore> = Arc::new(S3Store::new(pair.auth().clone()));
    let engine = SyncEngine::new(store, SyncOptions::default());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(SyncError::Runtime)?;

    runtime.block_on(engine.sync(&pair))
}
