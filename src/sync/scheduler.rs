//! Bounded parallel execution of transfer tasks.
//!
//! Two dispatch policies are supported:
//! - `Pool`: at most N tasks in flight, a new one starts as soon as a slot frees.
//! - `Batch`: up to N+1 tasks are launched together and the whole batch is
//!   drained, in launch order, before the next one starts.
//!
//! The first failing task stops dispatch. Tasks already running are allowed
//! to finish so the set of completed paths is exact.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{error, info};

use crate::error::{Result, SyncError};

/// Which way a transfer moves data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Local file -> remote key.
    Upload,
    /// Remote key -> local file.
    Download,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Upload => write!(f, "upload"),
            Direction::Download => write!(f, "download"),
        }
    }
}

/// One file to move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTask {
    /// Path relative to both endpoint roots.
    pub path: String,
    pub direction: Direction,
    /// Display locator of the source (`s3://bucket/key` or a local path).
    pub source: String,
    /// Display locator of the destination.
    pub destination: String,
}

/// Performs a single transfer. Returns the number of bytes moved.
#[async_trait]
pub trait TransferExecutor: Send + Sync {
    async fn execute(&self, task: &TransferTask) -> Result<u64>;
}

/// How tasks are dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchPolicy {
    #[default]
    Pool,
    Batch,
}

impl std::str::FromStr for DispatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pool" => Ok(DispatchPolicy::Pool),
            "batch" => Ok(DispatchPolicy::Batch),
            other => Err(format!("unknown dispatch policy: {} (expected pool or batch)", other)),
        }
    }
}

/// What a completed schedule did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleOutcome {
    /// Relative paths in completion order.
    pub completed: Vec<String>,
    pub bytes: u64,
}

type TaskResult = (TransferTask, Result<u64>);

async fn run_one(executor: Arc<dyn TransferExecutor>, task: TransferTask) -> TaskResult {
    let result = executor.execute(&task).await;
    (task, result)
}

/// Accumulates completions and remembers the first failure.
#[derive(Default)]
struct Tally {
    outcome: ScheduleOutcome,
    failure: Option<(String, SyncError)>,
}

impl Tally {
    fn record(&mut self, (task, result): TaskResult) {
        match result {
            Ok(bytes) => {
                info!("Completed sync: {} -> {}", task.source, task.destination);
                self.outcome.completed.push(task.path);
                self.outcome.bytes += bytes;
            }
            Err(err) => {
                error!(path = %task.path, error = %err, "transfer failed");
                if self.failure.is_none() {
                    self.failure = Some((task.path, err));
                }
            }
        }
    }

    /// A task that panicked or was cancelled counts as a failed transfer.
    fn record_join_error(&mut self, path: String, err: JoinError) {
        error!(path = %path, error = %err, "transfer task did not finish");
        if self.failure.is_none() {
            self.failure = Some((path, SyncError::Join(err)));
        }
    }

    fn failed(&self) -> bool {
        self.failure.is_some()
    }

    fn finish(self) -> Result<ScheduleOutcome> {
        match self.failure {
            Some((path, cause)) => Err(SyncError::TransferFailed {
                path,
                cause: Box::new(cause),
                completed: self.outcome.completed,
            }),
            None => Ok(self.outcome),
        }
    }
}

pub struct TransferScheduler {
    limit: usize,
    policy: DispatchPolicy,
}

impl TransferScheduler {
    pub fn new(limit: usize, policy: DispatchPolicy) -> Self {
        Self { limit, policy }
    }

    /// Run every task and wait for all of them.
    pub async fn run(
        &self,
        tasks: Vec<TransferTask>,
        executor: Arc<dyn TransferExecutor>,
    ) -> Result<ScheduleOutcome> {
        if self.limit == 0 {
            return Err(SyncError::InvalidConcurrency);
        }

        match self.policy {
            DispatchPolicy::Pool => self.run_pool(tasks, executor).await,
            DispatchPolicy::Batch => self.run_batches(tasks, executor).await,
        }
    }

    async fn run_pool(
        &self,
        tasks: Vec<TransferTask>,
        executor: Arc<dyn TransferExecutor>,
    ) -> Result<ScheduleOutcome> {
        let mut running = JoinSet::new();
        let mut paths: HashMap<Id, String> = HashMap::new();
        let mut tally = Tally::default();

        for task in tasks {
            // Free a slot before launching; the set never holds more than `limit` tasks.
            while running.len() >= self.limit {
                Self::join_one(&mut running, &mut paths, &mut tally).await;
            }
            if tally.failed() {
                break;
            }

            info!("Starting sync: {} -> {}", task.source, task.destination);
            let path = task.path.clone();
            let handle = running.spawn(run_one(executor.clone(), task));
            paths.insert(handle.id(), path);
        }

        while !running.is_empty() {
            Self::join_one(&mut running, &mut paths, &mut tally).await;
        }

        tally.finish()
    }

    async fn join_one(
        running: &mut JoinSet<TaskResult>,
        paths: &mut HashMap<Id, String>,
        tally: &mut Tally,
    ) {
        match running.join_next_with_id().await {
            Some(Ok((id, result))) => {
                paths.remove(&id);
                tally.record(result);
            }
            Some(Err(err)) => {
                let path = paths.remove(&err.id()).unwrap_or_default();
                tally.record_join_error(path, err);
            }
            None => {}
        }
    }

    async fn run_batches(
        &self,
        tasks: Vec<TransferTask>,
        executor: Arc<dyn TransferExecutor>,
    ) -> Result<ScheduleOutcome> {
        let batch_size = self.limit + 1;
        let total = tasks.len();
        let mut tally = Tally::default();
        let mut launched = 0;
        let mut pending = tasks.into_iter().peekable();

        while pending.peek().is_some() {
            let handles: Vec<_> = pending
                .by_ref()
                .take(batch_size)
                .map(|task| {
                    info!("Starting sync: {} -> {}", task.source, task.destination);
                    let path = task.path.clone();
                    (path, tokio::spawn(run_one(executor.clone(), task)))
                })
                .collect();
            launched += handles.len();

            if launched < total {
                info!("Maximum concurrent transfers running. Waiting.");
            }

            // Completion messages are consumed in launch order.
            for (path, handle) in handles {
                match handle.await {
                    Ok(result) => tally.record(result),
                    Err(err) => tally.record_join_error(path, err),
                }
            }

            if tally.failed() {
                break;
            }
        }

        tally.finish()
    }
}
