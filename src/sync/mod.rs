//! One-directional content sync between a local tree and a bucket prefix.
//!
//! Only objects whose content fingerprint differs are transferred. Nothing
//! is ever deleted on the target.

pub mod diff;
pub mod endpoint;
pub mod engine;
pub mod hash;
pub mod index;
pub mod locator;
pub mod scheduler;

pub use diff::diff;
pub use endpoint::{join_key, Endpoint, REMOTE_SCHEME};
pub use engine::{sync, SyncEngine, SyncOptions, SyncPair, SyncReport};
pub use hash::{fingerprint_bytes, fingerprint_file, normalize_etag};
pub use index::{build_local_index, build_remote_index, FingerprintIndex};
pub use locator::{BucketLocator, DEFAULT_REGIONS};
pub use scheduler::{
    Direction, DispatchPolicy, ScheduleOutcome, TransferExecutor, TransferScheduler, TransferTask,
};
