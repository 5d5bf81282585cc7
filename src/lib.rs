// Library module for bucketsync
// Re-exports modules for use in integration tests and the CLI

pub mod config;
pub mod error;
pub mod fs;
pub mod logging;
pub mod sync;

pub use config::Settings;
pub use error::{Result, SyncError};
pub use fs::{AuthContext, ObjectStore, S3Store};
pub use sync::{sync, SyncEngine, SyncOptions, SyncPair, SyncReport};
