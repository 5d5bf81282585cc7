pub mod backend;
pub mod local;
pub mod s3;

pub use backend::{AuthContext, ObjectEntry, ObjectStore, ProbeOutcome, ResolvedBucket, StoreError};
pub use local::LocalFs;
pub use s3::S3Store;
