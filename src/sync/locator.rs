//! Bucket region discovery.
//!
//! Probes a fixed list of candidate regions and stops at the first one that
//! answers for the bucket.

use tracing::{debug, info};

use crate::error::{Result, SyncError};
use crate::fs::{ObjectStore, ProbeOutcome, ResolvedBucket};

/// Regions probed when no list is configured.
pub const DEFAULT_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "ca-central-1",
    "eu-west-1",
    "eu-west-2",
    "eu-central-1",
    "eu-north-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "ap-south-1",
    "sa-east-1",
];

pub fn default_regions() -> Vec<String> {
    DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect()
}

pub struct BucketLocator<'a> {
    store: &'a dyn ObjectStore,
    regions: &'a [String],
}

impl<'a> BucketLocator<'a> {
    pub fn new(store: &'a dyn ObjectStore, regions: &'a [String]) -> Self {
        Self { store, regions }
    }

    /// Find the region hosting `bucket`.
    ///
    /// Redirect answers and other probe failures only skip the candidate.
    /// Exhausting the list is a `BucketNotFound` error.
    pub async fn locate(&self, bucket: &str) -> Result<ResolvedBucket> {
        for region in self.regions {
            debug!(bucket, region = %region, "probing region");

            match self.store.probe(bucket, region).await {
                ProbeOutcome::Hosted => {
                    info!(bucket, region = %region, "found bucket");
                    return Ok(ResolvedBucket::new(bucket, region.as_str()));
                }
                ProbeOutcome::NotHosted => {
                    debug!(bucket, region = %region, "bucket not hosted here");
                }
                ProbeOutcome::Failed(err) => {
                    debug!(bucket, region = %region, error = %err, "probe failed, trying next region");
                }
            }
        }

        Err(SyncError::BucketNotFound {
            bucket: bucket.to_string(),
            probed: self.regions.len(),
        })
    }
}
