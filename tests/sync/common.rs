// Shared fixtures: an in-memory object store and directory helpers

use async_trait::async_trait;
use bucketsync::fs::{ObjectEntry, ObjectStore, ProbeOutcome, ResolvedBucket, StoreError};
use bucketsync::sync::{fingerprint_bytes, DispatchPolicy, SyncEngine, SyncOptions, SyncPair, SyncReport};
use bucketsync::{AuthContext, Result};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const HOME_REGION: &str = "eu-west-1";

/// Bucket contents held in memory. ETags are quoted MD5 like S3 single-part uploads.
pub struct MemoryStore {
    region: String,
    objects: Mutex<BTreeMap<String, (Vec<u8>, String)>>,
    puts: Mutex<Vec<String>>,
    gets: Mutex<Vec<String>>,
    calls: AtomicUsize,
    fail_puts: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::failing_puts(&[])
    }

    pub fn failing_puts(keys: &[&str]) -> Self {
        Self {
            region: HOME_REGION.to_string(),
            objects: Mutex::new(BTreeMap::new()),
            puts: Mutex::new(Vec::new()),
            gets: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fail_puts: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn seed(&self, key: &str, data: &[u8]) {
        let etag = format!("\"{}\"", fingerprint_bytes(data));
        self.seed_with_etag(key, data, &etag);
    }

    pub fn seed_with_etag(&self, key: &str, data: &[u8], etag: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data.to_vec(), etag.to_string()));
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).map(|(data, _)| data.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    /// Keys put since the last call, sorted.
    pub fn take_puts(&self) -> Vec<String> {
        let mut puts = std::mem::take(&mut *self.puts.lock().unwrap());
        puts.sort();
        puts
    }

    /// Keys fetched since the last call, sorted.
    pub fn take_gets(&self) -> Vec<String> {
        let mut gets = std::mem::take(&mut *self.gets.lock().unwrap());
        gets.sort();
        gets
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check_bucket(&self, bucket: &ResolvedBucket) -> std::result::Result<(), StoreError> {
        if bucket.region != self.region {
            return Err(StoreError::Other(format!("wrong region {}", bucket.region)));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn probe(&self, _bucket: &str, region: &str) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if region == self.region {
            ProbeOutcome::Hosted
        } else {
            ProbeOutcome::NotHosted
        }
    }

    async fn list_objects(
        &self,
        bucket: &ResolvedBucket,
        prefix: &str,
    ) -> std::result::Result<Vec<ObjectEntry>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_bucket(bucket)?;

        let dir = if prefix.is_empty() { String::new() } else { format!("{}/", prefix) };
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key.starts_with(&dir))
            .map(|(key, (_, etag))| ObjectEntry {
                key: key.clone(),
                etag: Some(etag.clone()),
            })
            .collect())
    }

    async fn get_object(&self, bucket: &ResolvedBucket, key: &str) -> std::result::Result<Vec<u8>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_bucket(bucket)?;
        self.gets.lock().unwrap().push(key.to_string());
        self.object(key)
            .ok_or_else(|| StoreError::Other(format!("no such key: {}", key)))
    }

    async fn put_object(
        &self,
        bucket: &ResolvedBucket,
        key: &str,
        data: Vec<u8>,
    ) -> std::result::Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_bucket(bucket)?;
        if self.fail_puts.contains(key) {
            return Err(StoreError::Other(format!("injected failure for {}", key)));
        }
        self.puts.lock().unwrap().push(key.to_string());
        self.seed(key, &data);
        Ok(())
    }
}

pub fn options(policy: DispatchPolicy) -> SyncOptions {
    SyncOptions {
        regions: vec!["us-east-1".to_string(), HOME_REGION.to_string(), "ap-south-1".to_string()],
        policy,
        dry_run: false,
    }
}

/// Validate the pair and run one sync against `store`.
pub async fn run_sync(
    store: &Arc<MemoryStore>,
    source: &str,
    target: &str,
    concurrency: usize,
    options: SyncOptions,
) -> Result<SyncReport> {
    let pair = SyncPair::new(source, target, AuthContext::default(), concurrency)?;
    let store: Arc<dyn ObjectStore> = store.clone();
    SyncEngine::new(store, options).sync(&pair).await
}

pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn path_str(root: &Path) -> String {
    root.to_str().unwrap().to_string()
}
