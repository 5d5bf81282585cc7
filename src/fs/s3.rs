use async_trait::async_trait;
use futures::TryStreamExt;
use opendal::{services::S3, Operator};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::fs::backend::{
    AuthContext, ObjectEntry, ObjectStore, ProbeOutcome, ResolvedBucket, StoreError,
};

/// Error codes S3 answers with when a bucket is asked for in the wrong region.
const NOT_HOSTED_MARKERS: &[&str] = &[
    "PermanentRedirect",
    "AuthorizationHeaderMalformed",
    "301 Moved Permanently",
];

/// S3 and S3-compatible storage using OpenDAL.
///
/// One `Operator` is built per (bucket, region) pair and reused for the
/// lifetime of the store.
pub struct S3Store {
    auth: AuthContext,
    /// Endpoint template for S3-compatible providers, `{region}` is substituted.
    endpoint: Option<String>,
    operators: Mutex<HashMap<(String, String), Operator>>,
}

impl S3Store {
    /// Create a store talking to AWS S3.
    ///
    /// Without explicit keys OpenDAL falls back to the standard AWS credential
    /// chain (environment, shared credentials file, instance profile).
    pub fn new(auth: AuthContext) -> Self {
        debug!(explicit_credentials = auth.is_explicit(), "creating S3 store");
        Self {
            auth,
            endpoint: None,
            operators: Mutex::new(HashMap::new()),
        }
    }

    /// Use a custom endpoint, e.g. `https://s3.{region}.wasabisys.com`.
    pub fn with_endpoint(mut self, template: impl Into<String>) -> Self {
        self.endpoint = Some(template.into());
        self
    }

    fn endpoint_for(&self, region: &str) -> Option<String> {
        self.endpoint
            .as_ref()
            .map(|template| template.replace("{region}", region))
    }

    fn operator(&self, bucket: &str, region: &str) -> Result<Operator, StoreError> {
        let key = (bucket.to_string(), region.to_string());
        let mut cache = self
            .operators
            .lock()
            .map_err(|_| StoreError::Other("operator cache lock poisoned".to_string()))?;

        if let Some(op) = cache.get(&key) {
            return Ok(op.clone());
        }

        let mut builder = S3::default().root("/").bucket(bucket).region(region);

        if let Some(endpoint) = self.endpoint_for(region) {
            builder = builder.endpoint(&endpoint);
        }
        if let (Some(access_key), Some(secret_key)) =
            (&self.auth.access_key_id, &self.auth.secret_access_key)
        {
            builder = builder
                .access_key_id(access_key)
                .secret_access_key(secret_key);
        }
        if let Some(token) = &self.auth.session_token {
            builder = builder.session_token(token);
        }

        let op = Operator::new(builder)?.finish();
        cache.insert(key, op.clone());
        Ok(op)
    }
}

fn classify_probe_error(err: opendal::Error) -> ProbeOutcome {
    let message = err.to_string();
    if NOT_HOSTED_MARKERS.iter().any(|marker| message.contains(marker)) {
        ProbeOutcome::NotHosted
    } else {
        ProbeOutcome::Failed(err.into())
    }
}

/// Directory form of a key prefix as OpenDAL expects it for listing.
fn list_path(prefix: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        "/".to_string()
    } else {
        format!("{}/", prefix)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn probe(&self, bucket: &str, region: &str) -> ProbeOutcome {
        let op = match self.operator(bucket, region) {
            Ok(op) => op,
            Err(err) => return ProbeOutcome::Failed(err),
        };

        // A single-entry page is enough to prove the bucket answers here.
        let mut lister = match op.lister_with("/").limit(1).await {
            Ok(lister) => lister,
            Err(err) => return classify_probe_error(err),
        };

        match lister.try_next().await {
            Ok(_) => ProbeOutcome::Hosted,
            Err(err) => classify_probe_error(err),
        }
    }

    async fn list_objects(
        &self,
        bucket: &ResolvedBucket,
        prefix: &str,
    ) -> Result<Vec<ObjectEntry>, StoreError> {
        let op = self.operator(&bucket.name, &bucket.region)?;
        let path = list_path(prefix);

        // OpenDAL follows continuation tokens until the listing is exhausted.
        let entries = op.list_with(&path).recursive(true).await?;
        debug!(bucket = %bucket.name, prefix = %path, count = entries.len(), "listed objects");

        Ok(entries
            .into_iter()
            .filter(|entry| entry.metadata().mode().is_file())
            .map(|entry| ObjectEntry {
                key: entry.path().to_string(),
                etag: entry.metadata().etag().map(str::to_string),
            })
            .collect())
    }

    async fn get_object(&self, bucket: &ResolvedBucket, key: &str) -> Result<Vec<u8>, StoreError> {
        let op = self.operator(&bucket.name, &bucket.region)?;
        let content = op.read(key.trim_start_matches('/')).await?;
        Ok(content.to_vec())
    }

    async fn put_object(
        &self,
        bucket: &ResolvedBucket,
        key: &str,
        data: Vec<u8>,
    ) -> Result<(), StoreError> {
        let op = self.operator(&bucket.name, &bucket.region)?;
        op.write(key.trim_start_matches('/'), data).await?;
        Ok(())
    }
}
