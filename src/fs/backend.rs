use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by an object store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Backend(#[from] opendal::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Answer of a single region probe.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// The bucket answered from this region.
    Hosted,
    /// The service told us the bucket lives elsewhere (redirect).
    NotHosted,
    /// Any other failure. Not fatal for the candidate loop.
    Failed(StoreError),
}

/// A bucket together with the region it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedBucket {
    pub name: String,
    pub region: String,
}

impl ResolvedBucket {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
        }
    }

    /// `s3://bucket/key` form used in log lines and task locators.
    pub fn display_key(&self, key: &str) -> String {
        format!("s3://{}/{}", self.name, key.trim_start_matches('/'))
    }
}

/// One entry of a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Full key, relative to the bucket root.
    pub key: String,
    /// Integrity tag as returned by the service, possibly quoted.
    pub etag: Option<String>,
}

/// Credentials handed to the object store.
///
/// All fields empty means "use whatever the client finds in its environment".
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("AuthContext")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("session_token", &redact(&self.session_token))
            .finish()
    }
}

impl AuthContext {
    pub fn new(access_key_id: &str, secret_access_key: &str) -> Self {
        Self {
            access_key_id: Some(access_key_id.to_string()),
            secret_access_key: Some(secret_access_key.to_string()),
            session_token: None,
        }
    }

    /// Read the standard `AWS_*` variables. Missing or empty ones stay `None`.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            access_key_id: var("AWS_ACCESS_KEY_ID"),
            secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
            session_token: var("AWS_SESSION_TOKEN"),
        }
    }

    pub fn is_explicit(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }
}

/// Narrow object storage capability the sync engine runs against.
///
/// Implementations must be safe for concurrent calls on distinct keys.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lightweight check whether `bucket` is served from `region`.
    async fn probe(&self, bucket: &str, region: &str) -> ProbeOutcome;

    /// Complete listing of every object under `prefix` (empty for the whole bucket).
    async fn list_objects(
        &self,
        bucket: &ResolvedBucket,
        prefix: &str,
    ) -> Result<Vec<ObjectEntry>, StoreError>;

    async fn get_object(&self, bucket: &ResolvedBucket, key: &str) -> Result<Vec<u8>, StoreError>;

    async fn put_object(
        &self,
        bucket: &ResolvedBucket,
        key: &str,
        data: Vec<u8>,
    ) -> Result<(), StoreError>;
}
