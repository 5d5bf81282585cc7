//! Sync endpoints: a local directory or an `s3://bucket/prefix` locator.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

/// Scheme token that marks an endpoint as remote.
pub const REMOTE_SCHEME: &str = "s3://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Local { root: PathBuf },
    Remote { bucket: String, prefix: String },
}

impl Endpoint {
    /// Parse and validate an endpoint string.
    ///
    /// Remote locators are only checked for syntax; whether the bucket exists
    /// is decided later by region resolution. Local paths must be existing
    /// directories.
    pub fn parse(input: &str) -> Result<Self> {
        if looks_remote(input) {
            return Self::parse_remote(input);
        }

        let root = PathBuf::from(input);
        if input.is_empty() || !root.is_dir() {
            return Err(SyncError::LocalPathMissing { path: root });
        }
        Ok(Endpoint::Local { root })
    }

    fn parse_remote(input: &str) -> Result<Self> {
        let rest = &input[REMOTE_SCHEME.len()..];
        let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));

        validate_bucket_name(bucket).map_err(|reason| SyncError::InvalidEndpoint {
            endpoint: input.to_string(),
            reason,
        })?;

        Ok(Endpoint::Remote {
            bucket: bucket.to_string(),
            prefix: normalize_prefix(prefix),
        })
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Endpoint::Remote { .. })
    }

    pub fn local_root(&self) -> Option<&Path> {
        match self {
            Endpoint::Local { root } => Some(root),
            Endpoint::Remote { .. } => None,
        }
    }

    pub fn bucket(&self) -> Option<&str> {
        match self {
            Endpoint::Remote { bucket, .. } => Some(bucket),
            Endpoint::Local { .. } => None,
        }
    }

    /// Key prefix of a remote endpoint, empty for the bucket root and for local endpoints.
    pub fn prefix(&self) -> &str {
        match self {
            Endpoint::Remote { prefix, .. } => prefix,
            Endpoint::Local { .. } => "",
        }
    }

    /// Full object key for `relative` under this endpoint's prefix.
    pub fn key_for(&self, relative: &str) -> String {
        match self {
            Endpoint::Remote { prefix, .. } => join_key(prefix, relative),
            Endpoint::Local { .. } => relative.trim_start_matches('/').to_string(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Local { root } => write!(f, "{}", root.display()),
            Endpoint::Remote { bucket, prefix } if prefix.is_empty() => {
                write!(f, "{}{}", REMOTE_SCHEME, bucket)
            }
            Endpoint::Remote { bucket, prefix } => {
                write!(f, "{}{}/{}", REMOTE_SCHEME, bucket, prefix)
            }
        }
    }
}

/// True when the string carries the remote scheme token.
pub fn looks_remote(input: &str) -> bool {
    input.starts_with(REMOTE_SCHEME)
}

/// Join a key prefix and a relative path with exactly one separator.
pub fn join_key(prefix: &str, relative: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let relative = relative.trim_start_matches('/');
    if prefix.is_empty() {
        relative.to_string()
    } else {
        format!("{}/{}", prefix, relative)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    prefix
        .split('/')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn validate_bucket_name(bucket: &str) -> std::result::Result<(), String> {
    if bucket.is_empty() {
        return Err("missing bucket name".to_string());
    }
    if !(3..=63).contains(&bucket.len()) {
        return Err(format!("bucket name must be 3 to 63 characters, got {}", bucket.len()));
    }
    if let Some(bad) = bucket
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '.' || *c == '-'))
    {
        return Err(format!("bucket name contains invalid character {:?}", bad));
    }

    let is_alnum = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    if !is_alnum(bucket.chars().next()) || !is_alnum(bucket.chars().last()) {
        return Err("bucket name must start and end with a letter or digit".to_string());
    }
    Ok(())
}
