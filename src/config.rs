//! Settings loaded from `<config_dir>/bucketsync/config.toml`.
//!
//! ```toml
//! concurrency = 8
//! policy = "pool"            # or "batch"
//! regions = ["eu-west-1", "us-east-1"]
//! endpoint = "https://s3.{region}.wasabisys.com"
//! dry_run = false
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::sync::locator::default_regions;
use crate::sync::{DispatchPolicy, SyncOptions};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Maximum transfers in flight.
    pub concurrency: usize,
    pub policy: DispatchPolicy,
    /// Candidate regions for bucket lookup, probed in order.
    pub regions: Vec<String>,
    /// Endpoint template for S3-compatible providers.
    pub endpoint: Option<String>,
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            concurrency: num_cpus::get().max(1),
            policy: DispatchPolicy::default(),
            regions: default_regions(),
            endpoint: None,
            dry_run: false,
        }
    }
}

impl Settings {
    /// Default config file location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bucketsync").join("config.toml"))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields defaults. A missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| SyncError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Self::parse(&content).map_err(|reason| SyncError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        let settings: Settings = toml::from_str(content).map_err(|err| err.to_string())?;
        if settings.concurrency == 0 {
            return Err("concurrency must be at least 1".to_string());
        }
        if settings.regions.is_empty() {
            return Err("regions must not be empty".to_string());
        }
        Ok(settings)
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            regions: self.regions.clone(),
            policy: self.policy,
            dry_run: self.dry_run,
        }
    }
}
