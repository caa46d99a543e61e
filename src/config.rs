// src/config.rs
use std::{path::PathBuf, time::Duration};

use crate::error::{Error, Result};

/// Public-administration registry published by IndicePA: one row per
/// e-invoicing office, tab separated, with a header row.
pub const DEFAULT_REGISTRY_URL: &str =
    "https://www.indicepa.gov.it/public-services/opendata-read-service.php?dstype=FS&filename=serv_fatt.txt";

const DEFAULT_REGISTRY_TIMEOUT_SECS: u64 = 300;

pub const BUCKET_NAME: &str = "BUCKET_NAME";
pub const REGISTRY_URL: &str = "REGISTRY_URL";
pub const REGISTRY_TIMEOUT_SECS: &str = "REGISTRY_TIMEOUT_SECS";
pub const LOCAL_STORAGE_DIR: &str = "LOCAL_STORAGE_DIR";

/// Settings shared by the loader and the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// GCS bucket, or the sub-directory of `local_storage_dir` when set.
    pub bucket_name: String,
    pub registry_url: String,
    pub registry_timeout: Duration,
    /// Serve the artifact from a local directory instead of GCS.
    pub local_storage_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bucket_name = get(BUCKET_NAME).ok_or(Error::ConfigMissing { name: BUCKET_NAME })?;

        let registry_url = get(REGISTRY_URL).unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string());

        let registry_timeout = match get(REGISTRY_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|e| Error::ConfigInvalid {
                    name: REGISTRY_TIMEOUT_SECS,
                    message: format!("{raw:?}: {e}"),
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_REGISTRY_TIMEOUT_SECS),
        };

        Ok(Self {
            bucket_name,
            registry_url,
            registry_timeout,
            local_storage_dir: get(LOCAL_STORAGE_DIR).map(PathBuf::from),
        })
    }
}
