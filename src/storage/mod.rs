// src/storage/mod.rs
use std::{collections::BTreeMap, path::Path, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{config::Config, error::Result};

pub mod fs;
pub mod gcs;
pub mod memory;

pub use fs::FsStore;
pub use gcs::GcsStore;
pub use memory::MemoryStore;

/// Content type and free-form metadata attached to a stored object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub content_type: String,
    pub entries: BTreeMap<String, String>,
}

/// Durable object storage for the lookup artifact.
///
/// `put` receives a fully written local file and must either materialize the
/// whole object at `key` or leave whatever was there before untouched.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(&self, key: &str, staged: &Path, metadata: &ObjectMetadata) -> Result<()>;

    /// Full object body; fails with `StorageUnavailable` when the object
    /// is missing or cannot be read.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;
}

/// Local directory store when `LOCAL_STORAGE_DIR` is set, GCS otherwise.
pub async fn from_config(config: &Config) -> Result<Arc<dyn ArtifactStore>> {
    match &config.local_storage_dir {
        Some(root) => {
            info!(root = %root.display(), bucket = %config.bucket_name, "using local artifact store");
            Ok(Arc::new(FsStore::new(root.join(&config.bucket_name))))
        }
        None => {
            info!(bucket = %config.bucket_name, "using GCS artifact store");
            Ok(Arc::new(GcsStore::connect(config.bucket_name.clone()).await?))
        }
    }
}
