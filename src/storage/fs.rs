// src/storage/fs.rs
use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{ArtifactStore, ObjectMetadata};
use crate::error::{Error, Result};

const METADATA_SUFFIX: &str = ".meta.json";

/// Objects as plain files under `root`, metadata in a `<key>.meta.json`
/// sidecar. Writes go through a temp file in `root` and are renamed into
/// place, so readers only ever see complete objects.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn metadata_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}{}", key, METADATA_SUFFIX))
    }

    /// Metadata recorded by the last successful `put`.
    pub fn metadata(&self, key: &str) -> Result<ObjectMetadata> {
        let unavailable = |message: String| Error::StorageUnavailable {
            key: key.to_string(),
            message,
        };
        let file = File::open(self.metadata_path(key)).map_err(|e| unavailable(e.to_string()))?;
        serde_json::from_reader(file).map_err(|e| unavailable(e.to_string()))
    }

    fn put_blocking(&self, key: &str, staged: &Path, metadata: &ObjectMetadata) -> io::Result<u64> {
        fs::create_dir_all(&self.root)?;

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        let bytes = io::copy(&mut File::open(staged)?, tmp.as_file_mut())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.object_path(key)).map_err(|e| e.error)?;

        let mut meta = NamedTempFile::new_in(&self.root)?;
        serde_json::to_writer_pretty(meta.as_file_mut(), metadata)?;
        meta.as_file_mut().flush()?;
        meta.persist(self.metadata_path(key)).map_err(|e| e.error)?;

        Ok(bytes)
    }
}

#[async_trait]
impl ArtifactStore for FsStore {
    async fn put(&self, key: &str, staged: &Path, metadata: &ObjectMetadata) -> Result<()> {
        let store = self.clone();
        let (key_owned, staged_owned, metadata_owned) =
            (key.to_string(), staged.to_path_buf(), metadata.clone());

        let bytes = tokio::task::spawn_blocking(move || {
            store.put_blocking(&key_owned, &staged_owned, &metadata_owned)
        })
        .await?
        .map_err(|e| Error::StorageWrite {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        info!(path = %self.object_path(key).display(), bytes, "stored artifact locally");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(key);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| Error::StorageUnavailable {
                key: path.display().to_string(),
                message: e.to_string(),
            })?;
        debug!(path = %path.display(), bytes = bytes.len(), "read local artifact");
        Ok(bytes)
    }
}
