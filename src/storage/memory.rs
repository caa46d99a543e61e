// src/storage/memory.rs
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use super::{ArtifactStore, ObjectMetadata};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub metadata: ObjectMetadata,
}

/// Process-local store, cheap to clone; clones share the same objects.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    objects: Arc<Mutex<HashMap<String, StoredObject>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place raw bytes at `key`, bypassing `put`.
    pub fn insert(&self, key: &str, body: Vec<u8>) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body,
                metadata: ObjectMetadata::default(),
            },
        );
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn put(&self, key: &str, staged: &Path, metadata: &ObjectMetadata) -> Result<()> {
        let body = tokio::fs::read(staged)
            .await
            .map_err(|e| Error::StorageWrite {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body,
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.object(key)
            .map(|o| o.body)
            .ok_or_else(|| Error::StorageUnavailable {
                key: key.to_string(),
                message: "no such object".to_string(),
            })
    }
}
