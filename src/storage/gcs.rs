// src/storage/gcs.rs
use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use google_cloud_storage::{
    client::{Client, ClientConfig},
    http::objects::{
        download::Range,
        get::GetObjectRequest,
        upload::{UploadObjectRequest, UploadType},
        Object,
    },
};
use tracing::{debug, info, instrument};

use super::{ArtifactStore, ObjectMetadata};
use crate::error::{Error, Result};

/// Google Cloud Storage bucket authenticated with application default
/// credentials.
pub struct GcsStore {
    client: Client,
    bucket: String,
}

impl GcsStore {
    pub async fn connect(bucket: String) -> Result<Self> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| Error::StorageUnavailable {
                key: format!("gs://{}", bucket),
                message: format!("authenticating to GCS: {}", e),
            })?;
        Ok(Self {
            client: Client::new(config),
            bucket,
        })
    }
}

#[async_trait]
impl ArtifactStore for GcsStore {
    /// Single multipart upload: GCS only creates the object once the whole
    /// request has been received, so a failed upload never replaces the
    /// previous generation.
    #[instrument(level = "debug", skip(self, staged, metadata), fields(bucket = %self.bucket))]
    async fn put(&self, key: &str, staged: &Path, metadata: &ObjectMetadata) -> Result<()> {
        let write_err = |message: String| Error::StorageWrite {
            key: key.to_string(),
            message,
        };

        let body = tokio::fs::read(staged)
            .await
            .map_err(|e| write_err(format!("reading staged file {}: {}", staged.display(), e)))?;
        let len = body.len();

        let object = Object {
            name: key.to_string(),
            content_type: Some(metadata.content_type.clone()),
            metadata: Some(
                metadata
                    .entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<HashMap<_, _>>(),
            ),
            ..Default::default()
        };
        let request = UploadObjectRequest {
            bucket: self.bucket.clone(),
            ..Default::default()
        };

        self.client
            .upload_object(&request, body, &UploadType::Multipart(Box::new(object)))
            .await
            .map_err(|e| write_err(e.to_string()))?;

        info!(object = %key, bytes = len, "uploaded to GCS");
        Ok(())
    }

    #[instrument(level = "debug", skip(self), fields(bucket = %self.bucket))]
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let request = GetObjectRequest {
            bucket: self.bucket.clone(),
            object: key.to_string(),
            ..Default::default()
        };
        let bytes = self
            .client
            .download_object(&request, &Range(None, None))
            .await
            .map_err(|e| Error::StorageUnavailable {
                key: format!("gs://{}/{}", self.bucket, key),
                message: e.to_string(),
            })?;

        debug!(object = %key, bytes = bytes.len(), "downloaded from GCS");
        Ok(bytes)
    }
}
