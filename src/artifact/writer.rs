// src/artifact/writer.rs
use std::{
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use chrono::{DateTime, Utc};
use flate2::{write::GzEncoder, Compression};
use tempfile::NamedTempFile;
use tracing::{info, instrument};

use super::{LoadReport, ARTIFACT_KEY, CONTENT_TYPE, CREATION_DATE};
use crate::{
    error::{Error, Result},
    registry::{write_csv, RegistryReader},
    storage::{ArtifactStore, ObjectMetadata},
};

/// A complete, gzip-finished artifact sitting in a local temp file.
/// Dropping it without `commit` discards it.
#[derive(Debug)]
pub struct StagedArtifact {
    file: NamedTempFile,
    records: u64,
    compressed_bytes: u64,
}

impl StagedArtifact {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn compressed_bytes(&self) -> u64 {
        self.compressed_bytes
    }
}

/// Stream a registry feed through parse → CSV → gzip into a temp file.
///
/// Close order matters: the CSV writer is flushed into the gzip encoder, the
/// encoder writes its trailer, and only then is the file flushed to disk.
#[instrument(level = "info", skip(source))]
pub fn stage<R: Read>(source: R) -> Result<StagedArtifact> {
    let file = NamedTempFile::new().map_err(Error::Staging)?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());

    let mut rows = RegistryReader::new(BufReader::new(source));
    let (encoder, records) = write_csv(encoder, &mut rows)?;

    let mut buffered = encoder.finish().map_err(Error::Staging)?;
    buffered.flush().map_err(Error::Staging)?;
    let file = buffered
        .into_inner()
        .map_err(|e| Error::Staging(e.into_error()))?;
    file.as_file().sync_all().map_err(Error::Staging)?;
    let compressed_bytes = file.as_file().metadata().map_err(Error::Staging)?.len();

    info!(
        lines = rows.lines_read(),
        records,
        compressed_bytes,
        "staged artifact"
    );
    Ok(StagedArtifact {
        file,
        records,
        compressed_bytes,
    })
}

/// Publish a staged artifact under `ARTIFACT_KEY`, tagged with `created_at`.
#[instrument(level = "info", skip(store, staged), fields(records = staged.records))]
pub async fn commit(
    store: &dyn ArtifactStore,
    staged: StagedArtifact,
    created_at: DateTime<Utc>,
) -> Result<LoadReport> {
    let creation_date = created_at.to_rfc3339();
    let metadata = ObjectMetadata {
        content_type: CONTENT_TYPE.to_string(),
        entries: [(CREATION_DATE.to_string(), creation_date.clone())]
            .into_iter()
            .collect(),
    };

    store.put(ARTIFACT_KEY, staged.path(), &metadata).await?;

    info!(key = ARTIFACT_KEY, %creation_date, "artifact committed");
    Ok(LoadReport {
        key: ARTIFACT_KEY.to_string(),
        records: staged.records,
        compressed_bytes: staged.compressed_bytes,
        creation_date,
    })
}
