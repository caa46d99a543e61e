// src/loader.rs
use std::{sync::Arc, time::Instant};

use chrono::Utc;
use tracing::{info, instrument};

use crate::{
    artifact::{self, LoadReport},
    error::Result,
    fetch::RegistrySource,
    storage::ArtifactStore,
};

/// One write-path run: fetch the registry, stage the artifact, commit it.
///
/// Any failure before the commit leaves the stored artifact as it was.
#[instrument(level = "info", skip_all, fields(source = %source.describe()))]
pub async fn run_once(
    source: Arc<dyn RegistrySource>,
    store: &dyn ArtifactStore,
) -> Result<LoadReport> {
    let start = Instant::now();

    // fetch + parse + encode + gzip are blocking and stream one row at a time
    let staged = tokio::task::spawn_blocking(move || {
        let feed = source.open()?;
        artifact::stage(feed)
    })
    .await??;

    let report = artifact::commit(store, staged, Utc::now()).await?;
    info!(
        records = report.records,
        compressed_bytes = report.compressed_bytes,
        elapsed = ?start.elapsed(),
        "load complete"
    );
    Ok(report)
}
