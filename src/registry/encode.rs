// src/registry/encode.rs
use std::io::Write;

use csv::WriterBuilder;
use tracing::debug;

use super::ExtractedRecord;
use crate::error::{Error, Result};

/// Write `records` to `sink` as headerless `code,fiscal_code` CSV lines.
///
/// Stops at the first upstream error. On success everything buffered has
/// been flushed into `sink`, which is handed back with the record count so
/// the caller can finish whatever it wraps.
pub fn write_csv<W, I>(sink: W, records: I) -> Result<(W, u64)>
where
    W: Write,
    I: IntoIterator<Item = Result<ExtractedRecord>>,
{
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(sink);
    let mut written = 0u64;

    for record in records {
        wtr.serialize(record?).map_err(Error::Encode)?;
        written += 1;
    }

    wtr.flush().map_err(|e| Error::Encode(e.into()))?;
    let sink = wtr
        .into_inner()
        .map_err(|e| Error::Encode(e.into_error().into()))?;

    debug!(written, "encoded lookup csv");
    Ok((sink, written))
}
