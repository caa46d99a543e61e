// src/artifact/mod.rs
//
// The artifact is the only thing the loader and the validator share: a
// gzip-compressed, headerless `code,fiscal_code` CSV stored under a fixed key.
use serde::Serialize;

pub mod reader;
pub mod writer;

pub use reader::{load_lookup_table, read_artifact};
pub use writer::{commit, stage, StagedArtifact};

pub const ARTIFACT_KEY: &str = "split-payment-def.gz";
pub const CONTENT_TYPE: &str = "application/gzip";
pub const CREATION_DATE: &str = "creation-date";

/// Outcome of one successful loader run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub key: String,
    pub records: u64,
    pub compressed_bytes: u64,
    pub creation_date: String,
}
