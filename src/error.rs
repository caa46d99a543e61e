// src/error.rs
use std::io;
use thiserror::Error;

/// Every failure the loader and the validator can report.
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing required configuration value {name}")]
    ConfigMissing { name: &'static str },

    #[error("invalid configuration value {name}: {message}")]
    ConfigInvalid { name: &'static str, message: String },

    #[error("failed to fetch registry feed from {url}: {source}")]
    NetworkFailure {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read registry feed at line {line}: {source}")]
    FeedRead {
        line: u64,
        #[source]
        source: io::Error,
    },

    #[error("malformed registry row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("failed to write lookup csv: {0}")]
    Encode(#[source] csv::Error),

    #[error("failed to stage artifact: {0}")]
    Staging(#[source] io::Error),

    #[error("failed to store artifact {key}: {message}")]
    StorageWrite { key: String, message: String },

    #[error("artifact {key} is unavailable: {message}")]
    StorageUnavailable { key: String, message: String },

    #[error("artifact is corrupt: {message}")]
    CorruptArtifact { message: String },

    #[error("missing required parameter {param}")]
    InvalidRequest { param: &'static str },

    #[error("loader task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;
