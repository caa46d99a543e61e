// src/fetch/mod.rs
use std::{io::Read, time::Duration};

use tracing::{debug, info, instrument};

use crate::{
    config::Config,
    error::{Error, Result},
};

/// Where the registry feed comes from. `open` blocks, so call it off the
/// async executor.
pub trait RegistrySource: Send + Sync {
    fn describe(&self) -> String;

    fn open(&self) -> Result<Box<dyn Read + Send>>;
}

/// The IndicePA open-data feed over HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpRegistrySource {
    url: String,
    timeout: Duration,
}

impl HttpRegistrySource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.registry_url.clone(), config.registry_timeout)
    }
}

impl RegistrySource for HttpRegistrySource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    /// Sends the request and returns the body as a stream; nothing is
    /// buffered beyond what the caller reads.
    #[instrument(level = "info", skip(self), fields(url = %self.url))]
    fn open(&self) -> Result<Box<dyn Read + Send>> {
        let network = |source| Error::NetworkFailure {
            url: self.url.clone(),
            source,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(network)?;
        let resp = client
            .get(&self.url)
            .send()
            .map_err(network)?
            .error_for_status()
            .map_err(network)?;

        info!(status = %resp.status(), content_length = ?resp.content_length(), "registry feed opened");
        Ok(Box::new(resp))
    }
}

/// A feed held in memory.
#[derive(Debug, Clone)]
pub struct BytesSource(pub Vec<u8>);

impl RegistrySource for BytesSource {
    fn describe(&self) -> String {
        format!("{} in-memory bytes", self.0.len())
    }

    fn open(&self) -> Result<Box<dyn Read + Send>> {
        debug!(bytes = self.0.len(), "opening in-memory feed");
        Ok(Box::new(std::io::Cursor::new(self.0.clone())))
    }
}
