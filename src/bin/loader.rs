// src/bin/loader.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use splitpay::{
    config::Config,
    fetch::HttpRegistrySource,
    loader, logging,
    server::{loader_routes, LoaderState},
    storage,
};
use tracing::info;

/// Rebuild the split-payment lookup artifact from the IndicePA registry.
#[derive(Parser, Debug)]
struct Args {
    /// Run a single load and exit instead of waiting for trigger events
    #[arg(long)]
    once: bool,

    /// Port for the trigger endpoint
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let config = Config::from_env().context("loading configuration")?;
    info!(bucket = %config.bucket_name, registry = %config.registry_url, "loader starting");

    let source = Arc::new(HttpRegistrySource::from_config(&config));
    let store = storage::from_config(&config)
        .await
        .context("opening artifact store")?;

    if args.once {
        let report = loader::run_once(source, store.as_ref())
            .await
            .context("loading registry")?;
        info!(
            key = %report.key,
            records = report.records,
            creation_date = %report.creation_date,
            "artifact written"
        );
        return Ok(());
    }

    let routes = loader_routes(LoaderState { source, store });
    info!("Trigger endpoint: POST http://localhost:{}/", args.port);
    warp::serve(routes).run(([0, 0, 0, 0], args.port)).await;

    Ok(())
}
