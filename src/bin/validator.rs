// src/bin/validator.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use splitpay::{artifact, config::Config, logging, server::validator_routes, storage};
use tracing::info;

/// Answer split-payment addressee-code lookups over HTTP.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let config = Config::from_env().context("loading configuration")?;
    let store = storage::from_config(&config)
        .await
        .context("opening artifact store")?;

    // the table must be complete before the first request is accepted
    let table = artifact::load_lookup_table(store.as_ref())
        .await
        .context("loading lookup table")?;
    info!(entries = table.len(), "lookup table ready");

    let routes = validator_routes(Arc::new(table));
    info!("Server starting on port {}", args.port);
    warp::serve(routes).run(([0, 0, 0, 0], args.port)).await;

    Ok(())
}
