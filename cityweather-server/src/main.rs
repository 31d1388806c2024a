//! Binary crate for the `cityweather` server.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging setup
//! - Serving the HTTP API from `cityweather_server`

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
