//! Binary crate for the `weather-analyzer` service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Logging setup
//! - The HTTP surface over `analyzer-core`

use clap::Parser;

mod cli;
mod logging;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal outside development.
    dotenvy::dotenv().ok();

    let cmd = cli::Cli::parse();
    logging::init(cmd.json);
    cmd.run().await
}
