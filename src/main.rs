//! WebScout CLI entry point.

use anyhow::Result;
use clap::Parser;

use webscout_cli::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    webscout_cli::init_tracing();
    let cli = Cli::parse();
    run(cli).await
}
