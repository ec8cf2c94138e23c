//! Command-line surface.

pub mod crawl;
pub mod explore;
pub mod flows;
pub mod graph;
pub mod replay;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use url::Url;
use webscout_driver::fake::FakeBrowser;
use webscout_driver::Browser;

use crate::config::AppConfig;
use crate::demo;

#[derive(Debug, Parser)]
#[command(
    name = "webscout",
    version,
    about = "Autonomous web application explorer"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Explore a site with the planning state machine
    Explore(explore::ExploreArgs),
    /// Record a single page as one flow step
    Crawl(crawl::CrawlArgs),
    /// Follow first links up to a depth, recording each page
    Graph(graph::GraphArgs),
    /// Replay a recorded flow's command log
    Replay(replay::ReplayArgs),
    /// List recorded flows
    Flows(flows::FlowsArgs),
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_env();
    match cli.command {
        Commands::Explore(args) => explore::cmd_explore(args, config).await,
        Commands::Crawl(args) => crawl::cmd_crawl(args, config).await,
        Commands::Graph(args) => graph::cmd_graph(args, config).await,
        Commands::Replay(args) => replay::cmd_replay(args, config).await,
        Commands::Flows(args) => flows::cmd_flows(args, config).await,
    }
}

/// Session acquisition seam.
///
/// A concrete CDP/WebDriver adapter plugs in behind the driver traits;
/// until one is wired in, only the built-in demo site is runnable.
pub(crate) fn acquire_browser(demo: bool, headful: bool) -> Result<Box<dyn Browser>> {
    if demo {
        if headful {
            tracing::debug!("--headful has no effect on the demo driver");
        }
        return Ok(Box::new(FakeBrowser::new(demo::demo_site())));
    }
    bail!(
        "no browser driver is wired into this build; \
         pass --demo to run against the built-in demo site"
    )
}

/// Flow name derived from a URL's hostname, dots flattened to dashes.
pub(crate) fn flow_name_for(url: &str) -> Result<String> {
    let parsed = Url::parse(url)?;
    Ok(parsed.host_str().unwrap_or("unknown").replace('.', "-"))
}
