//! The `replay` subcommand: re-run a recorded flow's command log.

use anyhow::{bail, Result};
use clap::Args;
use url::Url;
use webscout_replay::ReplayEngine;
use webscout_step_store::StepStore;

use crate::config::AppConfig;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Flow whose command log to replay
    pub flow: String,
    /// Replay only the first N commands
    #[arg(long)]
    pub depth: Option<usize>,
    /// Run with a visible browser window
    #[arg(long)]
    pub headful: bool,
    /// Run against the built-in demo site
    #[arg(long)]
    pub demo: bool,
}

pub async fn cmd_replay(args: ReplayArgs, config: AppConfig) -> Result<()> {
    let store = StepStore::open(&config.db_path).await?;
    let steps = store.flow_steps(&args.flow).await?;
    let Some(last) = steps.last() else {
        bail!("flow '{}' has no recorded steps", args.flow);
    };
    let commands = last.command_log.clone();

    // Explore-recorded flows are named by their path URL; older flows
    // fall back to their first recorded URL.
    let start_url = if Url::parse(&args.flow).is_ok() {
        args.flow.clone()
    } else {
        steps[0].url.clone()
    };
    let depth = args.depth.unwrap_or(commands.len());

    let browser = super::acquire_browser(args.demo, args.headful)?;
    let engine = ReplayEngine::default();
    let session = engine
        .replay_to_depth(browser.as_ref(), &start_url, &commands, depth)
        .await?;

    println!(
        "Replayed {} commands, final URL: {}",
        depth.min(commands.len()),
        session.url
    );
    session.page.close().await?;
    browser.close().await?;
    Ok(())
}
