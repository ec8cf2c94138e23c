//! The `crawl` subcommand: record a single page as one flow step.

use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use webscout_driver::WaitPolicy;
use webscout_step_store::{BlobStore, PassthroughBlobStore, StepInput, StepStore};

use crate::config::AppConfig;

#[derive(Debug, Args)]
pub struct CrawlArgs {
    /// URL to record
    pub url: String,
    /// Run with a visible browser window
    #[arg(long)]
    pub headful: bool,
    /// Run against the built-in demo site
    #[arg(long)]
    pub demo: bool,
}

pub async fn cmd_crawl(args: CrawlArgs, config: AppConfig) -> Result<()> {
    let browser = super::acquire_browser(args.demo, args.headful)?;
    let page = browser.new_page().await?;

    page.goto(&args.url, WaitPolicy::NetworkIdle, Duration::from_secs(15))
        .await?;

    std::fs::create_dir_all(&config.screenshots_dir)?;
    let name = super::flow_name_for(&args.url)?;
    let shot = config
        .screenshots_dir
        .join(format!("{name}-{}.png", Utc::now().timestamp_millis()));
    page.screenshot(&shot).await?;
    let screenshot = PassthroughBlobStore.upload(&shot).await?;

    let store = StepStore::open(&config.db_path).await?;
    store
        .add_step(
            &name,
            StepInput {
                url: page.url(),
                screenshot,
                command_log: Vec::new(),
            },
        )
        .await?;

    println!("Recorded {} into flow '{}'.", page.url(), name);
    page.close().await?;
    browser.close().await?;
    Ok(())
}
