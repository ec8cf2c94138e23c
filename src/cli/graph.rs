//! The `graph` subcommand: follow first links up to a depth, recording
//! each page as a step.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tracing::info;
use url::Url;
use webscout_driver::WaitPolicy;
use webscout_step_store::{BlobStore, PassthroughBlobStore, StepInput, StepStore};

use crate::config::AppConfig;

#[derive(Debug, Args)]
pub struct GraphArgs {
    /// Start URL
    pub url: String,
    /// Maximum number of hops to follow
    #[arg(long, default_value_t = 3)]
    pub depth: usize,
    /// Run with a visible browser window
    #[arg(long)]
    pub headful: bool,
    /// Run against the built-in demo site
    #[arg(long)]
    pub demo: bool,
}

pub async fn cmd_graph(args: GraphArgs, config: AppConfig) -> Result<()> {
    let browser = super::acquire_browser(args.demo, args.headful)?;
    let page = browser.new_page().await?;
    let store = StepStore::open(&config.db_path).await?;
    std::fs::create_dir_all(&config.screenshots_dir)?;

    let flow = format!("graph-{}", super::flow_name_for(&args.url)?);
    let mut current = args.url.clone();
    let mut steps = 0usize;

    while steps < args.depth {
        page.goto(&current, WaitPolicy::DomContentLoaded, Duration::from_secs(15))
            .await?;

        let shot = config
            .screenshots_dir
            .join(format!("{flow}-step-{steps}.png"));
        page.screenshot(&shot).await?;
        let screenshot = PassthroughBlobStore.upload(&shot).await?;
        store
            .add_step(
                &flow,
                StepInput {
                    url: current.clone(),
                    screenshot,
                    command_log: Vec::new(),
                },
            )
            .await?;
        steps += 1;

        let base = Url::parse(&current)?;
        let next = page
            .interactive_elements()
            .await?
            .into_iter()
            .filter(|el| el.tag == "a")
            .find_map(|el| el.href)
            .and_then(|href| base.join(&href).ok())
            .map(String::from);

        match next {
            Some(next) if next != current => {
                info!(from = %current, to = %next, "following first link");
                current = next;
            }
            _ => break,
        }
    }

    println!("Graph crawl recorded {steps} steps into '{flow}'.");
    page.close().await?;
    browser.close().await?;
    Ok(())
}
