//! The `explore` subcommand: full state-machine run.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::info;
use webscout_explorer::{Explorer, ExplorerConfig};
use webscout_oracle::{HttpOracle, RateLimitedOracle, ScoringOracle, Throttle};
use webscout_reducer::{CandidateReducer, ReducerConfig};
use webscout_step_store::StepStore;

use crate::config::{load_site_context, AppConfig};
use crate::form_values::ContextualFormValues;

#[derive(Debug, Args)]
pub struct ExploreArgs {
    /// Start URL
    pub url: String,
    /// Run with a visible browser window
    #[arg(long)]
    pub headful: bool,
    /// Run against the built-in demo site
    #[arg(long)]
    pub demo: bool,
    /// Capture a screenshot for every executed step
    #[arg(long)]
    pub screenshots: bool,
    /// Candidate count above which the scoring oracle is consulted
    #[arg(long)]
    pub prune_threshold: Option<usize>,
}

pub async fn cmd_explore(args: ExploreArgs, config: AppConfig) -> Result<()> {
    let browser = super::acquire_browser(args.demo, args.headful)?;
    let page = browser.new_page().await?;

    let ctx = load_site_context(&args.url);
    let store = Arc::new(StepStore::open(&config.db_path).await?);

    let mut reducer_config = ReducerConfig::default();
    if let Some(threshold) = args.prune_threshold.or(config.prune_threshold) {
        reducer_config.prune_threshold = threshold;
    }
    let mut reducer = CandidateReducer::new(reducer_config);
    if let Some(oracle_config) = config.oracle.clone() {
        let oracle = Arc::new(HttpOracle::new(oracle_config)?);
        let throttled: Arc<dyn ScoringOracle> = Arc::new(RateLimitedOracle::new(
            oracle,
            Throttle::with_default_interval(),
        ));
        reducer = reducer.with_oracle(throttled);
    }

    let explorer_config = ExplorerConfig {
        screenshot_dir: args.screenshots.then(|| config.screenshots_dir.clone()),
        ..ExplorerConfig::default()
    };
    if let Some(dir) = explorer_config.screenshot_dir.as_ref() {
        std::fs::create_dir_all(dir)?;
    }

    let mut explorer = Explorer::new(page, ctx, reducer, explorer_config)
        .with_store(Arc::clone(&store))
        .with_form_values(Arc::new(ContextualFormValues));

    let report = explorer.run(&args.url).await;

    info!(
        paths = report.paths_explored,
        commands = report.commands_executed,
        ms = report.total_time_ms,
        "exploration run finished"
    );
    println!(
        "Explored {} paths, executed {} commands in {}ms.",
        report.paths_explored, report.commands_executed, report.total_time_ms
    );
    if !report.system_errors.is_empty() {
        println!("{} recoverable errors:", report.system_errors.len());
        for error in &report.system_errors {
            println!("  [{:?}] {}", error.kind, error.message);
        }
    }

    browser.close().await?;
    Ok(())
}
