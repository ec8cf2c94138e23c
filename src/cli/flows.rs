//! The `flows` subcommand: list recorded flows.

use anyhow::Result;
use clap::Args;
use webscout_step_store::StepStore;

use crate::config::AppConfig;

#[derive(Debug, Args)]
pub struct FlowsArgs {}

pub async fn cmd_flows(_args: FlowsArgs, config: AppConfig) -> Result<()> {
    let store = StepStore::open(&config.db_path).await?;
    let flows = store.all_flows().await?;
    if flows.is_empty() {
        println!("No flows recorded yet.");
        return Ok(());
    }

    let modified = store.modified_flows().await?;
    for flow in &flows {
        let marker = if modified.contains(&flow.name) {
            " *"
        } else {
            ""
        };
        println!("{} ({} steps){}", flow.name, flow.steps, marker);
    }
    if !modified.is_empty() {
        println!("* changed since the last documentation run");
    }
    Ok(())
}
