use anyhow::{Context, Result};
use clap::Parser;

use super::engine::EngineArgs;
use crate::refresh::{RefreshOutcome, RefreshTrigger};

#[derive(Parser, Debug)]
pub struct RefreshCommand {
    /// List the channels that found no directory match
    #[arg(long)]
    pub show_unmatched: bool,
}

impl RefreshCommand {
    pub async fn run(self, engine_args: &EngineArgs) -> Result<()> {
        let engine = engine_args.build().await?;

        match engine.scheduler.trigger(RefreshTrigger::Manual).await {
            RefreshOutcome::Completed(report) => {
                println!("Directory entries: {}", report.directory_entries);
                println!(
                    "Matched: {} / {}",
                    report.matched,
                    report.matched + report.unmatched.len()
                );
                println!("Cached links: {}", report.cached);

                if self.show_unmatched && !report.unmatched.is_empty() {
                    println!();
                    println!("Unmatched:");
                    for name in &report.unmatched {
                        println!("  - {}", name);
                    }
                }
                Ok(())
            }
            RefreshOutcome::AlreadyRunning => {
                println!("A refresh is already running");
                Ok(())
            }
            RefreshOutcome::Failed(e) => Err(e).context("Refresh failed"),
        }
    }
}
