use anyhow::{Context, Result};
use clap::Parser;

use super::engine::EngineArgs;
use crate::external::ResolveMode;

/// Ask the external resolver about a single name, bypassing the cache.
#[derive(Parser, Debug)]
pub struct ResolveCommand {
    /// Name as the external directory knows it
    pub name: String,

    /// Return the original locator instead of the resolved playable link
    #[arg(long)]
    pub original: bool,
}

impl ResolveCommand {
    pub async fn run(self, engine_args: &EngineArgs) -> Result<()> {
        let engine = engine_args.build().await?;
        let mode = if self.original {
            ResolveMode::Original
        } else {
            ResolveMode::Resolved
        };

        let locator = engine
            .client
            .resolve_one(&self.name, mode, engine.settings.fast_path_timeout)
            .await
            .with_context(|| format!("No {} link for '{}'", mode.as_str(), self.name))?;

        println!("{}", locator);
        Ok(())
    }
}
