use anyhow::Result;
use clap::Parser;

use super::engine::EngineArgs;

#[derive(Parser, Debug)]
pub struct ListChannelsCommand;

impl ListChannelsCommand {
    pub async fn run(self, engine_args: &EngineArgs) -> Result<()> {
        let engine = engine_args.build().await?;

        println!("Channels ({}):", engine.directory.len());
        for channel in engine.directory.iter() {
            let access = if channel.is_open_access { "open" } else { "proxied" };
            let cached = engine.store.get(&channel.display_name);
            println!(
                "  {:<16} {:<28} {:<8} {}",
                channel.id,
                channel.display_name,
                access,
                cached.as_deref().unwrap_or("-")
            );
        }
        Ok(())
    }
}
