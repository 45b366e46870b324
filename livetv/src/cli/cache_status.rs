use anyhow::Result;
use clap::Parser;

use super::engine::EngineArgs;

#[derive(Parser, Debug)]
pub struct CacheStatusCommand;

impl CacheStatusCommand {
    pub async fn run(self, engine_args: &EngineArgs) -> Result<()> {
        let engine = engine_args.build().await?;
        let store = &engine.store;

        println!("Cache file: {}", store.path().display());
        match store.refreshed_at() {
            Some(at) => println!("Refreshed at: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
            None => println!("Refreshed at: never"),
        }
        println!("Entries: {}", store.len());
        println!(
            "TTL: {}h",
            engine.settings.cache_ttl.as_secs_f64() / 3600.0
        );
        println!("Stale: {}", if store.is_stale() { "yes" } else { "no" });
        Ok(())
    }
}
