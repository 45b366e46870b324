use anyhow::Result;
use clap::{Parser, Subcommand};

mod cache_status;
mod engine;
mod list_channels;
mod refresh;
mod resolve;
mod run;
mod streams;

pub use cache_status::CacheStatusCommand;
pub use engine::EngineArgs;
pub use list_channels::ListChannelsCommand;
pub use refresh::RefreshCommand;
pub use resolve::ResolveCommand;
pub use run::RunCommand;
pub use streams::StreamsCommand;

#[derive(Parser, Debug)]
#[command(name = "livetv")]
#[command(about = "Live channel resolution with a cached, periodically refreshed directory")]
pub struct Args {
    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Refresh periodically and answer stream requests on stdin (default)
    Run(RunCommand),
    /// Run one directory refresh and exit
    Refresh(RefreshCommand),
    /// Print the streams for one channel
    Streams(StreamsCommand),
    /// Resolve one name through the external resolver
    Resolve(ResolveCommand),
    /// List configured channels with their cached links
    ListChannels(ListChannelsCommand),
    /// Show cache freshness
    CacheStatus(CacheStatusCommand),
}

impl Args {
    pub async fn run(self) -> Result<()> {
        let command = self.command.unwrap_or(Command::Run(RunCommand));

        match command {
            Command::Run(cmd) => cmd.run(&self.engine).await,
            Command::Refresh(cmd) => cmd.run(&self.engine).await,
            Command::Streams(cmd) => cmd.run(&self.engine).await,
            Command::Resolve(cmd) => cmd.run(&self.engine).await,
            Command::ListChannels(cmd) => cmd.run(&self.engine).await,
            Command::CacheStatus(cmd) => cmd.run(&self.engine).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_run() {
        let args = Args::parse_from(["livetv"]);
        assert!(args.command.is_none());
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = Args::parse_from(["livetv", "streams", "rai1", "--cache", "/tmp/links.json"]);
        assert!(matches!(args.command, Some(Command::Streams(ref s)) if s.id == "rai1"));
        assert_eq!(args.engine.cache.to_str(), Some("/tmp/links.json"));
    }
}
