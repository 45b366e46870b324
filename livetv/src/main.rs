use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cache;
mod channel;
mod cli;
mod external;
mod refresh;
mod settings;
mod streams;
mod util;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::Args::parse().run().await
}
