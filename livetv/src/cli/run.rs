use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::{signal, sync::watch};
use tracing::{error, info, warn};

use super::engine::{Engine, EngineArgs};
use crate::streams::{ProxyConfig, StreamDescriptor};

#[derive(Parser, Debug, Default)]
pub struct RunCommand;

#[derive(Debug, Serialize)]
struct StreamsResponse<'a> {
    id: &'a str,
    streams: Vec<StreamDescriptor>,
}

impl RunCommand {
    pub async fn run(self, engine_args: &EngineArgs) -> Result<()> {
        let engine = engine_args.build().await?;

        // Shutdown signal
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let refresher = tokio::spawn(
            Arc::clone(&engine.scheduler)
                .run_periodic(engine.settings.refresh_interval, shutdown_rx),
        );

        info!("ready, reading `<channel-id> [config-token]` lines from stdin");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();
        let ctrl_c = signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read stdin")? else {
                        info!("stdin closed");
                        break;
                    };
                    let Some(response) = handle_line(&engine, &line).await else {
                        continue;
                    };
                    stdout.write_all(response.as_bytes()).await?;
                    stdout.write_all(b"\n").await?;
                    stdout.flush().await?;

                    if let Err(e) = engine.store.flush_if_dirty().await {
                        error!(error = %e, "failed to persist cache");
                    }
                }
                result = &mut ctrl_c => {
                    result?;
                    info!("shutting down");
                    break;
                }
            }
        }

        let _ = shutdown_tx.send(true);
        let _ = refresher.await;

        engine
            .store
            .flush_if_dirty()
            .await
            .context("Failed to persist cache on shutdown")?;

        info!("done");
        Ok(())
    }
}

/// Answer one request line; `None` for blank lines.
async fn handle_line(engine: &Engine, line: &str) -> Option<String> {
    let mut parts = line.split_whitespace();
    let id = parts.next()?;

    let proxy = match parts.next() {
        Some(token) => ProxyConfig::decode(token).unwrap_or_else(|e| {
            warn!(channel = id, error = %e, "ignoring invalid config token");
            ProxyConfig::default()
        }),
        None => ProxyConfig::default(),
    };

    let streams = match engine.composer.streams_for(id, &proxy).await {
        Some(streams) => streams,
        None => {
            warn!(channel = id, "unknown channel");
            Vec::new()
        }
    };

    match serde_json::to_string(&StreamsResponse { id, streams }) {
        Ok(json) => Some(json),
        Err(e) => {
            error!(channel = id, error = %e, "failed to encode response");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser, Debug)]
    struct TestArgs {
        #[command(flatten)]
        engine: EngineArgs,
    }

    async fn engine(dir: &tempfile::TempDir) -> Engine {
        let channels = dir.path().join("channels.yaml");
        std::fs::write(
            &channels,
            "- id: rai1\n  name: Rai 1\n  staticUrl: https://x/a.mpd\n",
        )
        .unwrap();
        let cache = dir.path().join("cache.json");

        TestArgs::parse_from([
            "livetv",
            "--channels",
            channels.to_str().unwrap(),
            "--cache",
            cache.to_str().unwrap(),
        ])
        .engine
        .build()
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_handle_line_known_channel() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir).await;

        let response = handle_line(&engine, "tv:rai1").await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&response).unwrap();
        assert_eq!(value["id"], "tv:rai1");
        assert_eq!(value["streams"][0]["url"], "https://x/a.mpd");
        assert_eq!(value["streams"][0]["title"], "Rai 1 (MPD)");
    }

    #[tokio::test]
    async fn test_handle_line_unknown_and_blank() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir).await;

        assert!(handle_line(&engine, "   ").await.is_none());

        let response = handle_line(&engine, "nope garbage-token").await.unwrap();
        assert_eq!(response, r#"{"id":"nope","streams":[]}"#);
    }
}
