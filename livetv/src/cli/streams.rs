use anyhow::{Context, Result};
use clap::Parser;

use super::engine::EngineArgs;
use crate::streams::ProxyConfig;

#[derive(Parser, Debug)]
pub struct StreamsCommand {
    /// Channel id (a `tv:` prefix is accepted)
    pub id: String,

    /// Proxy config token (base64 or plain JSON)
    #[arg(long, conflicts_with_all = ["proxy_url", "proxy_password", "live_proxy_url"])]
    pub config: Option<String>,

    /// Base URL of the manifest/stream proxy
    #[arg(long)]
    pub proxy_url: Option<String>,

    /// Password for the manifest/stream proxy
    #[arg(long)]
    pub proxy_password: Option<String>,

    /// Base URL of the live playlist proxy
    #[arg(long)]
    pub live_proxy_url: Option<String>,
}

impl StreamsCommand {
    fn proxy_config(&self) -> Result<ProxyConfig> {
        match &self.config {
            Some(token) => ProxyConfig::decode(token).context("Invalid config token"),
            None => Ok(ProxyConfig::new(
                self.proxy_url.clone(),
                self.proxy_password.clone(),
                self.live_proxy_url.clone(),
            )),
        }
    }

    pub async fn run(self, engine_args: &EngineArgs) -> Result<()> {
        let proxy = self.proxy_config()?;
        let engine = engine_args.build().await?;

        let streams = engine
            .composer
            .streams_for(&self.id, &proxy)
            .await
            .with_context(|| format!("Unknown channel: {}", self.id))?;

        println!("{}", serde_json::to_string_pretty(&streams)?);

        engine
            .store
            .flush_if_dirty()
            .await
            .context("Failed to persist cache")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser, Debug)]
    struct TestArgs {
        #[command(flatten)]
        streams: StreamsCommand,
    }

    #[test]
    fn test_proxy_from_flags() {
        let args = TestArgs::parse_from([
            "streams",
            "skyuno",
            "--proxy-url",
            "https://mfp/",
            "--proxy-password",
            "pw",
        ]);
        let proxy = args.streams.proxy_config().unwrap();
        assert_eq!(proxy.credentials(), Some(("https://mfp", "pw")));
        assert!(proxy.live_proxy_base_url.is_none());
    }

    #[test]
    fn test_config_conflicts_with_flags() {
        assert!(
            TestArgs::try_parse_from([
                "streams",
                "skyuno",
                "--config",
                "e30=",
                "--proxy-url",
                "https://mfp",
            ])
            .is_err()
        );
    }
}
