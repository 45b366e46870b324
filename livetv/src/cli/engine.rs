use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::channel::matcher::DEFAULT_MATCH_THRESHOLD;
use crate::channel::{ChannelDirectory, Matcher};
use crate::external::{ExternalDirectoryClient, HttpDirectoryClient, ProcessDirectoryClient};
use crate::refresh::{FastPathResolver, RefreshScheduler};
use crate::settings::{
    DEFAULT_BULK_TIMEOUT, DEFAULT_CACHE_PATH, DEFAULT_CACHE_TTL, DEFAULT_CHANNELS_PATH,
    DEFAULT_FAST_PATH_TIMEOUT, DEFAULT_REFRESH_INTERVAL, EngineSettings,
};
use crate::streams::StreamComposer;

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Channel directory file (JSON or YAML)
    #[arg(long, global = true, env = "LIVETV_CHANNELS", default_value = DEFAULT_CHANNELS_PATH)]
    pub channels: PathBuf,

    /// Resolved-link cache file
    #[arg(long, global = true, env = "LIVETV_CACHE", default_value = DEFAULT_CACHE_PATH)]
    pub cache: PathBuf,

    /// Seconds after which the cache counts as stale
    #[arg(long, global = true, env = "LIVETV_CACHE_TTL_SECS", default_value_t = DEFAULT_CACHE_TTL.as_secs())]
    pub cache_ttl_secs: u64,

    /// Seconds between periodic directory refreshes
    #[arg(long, global = true, env = "LIVETV_REFRESH_INTERVAL_SECS", default_value_t = DEFAULT_REFRESH_INTERVAL.as_secs())]
    pub refresh_interval_secs: u64,

    /// Minimum fuzzy score (exclusive) for a directory match
    #[arg(long, global = true, env = "LIVETV_MATCH_THRESHOLD", default_value_t = DEFAULT_MATCH_THRESHOLD)]
    pub match_threshold: f64,

    /// Timeout for the bulk directory listing
    #[arg(long, global = true, env = "LIVETV_BULK_TIMEOUT_SECS", default_value_t = DEFAULT_BULK_TIMEOUT.as_secs())]
    pub bulk_timeout_secs: u64,

    /// Timeout for a per-request fast-path lookup
    #[arg(long, global = true, env = "LIVETV_FAST_PATH_TIMEOUT_SECS", default_value_t = DEFAULT_FAST_PATH_TIMEOUT.as_secs())]
    pub fast_path_timeout_secs: u64,

    /// Resolver executable
    #[arg(long, global = true, env = "LIVETV_RESOLVER_PROGRAM", default_value = "python3")]
    pub resolver_program: PathBuf,

    /// Arguments placed before the resolver's own arguments (repeatable)
    #[arg(
        long = "resolver-arg",
        global = true,
        env = "LIVETV_RESOLVER_ARGS",
        value_delimiter = ',',
        default_value = "vavoo_resolver.py"
    )]
    pub resolver_args: Vec<String>,

    /// Use an HTTP resolver service at this base URL instead of a subprocess
    #[arg(long, global = true, env = "LIVETV_RESOLVER_URL")]
    pub resolver_url: Option<String>,
}

/// Everything a command needs, wired together.
pub struct Engine {
    pub settings: EngineSettings,
    pub directory: Arc<ChannelDirectory>,
    pub store: Arc<CacheStore>,
    pub client: Arc<dyn ExternalDirectoryClient>,
    pub scheduler: Arc<RefreshScheduler>,
    pub composer: StreamComposer,
}

impl EngineArgs {
    pub fn settings(&self) -> Result<EngineSettings> {
        if !(0.0..1.0).contains(&self.match_threshold) {
            bail!(
                "Match threshold must be in [0, 1), got {}",
                self.match_threshold
            );
        }

        Ok(EngineSettings {
            channels_path: self.channels.clone(),
            cache_path: self.cache.clone(),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            refresh_interval: Duration::from_secs(self.refresh_interval_secs.max(1)),
            match_threshold: self.match_threshold,
            bulk_timeout: Duration::from_secs(self.bulk_timeout_secs),
            fast_path_timeout: Duration::from_secs(self.fast_path_timeout_secs),
        })
    }

    fn client(&self) -> Result<Arc<dyn ExternalDirectoryClient>> {
        let client: Arc<dyn ExternalDirectoryClient> = match &self.resolver_url {
            Some(url) => {
                info!(url = %url, "using HTTP resolver");
                Arc::new(
                    HttpDirectoryClient::new(url)
                        .context("Failed to create HTTP resolver client")?,
                )
            }
            None => {
                info!(
                    program = ?self.resolver_program,
                    args = ?self.resolver_args,
                    "using resolver subprocess"
                );
                Arc::new(ProcessDirectoryClient::new(
                    &self.resolver_program,
                    self.resolver_args.clone(),
                ))
            }
        };
        Ok(client)
    }

    /// Load the channel directory and cache, and wire up the engine.
    pub async fn build(&self) -> Result<Engine> {
        let settings = self.settings()?;

        let directory = Arc::new(
            ChannelDirectory::load(&settings.channels_path).with_context(|| {
                format!(
                    "Failed to load channel directory {}",
                    settings.channels_path.display()
                )
            })?,
        );
        info!(
            path = %settings.channels_path.display(),
            channels = directory.len(),
            "channel directory loaded"
        );

        let store = Arc::new(CacheStore::load(&settings.cache_path, settings.cache_ttl).await);
        info!(
            path = %settings.cache_path.display(),
            entries = store.len(),
            stale = store.is_stale(),
            "cache loaded"
        );

        let client = self.client()?;
        let matcher = Matcher::new(settings.match_threshold);
        debug!(threshold = matcher.threshold(), "fuzzy match threshold");
        let scheduler = Arc::new(RefreshScheduler::new(
            Arc::clone(&directory),
            Arc::clone(&store),
            Arc::clone(&client),
            matcher,
            settings.bulk_timeout,
        ));
        let fast_path = FastPathResolver::new(
            Arc::clone(&store),
            Arc::clone(&client),
            settings.fast_path_timeout,
        );
        let composer =
            StreamComposer::new(Arc::clone(&directory), Arc::clone(&scheduler), fast_path);

        Ok(Engine {
            settings,
            directory,
            store,
            client,
            scheduler,
            composer,
        })
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

    #[test]
    fn test_defaults() {
        let args = TestArgs::parse_from(["livetv"]);
        let settings = args.engine.settings().unwrap();
        assert_eq!(settings.cache_ttl, DEFAULT_CACHE_TTL);
        assert_eq!(settings.match_threshold, DEFAULT_MATCH_THRESHOLD);
        assert_eq!(args.engine.resolver_args, vec!["vavoo_resolver.py"]);
        assert!(args.engine.resolver_url.is_none());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let args = TestArgs::parse_from(["livetv", "--match-threshold", "1.5"]);
        assert!(args.engine.settings().is_err());
    }

    #[tokio::test]
    async fn test_build_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let channels = dir.path().join("channels.json");
        std::fs::write(
            &channels,
            r#"[{"id":"rai1","name":"Rai 1","staticUrl":"https://x/a.mpd"}]"#,
        )
        .unwrap();
        let cache = dir.path().join("cache.json");

        let args = TestArgs::parse_from([
            "livetv",
            "--channels",
            channels.to_str().unwrap(),
            "--cache",
            cache.to_str().unwrap(),
        ]);
        let engine = args.engine.build().await.unwrap();
        assert_eq!(engine.directory.len(), 1);
        assert!(engine.store.is_empty());
        assert!(engine.store.is_stale());
    }

    #[tokio::test]
    async fn test_build_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let args = TestArgs::parse_from(["livetv", "--channels", missing.to_str().unwrap()]);
        assert!(args.engine.build().await.is_err());
    }
}
