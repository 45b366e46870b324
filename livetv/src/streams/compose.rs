use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::channel::{ChannelDefinition, ChannelDirectory, StaticLocator, Transport};
use crate::refresh::{FastPathResolver, RefreshScheduler};

use super::proxy::{ProxyConfig, live_playlist_url, manifest_proxy_url, stream_proxy_url};

/// "No streams available", base64 encoded.
pub const PLACEHOLDER_URL: &str = "data:text/plain;base64,Tm8gc3RyZWFtcyBhdmFpbGFibGU=";

/// One playable candidate handed to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamDescriptor {
    pub url: String,
    pub title: String,
}

impl StreamDescriptor {
    fn new(url: String, title: String) -> Self {
        Self { url, title }
    }
}

/**
    Builds the ordered stream list for a channel.

    Static locators come first in configured order, then the directory
    locator (cache, falling back to the fast path) for channels that need
    the live proxy. An empty result is replaced by a single placeholder.
*/
pub struct StreamComposer {
    directory: Arc<ChannelDirectory>,
    store: Arc<CacheStore>,
    scheduler: Arc<RefreshScheduler>,
    fast_path: FastPathResolver,
}

impl StreamComposer {
    pub fn new(
        directory: Arc<ChannelDirectory>,
        scheduler: Arc<RefreshScheduler>,
        fast_path: FastPathResolver,
    ) -> Self {
        Self {
            directory,
            store: Arc::clone(scheduler.store()),
            scheduler,
            fast_path,
        }
    }

    /// `None` when the id is not a configured channel.
    pub async fn streams_for(
        &self,
        id: &str,
        proxy: &ProxyConfig,
    ) -> Option<Vec<StreamDescriptor>> {
        let channel = self.directory.get(id)?;
        Some(self.compose(channel, proxy).await)
    }

    pub async fn compose(
        &self,
        channel: &ChannelDefinition,
        proxy: &ProxyConfig,
    ) -> Vec<StreamDescriptor> {
        let mut streams: Vec<StreamDescriptor> = channel
            .static_locators
            .iter()
            .filter_map(|locator| static_stream(channel, locator, proxy))
            .collect();

        if !channel.is_open_access
            && let Some(live_base) = proxy.live_proxy_base_url.as_deref()
            && let Some(locator) = self.directory_locator(channel).await
        {
            streams.push(StreamDescriptor::new(
                live_playlist_url(live_base, &locator),
                format!("{} (Live)", channel.display_name),
            ));
        }

        if streams.is_empty() {
            info!(channel = %channel.id, "no streams available");
            streams.push(StreamDescriptor::new(
                PLACEHOLDER_URL.to_string(),
                format!("{} - No streams available", channel.display_name),
            ));
        }

        streams
    }

    async fn directory_locator(&self, channel: &ChannelDefinition) -> Option<String> {
        self.scheduler.ensure_fresh();

        if let Some(locator) = self.store.get(&channel.display_name) {
            debug!(channel = %channel.id, "directory locator from cache");
            return Some(locator);
        }

        debug!(channel = %channel.id, "cache miss, trying fast path");
        self.fast_path.resolve(channel).await
    }
}

fn static_stream(
    channel: &ChannelDefinition,
    locator: &StaticLocator,
    proxy: &ProxyConfig,
) -> Option<StreamDescriptor> {
    let title = format!("{} ({})", channel.display_name, locator.transport.label());

    if channel.is_open_access {
        return Some(StreamDescriptor::new(locator.url.clone(), title));
    }

    let Some((base, password)) = proxy.credentials() else {
        debug!(channel = %channel.id, "proxy credentials missing, skipping static locator");
        return None;
    };

    let url = match locator.transport {
        Transport::Manifest => manifest_proxy_url(base, password, &locator.url),
        Transport::SegmentedStream => stream_proxy_url(base, password, &locator.url),
    };
    Some(StreamDescriptor::new(url, title))
}
