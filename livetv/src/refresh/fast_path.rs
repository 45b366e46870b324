use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::channel::ChannelDefinition;
use crate::external::{ExternalDirectoryClient, ResolveMode};

/**
    Bounded-latency resolution for a channel the cache has not seen yet.

    Asks the external resolver for each of the channel's lookup names in
    turn, all within one timeout budget. A hit is written to the cache
    store (not flushed); anything else is reported as unresolved.
*/
pub struct FastPathResolver {
    store: Arc<CacheStore>,
    client: Arc<dyn ExternalDirectoryClient>,
    timeout: Duration,
}

impl FastPathResolver {
    pub fn new(
        store: Arc<CacheStore>,
        client: Arc<dyn ExternalDirectoryClient>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            client,
            timeout,
        }
    }

    pub async fn resolve(&self, channel: &ChannelDefinition) -> Option<String> {
        match tokio::time::timeout(self.timeout, self.try_names(channel)).await {
            Ok(locator) => locator,
            Err(_) => {
                debug!(channel = %channel.display_name, timeout = ?self.timeout, "fast path timed out");
                None
            }
        }
    }

    async fn try_names(&self, channel: &ChannelDefinition) -> Option<String> {
        let deadline = Instant::now() + self.timeout;

        for name in channel.lookup_names() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!(channel = %channel.display_name, "fast path out of time");
                break;
            }

            match self
                .client
                .resolve_one(name, ResolveMode::Original, remaining)
                .await
            {
                Ok(locator) => {
                    info!(
                        channel = %channel.display_name,
                        alias = name,
                        "resolved on the fast path"
                    );
                    self.store.put(&channel.display_name, locator.clone());
                    return Some(locator);
                }
                Err(e) => {
                    debug!(channel = %channel.display_name, alias = name, error = %e, "fast path miss");
                }
            }
        }

        None
    }
}
