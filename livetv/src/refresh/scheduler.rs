use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::cache::CacheStore;
use crate::channel::{ChannelDirectory, DirectoryIndex, Matcher};
use crate::external::{ClientError, ExternalDirectoryClient};
use crate::util::time::now;

/**
    Process-wide single-flight guard for directory refreshes.

    The only transition is idle -> refreshing -> idle; the flag is cleared
    when the returned guard drops, including on early return or timeout.
*/
#[derive(Debug, Default)]
pub struct RefreshState {
    in_progress: AtomicBool,
}

impl RefreshState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Returns `None` if a refresh is already running.
    fn try_begin(&self) -> Option<RefreshGuard<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard { state: self })
    }
}

struct RefreshGuard<'a> {
    state: &'a RefreshState,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.state.in_progress.store(false, Ordering::Release);
    }
}

/// What caused a refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Periodic,
    Stale,
    Manual,
}

impl fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshTrigger::Periodic => write!(f, "periodic"),
            RefreshTrigger::Stale => write!(f, "stale"),
            RefreshTrigger::Manual => write!(f, "manual"),
        }
    }
}

/// Counts from one completed refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub directory_entries: usize,
    pub matched: usize,
    pub unmatched: Vec<String>,
    pub cached: usize,
}

#[derive(Debug)]
pub enum RefreshOutcome {
    AlreadyRunning,
    Completed(RefreshReport),
    Failed(ClientError),
}

/**
    Repopulates the cache store from the external directory.

    All triggers (timer, stale lookups, manual) funnel through `trigger`,
    which is single-flight: a call made while a cycle runs returns
    `AlreadyRunning` immediately.
*/
pub struct RefreshScheduler {
    directory: Arc<ChannelDirectory>,
    store: Arc<CacheStore>,
    client: Arc<dyn ExternalDirectoryClient>,
    state: RefreshState,
    matcher: Matcher,
    bulk_timeout: Duration,
}

impl RefreshScheduler {
    pub fn new(
        directory: Arc<ChannelDirectory>,
        store: Arc<CacheStore>,
        client: Arc<dyn ExternalDirectoryClient>,
        matcher: Matcher,
        bulk_timeout: Duration,
    ) -> Self {
        Self {
            directory,
            store,
            client,
            state: RefreshState::new(),
            matcher,
            bulk_timeout,
        }
    }

    pub fn state(&self) -> &RefreshState {
        &self.state
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Run one refresh cycle unless one is already running.
    pub async fn trigger(&self, trigger: RefreshTrigger) -> RefreshOutcome {
        let Some(_guard) = self.state.try_begin() else {
            debug!(%trigger, "refresh already running");
            return RefreshOutcome::AlreadyRunning;
        };

        info!(%trigger, "refreshing live directory");

        match self.run_cycle().await {
            Ok(report) => {
                info!(
                    %trigger,
                    entries = report.directory_entries,
                    matched = report.matched,
                    unmatched = report.unmatched.len(),
                    cached = report.cached,
                    "live directory refreshed"
                );
                if !report.unmatched.is_empty() {
                    debug!(channels = ?report.unmatched, "channels without a directory match");
                }
                RefreshOutcome::Completed(report)
            }
            Err(e) => {
                warn!(%trigger, error = %e, "live directory refresh failed");
                RefreshOutcome::Failed(e)
            }
        }
    }

    async fn run_cycle(&self) -> Result<RefreshReport, ClientError> {
        let entries = self.client.bulk_list(self.bulk_timeout).await?;

        let index = DirectoryIndex::build(&entries);
        if index.is_empty() {
            warn!("directory listing has no usable names");
        } else {
            debug!(entries = entries.len(), names = index.len(), "directory index built");
        }

        let mut staged = Vec::new();
        let mut unmatched = Vec::new();
        for channel in self.directory.iter() {
            match self.matcher.match_channel(&index, channel) {
                Some(found) => {
                    debug!(
                        channel = %channel.display_name,
                        entry = %found.entry.name,
                        kind = ?found.kind,
                        score = found.score,
                        "matched"
                    );
                    staged.push((channel.display_name.clone(), found.entry.url.clone()));
                }
                None => unmatched.push(channel.display_name.clone()),
            }
        }

        let matched = staged.len();
        // Names missing from this cycle keep their previous locator.
        self.store.put_all(staged);
        self.store.mark_refreshed(now());

        if let Err(e) = self.store.flush().await {
            error!(error = %e, "failed to persist refreshed cache");
        }

        Ok(RefreshReport {
            directory_entries: entries.len(),
            matched,
            unmatched,
            cached: self.store.len(),
        })
    }

    /// Refresh in the background if the store is stale and nothing is running.
    pub fn ensure_fresh(self: &Arc<Self>) {
        if self.state.is_in_progress() || !self.store.is_stale() {
            return;
        }
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            scheduler.trigger(RefreshTrigger::Stale).await;
        });
    }

    /**
        Periodic refresh loop.

        Refreshes right away if the store is stale, then every `interval`
        until `shutdown` flips to `true`. A refresh still running when
        shutdown arrives is abandoned.
    */
    pub async fn run_periodic(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if !self.store.is_stale()
            || self
                .trigger_until_shutdown(RefreshTrigger::Stale, &mut shutdown)
                .await
        {
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !self
                            .trigger_until_shutdown(RefreshTrigger::Periodic, &mut shutdown)
                            .await
                        {
                            break;
                        }
                    }
                    _ = shutdown_requested(&mut shutdown) => break,
                }
            }
        }

        debug!("periodic refresh stopped");
    }

    /// `false` if shutdown arrived before the refresh finished.
    async fn trigger_until_shutdown(
        &self,
        trigger: RefreshTrigger,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        tokio::select! {
            _ = self.trigger(trigger) => true,
            _ = shutdown_requested(shutdown) => {
                debug!(%trigger, "refresh abandoned for shutdown");
                false
            }
        }
    }
}

/// Resolves once shutdown is signalled or the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
