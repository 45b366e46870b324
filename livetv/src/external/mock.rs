use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::channel::DirectoryEntry;

use super::{ClientError, ExternalDirectoryClient, ResolveMode};

/// Scriptable in-memory directory for tests.
#[derive(Default)]
pub struct MockDirectoryClient {
    pub entries: Mutex<Option<Vec<DirectoryEntry>>>,
    pub locators: Mutex<HashMap<String, String>>,
    pub delay: Mutex<Duration>,
    pub bulk_calls: AtomicUsize,
    pub resolve_calls: Mutex<Vec<(String, ResolveMode)>>,
}

impl MockDirectoryClient {
    pub fn with_entries(entries: Vec<DirectoryEntry>) -> Self {
        let mock = Self::default();
        *mock.entries.lock() = Some(entries);
        mock
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn set_entries(&self, entries: Option<Vec<DirectoryEntry>>) {
        *self.entries.lock() = entries;
    }

    pub fn set_locator(&self, name: &str, locator: &str) {
        self.locators
            .lock()
            .insert(name.to_string(), locator.to_string());
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> Vec<(String, ResolveMode)> {
        self.resolve_calls.lock().clone()
    }

    async fn wait(&self, timeout: Duration) -> Result<(), ClientError> {
        let delay = *self.delay.lock();
        if delay.is_zero() {
            return Ok(());
        }
        tokio::time::timeout(timeout, tokio::time::sleep(delay))
            .await
            .map_err(|_| ClientError::Timeout(timeout))
    }
}

#[async_trait]
impl ExternalDirectoryClient for MockDirectoryClient {
    async fn bulk_list(&self, timeout: Duration) -> Result<Vec<DirectoryEntry>, ClientError> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        self.wait(timeout).await?;
        self.entries
            .lock()
            .clone()
            .ok_or_else(|| ClientError::NonZeroExit(1))
    }

    async fn resolve_one(
        &self,
        name: &str,
        mode: ResolveMode,
        timeout: Duration,
    ) -> Result<String, ClientError> {
        self.resolve_calls.lock().push((name.to_string(), mode));
        self.wait(timeout).await?;
        self.locators
            .lock()
            .get(name)
            .cloned()
            .ok_or(ClientError::EmptyOutput)
    }
}
