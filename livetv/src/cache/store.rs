use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::util::time::{from_epoch_millis, now, to_epoch_millis};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to encode cache snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// On-disk form of the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheSnapshot {
    /// Epoch milliseconds of the last successful full refresh, `0` if never.
    pub timestamp: i64,
    #[serde(default)]
    pub links: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct CacheState {
    refreshed_at: Option<DateTime<Utc>>,
    links: HashMap<String, String>,
}

/**
    Channel display name to resolved locator map, mirrored to a JSON file.

    Memory is updated synchronously by `put`; nothing touches disk until
    `flush`, which writes `<path>.tmp` and renames it over `<path>`.
    Flushes are serialized, and each one writes the full current state.
*/
pub struct CacheStore {
    path: PathBuf,
    ttl: TimeDelta,
    state: RwLock<CacheState>,
    dirty: AtomicBool,
    flush_lock: tokio::sync::Mutex<()>,
}

impl CacheStore {
    /// An empty store that will persist to `path`.
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            state: RwLock::new(CacheState::default()),
            dirty: AtomicBool::new(false),
            flush_lock: tokio::sync::Mutex::new(()),
        }
    }

    /**
        Load the store from `path`.

        A missing file gives an empty store; an unreadable or undecodable one
        is logged and also gives an empty store.
    */
    pub async fn load(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        let store = Self::new(path, ttl);

        match tokio::fs::read(&store.path).await {
            Ok(bytes) => match serde_json::from_slice::<CacheSnapshot>(&bytes) {
                Ok(snapshot) => {
                    debug!(
                        path = ?store.path,
                        entries = snapshot.links.len(),
                        "loaded cache snapshot"
                    );
                    store.restore(snapshot);
                }
                Err(e) => {
                    warn!(path = ?store.path, error = %e, "corrupt cache file, starting empty");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?store.path, "no cache file yet");
            }
            Err(e) => {
                warn!(path = ?store.path, error = %e, "failed to read cache file, starting empty");
            }
        }

        store
    }

    fn restore(&self, snapshot: CacheSnapshot) {
        let mut state = self.state.write();
        state.refreshed_at = from_epoch_millis(snapshot.timestamp);
        state.links = snapshot.links.into_iter().collect();
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.state.read().links.get(name).cloned()
    }

    /// Upsert in memory only; marks the store dirty.
    pub fn put(&self, name: impl Into<String>, locator: impl Into<String>) {
        self.state.write().links.insert(name.into(), locator.into());
        self.dirty.store(true, Ordering::Release);
    }

    /// Upsert many entries under one lock.
    pub fn put_all(&self, entries: impl IntoIterator<Item = (String, String)>) {
        let mut state = self.state.write();
        for (name, locator) in entries {
            state.links.insert(name, locator);
        }
        self.dirty.store(true, Ordering::Release);
    }

    pub fn mark_refreshed(&self, at: DateTime<Utc>) {
        self.state.write().refreshed_at = Some(at);
        self.dirty.store(true, Ordering::Release);
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().refreshed_at
    }

    pub fn len(&self) -> usize {
        self.state.read().links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().links.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Stale when empty, never refreshed, or older than the TTL.
    pub fn is_stale(&self) -> bool {
        self.is_stale_at(now())
    }

    pub fn is_stale_at(&self, at: DateTime<Utc>) -> bool {
        let state = self.state.read();
        if state.links.is_empty() {
            return true;
        }
        match state.refreshed_at {
            Some(refreshed_at) => at - refreshed_at > self.ttl,
            None => true,
        }
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        let state = self.state.read();
        CacheSnapshot {
            timestamp: to_epoch_millis(state.refreshed_at),
            links: state
                .links
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Atomically persist the current in-memory state.
    pub async fn flush(&self) -> Result<(), CacheError> {
        let _guard = self.flush_lock.lock().await;

        self.dirty.store(false, Ordering::Release);
        let snapshot = self.snapshot();
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        if let Err(e) = self.write_atomic(&bytes).await {
            self.dirty.store(true, Ordering::Release);
            return Err(e);
        }

        debug!(path = ?self.path, entries = snapshot.links.len(), "cache flushed");
        Ok(())
    }

    /// Flush only if something was put since the last flush.
    pub async fn flush_if_dirty(&self) -> Result<bool, CacheError> {
        if !self.is_dirty() {
            return Ok(false);
        }
        self.flush().await?;
        Ok(true)
    }

    async fn write_atomic(&self, bytes: &[u8]) -> Result<(), CacheError> {
        let write_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| CacheError::Write { path, source }
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(write_err(parent))?;
        }

        let tmp = temp_path(&self.path);
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(write_err(&tmp))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(write_err(&self.path))?;

        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp: OsString = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
