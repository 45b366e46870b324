use std::path::PathBuf;
use std::time::Duration;

use crate::channel::matcher::DEFAULT_MATCH_THRESHOLD;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(12 * 60 * 60);
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);
pub const DEFAULT_BULK_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_FAST_PATH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CACHE_PATH: &str = "data/live_links.json";
pub const DEFAULT_CHANNELS_PATH: &str = "config/tv_channels.json";

/// Tunables for the resolution engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub channels_path: PathBuf,
    pub cache_path: PathBuf,
    pub cache_ttl: Duration,
    pub refresh_interval: Duration,
    pub match_threshold: f64,
    pub bulk_timeout: Duration,
    pub fast_path_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            channels_path: PathBuf::from(DEFAULT_CHANNELS_PATH),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            cache_ttl: DEFAULT_CACHE_TTL,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            bulk_timeout: DEFAULT_BULK_TIMEOUT,
            fast_path_timeout: DEFAULT_FAST_PATH_TIMEOUT,
        }
    }
}
