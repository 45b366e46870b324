pub mod http;
#[cfg(test)]
pub mod mock;
pub mod process;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::channel::DirectoryEntry;

pub use http::HttpDirectoryClient;
pub use process::ProcessDirectoryClient;

/// Outputs the resolver prints instead of a locator when it has nothing.
const SENTINELS: &[&str] = &["NOT_FOUND", "NO_URL", "RESOLVE_FAIL", "ERROR"];

/// Which locator a single-channel resolve should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// The final playable link.
    Resolved,
    /// The channel's original locator, left for a live proxy to resolve.
    Original,
}

impl ResolveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveMode::Resolved => "resolved",
            ResolveMode::Original => "original",
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to start resolver: {0}")]
    Spawn(std::io::Error),
    #[error("resolver exited with code {0}")]
    NonZeroExit(i32),
    #[error("resolver produced no output")]
    EmptyOutput,
    #[error("resolver reported no result ({0})")]
    NoResult(String),
    #[error("resolver timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to decode directory listing: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("resolver returned HTTP {0}")]
    Status(u16),
}

/**
    Narrow boundary to the third-party live-TV directory.

    Implementations must honour the caller's timeout; every failure,
    including a timeout, comes back as a `ClientError`.
*/
#[async_trait]
pub trait ExternalDirectoryClient: Send + Sync {
    /// Fetch the full directory listing.
    async fn bulk_list(&self, timeout: Duration) -> Result<Vec<DirectoryEntry>, ClientError>;

    /// Resolve one channel name to a single locator.
    async fn resolve_one(
        &self,
        name: &str,
        mode: ResolveMode,
        timeout: Duration,
    ) -> Result<String, ClientError>;
}

/// Trim resolver output and reject empty or sentinel values.
pub(crate) fn parse_locator(output: &str) -> Result<String, ClientError> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Err(ClientError::EmptyOutput);
    }
    if SENTINELS.contains(&trimmed) {
        return Err(ClientError::NoResult(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locator() {
        assert_eq!(
            parse_locator("  https://dir/x.m3u8\n").unwrap(),
            "https://dir/x.m3u8"
        );
        assert!(matches!(parse_locator(" \n"), Err(ClientError::EmptyOutput)));
        assert!(matches!(
            parse_locator("NOT_FOUND\n"),
            Err(ClientError::NoResult(s)) if s == "NOT_FOUND"
        ));
    }
}
