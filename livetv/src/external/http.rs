use std::time::Duration;

use async_trait::async_trait;

use crate::channel::DirectoryEntry;

use super::{ClientError, ExternalDirectoryClient, ResolveMode, parse_locator};

/**
    Talks to a resolver exposed as an HTTP service.

    - bulk listing: `GET {base}/channels`, JSON array body
    - single resolve: `GET {base}/resolve?name=..&mode=resolved|original`, text body
*/
#[derive(Debug, Clone)]
pub struct HttpDirectoryClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDirectoryClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("livetv/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get(&self, path: &str, timeout: Duration) -> Result<reqwest::Response, ClientError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| timeout_or(e, timeout))?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }
        Ok(response)
    }
}

fn timeout_or(e: reqwest::Error, timeout: Duration) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout(timeout)
    } else {
        ClientError::Http(e)
    }
}

#[async_trait]
impl ExternalDirectoryClient for HttpDirectoryClient {
    async fn bulk_list(&self, timeout: Duration) -> Result<Vec<DirectoryEntry>, ClientError> {
        let body = self
            .get("/channels", timeout)
            .await?
            .bytes()
            .await
            .map_err(|e| timeout_or(e, timeout))?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn resolve_one(
        &self,
        name: &str,
        mode: ResolveMode,
        timeout: Duration,
    ) -> Result<String, ClientError> {
        let path = format!(
            "/resolve?name={}&mode={}",
            urlencoding::encode(name),
            mode.as_str()
        );
        let body = self
            .get(&path, timeout)
            .await?
            .text()
            .await
            .map_err(|e| timeout_or(e, timeout))?;
        parse_locator(&body)
    }
}
