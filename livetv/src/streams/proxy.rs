use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyConfigError {
    #[error("config token is neither base64 nor JSON")]
    Undecodable,
    #[error("config token is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),
}

/**
    Requester-supplied proxy settings.

    Each field is optional; empty strings are treated as absent and base
    URLs never carry a trailing slash.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    pub proxy_base_url: Option<String>,
    pub proxy_password: Option<String>,
    pub live_proxy_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProxyConfig {
    #[serde(default)]
    config: Option<NestedConfig>,
    #[serde(default)]
    api_password: Option<String>,
    #[serde(default)]
    mfp_proxy_url: Option<String>,
    #[serde(default)]
    mfp_proxy_password: Option<String>,
    #[serde(default)]
    media_flow_proxy_url: Option<String>,
    #[serde(default)]
    media_flow_proxy_password: Option<String>,
    #[serde(default)]
    tv_proxy_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NestedConfig {
    #[serde(default)]
    base_url: Option<String>,
}

impl ProxyConfig {
    pub fn new(
        proxy_base_url: Option<String>,
        proxy_password: Option<String>,
        live_proxy_base_url: Option<String>,
    ) -> Self {
        Self {
            proxy_base_url: normalize_base(proxy_base_url),
            proxy_password: non_empty(proxy_password),
            live_proxy_base_url: normalize_base(live_proxy_base_url),
        }
    }

    /**
        Decode a config token: base64 (standard or URL-safe) JSON, or plain JSON.

        Accepts the nested `{config: {baseUrl}, apiPassword}` layout, the flat
        `mfpProxyUrl`/`mfpProxyPassword` layout and the older
        `mediaFlowProxyUrl`/`mediaFlowProxyPassword` keys, plus `tvProxyUrl`.
    */
    pub fn decode(token: &str) -> Result<Self, ProxyConfigError> {
        let token = token.trim();
        let json = if token.starts_with('{') {
            token.to_string()
        } else {
            let bytes = STANDARD
                .decode(token)
                .or_else(|_| URL_SAFE.decode(token))
                .map_err(|_| ProxyConfigError::Undecodable)?;
            String::from_utf8(bytes).map_err(|_| ProxyConfigError::Undecodable)?
        };

        let raw: RawProxyConfig = serde_json::from_str(&json)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawProxyConfig) -> Self {
        let nested_url = non_empty(raw.config.and_then(|c| c.base_url));
        let api_password = non_empty(raw.api_password);
        if nested_url.is_some() && api_password.is_some() {
            return Self::new(nested_url, api_password, raw.tv_proxy_url);
        }

        // URL and password fall back independently.
        let url = non_empty(raw.mfp_proxy_url).or(non_empty(raw.media_flow_proxy_url));
        let password =
            non_empty(raw.mfp_proxy_password).or(non_empty(raw.media_flow_proxy_password));
        Self::new(url, password, raw.tv_proxy_url)
    }

    /// Base URL and password, only when both are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((
            self.proxy_base_url.as_deref()?,
            self.proxy_password.as_deref()?,
        ))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn normalize_base(value: Option<String>) -> Option<String> {
    non_empty(value).map(|v| v.trim().trim_end_matches('/').to_string())
}

/// `{base}/proxy/mpd/manifest.m3u8?api_password=..&d=..`
pub fn manifest_proxy_url(base: &str, password: &str, locator: &str) -> String {
    format!(
        "{}/proxy/mpd/manifest.m3u8?api_password={}&d={}",
        base,
        urlencoding::encode(password),
        locator
    )
}

/// `{base}/proxy/stream/?api_password=..&d=..`
pub fn stream_proxy_url(base: &str, password: &str, locator: &str) -> String {
    format!(
        "{}/proxy/stream/?api_password={}&d={}",
        base,
        urlencoding::encode(password),
        locator
    )
}

/// `{base}/proxy/m3u?url=..`
pub fn live_playlist_url(base: &str, locator: &str) -> String {
    format!("{}/proxy/m3u?url={}", base, urlencoding::encode(locator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_forms() {
        assert_eq!(
            manifest_proxy_url("https://mfp", "p@ss word", "https://x/a.mpd?k=1"),
            "https://mfp/proxy/mpd/manifest.m3u8?api_password=p%40ss%20word&d=https://x/a.mpd?k=1"
        );
        assert_eq!(
            stream_proxy_url("https://mfp", "pw", "https://x/a.m3u8"),
            "https://mfp/proxy/stream/?api_password=pw&d=https://x/a.m3u8"
        );
        assert_eq!(
            live_playlist_url("https://tvp", "https://dir/play/123?a=b"),
            "https://tvp/proxy/m3u?url=https%3A%2F%2Fdir%2Fplay%2F123%3Fa%3Db"
        );
    }

    #[test]
    fn test_new_normalizes() {
        let config = ProxyConfig::new(
            Some("https://mfp/".to_string()),
            Some("".to_string()),
            Some("  ".to_string()),
        );
        assert_eq!(config.proxy_base_url.as_deref(), Some("https://mfp"));
        assert!(config.proxy_password.is_none());
        assert!(config.live_proxy_base_url.is_none());
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_decode_flat_base64() {
        let json = r#"{"mfpProxyUrl":"https://mfp/","mfpProxyPassword":"pw","tvProxyUrl":"https://tvp/"}"#;
        let token = STANDARD.encode(json);

        let config = ProxyConfig::decode(&token).unwrap();
        assert_eq!(config.credentials(), Some(("https://mfp", "pw")));
        assert_eq!(config.live_proxy_base_url.as_deref(), Some("https://tvp"));
    }

    #[test]
    fn test_decode_nested_and_legacy() {
        let nested = ProxyConfig::decode(
            r#"{"config":{"baseUrl":"https://nested"},"apiPassword":"secret"}"#,
        )
        .unwrap();
        assert_eq!(nested.credentials(), Some(("https://nested", "secret")));

        let legacy = ProxyConfig::decode(
            r#"{"mediaFlowProxyUrl":"https://legacy","mediaFlowProxyPassword":"pw"}"#,
        )
        .unwrap();
        assert_eq!(legacy.credentials(), Some(("https://legacy", "pw")));
    }

    #[test]
    fn test_decode_mixed_flat_and_legacy_keys() {
        let config = ProxyConfig::decode(
            r#"{"mfpProxyUrl":"https://mfp","mediaFlowProxyPassword":"pw"}"#,
        )
        .unwrap();
        assert_eq!(config.credentials(), Some(("https://mfp", "pw")));

        let config = ProxyConfig::decode(
            r#"{"mfpProxyUrl":"","mediaFlowProxyUrl":"https://legacy/","mfpProxyPassword":"new"}"#,
        )
        .unwrap();
        assert_eq!(config.credentials(), Some(("https://legacy", "new")));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            ProxyConfig::decode("%%%"),
            Err(ProxyConfigError::Undecodable)
        ));
        assert!(matches!(
            ProxyConfig::decode("{not json"),
            Err(ProxyConfigError::Json(_))
        ));
    }
}
