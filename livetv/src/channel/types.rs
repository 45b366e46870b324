use serde::{Deserialize, Serialize};

/// How a static locator is delivered, inferred from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// DASH manifest (`.mpd`), needs the manifest-rewrite proxy endpoint.
    Manifest,
    /// Anything else (HLS playlists, raw TS), goes through the stream proxy.
    SegmentedStream,
}

impl Transport {
    pub fn infer(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if path.to_ascii_lowercase().ends_with(".mpd") {
            Transport::Manifest
        } else {
            Transport::SegmentedStream
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Transport::Manifest => "MPD",
            Transport::SegmentedStream => "HLS",
        }
    }
}

/// A ready-to-use URL configured for a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticLocator {
    pub url: String,
    pub transport: Transport,
}

impl StaticLocator {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let transport = Transport::infer(&url);
        Self { url, transport }
    }
}

/**
    A statically configured live channel.

    Immutable after the directory is loaded. `display_name` doubles as the
    key under which externally resolved locators are cached.
*/
#[derive(Debug, Clone)]
pub struct ChannelDefinition {
    pub id: String,
    pub display_name: String,
    pub aliases: Vec<String>,
    pub static_locators: Vec<StaticLocator>,
    pub is_open_access: bool,
}

impl ChannelDefinition {
    /// Names tried against the external resolver, in preference order.
    pub fn lookup_names(&self) -> Vec<&str> {
        if self.aliases.is_empty() {
            vec![self.display_name.as_str()]
        } else {
            self.aliases.iter().map(String::as_str).collect()
        }
    }

    /// Display name followed by every alias.
    pub fn match_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.display_name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// One entry of the external live-TV directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl DirectoryEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            aliases: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_from_extension() {
        assert_eq!(Transport::infer("https://x/a.mpd"), Transport::Manifest);
        assert_eq!(
            Transport::infer("https://x/live/index.MPD?key_id=1&key=2"),
            Transport::Manifest
        );
        assert_eq!(
            Transport::infer("https://x/live/index.m3u8"),
            Transport::SegmentedStream
        );
        assert_eq!(
            Transport::infer("https://x/a.mpd.m3u8"),
            Transport::SegmentedStream
        );
    }

    #[test]
    fn test_lookup_names_fall_back_to_display_name() {
        let mut channel = ChannelDefinition {
            id: "sky_uno".to_string(),
            display_name: "Sky Uno".to_string(),
            aliases: Vec::new(),
            static_locators: Vec::new(),
            is_open_access: false,
        };
        assert_eq!(channel.lookup_names(), vec!["Sky Uno"]);

        channel.aliases = vec!["SKY UNO".to_string(), "SKY UNO HD".to_string()];
        assert_eq!(channel.lookup_names(), vec!["SKY UNO", "SKY UNO HD"]);
        assert_eq!(
            channel.match_names().collect::<Vec<_>>(),
            vec!["Sky Uno", "SKY UNO", "SKY UNO HD"]
        );
    }
}
