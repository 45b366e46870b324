use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::types::{ChannelDefinition, StaticLocator};

/// Channels served without any proxy unless the directory file says otherwise.
pub const DEFAULT_OPEN_ACCESS: &[&str] = &[
    "rai1",
    "rai2",
    "rai3",
    "rai4",
    "rai5",
    "raimovie",
    "raipremium",
    "raigulp",
    "raiyoyo",
    "rainews24",
    "raistoria",
    "raiscuola",
    "raisport",
    "rai4k",
];

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("duplicate channel id '{0}'")]
    DuplicateId(String),
    #[error("channel with empty id or name")]
    MissingField,
}

/// Channel entry as written in the directory file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChannel {
    id: String,
    name: String,
    #[serde(default)]
    static_url: Option<String>,
    #[serde(default)]
    static_url2: Option<String>,
    #[serde(default)]
    static_url3: Option<String>,
    #[serde(default, alias = "vavooNames")]
    aliases: Vec<String>,
    #[serde(default)]
    open_access: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDirectory {
    Listing(Vec<RawChannel>),
    Document {
        #[serde(default, rename = "openAccess")]
        open_access: Option<Vec<String>>,
        channels: Vec<RawChannel>,
    },
}

/**
    The static set of configured channels, loaded once at startup.
*/
#[derive(Debug, Clone, Default)]
pub struct ChannelDirectory {
    channels: Vec<ChannelDefinition>,
    by_id: HashMap<String, usize>,
}

impl ChannelDirectory {
    /// Load a directory from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let content = std::fs::read_to_string(path).map_err(|source| DirectoryError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = path
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false);

        let raw: RawDirectory = if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| DirectoryError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| DirectoryError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawDirectory) -> Result<Self, DirectoryError> {
        let (open_access, channels) = match raw {
            RawDirectory::Listing(channels) => (None, channels),
            RawDirectory::Document {
                open_access,
                channels,
            } => (open_access, channels),
        };

        let allow_list: HashSet<String> = match open_access {
            Some(ids) => ids.into_iter().collect(),
            None => DEFAULT_OPEN_ACCESS.iter().map(|s| s.to_string()).collect(),
        };

        let definitions = channels
            .into_iter()
            .map(|raw| {
                if raw.id.trim().is_empty() || raw.name.trim().is_empty() {
                    return Err(DirectoryError::MissingField);
                }

                let static_locators = [raw.static_url, raw.static_url2, raw.static_url3]
                    .into_iter()
                    .flatten()
                    .filter(|url| !url.trim().is_empty())
                    .map(StaticLocator::new)
                    .collect();

                let is_open_access = raw
                    .open_access
                    .unwrap_or_else(|| allow_list.contains(&raw.id));

                Ok(ChannelDefinition {
                    id: raw.id,
                    display_name: raw.name,
                    aliases: raw.aliases,
                    static_locators,
                    is_open_access,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(definitions)
    }

    pub fn new(channels: Vec<ChannelDefinition>) -> Result<Self, DirectoryError> {
        let mut by_id = HashMap::with_capacity(channels.len());
        for (index, channel) in channels.iter().enumerate() {
            if by_id.insert(channel.id.clone(), index).is_some() {
                return Err(DirectoryError::DuplicateId(channel.id.clone()));
            }
        }
        Ok(Self { channels, by_id })
    }

    /// Find a channel by id, accepting an optional `tv:` prefix.
    pub fn get(&self, id: &str) -> Option<&ChannelDefinition> {
        let id = id.strip_prefix("tv:").unwrap_or(id);
        self.by_id.get(id).map(|&index| &self.channels[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelDefinition> {
        self.channels.iter()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
