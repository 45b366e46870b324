pub mod directory;
pub mod matcher;
pub mod types;

pub use directory::{ChannelDirectory, DirectoryError};
pub use matcher::{DirectoryIndex, Match, MatchKind, Matcher, normalize};
pub use types::{ChannelDefinition, DirectoryEntry, StaticLocator, Transport};
