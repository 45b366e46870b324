pub mod compose;
pub mod proxy;

pub use compose::{PLACEHOLDER_URL, StreamComposer, StreamDescriptor};
pub use proxy::{ProxyConfig, ProxyConfigError};
