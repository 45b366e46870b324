pub mod store;

pub use store::{CacheError, CacheSnapshot, CacheStore};
