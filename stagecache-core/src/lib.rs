//! Stagecache Core - Identity, Keys and Errors
//!
//! Plain value types shared by the cache implementation and its callers.
//! This crate holds no cache state.

pub mod config;
pub mod error;
pub mod identity;
pub mod key;

pub use config::CacheConfig;
pub use error::{ConfigError, FormatError, StageCacheError, StageCacheResult};
pub use identity::StageId;
pub use key::{KeyedStage, StageKey, StageQuery};
