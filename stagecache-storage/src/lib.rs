//! Stagecache Storage - Thread-Safe Stage Cache
//!
//! An in-process cache that lets independent clients share reference-counted
//! stages, either by a lightweight [`StageId`] or by structural lookup through
//! [`StageQuery`].
//!
//! # Example
//!
//! ```
//! use stagecache_storage::{StageCache, StageId, StageKey, StageQuery};
//! use std::sync::Arc;
//!
//! let cache: StageCache<String, &str, ()> = StageCache::new();
//! let stage = Arc::new("scene".to_string());
//! let id = cache.insert(&stage, StageKey::new("scene.usda", None, ()));
//!
//! // Ids survive a trip through a string.
//! let id = StageId::from_string(&id.to_string()).unwrap();
//! assert!(Arc::ptr_eq(&cache.find(id).unwrap(), &stage));
//!
//! let matches = cache.find_all_matching(&StageQuery::root("scene.usda"));
//! assert_eq!(matches.len(), 1);
//! ```

pub mod cache;
pub mod observer;
mod store;

pub use cache::StageCache;
pub use observer::{CacheEvent, CacheObserver, NoopObserver, TracingObserver};

// Re-export core types for convenience
pub use stagecache_core::{
    CacheConfig, ConfigError, FormatError, KeyedStage, StageCacheError, StageCacheResult,
    StageId, StageKey, StageQuery,
};
