//! Diagnostic hooks for cache operations.
//!
//! A [`StageCache`](crate::StageCache) reports every find, insert, erase and
//! clear to its [`CacheObserver`]. Observers are always invoked after the
//! cache lock has been released, so they may call back into the cache.

use stagecache_core::StageId;

/// A cache operation, as seen by an observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// Lookup by id
    Find { id: StageId, hit: bool },
    /// Lookup by key; `found` is the number of stages returned
    FindMatching { found: usize },
    /// Insert; `inserted` is false if the stage was already cached
    Insert { id: StageId, inserted: bool },
    /// Erase by id or by stage; erasing an uncached stage reports an invalid id
    Erase { id: StageId, erased: bool },
    /// Erase by key
    EraseMatching { count: usize },
    /// Clear; `count` is the number of stages dropped from the cache
    Clear { count: usize },
}

/// Receives cache events.
pub trait CacheObserver: Send + Sync {
    /// Return false to let the cache skip building events entirely.
    fn enabled(&self) -> bool {
        true
    }

    /// Called once per operation with the cache's debug label.
    fn on_event(&self, cache: &str, event: &CacheEvent);
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CacheObserver for NoopObserver {
    fn enabled(&self) -> bool {
        false
    }

    fn on_event(&self, _cache: &str, _event: &CacheEvent) {}
}

/// Observer that emits one `tracing` event per operation.
///
/// Lookups are logged at `TRACE`, mutations at `DEBUG`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CacheObserver for TracingObserver {
    fn on_event(&self, cache: &str, event: &CacheEvent) {
        match *event {
            CacheEvent::Find { id, hit } => {
                tracing::trace!(cache, id = %id, hit, "Stage cache find");
            }
            CacheEvent::FindMatching { found } => {
                tracing::trace!(cache, found, "Stage cache find matching");
            }
            CacheEvent::Insert { id, inserted } => {
                tracing::debug!(cache, id = %id, inserted, "Stage cache insert");
            }
            CacheEvent::Erase { id, erased } => {
                tracing::debug!(cache, id = %id, erased, "Stage cache erase");
            }
            CacheEvent::EraseMatching { count } => {
                tracing::debug!(cache, count, "Stage cache erase matching");
            }
            CacheEvent::Clear { count } => {
                tracing::debug!(cache, count, "Stage cache clear");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_observer_is_disabled() {
        assert!(!NoopObserver.enabled());
        NoopObserver.on_event("cache", &CacheEvent::Clear { count: 1 });
    }

    #[test]
    fn test_tracing_observer_accepts_every_event() {
        assert!(TracingObserver.enabled());
        let events = [
            CacheEvent::Find { id: StageId::from_long_int(1), hit: true },
            CacheEvent::FindMatching { found: 0 },
            CacheEvent::Insert { id: StageId::from_long_int(2), inserted: true },
            CacheEvent::Erase { id: StageId::INVALID, erased: false },
            CacheEvent::EraseMatching { count: 3 },
            CacheEvent::Clear { count: 4 },
        ];
        for event in &events {
            TracingObserver.on_event("cache", event);
        }
    }
}
