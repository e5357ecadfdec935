//! Thread-safe stage cache.

use crate::observer::{CacheEvent, CacheObserver, NoopObserver, TracingObserver};
use crate::store::StageStore;
use stagecache_core::{CacheConfig, KeyedStage, StageCacheResult, StageId, StageKey, StageQuery};
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Everything guarded by the cache lock.
struct CacheState<S: ?Sized, H, C> {
    store: StageStore<S, H, C>,
    debug_name: String,
}

impl<S: ?Sized, H: Clone, C: Clone> Clone for CacheState<S, H, C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            debug_name: self.debug_name.clone(),
        }
    }
}

/// A concurrency-safe collection of shared stages.
///
/// Stages are held as `Arc<S>` and indexed three ways: by the [`StageId`]
/// assigned on insert, by pointer identity, and by their [`StageKey`]. Every
/// method except construction and drop may be called from any thread
/// concurrently; each call holds the instance's lock for its full duration,
/// so operations on one cache are linearizable.
///
/// The cache is a regular value. Cloning it copies the index and shares the
/// stages; erasing from one clone does not affect the other. Erasing a stage
/// only releases the cache's reference, and that release always happens after
/// the lock is dropped, so a stage's `Drop` may use the cache.
pub struct StageCache<S: ?Sized, H, C> {
    state: Mutex<CacheState<S, H, C>>,
    instance: Uuid,
    observer: Arc<dyn CacheObserver>,
}

impl<S, H, C> StageCache<S, H, C>
where
    S: ?Sized,
    H: Eq + Hash + Clone,
    C: PartialEq + Clone,
{
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState {
                store: StageStore::new(),
                debug_name: String::new(),
            }),
            instance: Uuid::now_v7(),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Create an empty cache from `config`.
    ///
    /// With `config.trace` set, operations are reported through
    /// [`TracingObserver`].
    pub fn with_config(config: CacheConfig) -> StageCacheResult<Self> {
        config.validate()?;
        let mut cache = Self::new();
        if let Some(name) = config.debug_name {
            cache.lock_mut().debug_name = name;
        }
        if config.trace {
            cache.observer = Arc::new(TracingObserver);
        }
        Ok(cache)
    }

    /// Replace the observer notified of cache operations.
    pub fn with_observer(mut self, observer: Arc<dyn CacheObserver>) -> Self {
        self.observer = observer;
        self
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<S, H, C>> {
        // Every mutation leaves the store consistent, so a panic elsewhere
        // while holding the lock does not invalidate it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_mut(&mut self) -> &mut CacheState<S, H, C> {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn label(&self, debug_name: &str) -> String {
        if debug_name.is_empty() {
            format!("stage-cache-{}", self.instance)
        } else {
            debug_name.to_string()
        }
    }

    /// Run `op` under the lock and report its event once the lock is gone.
    ///
    /// The result is returned after the guard is dropped, so any stage
    /// handles it carries are released by the caller, outside the lock.
    fn observed<R>(&self, op: impl FnOnce(&mut StageStore<S, H, C>) -> (R, CacheEvent)) -> R {
        let (result, event, label) = {
            let mut state = self.lock();
            let (result, event) = op(&mut state.store);
            let label = self
                .observer
                .enabled()
                .then(|| self.label(&state.debug_name));
            (result, event, label)
        };
        if let Some(label) = label {
            self.observer.on_event(&label, &event);
        }
        result
    }

    /// Return every stage in the cache, in insertion order.
    pub fn all_stages(&self) -> Vec<Arc<S>> {
        self.lock().store.stages()
    }

    /// Number of stages in the cache.
    pub fn len(&self) -> usize {
        self.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().store.is_empty()
    }

    /// Find the stage for `id`.
    ///
    /// Returns `None` if `id` is invalid or not present in this cache.
    pub fn find(&self, id: StageId) -> Option<Arc<S>> {
        self.observed(|store| {
            let stage = store.find(id).cloned();
            let hit = stage.is_some();
            (stage, CacheEvent::Find { id, hit })
        })
    }

    /// Find a stage matching `query`.
    ///
    /// If several stages match, an arbitrary one of them is returned.
    pub fn find_one_matching(&self, query: &StageQuery<H, C>) -> Option<Arc<S>> {
        self.observed(|store| {
            let stage = store.find_one(query).cloned();
            let found = usize::from(stage.is_some());
            (stage, CacheEvent::FindMatching { found })
        })
    }

    /// Find every stage matching `query`.
    pub fn find_all_matching(&self, query: &StageQuery<H, C>) -> Vec<Arc<S>> {
        self.observed(|store| {
            let stages = store.find_all(query);
            let found = stages.len();
            (stages, CacheEvent::FindMatching { found })
        })
    }

    /// Id of `stage` in this cache, or [`StageId::INVALID`] if absent.
    pub fn id_of(&self, stage: &Arc<S>) -> StageId {
        self.lock().store.id_of(stage)
    }

    pub fn contains(&self, stage: &Arc<S>) -> bool {
        self.id_of(stage).is_valid()
    }

    pub fn contains_id(&self, id: StageId) -> bool {
        self.lock().store.contains_id(id)
    }

    /// Insert `stage` under `key` and return its id.
    ///
    /// If `stage` is already present (by identity, not by value), its
    /// existing id is returned and `key` is ignored.
    pub fn insert(&self, stage: &Arc<S>, key: StageKey<H, C>) -> StageId {
        self.observed(|store| {
            let (id, inserted) = store.insert(stage, key);
            (id, CacheEvent::Insert { id, inserted })
        })
    }

    /// Insert `stage` under the key it reports for itself.
    pub fn insert_keyed(&self, stage: &Arc<S>) -> StageId
    where
        S: KeyedStage<Layer = H, Context = C>,
    {
        let key = stage.stage_key();
        self.insert(stage, key)
    }

    /// Erase the stage for `id`. Returns false if there was none.
    pub fn erase(&self, id: StageId) -> bool {
        let removed = self.observed(|store| {
            let removed = store.erase(id);
            let erased = removed.is_some();
            (removed, CacheEvent::Erase { id, erased })
        });
        removed.is_some()
    }

    /// Erase `stage`. Returns false if it was not cached.
    pub fn erase_stage(&self, stage: &Arc<S>) -> bool {
        let removed = self.observed(|store| {
            let removed = store.erase_stage(stage);
            let (id, erased) = removed
                .as_ref()
                .map_or((StageId::INVALID, false), |e| (e.id, true));
            (removed, CacheEvent::Erase { id, erased })
        });
        removed.is_some()
    }

    /// Erase every stage matching `query` and return how many were erased.
    pub fn erase_all(&self, query: &StageQuery<H, C>) -> usize {
        let removed = self.observed(|store| {
            let removed = store.erase_matching(query);
            let count = removed.len();
            (removed, CacheEvent::EraseMatching { count })
        });
        removed.len()
    }

    /// Remove every stage, leaving the cache equivalent to a new one apart
    /// from its debug name.
    pub fn clear(&self) {
        let _old = self.observed(|store| {
            let old = store.take();
            let count = old.len();
            (old, CacheEvent::Clear { count })
        });
    }

    /// Set the name used in diagnostic output. An empty name falls back to
    /// the instance identity.
    ///
    /// Names are checked with [`CacheConfig::validate_debug_name`], the same
    /// rule [`StageCache::with_config`] applies; a rejected name leaves the
    /// current one in place.
    pub fn set_debug_name(&self, name: impl Into<String>) -> StageCacheResult<()> {
        let name = name.into();
        CacheConfig::validate_debug_name(&name)?;
        self.lock().debug_name = name;
        Ok(())
    }

    /// The name set with [`StageCache::set_debug_name`], or empty.
    pub fn debug_name(&self) -> String {
        self.lock().debug_name.clone()
    }

    /// The debug name, or an identity-based label if none is set.
    pub fn debug_label(&self) -> String {
        let state = self.lock();
        self.label(&state.debug_name)
    }

    /// Exchange contents and debug names with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self.lock_mut(), other.lock_mut());
    }
}

impl<S, H, C> Default for StageCache<S, H, C>
where
    S: ?Sized,
    H: Eq + Hash + Clone,
    C: PartialEq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, H, C> Clone for StageCache<S, H, C>
where
    S: ?Sized,
    H: Eq + Hash + Clone,
    C: PartialEq + Clone,
{
    fn clone(&self) -> Self {
        let state = self.lock().clone();
        Self {
            state: Mutex::new(state),
            instance: Uuid::now_v7(),
            observer: Arc::clone(&self.observer),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        let mut copy = source.lock().clone();
        std::mem::swap(self.lock_mut(), &mut copy);
        self.observer = Arc::clone(&source.observer);
        // `copy` now holds the previous contents and is released here.
    }
}

impl<S, H, C> fmt::Debug for StageCache<S, H, C>
where
    S: ?Sized,
    H: Eq + Hash + Clone,
    C: PartialEq + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, len) = {
            let state = self.lock();
            (self.label(&state.debug_name), state.store.len())
        };
        f.debug_struct("StageCache")
            .field("label", &label)
            .field("len", &len)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
