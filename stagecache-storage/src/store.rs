//! Multi-index stage store.
//!
//! The store is not synchronized; [`crate::StageCache`] owns one behind a
//! mutex. Three indexes are kept consistent on every insert and erase:
//!
//! - `entries`: id -> entry (authoritative)
//! - `by_stage`: stage address -> id
//! - `by_root`: root handle -> ids, ordered so matches come back in
//!   insertion order

use stagecache_core::{StageId, StageKey, StageQuery};
use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Process-wide id source. Ids from unrelated caches never collide, so an id
/// presented to the wrong cache simply is not found.
static NEXT_STAGE_ID: AtomicI64 = AtomicI64::new(1);

fn next_stage_id() -> StageId {
    StageId::from_long_int(NEXT_STAGE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Address of the shared allocation, used as the stage's identity.
fn stage_addr<S: ?Sized>(stage: &Arc<S>) -> usize {
    Arc::as_ptr(stage) as *const () as usize
}

/// One cached stage.
#[derive(Debug)]
pub struct Entry<S: ?Sized, H, C> {
    pub id: StageId,
    pub stage: Arc<S>,
    pub key: StageKey<H, C>,
}

impl<S: ?Sized, H: Clone, C: Clone> Clone for Entry<S, H, C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            stage: Arc::clone(&self.stage),
            key: self.key.clone(),
        }
    }
}

/// Unsynchronized stage storage with id, identity and key indexes.
#[derive(Debug)]
pub struct StageStore<S: ?Sized, H, C> {
    entries: HashMap<StageId, Entry<S, H, C>>,
    by_stage: HashMap<usize, StageId>,
    by_root: HashMap<H, BTreeSet<StageId>>,
}

impl<S: ?Sized, H, C> Default for StageStore<S, H, C> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            by_stage: HashMap::new(),
            by_root: HashMap::new(),
        }
    }
}

impl<S: ?Sized, H: Clone, C: Clone> Clone for StageStore<S, H, C> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            by_stage: self.by_stage.clone(),
            by_root: self.by_root.clone(),
        }
    }
}

impl<S, H, C> StageStore<S, H, C>
where
    S: ?Sized,
    H: Eq + Hash + Clone,
    C: PartialEq,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `stage` under `key`, or return its id if already present.
    ///
    /// The second element is false when the stage was already present; the
    /// supplied key is discarded in that case.
    pub fn insert(&mut self, stage: &Arc<S>, key: StageKey<H, C>) -> (StageId, bool) {
        let addr = stage_addr(stage);
        if let Some(&id) = self.by_stage.get(&addr) {
            return (id, false);
        }

        // `H::clone` and `H::hash` may unwind. Run them before any index is
        // written so a poisoned store is still consistent.
        let id = next_stage_id();
        let root = key.root.clone();
        self.by_root.entry(root).or_default().insert(id);
        self.by_stage.insert(addr, id);
        self.entries.insert(
            id,
            Entry {
                id,
                stage: Arc::clone(stage),
                key,
            },
        );
        (id, true)
    }

    pub fn find(&self, id: StageId) -> Option<&Arc<S>> {
        self.entries.get(&id).map(|e| &e.stage)
    }

    pub fn contains_id(&self, id: StageId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Id of `stage`, or [`StageId::INVALID`] if it is not stored here.
    pub fn id_of(&self, stage: &Arc<S>) -> StageId {
        self.by_stage
            .get(&stage_addr(stage))
            .copied()
            .unwrap_or_default()
    }

    /// Ids of matching entries, in insertion order.
    fn matching_ids<'a>(&'a self, query: &'a StageQuery<H, C>) -> impl Iterator<Item = StageId> + 'a {
        self.by_root
            .get(query.root_key())
            .into_iter()
            .flatten()
            .copied()
            .filter(move |id| {
                self.entries
                    .get(id)
                    .map_or(false, |e| query.matches(&e.key))
            })
    }

    /// Any one matching stage. Currently the earliest inserted.
    pub fn find_one(&self, query: &StageQuery<H, C>) -> Option<&Arc<S>> {
        self.matching_ids(query).next().and_then(|id| self.find(id))
    }

    pub fn find_all(&self, query: &StageQuery<H, C>) -> Vec<Arc<S>> {
        self.matching_ids(query)
            .filter_map(|id| self.find(id).cloned())
            .collect()
    }

    /// Remove the entry for `id`. The removed entry is handed back so the
    /// caller decides where its stage handle is released.
    pub fn erase(&mut self, id: StageId) -> Option<Entry<S, H, C>> {
        let root = &self.entries.get(&id)?.key.root;
        // Each root lookup either unwinds before touching `by_root` or
        // completes; the id-keyed indexes are only updated afterwards.
        let bucket_len = self.by_root.get(root).map_or(0, BTreeSet::len);
        if bucket_len <= 1 {
            self.by_root.remove(root);
        } else if let Some(ids) = self.by_root.get_mut(root) {
            ids.remove(&id);
        }

        let entry = self.entries.remove(&id)?;
        self.by_stage.remove(&stage_addr(&entry.stage));
        Some(entry)
    }

    pub fn erase_stage(&mut self, stage: &Arc<S>) -> Option<Entry<S, H, C>> {
        let id = self.id_of(stage);
        self.erase(id)
    }

    pub fn erase_matching(&mut self, query: &StageQuery<H, C>) -> Vec<Entry<S, H, C>> {
        let ids: Vec<StageId> = self.matching_ids(query).collect();
        ids.into_iter().filter_map(|id| self.erase(id)).collect()
    }

    /// Empty the store, returning the previous contents.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// All stages, in insertion order.
    pub fn stages(&self) -> Vec<Arc<S>> {
        let mut entries: Vec<&Entry<S, H, C>> = self.entries.values().collect();
        entries.sort_by_key(|e| e.id);
        entries.into_iter().map(|e| Arc::clone(&e.stage)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
