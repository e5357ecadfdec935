//! Stagecache Test Utilities
//!
//! Shared test infrastructure for the stagecache workspace:
//! - Stand-in stage, layer handle and resolver context types
//! - A drop-counting stage for ownership assertions
//! - Proptest generators for keys and ids
//! - Tracing subscriber setup for tests

pub use stagecache_core::{KeyedStage, StageId, StageKey, StageQuery};

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};

// ============================================================================
// FIXTURES
// ============================================================================

/// Stand-in for a layer handle: compared and hashed by path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerHandle(String);

impl LayerHandle {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stand-in for a resolver context: an asset search path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResolverContext {
    search_path: Vec<String>,
}

impl ResolverContext {
    pub fn new<I, P>(search_path: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            search_path: search_path.into_iter().map(Into::into).collect(),
        }
    }

    pub fn search_path(&self) -> &[String] {
        &self.search_path
    }
}

/// A stage that knows the key it was opened with.
#[derive(Debug)]
pub struct TestStage {
    name: String,
    key: StageKey<LayerHandle, ResolverContext>,
}

impl TestStage {
    /// Open a stage on `root` with an optional session layer.
    pub fn open(
        name: impl Into<String>,
        root: &str,
        session: Option<&str>,
        context: ResolverContext,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            key: StageKey::new(LayerHandle::new(root), session.map(LayerHandle::new), context),
        })
    }

    /// Open a stage on `root` with no session layer and an empty context.
    pub fn with_root(root: &str) -> Arc<Self> {
        Self::open(root, root, None, ResolverContext::default())
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl KeyedStage for TestStage {
    type Layer = LayerHandle;
    type Context = ResolverContext;

    fn stage_key(&self) -> StageKey<LayerHandle, ResolverContext> {
        self.key.clone()
    }
}

/// Layer handle whose next `clone` or `hash` panics once armed.
///
/// Clones share the trigger, so arming any copy arms them all. The trigger
/// fires once and then disarms.
#[derive(Debug)]
pub struct TrippingLayer {
    path: &'static str,
    armed: Arc<AtomicBool>,
}

impl TrippingLayer {
    pub fn new(path: &'static str) -> Self {
        Self {
            path,
            armed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    fn trip(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            panic!("layer {} tripped", self.path);
        }
    }
}

impl Clone for TrippingLayer {
    fn clone(&self) -> Self {
        self.trip();
        Self {
            path: self.path,
            armed: Arc::clone(&self.armed),
        }
    }
}

impl PartialEq for TrippingLayer {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for TrippingLayer {}

impl Hash for TrippingLayer {
    fn hash<HS: Hasher>(&self, state: &mut HS) {
        self.trip();
        self.path.hash(state);
    }
}

/// Counts drops of the stages it hands out.
#[derive(Debug, Clone, Default)]
pub struct DropCounter {
    drops: Arc<AtomicUsize>,
}

/// Stage that bumps its [`DropCounter`] when dropped.
#[derive(Debug)]
pub struct TrackedStage {
    drops: Arc<AtomicUsize>,
}

impl Drop for TrackedStage {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl DropCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Arc<TrackedStage> {
        Arc::new(TrackedStage {
            drops: Arc::clone(&self.drops),
        })
    }

    pub fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }
}

// ============================================================================
// TRACING
// ============================================================================

static TRACING: Once = Once::new();

/// Install a test-writer `fmt` subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("stagecache_storage=trace"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for stagecache types.

    use super::*;
    use proptest::prelude::*;

    /// Generate any id, including the invalid one.
    pub fn arb_stage_id() -> impl Strategy<Value = StageId> {
        prop_oneof![
            1 => Just(StageId::INVALID),
            9 => any::<i64>().prop_map(StageId::from_long_int),
        ]
    }

    /// Generate a layer handle from a small pool so keys collide often.
    pub fn arb_layer_handle() -> impl Strategy<Value = LayerHandle> {
        (0u8..4).prop_map(|n| LayerHandle::new(format!("layer_{}.usda", n)))
    }

    /// Generate a resolver context from a small pool.
    pub fn arb_resolver_context() -> impl Strategy<Value = ResolverContext> {
        prop_oneof![
            Just(ResolverContext::default()),
            Just(ResolverContext::new(["/assets"])),
            Just(ResolverContext::new(["/assets", "/shots"])),
        ]
    }

    /// Generate a full stage key.
    pub fn arb_stage_key() -> impl Strategy<Value = StageKey<LayerHandle, ResolverContext>> {
        (
            arb_layer_handle(),
            prop::option::of(arb_layer_handle()),
            arb_resolver_context(),
        )
            .prop_map(|(root, session, context)| StageKey::new(root, session, context))
    }

    /// Generate a query naming the root and optionally session and context.
    pub fn arb_stage_query() -> impl Strategy<Value = StageQuery<LayerHandle, ResolverContext>> {
        (
            arb_layer_handle(),
            prop::option::of(prop::option::of(arb_layer_handle())),
            prop::option::of(arb_resolver_context()),
        )
            .prop_map(|(root, session, context)| {
                let mut query = StageQuery::root(root);
                if let Some(session) = session {
                    query = query.with_session(session);
                }
                if let Some(context) = context {
                    query = query.with_context(context);
                }
                query
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_stage_reports_key() {
        let stage = TestStage::open("s", "root.usda", Some("sess.usda"), ResolverContext::new(["/a"]));
        let key = stage.stage_key();
        assert_eq!(key.root, LayerHandle::new("root.usda"));
        assert_eq!(key.session.as_ref().map(LayerHandle::path), Some("sess.usda"));
        assert_eq!(key.context.search_path(), ["/a".to_string()]);
        assert_eq!(stage.name(), "s");
    }

    #[test]
    fn test_layer_handle_displays_path() {
        let layer = LayerHandle::new("shots/a.usda");
        assert_eq!(layer.to_string(), layer.path());
    }

    #[test]
    fn test_tripping_layer_fires_once() {
        let layer = TrippingLayer::new("a.usda");
        let copy = layer.clone();
        copy.arm();
        assert!(std::panic::catch_unwind(|| layer.clone()).is_err());
        let again = layer.clone();
        assert_eq!(again, copy);
    }

    #[test]
    fn test_drop_counter() {
        let counter = DropCounter::new();
        let a = counter.stage();
        let b = Arc::clone(&a);
        drop(a);
        assert_eq!(counter.drops(), 0);
        drop(b);
        assert_eq!(counter.drops(), 1);
    }
}
