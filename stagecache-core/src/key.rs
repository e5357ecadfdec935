//! Structural lookup keys for cached stages.
//!
//! Every cached stage is indexed by a [`StageKey`]: a required root handle, an
//! optional session handle and a resolution context. The cache never looks
//! inside these values; it only compares them for equality (and hashes the
//! root handle).
//!
//! A [`StageQuery`] names the root handle and optionally the session handle
//! and/or context. Components left out of a query match anything.

use serde::{Deserialize, Serialize};

/// The full key a stage is indexed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageKey<H, C> {
    /// Primary identity of the stage
    pub root: H,
    /// Secondary identity; `None` when the stage has no session handle
    pub session: Option<H>,
    /// Context the stage was resolved under
    pub context: C,
}

impl<H, C> StageKey<H, C> {
    pub fn new(root: H, session: Option<H>, context: C) -> Self {
        Self {
            root,
            session,
            context,
        }
    }
}

/// A full or partial key used to match cached stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageQuery<H, C> {
    root: H,
    // Outer None: unconstrained. Some(None): stages without a session handle.
    session: Option<Option<H>>,
    context: Option<C>,
}

impl<H, C> StageQuery<H, C> {
    /// Match every stage with `root`.
    pub fn root(root: H) -> Self {
        Self {
            root,
            session: None,
            context: None,
        }
    }

    /// Additionally require the session handle to equal `session`.
    ///
    /// Passing `None` restricts the query to stages that have no session
    /// handle.
    pub fn with_session(mut self, session: Option<H>) -> Self {
        self.session = Some(session);
        self
    }

    /// Additionally require the resolution context to equal `context`.
    pub fn with_context(mut self, context: C) -> Self {
        self.context = Some(context);
        self
    }

    pub fn root_key(&self) -> &H {
        &self.root
    }

    pub fn session_key(&self) -> Option<Option<&H>> {
        self.session.as_ref().map(Option::as_ref)
    }

    pub fn context_key(&self) -> Option<&C> {
        self.context.as_ref()
    }
}

impl<H: PartialEq, C: PartialEq> StageQuery<H, C> {
    /// Return true if `key` agrees with every component this query names.
    pub fn matches(&self, key: &StageKey<H, C>) -> bool {
        self.root == key.root
            && self.session.as_ref().map_or(true, |s| *s == key.session)
            && self.context.as_ref().map_or(true, |c| *c == key.context)
    }
}

impl<H, C> From<StageKey<H, C>> for StageQuery<H, C> {
    fn from(key: StageKey<H, C>) -> Self {
        Self {
            root: key.root,
            session: Some(key.session),
            context: Some(key.context),
        }
    }
}

/// A stage that can report the key it should be cached under.
pub trait KeyedStage {
    /// Handle type of the root and session identities
    type Layer;
    /// Resolution context type
    type Context;

    fn stage_key(&self) -> StageKey<Self::Layer, Self::Context>;
}

// =============================================================================
// TESTS
// =============================================================================
