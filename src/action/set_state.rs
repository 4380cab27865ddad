use crate::store::StoreInner;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

/// A partial state value that can be shallow-merged into a full state.
///
/// Any `FnOnce(&mut S)` is a patch; structs of optional fields can
/// implement it to mirror "partial object" updates.
pub trait Patch<S> {
    /// Merge this patch into `state`.
    fn merge_into(self, state: &mut S);
}

impl<S, F> Patch<S> for F
where
    F: FnOnce(&mut S),
{
    fn merge_into(self, state: &mut S) {
        self(state)
    }
}

/// Mutation handle passed to setter-passing actions.
///
/// Cheap to clone and `Send`, so an action body can move it into a task and
/// call it after an await. Each call is one complete state replacement:
/// every current subscriber has been notified by the time it returns.
pub struct SetState<S> {
    inner: Arc<StoreInner<S>>,
}

impl<S: Send + Sync + 'static> SetState<S> {
    pub(crate) fn new(inner: Arc<StoreInner<S>>) -> Self {
        Self { inner }
    }

    /// The current state snapshot.
    pub fn get(&self) -> Arc<S> {
        self.inner.snapshot()
    }

    /// Replace the state.
    pub fn set(&self, state: S) {
        self.inner.replace(state);
    }

    /// Replace the state with a value computed from the previous one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&S) -> S,
    {
        if let Err(never) = self
            .inner
            .transition(|prev| Ok::<S, Infallible>(f(prev)))
        {
            match never {}
        }
    }

    /// Shallow-merge a partial value into a copy of the current state.
    pub fn patch<P>(&self, patch: P)
    where
        S: Clone,
        P: Patch<S>,
    {
        if let Err(never) = self.inner.transition(|prev| {
            let mut next = prev.clone();
            patch.merge_into(&mut next);
            Ok::<S, Infallible>(next)
        }) {
            match never {}
        }
    }
}

impl<S> Clone for SetState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for SetState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState").finish_non_exhaustive()
    }
}
