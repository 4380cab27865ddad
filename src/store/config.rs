use crate::action::{ActionDefinition, SetState};
use crate::error::{BoxError, Result};
use crate::store::store::{create_store, Store};
use std::future::Future;
use std::sync::Arc;

/// Construction parameters for a [`Store`].
///
/// Holds the initial state, the action definitions in the order they were
/// added, and a name used to tag log output.
pub struct StoreConfig<S> {
    pub(crate) name: Arc<str>,
    pub(crate) initial_state: S,
    pub(crate) definitions: Vec<(String, ActionDefinition<S>)>,
}

impl<S: Send + Sync + 'static> StoreConfig<S> {
    /// Start a configuration from the initial state.
    ///
    /// The state is moved into the store; pass a clone to keep using the
    /// original value independently.
    pub fn new(initial_state: S) -> Self {
        Self {
            name: Arc::from("store"),
            initial_state,
            definitions: Vec::new(),
        }
    }

    /// Name the store in log fields.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Arc::from(name.into());
        self
    }

    /// Add a prepared action definition.
    pub fn action(mut self, name: impl Into<String>, definition: ActionDefinition<S>) -> Self {
        self.definitions.push((name.into(), definition));
        self
    }

    /// Add a reducer-form action: `(state, payload) -> new state`.
    pub fn reducer<P, F>(self, name: impl Into<String>, reducer: F) -> Self
    where
        P: 'static,
        F: Fn(&S, P) -> S + Send + Sync + 'static,
    {
        self.action(name, ActionDefinition::reducer(reducer))
    }

    /// Add a reducer that may reject the transition.
    pub fn try_reducer<P, E, F>(self, name: impl Into<String>, reducer: F) -> Self
    where
        P: 'static,
        E: Into<BoxError>,
        F: Fn(&S, P) -> Result<S, E> + Send + Sync + 'static,
    {
        self.action(name, ActionDefinition::try_reducer(reducer))
    }

    /// Add a setter-passing action.
    pub fn setter<P, R, F>(self, name: impl Into<String>, body: F) -> Self
    where
        P: 'static,
        R: 'static,
        F: Fn(SetState<S>, P) -> R + Send + Sync + 'static,
    {
        self.action(name, ActionDefinition::setter(body))
    }

    /// Add a setter-passing action whose body finishes asynchronously.
    pub fn async_setter<P, T, Fut, F>(self, name: impl Into<String>, body: F) -> Self
    where
        P: 'static,
        T: 'static,
        Fut: Future<Output = T> + Send + 'static,
        F: Fn(SetState<S>, P) -> Fut + Send + Sync + 'static,
    {
        self.action(name, ActionDefinition::async_setter(body))
    }

    /// Number of action definitions added so far.
    pub fn action_count(&self) -> usize {
        self.definitions.len()
    }

    /// Build the store; see [`create_store`].
    pub fn build(self) -> Result<Store<S>> {
        create_store(self)
    }
}
