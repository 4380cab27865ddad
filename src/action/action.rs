use crate::action::definition::ActionDefinition;
use crate::error::{Result, StoreError};
use crate::store::StoreInner;
use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by asynchronous setter actions.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Handle for an action defined with `async_setter`.
pub type AsyncAction<P, T = ()> = Action<P, BoxFuture<T>>;

/// A bound action: a callable taking only its payload.
///
/// The state channel the definition received is already wired in, so
/// callers see `(payload) -> R` regardless of how the action was defined.
pub struct Action<P, R = ()> {
    name: Arc<str>,
    run: Arc<dyn Fn(P) -> Result<R> + Send + Sync>,
}

impl<P: 'static, R: 'static> Action<P, R> {
    pub(crate) fn new<F>(name: Arc<str>, run: F) -> Self
    where
        F: Fn(P) -> Result<R> + Send + Sync + 'static,
    {
        Self {
            name,
            run: Arc::new(run),
        }
    }

    /// Invoke the action with its payload.
    pub fn call(&self, payload: P) -> Result<R> {
        (self.run)(payload)
    }

    /// The configured action name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<P, R> Clone for Action<P, R> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            run: Arc::clone(&self.run),
        }
    }
}

impl<P, R> fmt::Debug for Action<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("payload", &type_name::<P>())
            .field("output", &type_name::<R>())
            .finish()
    }
}

/// A bound action with its payload and output types erased.
pub(crate) struct BoundAction {
    payload: &'static str,
    output: &'static str,
    handle: Arc<dyn Any + Send + Sync>,
}

impl BoundAction {
    pub(crate) fn new<P: 'static, R: 'static>(action: Action<P, R>) -> Self {
        Self {
            payload: type_name::<P>(),
            output: type_name::<R>(),
            handle: Arc::new(action),
        }
    }
}

/// The fixed table of actions bound to one store.
pub struct Actions<S> {
    store: Arc<str>,
    table: BTreeMap<String, BoundAction>,
    _state: PhantomData<fn() -> S>,
}

impl<S: Send + Sync + 'static> Actions<S> {
    /// Bind each definition once against the store engine.
    pub(crate) fn bind(
        inner: &Arc<StoreInner<S>>,
        definitions: Vec<(String, ActionDefinition<S>)>,
    ) -> Result<Self> {
        let mut table = BTreeMap::new();
        for (name, definition) in definitions {
            if table.contains_key(&name) {
                return Err(StoreError::duplicate_action(name));
            }
            let bound = definition.bind(inner, Arc::from(name.as_str()));
            table.insert(name, bound);
        }

        Ok(Self {
            store: Arc::from(inner.name()),
            table,
            _state: PhantomData,
        })
    }
}

impl<S> Actions<S> {
    /// Look up an action by name with its payload and return types.
    ///
    /// Fails with [`StoreError::UnknownAction`] for a name that was not
    /// configured and [`StoreError::ActionSignature`] when the types differ
    /// from the definition.
    pub fn get<P: 'static, R: 'static>(&self, name: &str) -> Result<Action<P, R>> {
        let bound = self.table.get(name).ok_or_else(|| {
            tracing::warn!(store = %self.store, action = name, "unknown action");
            StoreError::unknown_action(name)
        })?;

        bound
            .handle
            .downcast_ref::<Action<P, R>>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!(
                    store = %self.store,
                    action = name,
                    payload = bound.payload,
                    requested = type_name::<P>(),
                    "action requested with a mismatched signature"
                );
                StoreError::ActionSignature {
                    name: name.to_string(),
                    payload: bound.payload,
                    output: bound.output,
                    requested_payload: type_name::<P>(),
                    requested_output: type_name::<R>(),
                }
            })
    }

    /// Invoke a unit-returning action by name.
    pub fn dispatch<P: 'static>(&self, name: &str, payload: P) -> Result<()> {
        self.get::<P, ()>(name)?.call(payload)
    }

    /// Whether an action with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Configured action names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    /// Number of configured actions.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the store was configured without actions.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl<S> fmt::Debug for Actions<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.table
                    .iter()
                    .map(|(name, bound)| (name, format!("({}) -> {}", bound.payload, bound.output))),
            )
            .finish()
    }
}
