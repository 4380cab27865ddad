use crate::action::{Action, Actions};
use crate::error::Result;
use crate::select::{ExternalStore, Selection};
use crate::store::config::StoreConfig;
use crate::store::subscribers::{Listener, Registry, Unsubscribe};
use parking_lot::{ReentrantMutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Shared engine state: the snapshot, the registry and the transition lock.
pub(crate) struct StoreInner<S> {
    name: Arc<str>,
    state: RwLock<Arc<S>>,
    version: AtomicU64,
    subscribers: Arc<Registry>,
    // Held for a whole transition including fan-out. Re-entrant so that a
    // listener may dispatch on the same thread.
    transition: ReentrantMutex<()>,
}

impl<S: Send + Sync + 'static> StoreInner<S> {
    fn new(name: Arc<str>, initial: S) -> Self {
        Self {
            subscribers: Registry::new(Arc::clone(&name)),
            name,
            state: RwLock::new(Arc::new(initial)),
            version: AtomicU64::new(0),
            transition: ReentrantMutex::new(()),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn snapshot(&self) -> Arc<S> {
        Arc::clone(&self.state.read())
    }

    /// Replace the state and notify every listener before returning.
    pub(crate) fn replace(&self, next: S) {
        let _transition = self.transition.lock();
        *self.state.write() = Arc::new(next);
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(
            store = %self.name,
            version,
            listeners = self.subscribers.len(),
            "state replaced"
        );
        self.subscribers.notify();
    }

    /// Derive the next state from the current one and commit it.
    ///
    /// Nothing is written and nobody is notified when `f` fails or panics.
    pub(crate) fn transition<E>(&self, f: impl FnOnce(&S) -> Result<S, E>) -> Result<(), E> {
        let _transition = self.transition.lock();
        let current = self.snapshot();
        let next = f(&*current)?;
        self.replace(next);
        Ok(())
    }
}

/// A state container with named actions and change subscriptions.
///
/// Holds one immutable snapshot of `S`. Actions configured at construction
/// are the only way to produce a new snapshot; every replacement is followed
/// by a synchronous notification of all subscribers.
///
/// # Examples
///
/// ```
/// use zusdux::StoreConfig;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Counter {
///     count: i32,
/// }
///
/// let store = StoreConfig::new(Counter { count: 0 })
///     .reducer("increment", |s: &Counter, _: ()| Counter { count: s.count + 1 })
///     .build()?;
///
/// store.dispatch("increment", ())?;
/// assert_eq!(*store.get_state(), Counter { count: 1 });
/// # Ok::<(), zusdux::StoreError>(())
/// ```
pub struct Store<S> {
    inner: Arc<StoreInner<S>>,
    actions: Arc<Actions<S>>,
}

/// Create a store from its configuration.
///
/// Each action definition is bound exactly once; the resulting action table
/// is fixed for the lifetime of the store.
pub fn create_store<S>(config: StoreConfig<S>) -> Result<Store<S>>
where
    S: Send + Sync + 'static,
{
    let StoreConfig {
        name,
        initial_state,
        definitions,
    } = config;

    let inner = Arc::new(StoreInner::new(name, initial_state));
    let actions = Actions::bind(&inner, definitions)?;

    tracing::debug!(
        store = %inner.name(),
        actions = actions.len(),
        "store created"
    );

    Ok(Store {
        inner,
        actions: Arc::new(actions),
    })
}

impl<S: Send + Sync + 'static> Store<S> {
    /// Create a store; shorthand for [`create_store`].
    pub fn new(config: StoreConfig<S>) -> Result<Self> {
        create_store(config)
    }

    /// Name given in the configuration, used in log fields.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Get the current state snapshot.
    pub fn get_state(&self) -> Arc<S> {
        self.inner.snapshot()
    }

    /// Read a derived value from the current state.
    ///
    /// Side-effect free and cheap, so bindings may call it speculatively.
    pub fn read<F, R>(&self, selector: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        let state = self.inner.snapshot();
        selector(&*state)
    }

    /// Number of state replacements since construction.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    /// The bound actions configured for this store.
    pub fn actions(&self) -> &Actions<S> {
        &self.actions
    }

    /// Look up a typed action handle by name.
    pub fn action<P: 'static, R: 'static>(&self, name: &str) -> Result<Action<P, R>> {
        self.actions.get(name)
    }

    /// Invoke a unit-returning action by name.
    pub fn dispatch<P: 'static>(&self, name: &str, payload: P) -> Result<()> {
        self.actions.dispatch(name, payload)
    }

    /// Subscribe to state changes.
    ///
    /// The callback runs after every subsequent state replacement until the
    /// returned handle is used to unsubscribe. Dropping the handle leaves the
    /// callback registered; [`Unsubscribe::into_guard`] ties it to a scope.
    ///
    /// The store owns its callbacks, so a callback that captures a `Store`
    /// clone keeps the store alive while registered. Capture
    /// [`downgrade`](Store::downgrade) instead:
    ///
    /// ```
    /// use zusdux::StoreConfig;
    ///
    /// let store = StoreConfig::new(0_u32)
    ///     .reducer("bump", |s: &u32, _: ()| s + 1)
    ///     .build()?;
    ///
    /// let weak = store.downgrade();
    /// let _handle = store.subscribe(move || {
    ///     if let Some(store) = weak.upgrade() {
    ///         println!("now {}", store.get_state());
    ///     }
    /// });
    /// store.dispatch("bump", ())?;
    /// # Ok::<(), zusdux::StoreError>(())
    /// ```
    pub fn subscribe<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe_listener(Arc::new(callback))
    }

    /// Subscribe a shared listener; registering the same `Arc` twice is a no-op.
    pub fn subscribe_listener(&self, listener: Listener) -> Unsubscribe {
        let handle = self.inner.subscribers.insert(listener);
        tracing::debug!(
            store = %self.inner.name(),
            listeners = self.inner.subscribers.len(),
            "listener subscribed"
        );
        handle
    }

    /// A handle that does not keep the store alive.
    pub fn downgrade(&self) -> WeakStore<S> {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
            actions: Arc::downgrade(&self.actions),
        }
    }

    /// Number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Bind a selector, re-signalling only when its derived value changes.
    pub fn select<R, F>(&self, selector: F) -> Selection<S, R>
    where
        R: PartialEq + Send + Sync + 'static,
        F: Fn(&S) -> R + Send + Sync + 'static,
    {
        Selection::new(self, selector)
    }

    /// Bind a selector with a custom equality check.
    pub fn select_with<R, F, E>(&self, selector: F, equal: E) -> Selection<S, R>
    where
        R: Send + Sync + 'static,
        F: Fn(&S) -> R + Send + Sync + 'static,
        E: Fn(&R, &R) -> bool + Send + Sync + 'static,
    {
        Selection::with_equality(self, selector, equal)
    }

    /// Bind the whole snapshot, compared by pointer identity.
    pub fn select_all(&self) -> Selection<S, Arc<S>> {
        Selection::from_source(self, |state: Arc<S>| state, |a: &Arc<S>, b: &Arc<S>| {
            Arc::ptr_eq(a, b)
        })
    }
}

impl<S: Send + Sync + 'static> ExternalStore<S> for Store<S> {
    fn subscribe_listener(&self, listener: Listener) -> Unsubscribe {
        Store::subscribe_listener(self, listener)
    }

    fn snapshot(&self) -> Arc<S> {
        self.get_state()
    }
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            actions: Arc::clone(&self.actions),
        }
    }
}

/// Non-owning store handle, for listeners that read back into their store.
pub struct WeakStore<S> {
    inner: Weak<StoreInner<S>>,
    actions: Weak<Actions<S>>,
}

impl<S> WeakStore<S> {
    /// The store, if any `Store` handle to it is still alive.
    pub fn upgrade(&self) -> Option<Store<S>> {
        Some(Store {
            inner: self.inner.upgrade()?,
            actions: self.actions.upgrade()?,
        })
    }
}

impl<S> Clone for WeakStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
            actions: Weak::clone(&self.actions),
        }
    }
}
