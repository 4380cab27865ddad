use crate::store::{Listener, Registry, Unsubscribe};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// What a reactive binding needs from a store.
///
/// A host framework's external-store hook is built from these two
/// functions: one to learn when to re-check, one to read the snapshot.
pub trait ExternalStore<S>: Send + Sync {
    /// Register a change listener.
    fn subscribe_listener(&self, listener: Listener) -> Unsubscribe;

    /// The current state snapshot. Must be cheap and side-effect free.
    fn snapshot(&self) -> Arc<S>;
}

type Selector<S, R> = Arc<dyn Fn(Arc<S>) -> R + Send + Sync>;
type Equality<R> = Arc<dyn Fn(&R, &R) -> bool + Send + Sync>;

struct SelectionShared<S, R> {
    source: Box<dyn ExternalStore<S>>,
    selector: Selector<S, R>,
    equal: Equality<R>,
    // Swapped whole so readers never hold the lock while user code runs.
    cached: RwLock<Arc<R>>,
    changes: AtomicU64,
    listeners: Arc<Registry>,
}

impl<S, R> SelectionShared<S, R> {
    /// Re-derive from the latest snapshot; returns whether the value changed.
    fn refresh(&self) -> bool {
        let next = (self.selector)(self.source.snapshot());
        let current = self.current();
        if (self.equal)(&*current, &next) {
            return false;
        }
        *self.cached.write() = Arc::new(next);
        self.changes.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn current(&self) -> Arc<R> {
        Arc::clone(&self.cached.read())
    }
}

/// A selector bound to a store.
///
/// Caches the derived value and re-derives it on every store notification.
/// Listeners registered with [`on_change`](Selection::on_change) are only
/// signalled when the derived value actually differs from the cached one,
/// so changes to state the selector does not read are invisible here.
///
/// Dropping the selection removes its store subscription.
///
/// # Examples
///
/// ```
/// use zusdux::StoreConfig;
///
/// #[derive(Clone)]
/// struct State {
///     count: u32,
///     name: String,
/// }
///
/// let store = StoreConfig::new(State { count: 0, name: "counter".into() })
///     .reducer("increment", |s: &State, _: ()| State { count: s.count + 1, ..s.clone() })
///     .reducer("rename", |s: &State, name: String| State { name, ..s.clone() })
///     .build()?;
///
/// let count = store.select(|s: &State| s.count);
/// store.dispatch("rename", "other".to_string())?;
/// assert_eq!(count.changes(), 0);
///
/// store.dispatch("increment", ())?;
/// assert_eq!(count.get(), 1);
/// assert_eq!(count.changes(), 1);
/// # Ok::<(), zusdux::StoreError>(())
/// ```
pub struct Selection<S, R> {
    shared: Arc<SelectionShared<S, R>>,
    subscription: Unsubscribe,
}

impl<S, R> Selection<S, R>
where
    S: Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    /// Bind `selector` to `store`, comparing derived values with `PartialEq`.
    pub fn new<E, F>(store: &E, selector: F) -> Self
    where
        E: ExternalStore<S> + Clone + 'static,
        R: PartialEq,
        F: Fn(&S) -> R + Send + Sync + 'static,
    {
        Self::with_equality(store, selector, |a: &R, b: &R| a == b)
    }

    /// Bind `selector` to `store` with a custom equality check.
    pub fn with_equality<E, F, Q>(store: &E, selector: F, equal: Q) -> Self
    where
        E: ExternalStore<S> + Clone + 'static,
        F: Fn(&S) -> R + Send + Sync + 'static,
        Q: Fn(&R, &R) -> bool + Send + Sync + 'static,
    {
        Self::from_source(store, move |state: Arc<S>| selector(&*state), equal)
    }

    pub(crate) fn from_source<E, F, Q>(store: &E, selector: F, equal: Q) -> Self
    where
        E: ExternalStore<S> + Clone + 'static,
        F: Fn(Arc<S>) -> R + Send + Sync + 'static,
        Q: Fn(&R, &R) -> bool + Send + Sync + 'static,
    {
        let initial = selector(store.snapshot());
        let shared = Arc::new(SelectionShared {
            source: Box::new(store.clone()),
            selector: Arc::new(selector),
            equal: Arc::new(equal),
            cached: RwLock::new(Arc::new(initial)),
            changes: AtomicU64::new(0),
            listeners: Registry::new(Arc::from("selection")),
        });

        // The store only holds a weak reference so the selection can drop.
        let weak: Weak<SelectionShared<S, R>> = Arc::downgrade(&shared);
        let subscription = store.subscribe_listener(Arc::new(move || {
            if let Some(shared) = weak.upgrade() {
                if shared.refresh() {
                    shared.listeners.notify();
                }
            }
        }));

        Self {
            shared,
            subscription,
        }
    }

    /// Read the cached derived value without cloning it.
    ///
    /// `f` sees the value cached when it was called; it may dispatch on the
    /// store, which re-derives the cache without affecting what `f` holds.
    pub fn with<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        let cached = self.shared.current();
        f(&*cached)
    }

    /// Number of times the derived value has changed since binding.
    pub fn changes(&self) -> u64 {
        self.shared.changes.load(Ordering::SeqCst)
    }

    /// Register a callback invoked after each change of the derived value.
    pub fn on_change<F>(&self, callback: F) -> Unsubscribe
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.listeners.insert(Arc::new(callback))
    }

    /// Re-derive from the current snapshot without waiting for a notification.
    ///
    /// Returns whether the cached value changed. Change listeners are not
    /// signalled; the caller is already looking.
    pub fn refresh(&self) -> bool {
        self.shared.refresh()
    }

    /// Whether this selection is still subscribed to its store.
    pub fn is_bound(&self) -> bool {
        !self.subscription.is_unsubscribed()
    }
}

impl<S, R> Selection<S, R>
where
    S: Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// Get a clone of the cached derived value.
    pub fn get(&self) -> R {
        R::clone(&self.shared.current())
    }
}

impl<S, R> Drop for Selection<S, R> {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use crate::StoreConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    struct Counter {
        name: String,
        count: i32,
    }

    fn counter() -> crate::Store<Counter> {
        StoreConfig::new(Counter {
            name: "counter".to_string(),
            count: 0,
        })
        .reducer("increment", |s: &Counter, _: ()| Counter {
            count: s.count + 1,
            ..s.clone()
        })
        .reducer("set_name", |s: &Counter, name: String| Counter {
            name,
            ..s.clone()
        })
        .build()
        .unwrap()
    }

    #[test]
    fn selection_starts_with_current_value() {
        let store = counter();
        store.dispatch("increment", ()).unwrap();
        let count = store.select(|s: &Counter| s.count);
        assert_eq!(count.get(), 1);
        assert_eq!(count.changes(), 0);
    }

    #[test]
    fn unrelated_changes_do_not_signal() {
        let store = counter();
        let count = store.select(|s: &Counter| s.count);

        let renders = Arc::new(AtomicUsize::new(0));
        let renders_clone = renders.clone();
        let _handle = count.on_change(move || {
            renders_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.dispatch("increment", ()).unwrap();
        assert_eq!(renders.load(Ordering::SeqCst), 1);
        assert_eq!(count.get(), 1);

        store.dispatch("set_name", "new-name".to_string()).unwrap();
        assert_eq!(renders.load(Ordering::SeqCst), 1);
        assert_eq!(count.changes(), 1);
    }

    #[test]
    fn custom_equality_controls_signalling() {
        let store = counter();
        let parity = store.select_with(
            |s: &Counter| s.count,
            |a: &i32, b: &i32| a % 2 == b % 2,
        );

        store.dispatch("increment", ()).unwrap();
        store.dispatch("increment", ()).unwrap();
        store.dispatch("increment", ()).unwrap();

        // 0 -> 1 changes parity, 1 -> 2 changes parity, 2 -> 3 changes parity.
        assert_eq!(parity.changes(), 3);

        let tens = store.select_with(|s: &Counter| s.count, |a: &i32, b: &i32| a / 10 == b / 10);
        store.dispatch("increment", ()).unwrap();
        assert_eq!(tens.changes(), 0);
        assert_eq!(tens.get(), 3);
    }

    #[test]
    fn whole_state_selection_uses_identity() {
        let store = counter();
        let all = store.select_all();
        let before = all.get();

        store.dispatch("set_name", "counter".to_string()).unwrap();
        // Same contents, new snapshot.
        assert_eq!(all.changes(), 1);
        assert_eq!(*all.get(), *before);
        assert!(!Arc::ptr_eq(&all.get(), &before));
    }

    #[test]
    fn dropping_selection_releases_subscription() {
        let store = counter();
        let count = store.select(|s: &Counter| s.count);
        assert_eq!(store.subscriber_count(), 1);
        assert!(count.is_bound());

        drop(count);
        assert_eq!(store.subscriber_count(), 0);
        store.dispatch("increment", ()).unwrap();
    }

    #[test]
    fn refresh_reads_without_signalling() {
        let store = counter();
        let count = store.select(|s: &Counter| s.count);
        let renders = Arc::new(AtomicUsize::new(0));
        let renders_clone = renders.clone();
        let _handle = count.on_change(move || {
            renders_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!count.refresh());
        store.dispatch("increment", ()).unwrap();
        assert!(!count.refresh());
        assert_eq!(count.with(|c| *c), 1);
        assert_eq!(renders.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispatch_inside_with_completes() {
        let store = counter();
        let count = store.select(|s: &Counter| s.count);

        let seen = count.with(|c| {
            store.dispatch("increment", ()).unwrap();
            *c
        });
        assert_eq!(seen, 0);
        assert_eq!(count.get(), 1);
        assert_eq!(count.changes(), 1);
    }

    #[test]
    fn with_does_not_block_dispatch_from_other_threads() {
        let store = counter();
        let count = store.select(|s: &Counter| s.count);
        let (started_tx, started_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();

        let worker = {
            let store = store.clone();
            thread::spawn(move || {
                started_rx.recv().unwrap();
                store.dispatch("increment", ()).unwrap();
                done_tx.send(()).unwrap();
            })
        };

        count.with(|_| {
            started_tx.send(()).unwrap();
            done_rx
                .recv_timeout(Duration::from_secs(5))
                .expect("dispatch blocked by a reader");
        });
        worker.join().unwrap();
        assert_eq!(count.get(), 1);
    }
}
