use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// A zero-argument change notification callback.
///
/// Registration is keyed on the `Arc` pointer: subscribing a clone of the
/// same `Listener` twice yields a single subscription.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

struct Entry {
    listener: Listener,
    active: AtomicBool,
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Ordered set of listeners with iteration-safe fan-out.
pub(crate) struct Registry {
    // Name of the store this registry belongs to, for log fields.
    owner: Arc<str>,
    entries: RwLock<Vec<Arc<Entry>>>,
}

impl Registry {
    pub(crate) fn new(owner: Arc<str>) -> Arc<Self> {
        Arc::new(Self {
            owner,
            entries: RwLock::new(Vec::new()),
        })
    }

    /// Add `listener` unless it is already registered.
    pub(crate) fn insert(self: &Arc<Self>, listener: Listener) -> Unsubscribe {
        {
            let mut entries = self.entries.write();
            if !entries.iter().any(|e| same_listener(&e.listener, &listener)) {
                entries.push(Arc::new(Entry {
                    listener: Arc::clone(&listener),
                    active: AtomicBool::new(true),
                }));
            }
        }

        Unsubscribe {
            registry: Arc::downgrade(self),
            // Holding the listener keeps its address from being reused while
            // this handle can still remove it.
            listener,
            done: AtomicBool::new(false),
        }
    }

    fn remove(&self, listener: &Listener) -> bool {
        let mut entries = self.entries.write();
        match entries
            .iter()
            .position(|e| same_listener(&e.listener, listener))
        {
            Some(index) => {
                let entry = entries.remove(index);
                entry.active.store(false, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Invoke every registered listener once.
    ///
    /// Iterates a copy of the registry so listeners may subscribe or
    /// unsubscribe while the round is running. A listener removed before it
    /// is reached is skipped. A panicking listener does not stop the round;
    /// the first panic is resumed once every listener has been visited.
    pub(crate) fn notify(&self) {
        let entries: Vec<Arc<Entry>> = self.entries.read().clone();
        let mut first_panic = None;

        for entry in entries {
            if !entry.active.load(Ordering::SeqCst) {
                continue;
            }
            let listener = Arc::clone(&entry.listener);
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener())) {
                tracing::warn!(
                    store = %self.owner,
                    "store listener panicked during notification"
                );
                if first_panic.is_none() {
                    first_panic = Some(payload);
                }
            }
        }

        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
    }
}

/// Handle returned by `subscribe`; removes exactly that registration.
///
/// Dropping the handle does not unsubscribe. Use
/// [`into_guard`](Unsubscribe::into_guard) for scope-bound subscriptions.
/// A listener that owns a `Store` clone keeps that store alive for as long
/// as it stays registered; capture a [`WeakStore`](crate::WeakStore)
/// instead.
pub struct Unsubscribe {
    registry: Weak<Registry>,
    listener: Listener,
    done: AtomicBool,
}

impl Unsubscribe {
    /// Remove the listener. Calling this more than once has no further effect.
    pub fn unsubscribe(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            if registry.remove(&self.listener) {
                tracing::debug!(
                    store = %registry.owner,
                    remaining = registry.len(),
                    "listener unsubscribed"
                );
            }
        }
    }

    /// Whether [`unsubscribe`](Unsubscribe::unsubscribe) has been called.
    pub fn is_unsubscribed(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Convert into a guard that unsubscribes when dropped.
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard { handle: self }
    }
}

/// RAII guard for a store subscription.
pub struct SubscriptionGuard {
    handle: Unsubscribe,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.handle.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn registry() -> Arc<Registry> {
        Registry::new(Arc::from("test"))
    }

    fn counting(counter: &Arc<AtomicUsize>) -> Listener {
        let counter = Arc::clone(counter);
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn duplicate_listener_is_registered_once() {
        let registry = registry();
        let calls = Arc::new(AtomicUsize::new(0));
        let listener = counting(&calls);

        let _first = registry.insert(Arc::clone(&listener));
        let _second = registry.insert(Arc::clone(&listener));
        assert_eq!(registry.len(), 1);

        registry.notify();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let registry = registry();
        let calls = Arc::new(AtomicUsize::new(0));
        let keep = registry.insert(counting(&calls));
        let handle = registry.insert(counting(&calls));

        handle.unsubscribe();
        handle.unsubscribe();
        assert!(handle.is_unsubscribed());
        assert_eq!(registry.len(), 1);

        registry.notify();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        drop(keep);
    }

    #[test]
    fn notifies_in_registration_order() {
        let registry = registry();
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for id in 0..3 {
            let order = Arc::clone(&order);
            handles.push(registry.insert(Arc::new(move || order.lock().unwrap().push(id))));
        }

        registry.notify();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn listener_removed_mid_round_is_skipped() {
        let registry = registry();
        let late_calls = Arc::new(AtomicUsize::new(0));
        let victim: Arc<Mutex<Option<Unsubscribe>>> = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&victim);
        let _remover = registry.insert(Arc::new(move || {
            if let Some(handle) = slot.lock().unwrap().as_ref() {
                handle.unsubscribe();
            }
        }));
        let handle = registry.insert(counting(&late_calls));
        *victim.lock().unwrap() = Some(handle);

        registry.notify();
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn panicking_listener_does_not_starve_the_rest() {
        let registry = registry();
        let calls = Arc::new(AtomicUsize::new(0));
        let _bad = registry.insert(Arc::new(|| panic!("listener failure")));
        let _good = registry.insert(counting(&calls));

        let result = panic::catch_unwind(AssertUnwindSafe(|| registry.notify()));
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn guard_unsubscribes_on_drop() {
        let registry = registry();
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let _guard = registry.insert(counting(&calls)).into_guard();
            registry.notify();
        }
        registry.notify();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn listener_panic_is_logged_with_store_name() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let registry = Registry::new(Arc::from("checkout"));
        let _bad = registry.insert(Arc::new(|| panic!("listener failure")));

        tracing::subscriber::with_default(subscriber, || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| registry.notify()));
            assert!(result.is_err());
        });

        let text = logs.text();
        assert!(text.contains("store listener panicked during notification"));
        assert!(text.contains("store=checkout"));
    }
}
