use crate::action::action::{Action, BoundAction, BoxFuture};
use crate::action::set_state::SetState;
use crate::error::{BoxError, StoreError};
use crate::store::StoreInner;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

type Binder<S> = Box<dyn FnOnce(&Arc<StoreInner<S>>, Arc<str>) -> BoundAction + Send>;

/// An unbound action definition.
///
/// Two shapes are supported. Reducer form computes the complete next state
/// from the current one. Setter-passing form receives a [`SetState`] handle
/// and may call it any number of times, including after suspension.
pub struct ActionDefinition<S> {
    binder: Binder<S>,
}

impl<S: Send + Sync + 'static> ActionDefinition<S> {
    /// Reducer form: `(state, payload) -> new state`.
    pub fn reducer<P, F>(reducer: F) -> Self
    where
        P: 'static,
        F: Fn(&S, P) -> S + Send + Sync + 'static,
    {
        Self::try_reducer(move |state: &S, payload: P| Ok::<S, Infallible>(reducer(state, payload)))
    }

    /// Fallible reducer form.
    ///
    /// An `Err` leaves the current state in place, notifies nobody, and is
    /// returned to the caller as [`StoreError::Action`].
    pub fn try_reducer<P, E, F>(reducer: F) -> Self
    where
        P: 'static,
        E: Into<BoxError>,
        F: Fn(&S, P) -> Result<S, E> + Send + Sync + 'static,
    {
        Self {
            binder: Box::new(move |inner: &Arc<StoreInner<S>>, name: Arc<str>| {
                let inner = Arc::clone(inner);
                let action_name = Arc::clone(&name);
                BoundAction::new(Action::new(name, move |payload: P| {
                    inner
                        .transition(|state| reducer(state, payload))
                        .map_err(|err| {
                            let source: BoxError = err.into();
                            tracing::debug!(
                                store = %inner.name(),
                                action = %action_name,
                                error = %source,
                                "transition rejected"
                            );
                            StoreError::action(&*action_name, source)
                        })
                }))
            }),
        }
    }

    /// Setter-passing form: `(set_state, payload) -> R`.
    pub fn setter<P, R, F>(body: F) -> Self
    where
        P: 'static,
        R: 'static,
        F: Fn(SetState<S>, P) -> R + Send + Sync + 'static,
    {
        Self {
            binder: Box::new(move |inner: &Arc<StoreInner<S>>, name: Arc<str>| {
                let set = SetState::new(Arc::clone(inner));
                BoundAction::new(Action::new(name, move |payload: P| {
                    Ok(body(set.clone(), payload))
                }))
            }),
        }
    }

    /// Setter-passing form whose body returns a future.
    ///
    /// Whatever the body does before building its future runs when the
    /// action is called; the rest runs when the returned [`BoxFuture`] is
    /// polled. The store never drives or cancels it.
    pub fn async_setter<P, T, Fut, F>(body: F) -> Self
    where
        P: 'static,
        T: 'static,
        Fut: Future<Output = T> + Send + 'static,
        F: Fn(SetState<S>, P) -> Fut + Send + Sync + 'static,
    {
        Self::setter(move |set: SetState<S>, payload: P| -> BoxFuture<T> {
            Box::pin(body(set, payload))
        })
    }

    pub(crate) fn bind(self, inner: &Arc<StoreInner<S>>, name: Arc<str>) -> BoundAction {
        (self.binder)(inner, name)
    }
}
