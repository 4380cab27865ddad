//! # Zusdux
//!
//! A minimal state container for Rust.
//!
//! A [`Store`] holds one immutable snapshot of your state. The only way to
//! change it is through actions configured when the store is created, and
//! every change is followed by a synchronous notification of subscribers.
//!
//! ## Actions
//!
//! Two ways to define an action:
//! - Reducer form: `(state, payload) -> new state`
//! - Setter-passing form: `(set_state, payload) -> R`, free to call
//!   [`SetState`] any number of times, including after an await
//!
//! Either way the bound [`Action`] only takes the payload.
//!
//! ## Reading
//!
//! - [`Store::get_state`] returns the current snapshot
//! - [`Store::subscribe`] registers a change callback
//! - [`Store::select`] binds a selector whose listeners fire only when the
//!   derived value changes
//!
//! ```
//! use zusdux::StoreConfig;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Counter {
//!     count: i32,
//! }
//!
//! let store = StoreConfig::new(Counter { count: 0 })
//!     .reducer("increment", |s: &Counter, _: ()| Counter { count: s.count + 1 })
//!     .reducer("increment_by", |s: &Counter, by: i32| Counter { count: s.count + by })
//!     .build()?;
//!
//! let unsubscribe = store.subscribe(|| println!("changed"));
//! store.dispatch("increment", ())?;
//! store.dispatch("increment_by", 2)?;
//! unsubscribe.unsubscribe();
//!
//! assert_eq!(store.get_state().count, 3);
//! # Ok::<(), zusdux::StoreError>(())
//! ```

pub mod action;
pub mod error;
pub mod select;
pub mod store;

// Re-export main types for convenience
pub use action::{Action, ActionDefinition, Actions, AsyncAction, BoxFuture, Patch, SetState};
pub use error::{Result, StoreError};
pub use select::{ExternalStore, Selection};
pub use store::{
    create_store, Listener, Store, StoreConfig, SubscriptionGuard, Unsubscribe, WeakStore,
};
