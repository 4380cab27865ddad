//! The store engine.
//!
//! A store owns one immutable state snapshot, the transition path that
//! replaces it, and the registry of listeners notified after each
//! replacement.

mod config;
mod store;
mod subscribers;

pub use config::StoreConfig;
pub(crate) use store::StoreInner;
pub use store::{create_store, Store, WeakStore};
pub(crate) use subscribers::Registry;
pub use subscribers::{Listener, SubscriptionGuard, Unsubscribe};
