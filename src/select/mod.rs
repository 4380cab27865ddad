//! Selector bindings for reactive consumers.
//!
//! A [`Selection`] caches a value derived from the store and only signals
//! its listeners when that value changes. This is the read path a UI
//! binding sits on: subscribe, re-derive, compare, then decide to re-render.

mod selection;

pub use selection::{ExternalStore, Selection};
