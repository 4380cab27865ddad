//! Action definitions and the actions bound to a store.
//!
//! Definitions come in reducer form, `(state, payload) -> state`, and
//! setter-passing form, `(set_state, payload) -> R`. Binding happens once
//! when the store is created and yields [`Action`] handles that only take
//! the payload.

mod action;
mod definition;
mod set_state;

pub use action::{Action, Actions, AsyncAction, BoxFuture};
pub use definition::ActionDefinition;
pub use set_state::{Patch, SetState};
