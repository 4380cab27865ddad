//! Error types for store construction and action dispatch.

use thiserror::Error;

/// Boxed error returned by fallible reducers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by a [`Store`](crate::Store) and its actions.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No action with this name was configured.
    #[error("unknown action '{name}'")]
    UnknownAction { name: String },

    /// The action exists but was requested with a different payload or return type.
    #[error("action '{name}' is defined as ({payload}) -> {output}, requested ({requested_payload}) -> {requested_output}")]
    ActionSignature {
        name: String,
        payload: &'static str,
        output: &'static str,
        requested_payload: &'static str,
        requested_output: &'static str,
    },

    /// Two definitions were supplied under the same name.
    #[error("action '{name}' is defined more than once")]
    DuplicateAction { name: String },

    /// A reducer rejected the transition; the previous state is kept.
    #[error("action '{name}' failed: {source}")]
    Action {
        name: String,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    pub(crate) fn unknown_action(name: impl Into<String>) -> Self {
        Self::UnknownAction { name: name.into() }
    }

    pub(crate) fn duplicate_action(name: impl Into<String>) -> Self {
        Self::DuplicateAction { name: name.into() }
    }

    pub(crate) fn action(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Action {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Name of the action this error concerns.
    pub fn action_name(&self) -> &str {
        match self {
            Self::UnknownAction { name }
            | Self::ActionSignature { name, .. }
            | Self::DuplicateAction { name }
            | Self::Action { name, .. } => name,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
