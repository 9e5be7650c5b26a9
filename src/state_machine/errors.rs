use crate::runtime::RuntimeError;
use thiserror::Error;

/// Error types for state machine operations
#[derive(Error, Debug)]
pub enum StateMachineError {
    /// No transition for the requested event or target state, or its guard
    /// rejected the current context. Callers treat this as a benign no-op.
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Ambiguous transition table: more than one transition from {from} on {event}")]
    AmbiguousTransition { from: String, event: String },

    #[error("Action '{action}' failed: {source}")]
    ActionFailed {
        action: &'static str,
        #[source]
        source: ActionError,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error type for transition action failures
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("operation {operation} not supported by {kind}")]
    Unsupported { operation: String, kind: String },
}

impl From<RuntimeError> for ActionError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::InvalidSpec(reason) => Self::InvalidArgument(reason),
            RuntimeError::Unsupported { operation, kind } => Self::Unsupported { operation, kind },
            other => Self::Runtime(other.to_string()),
        }
    }
}

/// Result type alias for state machine operations
pub type StateMachineResult<T> = Result<T, StateMachineError>;
pub type ActionResult<T> = Result<T, ActionError>;

/// Helper for the invalid-transition error from any displayable pair
pub fn invalid_transition(
    from: impl std::fmt::Display,
    to: impl std::fmt::Display,
) -> StateMachineError {
    StateMachineError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
}
