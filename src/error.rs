use crate::config::ConfigurationError;
use crate::services::StoreError;
use crate::state_machine::{ActionError, StateMachineError};

/// Crate-wide error returned by the lifecycle API.
///
/// `InvalidTransition` is the only variant callers should never see from the
/// public lifecycle managers: it is absorbed at that boundary and turned into
/// a no-op returning the unchanged entity.
#[derive(Debug, thiserror::Error)]
pub enum RunplaneError {
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("system error: {0}")]
    System(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("transition failed: {0}")]
    Transition(String),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl RunplaneError {
    pub fn system(msg: impl Into<String>) -> Self {
        Self::System(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}

impl From<StateMachineError> for RunplaneError {
    fn from(err: StateMachineError) -> Self {
        match err {
            StateMachineError::InvalidTransition { from, to } => {
                Self::InvalidTransition { from, to }
            }
            StateMachineError::ActionFailed {
                source: ActionError::InvalidArgument(reason),
                ..
            } => Self::InvalidArgument(reason),
            other => Self::Transition(other.to_string()),
        }
    }
}

impl From<StoreError> for RunplaneError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::System(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RunplaneError>;
