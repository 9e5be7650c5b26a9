//! # Runtimes and Actuators
//!
//! Kind-specific business logic consumed by the lifecycle managers. A
//! [`Runtime`] turns runs into executable specs and [`Runnable`]s; an
//! [`Actuator`] starts, stops and reacts to the firing of triggers. Both are
//! resolved by kind through the factories in [`crate::registry`].

use crate::models::{Run, RunSpec, Runnable, Status, Trigger};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid spec: {0}")]
    InvalidSpec(String),

    #[error("operation {operation} not supported by {kind}")]
    Unsupported { operation: String, kind: String },

    #[error("backend failure: {0}")]
    Backend(String),
}

impl RuntimeError {
    pub fn unsupported(operation: &str, kind: &str) -> Self {
        Self::Unsupported {
            operation: operation.to_string(),
            kind: kind.to_string(),
        }
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Run-side collaborator resolved from `Run::runtime_kind`
#[async_trait]
pub trait Runtime: Send + Sync {
    /// Registry key, e.g. `python`
    fn kind(&self) -> &str;

    /// Resolve the executable spec for a created run
    async fn build(&self, run: &Run) -> RuntimeResult<RunSpec>;

    /// Produce the unit of work a framework will execute
    async fn run(&self, run: &Run) -> RuntimeResult<Runnable>;

    async fn stop(&self, _run: &Run) -> RuntimeResult<Option<Runnable>> {
        Err(RuntimeError::unsupported("stop", &format!("{} runtime", self.kind())))
    }

    async fn resume(&self, _run: &Run) -> RuntimeResult<Option<Runnable>> {
        Err(RuntimeError::unsupported("resume", &format!("{} runtime", self.kind())))
    }

    /// Release external resources. `None` when nothing physical exists.
    async fn delete(&self, _run: &Run) -> RuntimeResult<Option<Runnable>> {
        Ok(None)
    }
}

/// Trigger-side collaborator resolved from `Trigger::kind`
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Registry key, e.g. `scheduler`
    fn kind(&self) -> &str;

    /// Start watching for the trigger condition
    async fn run(&self, trigger: &Trigger) -> RuntimeResult<Option<Status>>;

    async fn stop(&self, trigger: &Trigger) -> RuntimeResult<Option<Status>>;

    /// Status fragment recorded each time the trigger fires
    async fn on_fire(&self, _trigger: &Trigger) -> RuntimeResult<Option<Status>> {
        Ok(None)
    }
}
