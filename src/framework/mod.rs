//! # Execution Frameworks
//!
//! Frameworks materialize runnables on an execution backend (container jobs,
//! deployments, builders). The lifecycle core never calls them directly: the
//! [`RunnableDispatcher`] consumes published runnables from the bus and the
//! [`RunnableMonitor`] polls active work, both reporting back through
//! `RunnableChanged` events.

pub mod dispatcher;
pub mod monitor;
pub mod registry;
pub mod store;

pub use dispatcher::RunnableDispatcher;
pub use monitor::RunnableMonitor;
pub use registry::FrameworkRegistry;
pub use store::{RunnableStore, TrackedRunnable};

use crate::models::Runnable;
use crate::state_machine::State;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameworkError {
    #[error("no framework registered as {0}")]
    NotRegistered(String),

    #[error("{framework} failed to {operation}: {reason}")]
    Backend {
        framework: String,
        operation: &'static str,
        reason: String,
    },
}

impl FrameworkError {
    pub fn backend(framework: &str, operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Backend {
            framework: framework.to_string(),
            operation,
            reason: reason.into(),
        }
    }
}

pub type FrameworkResult<T> = Result<T, FrameworkError>;

/// Backend-specific unit of work built from a runnable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionUnit {
    /// Run id of the runnable it was built from
    pub id: String,
    pub framework: String,
    /// Backend object, opaque to the core
    #[serde(default)]
    pub manifest: Value,
    /// Last state observed on the backend
    pub state: State,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ExecutionUnit {
    pub fn new(runnable: &Runnable, manifest: Value) -> Self {
        Self {
            id: runnable.id.clone(),
            framework: runnable.framework.clone(),
            manifest,
            state: runnable.state,
            message: None,
        }
    }

    pub fn with_state(mut self, state: State, message: Option<String>) -> Self {
        self.state = state;
        self.message = message;
        self
    }
}

#[async_trait]
pub trait Framework: Send + Sync {
    /// Registry key matched against `Runnable::framework`
    fn name(&self) -> &str;

    async fn build(&self, runnable: &Runnable) -> FrameworkResult<ExecutionUnit>;

    /// Submit to the backend, returning the unit as accepted
    async fn apply(&self, unit: ExecutionUnit) -> FrameworkResult<ExecutionUnit>;

    /// Current backend view, `None` once the unit no longer exists
    async fn get(&self, unit: &ExecutionUnit) -> FrameworkResult<Option<ExecutionUnit>>;

    async fn delete(&self, unit: &ExecutionUnit) -> FrameworkResult<()>;
}
