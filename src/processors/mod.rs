//! # Post-transition Processors
//!
//! Pluggable hooks invoked after a transition for the stage named after the
//! resulting state (`onRunning`, `onError`, ...). Each processor returns a
//! partial [`Status`] that is merged under the base status.

pub mod transitions;

pub use transitions::TransitionsProcessor;

use crate::models::{Entity, Runnable, Status};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("processor {processor} failed: {reason}")]
    Failed {
        processor: &'static str,
        reason: String,
    },
}

impl ProcessorError {
    pub fn failed(processor: &'static str, reason: impl Into<String>) -> Self {
        Self::Failed {
            processor,
            reason: reason.into(),
        }
    }
}

pub type ProcessorResult<T> = Result<T, ProcessorError>;

#[async_trait]
pub trait Processor<E: Entity>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Stage keys this processor is registered under
    fn stages(&self) -> Vec<String>;

    /// Status fragment for `entity` as it stood before the transition.
    ///
    /// `base` holds the state and message produced by the state machine.
    async fn process(
        &self,
        entity: &E,
        runnable: Option<&Runnable>,
        base: &Status,
    ) -> ProcessorResult<Option<Status>>;
}
