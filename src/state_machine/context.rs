//! Per-operation transition contexts.
//!
//! A context is built from the entity as last persisted and the collaborator
//! resolved for its kind; it is never cached between operations.

use crate::models::{Run, RunSpec, Runnable, Status, Trigger};
use crate::runtime::{Actuator, Runtime};
use std::fmt;
use std::sync::Arc;

pub struct RunContext {
    pub run: Run,
    pub runtime: Arc<dyn Runtime>,
}

impl RunContext {
    pub fn new(run: Run, runtime: Arc<dyn Runtime>) -> Self {
        Self { run, runtime }
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run.id)
            .field("runtime", &self.runtime.kind())
            .finish()
    }
}

pub struct TriggerContext {
    pub trigger: Trigger,
    pub actuator: Arc<dyn Actuator>,
}

impl TriggerContext {
    pub fn new(trigger: Trigger, actuator: Arc<dyn Actuator>) -> Self {
        Self { trigger, actuator }
    }
}

impl fmt::Debug for TriggerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerContext")
            .field("trigger_id", &self.trigger.id)
            .field("actuator", &self.actuator.kind())
            .finish()
    }
}

/// What a run transition hands back to the lifecycle manager
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutput {
    /// Resolved executable spec from `BUILD`
    Spec(RunSpec),
    /// Work to publish for a framework
    Runnable(Runnable),
}

impl RunOutput {
    pub fn into_runnable(self) -> Option<Runnable> {
        match self {
            Self::Runnable(runnable) => Some(runnable),
            Self::Spec(_) => None,
        }
    }

    pub fn into_spec(self) -> Option<RunSpec> {
        match self {
            Self::Spec(spec) => Some(spec),
            Self::Runnable(_) => None,
        }
    }
}

/// Trigger transitions produce status fragments from the actuator
pub type TriggerOutput = Status;
