use super::errors::ActionResult;
use super::fsm::MachineSpec;
use super::run_state_machine::RunMachine;
use super::trigger_state_machine::TriggerMachine;
use super::{RunContext, RunOutput, TriggerContext};
use crate::models::{Runnable, Status};
use async_trait::async_trait;
use tracing::{debug, info};

/// Trait for implementing state transition actions
#[async_trait]
pub trait StateAction<M: MachineSpec>: Send + Sync {
    /// Execute the action; runs exactly once per performed transition
    async fn execute(
        &self,
        context: &M::Context,
        input: Option<&M::Input>,
    ) -> ActionResult<Option<M::Output>>;

    /// Get a description of this action for logging
    fn description(&self) -> &'static str;
}

/// `CREATED -> BUILT`: resolve the executable spec through the runtime
pub struct BuildRunAction;

#[async_trait]
impl StateAction<RunMachine> for BuildRunAction {
    async fn execute(
        &self,
        context: &RunContext,
        _input: Option<&Runnable>,
    ) -> ActionResult<Option<RunOutput>> {
        let spec = context.runtime.build(&context.run).await?;
        debug!(run_id = %context.run.id, runtime = context.runtime.kind(), "run spec resolved");
        Ok(Some(RunOutput::Spec(spec)))
    }

    fn description(&self) -> &'static str {
        "build run"
    }
}

/// `BUILT -> READY`: produce the runnable the framework will execute
pub struct DispatchRunAction;

#[async_trait]
impl StateAction<RunMachine> for DispatchRunAction {
    async fn execute(
        &self,
        context: &RunContext,
        _input: Option<&Runnable>,
    ) -> ActionResult<Option<RunOutput>> {
        let runnable = context.runtime.run(&context.run).await?;
        info!(
            run_id = %context.run.id,
            framework = %runnable.framework,
            "runnable produced for dispatch"
        );
        Ok(Some(RunOutput::Runnable(runnable)))
    }

    fn description(&self) -> &'static str {
        "dispatch run"
    }
}

pub struct StopRunAction;

#[async_trait]
impl StateAction<RunMachine> for StopRunAction {
    async fn execute(
        &self,
        context: &RunContext,
        _input: Option<&Runnable>,
    ) -> ActionResult<Option<RunOutput>> {
        Ok(context
            .runtime
            .stop(&context.run)
            .await?
            .map(RunOutput::Runnable))
    }

    fn description(&self) -> &'static str {
        "stop run"
    }
}

pub struct ResumeRunAction;

#[async_trait]
impl StateAction<RunMachine> for ResumeRunAction {
    async fn execute(
        &self,
        context: &RunContext,
        _input: Option<&Runnable>,
    ) -> ActionResult<Option<RunOutput>> {
        Ok(context
            .runtime
            .resume(&context.run)
            .await?
            .map(RunOutput::Runnable))
    }

    fn description(&self) -> &'static str {
        "resume run"
    }
}

/// `* -> DELETING`: ask the runtime for a teardown runnable, if any
pub struct CleanupRunAction;

#[async_trait]
impl StateAction<RunMachine> for CleanupRunAction {
    async fn execute(
        &self,
        context: &RunContext,
        _input: Option<&Runnable>,
    ) -> ActionResult<Option<RunOutput>> {
        Ok(context
            .runtime
            .delete(&context.run)
            .await?
            .map(RunOutput::Runnable))
    }

    fn description(&self) -> &'static str {
        "cleanup run"
    }
}

pub struct StartTriggerAction;

#[async_trait]
impl StateAction<TriggerMachine> for StartTriggerAction {
    async fn execute(
        &self,
        context: &TriggerContext,
        _input: Option<&Status>,
    ) -> ActionResult<Option<Status>> {
        Ok(context.actuator.run(&context.trigger).await?)
    }

    fn description(&self) -> &'static str {
        "start trigger"
    }
}

pub struct StopTriggerAction;

#[async_trait]
impl StateAction<TriggerMachine> for StopTriggerAction {
    async fn execute(
        &self,
        context: &TriggerContext,
        _input: Option<&Status>,
    ) -> ActionResult<Option<Status>> {
        Ok(context.actuator.stop(&context.trigger).await?)
    }

    fn description(&self) -> &'static str {
        "stop trigger"
    }
}

/// `READY -> READY` on fire; the input carries the fire details, if any
pub struct FireTriggerAction;

#[async_trait]
impl StateAction<TriggerMachine> for FireTriggerAction {
    async fn execute(
        &self,
        context: &TriggerContext,
        input: Option<&Status>,
    ) -> ActionResult<Option<Status>> {
        let fragment = context.actuator.on_fire(&context.trigger).await?;
        Ok(match (fragment, input) {
            (Some(fragment), Some(details)) => Some(fragment.merge(details.clone())),
            (fragment, details) => fragment.or_else(|| details.cloned()),
        })
    }

    fn description(&self) -> &'static str {
        "fire trigger"
    }
}
