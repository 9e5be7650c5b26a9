use super::fsm::MachineSpec;
use super::run_state_machine::RunMachine;
use super::trigger_state_machine::TriggerMachine;
use super::{RunContext, TriggerContext};

/// Predicate deciding whether a transition may fire for the current context
pub trait StateGuard<M: MachineSpec>: Send + Sync {
    fn check(&self, context: &M::Context) -> bool;

    /// Get a description of this guard for logging
    fn description(&self) -> &'static str;
}

/// Guard to check the run references a task before it is built or dispatched
pub struct RunHasTaskGuard;

impl StateGuard<RunMachine> for RunHasTaskGuard {
    fn check(&self, context: &RunContext) -> bool {
        context.run.spec.has_task()
    }

    fn description(&self) -> &'static str {
        "Run spec must reference a task"
    }
}

/// Guard to check the trigger references a task before it starts firing
pub struct TriggerHasTaskGuard;

impl StateGuard<TriggerMachine> for TriggerHasTaskGuard {
    fn check(&self, context: &TriggerContext) -> bool {
        !context.trigger.spec.task.trim().is_empty()
    }

    fn description(&self) -> &'static str {
        "Trigger spec must reference a task"
    }
}
