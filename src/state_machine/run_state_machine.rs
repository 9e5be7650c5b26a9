use super::actions::{
    BuildRunAction, CleanupRunAction, DispatchRunAction, ResumeRunAction, StopRunAction,
};
use super::errors::StateMachineResult;
use super::events::RunEvent;
use super::fsm::{Fsm, MachineSpec, Transition, TransitionTable};
use super::guards::RunHasTaskGuard;
use super::states::State;
use super::{RunContext, RunOutput, StateAction, StateGuard};
use crate::models::Runnable;
use std::sync::Arc;

/// Machine family for runs
pub struct RunMachine;

impl MachineSpec for RunMachine {
    type State = State;
    type Event = RunEvent;
    type Context = RunContext;
    type Input = Runnable;
    type Output = RunOutput;
}

pub type RunStateMachine = Fsm<RunMachine>;

/// Holds the validated run transition table and hands out fresh machines
#[derive(Clone)]
pub struct RunStateMachineFactory {
    table: Arc<TransitionTable<RunMachine>>,
}

impl RunStateMachineFactory {
    pub fn new() -> StateMachineResult<Self> {
        Ok(Self {
            table: Arc::new(Self::transitions()?),
        })
    }

    /// Machine positioned at `initial`, normally the persisted run state
    pub fn create(&self, initial: State, context: RunContext) -> RunStateMachine {
        Fsm::new(initial, context, Arc::clone(&self.table))
    }

    pub fn table(&self) -> &TransitionTable<RunMachine> {
        &self.table
    }

    fn transitions() -> StateMachineResult<TransitionTable<RunMachine>> {
        use State::{Built, Completed, Created, Deleted, Ready, Running, Stopped};

        let has_task: Arc<dyn StateGuard<RunMachine>> = Arc::new(RunHasTaskGuard);
        let stop: Arc<dyn StateAction<RunMachine>> = Arc::new(StopRunAction);
        let cleanup: Arc<dyn StateAction<RunMachine>> = Arc::new(CleanupRunAction);

        TransitionTable::builder()
            .add(
                Transition::new(Created, RunEvent::Build, Built)
                    .with_guard(Arc::clone(&has_task))
                    .with_action(Arc::new(BuildRunAction)),
            )
            .add(
                Transition::new(Built, RunEvent::Run, Ready)
                    .with_guard(has_task)
                    .with_action(Arc::new(DispatchRunAction)),
            )
            .add(Transition::new(Ready, RunEvent::Execute, Running))
            .add_from(&[Ready, Running], RunEvent::Stop, Stopped, None, Some(stop))
            .add(
                Transition::new(Stopped, RunEvent::Resume, Running)
                    .with_action(Arc::new(ResumeRunAction)),
            )
            .add_from(&[Ready, Running], RunEvent::Complete, Completed, None, None)
            .add_from(
                &[Created, Built, Ready, Running, Stopped],
                RunEvent::Error,
                State::Error,
                None,
                None,
            )
            .add_from(
                &[Created, Built, Ready, Running, Stopped, Completed, State::Error],
                RunEvent::Deleting,
                State::Deleting,
                None,
                Some(cleanup),
            )
            .add(Transition::new(State::Deleting, RunEvent::Delete, Deleted))
            .build()
    }
}
