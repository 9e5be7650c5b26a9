use super::actions::{FireTriggerAction, StartTriggerAction, StopTriggerAction};
use super::errors::StateMachineResult;
use super::events::TriggerEvent;
use super::fsm::{Fsm, MachineSpec, Transition, TransitionTable};
use super::guards::TriggerHasTaskGuard;
use super::states::State;
use super::{StateAction, StateGuard, TriggerContext};
use crate::models::Status;
use std::sync::Arc;

/// Machine family for triggers
pub struct TriggerMachine;

impl MachineSpec for TriggerMachine {
    type State = State;
    type Event = TriggerEvent;
    type Context = TriggerContext;
    type Input = Status;
    type Output = Status;
}

pub type TriggerStateMachine = Fsm<TriggerMachine>;

#[derive(Clone)]
pub struct TriggerStateMachineFactory {
    table: Arc<TransitionTable<TriggerMachine>>,
}

impl TriggerStateMachineFactory {
    pub fn new() -> StateMachineResult<Self> {
        Ok(Self {
            table: Arc::new(Self::transitions()?),
        })
    }

    pub fn create(&self, initial: State, context: TriggerContext) -> TriggerStateMachine {
        Fsm::new(initial, context, Arc::clone(&self.table))
    }

    pub fn table(&self) -> &TransitionTable<TriggerMachine> {
        &self.table
    }

    fn transitions() -> StateMachineResult<TransitionTable<TriggerMachine>> {
        use State::{Created, Ready, Stopped};

        let has_task: Arc<dyn StateGuard<TriggerMachine>> = Arc::new(TriggerHasTaskGuard);
        let start: Arc<dyn StateAction<TriggerMachine>> = Arc::new(StartTriggerAction);

        TransitionTable::builder()
            .add_from(
                &[Created, Stopped, State::Error],
                TriggerEvent::Run,
                Ready,
                Some(has_task),
                Some(start),
            )
            .add(
                Transition::new(Ready, TriggerEvent::Fire, Ready)
                    .with_action(Arc::new(FireTriggerAction)),
            )
            .add(
                Transition::new(Ready, TriggerEvent::Stop, Stopped)
                    .with_action(Arc::new(StopTriggerAction)),
            )
            .add_from(&[Created, Ready], TriggerEvent::Error, State::Error, None, None)
            .build()
    }
}
