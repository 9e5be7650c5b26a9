// State machine module for run and trigger lifecycles
//
// A generic table-driven engine (`fsm`) plus one machine family per entity
// type. Factories validate their tables once; machines are per operation.

pub mod actions;
pub mod context;
pub mod errors;
pub mod events;
pub mod fsm;
pub mod guards;
pub mod run_state_machine;
pub mod states;
pub mod trigger_state_machine;

// Re-export main types for convenient access
pub use context::{RunContext, RunOutput, TriggerContext, TriggerOutput};
pub use errors::{invalid_transition, ActionError, StateMachineError, StateMachineResult};
pub use events::{RunEvent, TriggerEvent};
pub use fsm::{Fsm, MachineSpec, Transition, TransitionTable};
pub use run_state_machine::{RunMachine, RunStateMachine, RunStateMachineFactory};
pub use states::{stage_key, State};
pub use trigger_state_machine::{TriggerMachine, TriggerStateMachine, TriggerStateMachineFactory};

// Common traits
pub use actions::StateAction;
pub use guards::StateGuard;
