//! # Finite State Machine Engine
//!
//! A generic, table-driven state machine. A [`TransitionTable`] is built and
//! validated once at start-up; an [`Fsm`] is created per operation from the
//! entity's persisted state and discarded afterwards, so no machine state can
//! outlive (or go stale across) a process restart.

use super::errors::{invalid_transition, StateMachineError, StateMachineResult};
use super::{StateAction, StateGuard};
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, trace};

/// Associated types of one family of machines (runs, triggers, ...)
pub trait MachineSpec: Send + Sync + 'static {
    type State: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static;
    type Event: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static;
    type Context: Send + Sync;
    type Input: Send + Sync;
    type Output: Send;
}

/// `(from, event, guard?, action?, to)`
pub struct Transition<M: MachineSpec> {
    pub from: M::State,
    pub event: M::Event,
    pub to: M::State,
    guard: Option<Arc<dyn StateGuard<M>>>,
    action: Option<Arc<dyn StateAction<M>>>,
}

impl<M: MachineSpec> Transition<M> {
    pub fn new(from: M::State, event: M::Event, to: M::State) -> Self {
        Self {
            from,
            event,
            to,
            guard: None,
            action: None,
        }
    }

    pub fn with_guard(mut self, guard: Arc<dyn StateGuard<M>>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn with_action(mut self, action: Arc<dyn StateAction<M>>) -> Self {
        self.action = Some(action);
        self
    }

    fn allows(&self, context: &M::Context) -> bool {
        match &self.guard {
            Some(guard) => {
                let allowed = guard.check(context);
                if !allowed {
                    debug!(
                        from = %self.from,
                        event = %self.event,
                        guard = guard.description(),
                        "transition guard rejected context"
                    );
                }
                allowed
            }
            None => true,
        }
    }
}

impl<M: MachineSpec> Debug for Transition<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("from", &self.from)
            .field("event", &self.event)
            .field("to", &self.to)
            .field("guard", &self.guard.as_ref().map(|g| g.description()))
            .field("action", &self.action.as_ref().map(|a| a.description()))
            .finish()
    }
}

/// Validated set of transitions; at most one per `(from, event)` pair
pub struct TransitionTable<M: MachineSpec> {
    transitions: Vec<Transition<M>>,
    index: HashMap<(M::State, M::Event), usize>,
}

impl<M: MachineSpec> TransitionTable<M> {
    pub fn builder() -> TransitionTableBuilder<M> {
        TransitionTableBuilder {
            transitions: Vec::new(),
        }
    }

    pub fn find(&self, from: M::State, event: M::Event) -> Option<&Transition<M>> {
        self.index.get(&(from, event)).map(|&i| &self.transitions[i])
    }

    /// Transitions leaving `from` and reaching `to`, in registration order
    pub fn leading_to(
        &self,
        from: M::State,
        to: M::State,
    ) -> impl Iterator<Item = &Transition<M>> + '_ {
        self.transitions
            .iter()
            .filter(move |t| t.from == from && t.to == to)
    }

    /// Events accepted from `state`, in registration order
    pub fn events_from(&self, state: M::State) -> Vec<M::Event> {
        self.transitions
            .iter()
            .filter(|t| t.from == state)
            .map(|t| t.event)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

pub struct TransitionTableBuilder<M: MachineSpec> {
    transitions: Vec<Transition<M>>,
}

impl<M: MachineSpec> TransitionTableBuilder<M> {
    pub fn add(mut self, transition: Transition<M>) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Register the same event/target/guard/action for several source states
    pub fn add_from(
        mut self,
        from: &[M::State],
        event: M::Event,
        to: M::State,
        guard: Option<Arc<dyn StateGuard<M>>>,
        action: Option<Arc<dyn StateAction<M>>>,
    ) -> Self {
        for &state in from {
            self.transitions.push(Transition {
                from: state,
                event,
                to,
                guard: guard.clone(),
                action: action.clone(),
            });
        }
        self
    }

    /// Fails when two transitions share a `(from, event)` pair
    pub fn build(self) -> StateMachineResult<TransitionTable<M>> {
        let mut index = HashMap::with_capacity(self.transitions.len());
        for (i, t) in self.transitions.iter().enumerate() {
            if index.insert((t.from, t.event), i).is_some() {
                return Err(StateMachineError::AmbiguousTransition {
                    from: t.from.to_string(),
                    event: t.event.to_string(),
                });
            }
        }
        Ok(TransitionTable {
            transitions: self.transitions,
            index,
        })
    }
}

/// Per-operation machine instance; never shared, never persisted
pub struct Fsm<M: MachineSpec> {
    current: M::State,
    context: M::Context,
    table: Arc<TransitionTable<M>>,
}

impl<M: MachineSpec> Fsm<M> {
    pub fn new(initial: M::State, context: M::Context, table: Arc<TransitionTable<M>>) -> Self {
        Self {
            current: initial,
            context,
            table,
        }
    }

    pub fn current_state(&self) -> M::State {
        self.current
    }

    pub fn context(&self) -> &M::Context {
        &self.context
    }

    pub fn into_context(self) -> M::Context {
        self.context
    }

    /// Execute the transition registered for `(current, event)`
    pub async fn perform(
        &mut self,
        event: M::Event,
        input: Option<&M::Input>,
    ) -> StateMachineResult<Option<M::Output>> {
        let table = Arc::clone(&self.table);
        let transition = table
            .find(self.current, event)
            .ok_or_else(|| invalid_transition(self.current, event))?;

        if !transition.allows(&self.context) {
            return Err(invalid_transition(self.current, event));
        }

        self.execute(transition, input).await
    }

    /// Move to an externally observed state.
    ///
    /// Executes the first transition from the current state that reaches
    /// `target` and passes its guard. Already being in `target` with no such
    /// transition is an idempotent no-op.
    pub async fn go_to_state(
        &mut self,
        target: M::State,
        input: Option<&M::Input>,
    ) -> StateMachineResult<Option<M::Output>> {
        let table = Arc::clone(&self.table);
        let transition = table
            .leading_to(self.current, target)
            .find(|t| t.allows(&self.context));

        match transition {
            Some(transition) => self.execute(transition, input).await,
            None if self.current == target => {
                trace!(state = %target, "already in target state");
                Ok(None)
            }
            None => Err(invalid_transition(self.current, target)),
        }
    }

    async fn execute(
        &mut self,
        transition: &Transition<M>,
        input: Option<&M::Input>,
    ) -> StateMachineResult<Option<M::Output>> {
        let output = match &transition.action {
            Some(action) => action
                .execute(&self.context, input)
                .await
                .map_err(|source| StateMachineError::ActionFailed {
                    action: action.description(),
                    source,
                })?,
            None => None,
        };

        debug!(
            from = %transition.from,
            event = %transition.event,
            to = %transition.to,
            "transition performed"
        );
        self.current = transition.to;
        Ok(output)
    }
}
