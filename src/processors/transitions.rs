use super::{Processor, ProcessorResult};
use crate::models::{Entity, Runnable, Status, TransitionRecord};
use crate::state_machine::State;
use async_trait::async_trait;
use chrono::Utc;
use std::marker::PhantomData;

/// Appends a `{state, previous, message, time}` record to the status history
pub struct TransitionsProcessor<E> {
    limit: usize,
    _entity: PhantomData<fn(&E)>,
}

impl<E: Entity> TransitionsProcessor<E> {
    /// Keeps at most `limit` records, dropping the oldest first
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E: Entity> Processor<E> for TransitionsProcessor<E> {
    fn name(&self) -> &'static str {
        "transitions"
    }

    fn stages(&self) -> Vec<String> {
        State::ALL.iter().map(State::stage_key).collect()
    }

    async fn process(
        &self,
        entity: &E,
        _runnable: Option<&Runnable>,
        base: &Status,
    ) -> ProcessorResult<Option<Status>> {
        let Some(state) = base.state else {
            return Ok(None);
        };

        let current = entity.status();
        let mut history = current.transitions.clone().unwrap_or_default();
        history.push(TransitionRecord {
            state,
            previous: current.state,
            message: base.message.clone(),
            time: Utc::now(),
        });

        if history.len() > self.limit {
            let excess = history.len() - self.limit;
            history.drain(..excess);
        }

        Ok(Some(Status {
            transitions: Some(history),
            ..Status::default()
        }))
    }
}
