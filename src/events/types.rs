use crate::models::{Run, Runnable, Status};
use crate::state_machine::{State, TriggerEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the caller of an entity operation intends to do with the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityAction {
    Create,
    /// The only action whose result is persisted by the lifecycle manager
    Update,
    Delete,
    /// Runs logic for its side effects without rewriting the entity
    Read,
}

impl fmt::Display for EntityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Read => "READ",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityOperation<D> {
    pub dto: D,
    pub action: EntityAction,
}

impl<D> EntityOperation<D> {
    pub fn new(dto: D, action: EntityAction) -> Self {
        Self { dto, action }
    }

    pub fn update(dto: D) -> Self {
        Self::new(dto, EntityAction::Update)
    }

    pub fn read(dto: D) -> Self {
        Self::new(dto, EntityAction::Read)
    }
}

/// A framework observed a runnable in `state`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnableChangedEvent {
    /// Run id
    pub id: String,
    pub state: State,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runnable: Option<Runnable>,
}

impl RunnableChangedEvent {
    pub fn new(id: impl Into<String>, state: State, runnable: Option<Runnable>) -> Self {
        Self {
            id: id.into(),
            state,
            runnable,
        }
    }

    /// Report carrying the runnable itself, with its state already updated
    pub fn from_runnable(runnable: Runnable) -> Self {
        Self {
            id: runnable.id.clone(),
            state: runnable.state,
            runnable: Some(runnable),
        }
    }
}

/// Request to act on a trigger, typically from its actuator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerExecutionEvent {
    pub trigger_id: String,
    pub event: TriggerEvent,
    /// Fire details merged into the trigger status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Status>,
}

impl TriggerExecutionEvent {
    pub fn new(trigger_id: impl Into<String>, event: TriggerEvent) -> Self {
        Self {
            trigger_id: trigger_id.into(),
            event,
            details: None,
        }
    }

    pub fn with_details(mut self, details: Status) -> Self {
        self.details = Some(details);
        self
    }
}

/// Emitted after a lifecycle manager persisted an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityChangedEvent {
    pub kind: String,
    pub id: String,
    pub state: Option<State>,
    pub action: EntityAction,
    pub timestamp: DateTime<Utc>,
}

/// Everything carried by the lifecycle event bus
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    /// Framework status report, consumed by the runnable listener
    RunnableChanged(RunnableChangedEvent),
    /// Work to materialize, consumed by the runnable dispatcher
    RunnablePublished(Runnable),
    RunOperation(EntityOperation<Run>),
    TriggerExecution(TriggerExecutionEvent),
    EntityChanged(EntityChangedEvent),
}

impl BusEvent {
    /// Shard key: events for the same entity id are handled in order
    pub fn entity_id(&self) -> &str {
        match self {
            Self::RunnableChanged(event) => &event.id,
            Self::RunnablePublished(runnable) => &runnable.id,
            Self::RunOperation(operation) => &operation.dto.id,
            Self::TriggerExecution(event) => &event.trigger_id,
            Self::EntityChanged(event) => &event.id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RunnableChanged(_) => "runnable.changed",
            Self::RunnablePublished(_) => "runnable.published",
            Self::RunOperation(_) => "run.operation",
            Self::TriggerExecution(_) => "trigger.execution",
            Self::EntityChanged(_) => "entity.changed",
        }
    }
}

impl From<RunnableChangedEvent> for BusEvent {
    fn from(event: RunnableChangedEvent) -> Self {
        Self::RunnableChanged(event)
    }
}

impl From<TriggerExecutionEvent> for BusEvent {
    fn from(event: TriggerExecutionEvent) -> Self {
        Self::TriggerExecution(event)
    }
}

impl From<EntityOperation<Run>> for BusEvent {
    fn from(operation: EntityOperation<Run>) -> Self {
        Self::RunOperation(operation)
    }
}
