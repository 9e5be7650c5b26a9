//! # Models
//!
//! Lifecycle-managed entities (runs, triggers), the tasks triggers resolve,
//! the runnables handed to frameworks and the typed status they all carry.

pub mod run;
pub mod runnable;
pub mod status;
pub mod task;
pub mod trigger;

pub use run::{Run, RunSpec};
pub use runnable::Runnable;
pub use status::{merge_transition_status, Status, TransitionRecord};
pub use task::{Task, TaskKey};
pub use trigger::{Trigger, TriggerSpec};

use serde::{Deserialize, Serialize};

/// Common surface of persisted entities handled by stores and lifecycle managers
pub trait Entity: Clone + PartialEq + Send + Sync + 'static {
    /// Entity kind used in errors, events and logs
    const KIND: &'static str;

    fn id(&self) -> &str;

    fn project(&self) -> &str;

    fn status(&self) -> &Status;

    fn set_status(&mut self, status: Status);

    /// Refresh the modification timestamp before persisting
    fn touch(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    ProducedBy,
    Consumes,
    Produces,
}

/// Typed link from an entity to another entity key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    pub dest: String,
}

impl Relationship {
    pub fn produced_by(dest: impl Into<String>) -> Self {
        Self {
            kind: RelationshipKind::ProducedBy,
            dest: dest.into(),
        }
    }
}
