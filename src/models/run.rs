use super::{Entity, Relationship, RelationshipKind, Status};
use crate::constants;
use crate::state_machine::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Executable spec of a run. `build` replaces it with the spec resolved by the
/// runtime; everything the runtime does not model lives in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    /// Task key (`<kind>://<project>/<id>`) the run executes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunSpec {
    pub fn has_task(&self) -> bool {
        self.task.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

/// A single execution instance of a function/task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    /// `<runtime>+run`, e.g. `python+run`
    pub kind: String,
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub spec: RunSpec,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Run {
    pub fn new(kind: impl Into<String>, project: impl Into<String>, spec: RunSpec) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            kind: kind.into(),
            project: project.into(),
            user: None,
            name: None,
            spec,
            status: Status::base(State::Created, None),
            relationships: Vec::new(),
            created: now,
            updated: now,
        }
    }

    /// Runtime registry key: the part of `kind` before the separator
    pub fn runtime_kind(&self) -> &str {
        self.kind
            .split(constants::KIND_SEPARATOR)
            .next()
            .unwrap_or(&self.kind)
    }

    /// Persisted state, `Created` when none has been recorded yet
    pub fn state(&self) -> State {
        self.status.state.unwrap_or_default()
    }

    pub fn produced_by(&self) -> Option<&str> {
        self.relationships
            .iter()
            .find(|r| r.kind == RelationshipKind::ProducedBy)
            .map(|r| r.dest.as_str())
    }
}

impl Entity for Run {
    const KIND: &'static str = constants::entities::RUN;

    fn id(&self) -> &str {
        &self.id
    }

    fn project(&self) -> &str {
        &self.project
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    fn touch(&mut self) {
        self.updated = Utc::now();
    }
}
