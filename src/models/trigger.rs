use super::{Entity, Status};
use crate::constants;
use crate::state_machine::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerSpec {
    /// Task key (`<kind>://<project>/<id>`) of the runs this trigger produces
    #[serde(default)]
    pub task: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    /// Run spec fields copied into every produced run
    #[serde(default)]
    pub template: Map<String, Value>,

    /// Actuator specific settings (schedule, source, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A configured condition or schedule that creates and starts runs when fired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: String,
    /// Actuator registry key, e.g. `scheduler`
    pub kind: String,
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub spec: TriggerSpec,
    #[serde(default)]
    pub status: Status,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Trigger {
    pub fn new(kind: impl Into<String>, project: impl Into<String>, spec: TriggerSpec) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            kind: kind.into(),
            project: project.into(),
            user: None,
            name: None,
            spec,
            status: Status::base(State::Created, None),
            created: now,
            updated: now,
        }
    }

    pub fn state(&self) -> State {
        self.status.state.unwrap_or_default()
    }

    /// Reference used as the destination of `ProducedBy` relationships
    pub fn key(&self) -> String {
        format!("{}://{}/{}", self.kind, self.project, self.id)
    }
}

impl Entity for Trigger {
    const KIND: &'static str = constants::entities::TRIGGER;

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
