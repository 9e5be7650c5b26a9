use crate::state_machine::State;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Opaque description of work handed to an execution framework.
///
/// Runtimes create runnables during transitions; once published the bus owns
/// them and only the target framework updates `state`/`message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Runnable {
    /// Id of the run this unit of work belongs to
    pub id: String,
    /// Framework registry key, e.g. `k8sjob`
    pub framework: String,
    pub runtime: String,
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    pub state: State,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub envs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub resources: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl Runnable {
    pub fn new(
        id: impl Into<String>,
        framework: impl Into<String>,
        runtime: impl Into<String>,
        project: impl Into<String>,
        state: State,
    ) -> Self {
        Self {
            id: id.into(),
            framework: framework.into(),
            runtime: runtime.into(),
            project: project.into(),
            task: None,
            state,
            message: None,
            image: None,
            command: None,
            args: Vec::new(),
            envs: BTreeMap::new(),
            resources: Map::new(),
            labels: BTreeMap::new(),
        }
    }

    pub fn with_state(mut self, state: State, message: Option<String>) -> Self {
        self.state = state;
        self.message = message;
        self
    }
}
