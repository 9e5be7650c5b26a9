use super::{Entity, Status};
use crate::constants;
use crate::error::{Result, RunplaneError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A runnable task definition for a function, resolved when triggers fire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// `<runtime>+<flavour>`, e.g. `python+job`
    pub kind: String,
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default)]
    pub spec: Map<String, Value>,
    #[serde(default)]
    pub status: Status,
}

impl Task {
    pub fn runtime_kind(&self) -> &str {
        self.kind
            .split(constants::KIND_SEPARATOR)
            .next()
            .unwrap_or(&self.kind)
    }

    /// Kind of the runs executing this task (`python+job` -> `python+run`)
    pub fn run_kind(&self) -> String {
        format!(
            "{}{}{}",
            self.runtime_kind(),
            constants::KIND_SEPARATOR,
            constants::RUN_KIND_SUFFIX
        )
    }

    pub fn key(&self) -> TaskKey {
        TaskKey {
            kind: self.kind.clone(),
            project: self.project.clone(),
            id: self.id.clone(),
        }
    }
}

impl Entity for Task {
    const KIND: &'static str = constants::entities::TASK;

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
}

/// Parsed `<kind>://<project>/<id>` task reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskKey {
    pub kind: String,
    pub project: String,
    pub id: String,
}

impl TaskKey {
    pub fn parse(key: &str) -> Result<Self> {
        let malformed = || RunplaneError::invalid_argument(format!("malformed task key: '{key}'"));

        let (kind, rest) = key.split_once("://").ok_or_else(malformed)?;
        let (project, id) = rest.split_once('/').ok_or_else(malformed)?;

        if kind.is_empty() || project.is_empty() || id.is_empty() || id.contains('/') {
            return Err(malformed());
        }

        Ok(Self {
            kind: kind.to_string(),
            project: project.to_string(),
            id: id.to_string(),
        })
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.kind, self.project, self.id)
    }
}
