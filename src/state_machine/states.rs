use crate::constants::STAGE_PREFIX;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states shared by runs and triggers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    /// Initial state when the entity is persisted
    #[default]
    Created,
    /// Executable spec resolved by the runtime
    Built,
    /// Work handed to a framework, not yet observed running
    Ready,
    Running,
    Stopped,
    Completed,
    Error,
    /// Teardown of external resources requested
    Deleting,
    Deleted,
}

impl State {
    pub const ALL: [State; 9] = [
        Self::Created,
        Self::Built,
        Self::Ready,
        Self::Running,
        Self::Stopped,
        Self::Completed,
        Self::Error,
        Self::Deleting,
        Self::Deleted,
    ];

    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// Check if external work may still be alive in this state
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Ready | Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Built => "BUILT",
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Stopped => "STOPPED",
            Self::Completed => "COMPLETED",
            Self::Error => "ERROR",
            Self::Deleting => "DELETING",
            Self::Deleted => "DELETED",
        }
    }

    /// Processor stage fired after reaching this state (`RUNNING` -> `onRunning`)
    pub fn stage_key(&self) -> String {
        stage_key(self.as_str())
    }
}

/// `"on" + Capitalize(lowercase(name))`
pub fn stage_key(state_name: &str) -> String {
    let lower = state_name.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => format!("{STAGE_PREFIX}{}{}", first.to_uppercase(), chars.as_str()),
        None => STAGE_PREFIX.to_string(),
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for State {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid state: {s}"))
    }
}
