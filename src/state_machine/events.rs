use serde::{Deserialize, Serialize};
use std::fmt;

/// Events that can trigger run state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunEvent {
    /// Resolve the executable spec
    Build,
    /// Hand the run to its framework
    Run,
    /// Framework reported the work running
    Execute,
    Stop,
    Resume,
    /// Framework reported successful completion
    Complete,
    /// Framework or runtime reported a failure
    Error,
    /// Begin teardown of external resources
    Deleting,
    /// Teardown finished
    Delete,
}

impl RunEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Build => "BUILD",
            Self::Run => "RUN",
            Self::Execute => "EXECUTE",
            Self::Stop => "STOP",
            Self::Resume => "RESUME",
            Self::Complete => "COMPLETE",
            Self::Error => "ERROR",
            Self::Deleting => "DELETING",
            Self::Delete => "DELETE",
        }
    }

    /// Events a caller may request directly; the rest follow framework reports
    pub fn is_user_requested(&self) -> bool {
        matches!(
            self,
            Self::Build | Self::Run | Self::Stop | Self::Resume | Self::Deleting
        )
    }
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}

/// Events that can trigger trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerEvent {
    Run,
    Stop,
    /// Trigger condition met, produce a run
    Fire,
    Error,
}

impl TriggerEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Run => "RUN",
            Self::Stop => "STOP",
            Self::Fire => "FIRE",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}
