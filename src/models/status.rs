//! Typed entity status with explicit, last-wins merging.
//!
//! A `Status` is used both as the persisted status of an entity and as a
//! partial fragment contributed by a transition or a processor. Merging a
//! fragment only overwrites the fields (and `extra` keys) the fragment sets.

use crate::state_machine::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One entry of the transition history kept in an entity status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub state: State,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<State>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transitions: Option<Vec<TransitionRecord>>,

    /// Fields owned by runtimes, actuators and processors
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Status {
    /// Fragment carrying only a state and an optional message
    pub fn base(state: State, message: Option<String>) -> Self {
        Self {
            state: Some(state),
            message,
            ..Self::default()
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Apply `overlay` on top of `self`; fields present in the overlay win.
    pub fn merge(mut self, overlay: Status) -> Self {
        if overlay.state.is_some() {
            self.state = overlay.state;
        }
        if overlay.message.is_some() {
            self.message = overlay.message;
        }
        if overlay.transitions.is_some() {
            self.transitions = overlay.transitions;
        }
        self.extra.extend(overlay.extra);
        self
    }

    /// Fold fragments left to right, later fragments winning per field.
    pub fn merge_all(initial: Status, fragments: impl IntoIterator<Item = Status>) -> Self {
        fragments.into_iter().fold(initial, Status::merge)
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_none()
            && self.message.is_none()
            && self.transitions.is_none()
            && self.extra.is_empty()
    }
}

/// Merge order used after every transition: processors may add fields but the
/// base fragment (state and message from the state machine) always wins.
///
/// The base message is applied even when absent, so a message left over from
/// the previous state never survives a transition.
pub fn merge_transition_status(current: Status, processors: Vec<Status>, base: Status) -> Status {
    let message = base.message.clone();
    let mut merged =
        Status::merge_all(current, processors.into_iter().chain(std::iter::once(base)));
    merged.message = message;
    merged
}
