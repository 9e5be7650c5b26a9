use super::ExecutionUnit;
use crate::models::Runnable;
use crate::state_machine::State;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// A dispatched runnable and the backend unit materialized for it
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedRunnable {
    pub runnable: Runnable,
    pub unit: ExecutionUnit,
    pub observed_at: DateTime<Utc>,
}

impl TrackedRunnable {
    pub fn state(&self) -> State {
        self.unit.state
    }
}

/// Runnables with live or not yet removed backend units, keyed by run id
#[derive(Default)]
pub struct RunnableStore {
    entries: DashMap<String, TrackedRunnable>,
}

impl RunnableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, runnable: Runnable, unit: ExecutionUnit) {
        self.entries.insert(
            runnable.id.clone(),
            TrackedRunnable {
                runnable,
                unit,
                observed_at: Utc::now(),
            },
        );
    }

    pub fn get(&self, id: &str) -> Option<TrackedRunnable> {
        self.entries.get(id).map(|e| e.value().clone())
    }

    /// Record a newer backend view; returns false when `id` is not tracked
    pub fn observe(&self, id: &str, unit: ExecutionUnit) -> bool {
        match self.entries.get_mut(id) {
            Some(mut entry) => {
                entry.unit = unit;
                entry.observed_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn untrack(&self, id: &str) -> Option<TrackedRunnable> {
        self.entries.remove(id).map(|(_, tracked)| tracked)
    }

    /// Entries of `framework` whose last observed state is still active
    pub fn active(&self, framework: &str) -> Vec<TrackedRunnable> {
        self.entries
            .iter()
            .filter(|e| e.runnable.framework == framework && e.state().is_active())
            .map(|e| e.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
