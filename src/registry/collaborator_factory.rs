use crate::error::{Result, RunplaneError};
use crate::runtime::{Actuator, Runtime};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Kind-keyed map of shared collaborators
struct KindRegistry<T: ?Sized> {
    label: &'static str,
    entries: RwLock<HashMap<String, Arc<T>>>,
}

impl<T: ?Sized> KindRegistry<T> {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn register(&self, kind: &str, entry: Arc<T>) {
        let replaced = self.entries.write().insert(kind.to_string(), entry).is_some();
        info!(registry = self.label, kind, replaced, "collaborator registered");
    }

    fn resolve(&self, kind: &str) -> Result<Arc<T>> {
        self.entries.read().get(kind).cloned().ok_or_else(|| {
            RunplaneError::invalid_argument(format!("no {} registered for kind {kind}", self.label))
        })
    }

    fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<_> = self.entries.read().keys().cloned().collect();
        kinds.sort();
        kinds
    }
}

/// Resolves the [`Runtime`] for a run's kind prefix
pub struct RuntimeFactory {
    inner: KindRegistry<dyn Runtime>,
}

impl RuntimeFactory {
    pub fn new() -> Self {
        Self {
            inner: KindRegistry::new("runtime"),
        }
    }

    /// Registers under `runtime.kind()`, replacing any earlier registration
    pub fn register(&self, runtime: Arc<dyn Runtime>) {
        let kind = runtime.kind().to_string();
        self.inner.register(&kind, runtime);
    }

    pub fn resolve(&self, kind: &str) -> Result<Arc<dyn Runtime>> {
        self.inner.resolve(kind)
    }

    pub fn kinds(&self) -> Vec<String> {
        self.inner.kinds()
    }
}

impl Default for RuntimeFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves the [`Actuator`] for a trigger's kind
pub struct ActuatorFactory {
    inner: KindRegistry<dyn Actuator>,
}

impl ActuatorFactory {
    pub fn new() -> Self {
        Self {
            inner: KindRegistry::new("actuator"),
        }
    }

    pub fn register(&self, actuator: Arc<dyn Actuator>) {
        let kind = actuator.kind().to_string();
        self.inner.register(&kind, actuator);
    }

    pub fn resolve(&self, kind: &str) -> Result<Arc<dyn Actuator>> {
        self.inner.resolve(kind)
    }

    pub fn kinds(&self) -> Vec<String> {
        self.inner.kinds()
    }
}

impl Default for ActuatorFactory {
    fn default() -> Self {
        Self::new()
    }
}
