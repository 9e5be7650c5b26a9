use super::{Framework, FrameworkError, FrameworkResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Frameworks keyed by name
#[derive(Default)]
pub struct FrameworkRegistry {
    frameworks: RwLock<HashMap<String, Arc<dyn Framework>>>,
}

impl FrameworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, framework: Arc<dyn Framework>) {
        let name = framework.name().to_string();
        info!(framework = %name, "framework registered");
        self.frameworks.write().insert(name, framework);
    }

    pub fn get(&self, name: &str) -> FrameworkResult<Arc<dyn Framework>> {
        self.frameworks
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| FrameworkError::NotRegistered(name.to_string()))
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.frameworks.read().keys().cloned().collect();
        names.sort();
        names
    }
}
