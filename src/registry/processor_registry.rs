use crate::models::Entity;
use crate::processors::Processor;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Processors indexed by the stage keys they declare
pub struct ProcessorRegistry<E: Entity> {
    stages: RwLock<HashMap<String, Vec<Arc<dyn Processor<E>>>>>,
}

impl<E: Entity> ProcessorRegistry<E> {
    pub fn new() -> Self {
        Self {
            stages: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, processor: Arc<dyn Processor<E>>) {
        let mut stages = self.stages.write();
        for stage in processor.stages() {
            debug!(
                entity = E::KIND,
                processor = processor.name(),
                stage = %stage,
                "processor registered"
            );
            stages
                .entry(stage)
                .or_default()
                .push(Arc::clone(&processor));
        }
    }

    /// Processors for `stage` in registration order
    pub fn processors(&self, stage: &str) -> Vec<Arc<dyn Processor<E>>> {
        self.stages.read().get(stage).cloned().unwrap_or_default()
    }
}

impl<E: Entity> Default for ProcessorRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}
