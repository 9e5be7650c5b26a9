use super::EventListener;
use crate::error::Result;
use crate::events::{BusEvent, EntityAction, EntityOperation};
use crate::lifecycle::RunLifecycleManager;
use crate::models::Run;
use crate::services::EntityService;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Starts the delete flow for runs whose deletion was requested
pub struct RunOperationsListener {
    runs: Arc<dyn EntityService<Run>>,
    manager: Arc<RunLifecycleManager>,
}

impl RunOperationsListener {
    pub fn new(runs: Arc<dyn EntityService<Run>>, manager: Arc<RunLifecycleManager>) -> Self {
        Self { runs, manager }
    }

    pub async fn receive(&self, operation: &EntityOperation<Run>) -> Result<()> {
        if operation.action != EntityAction::Delete {
            return Ok(());
        }
        match self.runs.find(&operation.dto.id).await? {
            Some(run) => {
                self.manager.delete(run).await?;
            }
            None => debug!(run_id = %operation.dto.id, "delete requested for unknown run"),
        }
        Ok(())
    }
}

#[async_trait]
impl EventListener for RunOperationsListener {
    fn name(&self) -> &'static str {
        "run-operations"
    }

    fn accepts(&self, event: &BusEvent) -> bool {
        matches!(
            event,
            BusEvent::RunOperation(EntityOperation {
                action: EntityAction::Delete,
                ..
            })
        )
    }

    async fn handle(&self, event: &BusEvent) -> Result<()> {
        match event {
            BusEvent::RunOperation(operation) => self.receive(operation).await,
            _ => Ok(()),
        }
    }
}
