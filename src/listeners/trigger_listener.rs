use super::EventListener;
use crate::error::Result;
use crate::events::{BusEvent, TriggerExecutionEvent};
use crate::lifecycle::TriggerLifecycleManager;
use crate::models::Trigger;
use crate::services::EntityService;
use crate::state_machine::TriggerEvent;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Executes trigger requests coming from actuators
pub struct TriggerListener {
    triggers: Arc<dyn EntityService<Trigger>>,
    manager: Arc<TriggerLifecycleManager>,
}

impl TriggerListener {
    pub fn new(
        triggers: Arc<dyn EntityService<Trigger>>,
        manager: Arc<TriggerLifecycleManager>,
    ) -> Self {
        Self { triggers, manager }
    }

    pub async fn receive(&self, event: &TriggerExecutionEvent) -> Result<()> {
        let Some(trigger) = self.triggers.find(&event.trigger_id).await? else {
            debug!(trigger_id = %event.trigger_id, "execution for unknown trigger dropped");
            return Ok(());
        };

        match event.event {
            TriggerEvent::Fire => {
                self.manager.fire_with(trigger, event.details.clone()).await;
            }
            TriggerEvent::Run => {
                self.manager.run(trigger).await?;
            }
            // accepted, nothing to do yet
            TriggerEvent::Stop | TriggerEvent::Error => {
                debug!(
                    trigger_id = %event.trigger_id,
                    event = %event.event,
                    "trigger event ignored"
                );
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EventListener for TriggerListener {
    fn name(&self) -> &'static str {
        "trigger"
    }

    fn accepts(&self, event: &BusEvent) -> bool {
        matches!(event, BusEvent::TriggerExecution(_))
    }

    async fn handle(&self, event: &BusEvent) -> Result<()> {
        match event {
            BusEvent::TriggerExecution(execution) => self.receive(execution).await,
            _ => Ok(()),
        }
    }
}
