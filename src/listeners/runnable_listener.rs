use super::EventListener;
use crate::error::Result;
use crate::events::{BusEvent, RunnableChangedEvent};
use crate::lifecycle::RunLifecycleManager;
use crate::models::Run;
use crate::services::EntityService;
use crate::state_machine::State;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Applies framework status reports to runs
pub struct RunnableListener {
    runs: Arc<dyn EntityService<Run>>,
    manager: Arc<RunLifecycleManager>,
}

impl RunnableListener {
    pub fn new(runs: Arc<dyn EntityService<Run>>, manager: Arc<RunLifecycleManager>) -> Self {
        Self { runs, manager }
    }

    pub async fn receive(&self, event: &RunnableChangedEvent) -> Result<()> {
        let Some(run) = self.runs.find(&event.id).await? else {
            debug!(run_id = %event.id, state = %event.state, "report for unknown run dropped");
            return Ok(());
        };
        let runnable = event.runnable.clone();

        match event.state {
            State::Completed => self.manager.on_completed(run, runnable).await?,
            State::Error => self.manager.on_error(run, runnable).await?,
            State::Running => self.manager.on_running(run, runnable).await?,
            State::Stopped => self.manager.on_stopped(run, runnable).await?,
            State::Deleted => self.manager.on_deleted(run, runnable).await?,
            other => {
                debug!(run_id = %event.id, state = %other, "runnable state not handled");
                return Ok(());
            }
        };
        Ok(())
    }
}

#[async_trait]
impl EventListener for RunnableListener {
    fn name(&self) -> &'static str {
        "runnable"
    }

    fn accepts(&self, event: &BusEvent) -> bool {
        matches!(event, BusEvent::RunnableChanged(_))
    }

    async fn handle(&self, event: &BusEvent) -> Result<()> {
        match event {
            BusEvent::RunnableChanged(changed) => self.receive(changed).await,
            _ => Ok(()),
        }
    }
}
