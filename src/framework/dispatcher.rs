use super::{FrameworkRegistry, FrameworkResult, RunnableStore};
use crate::error::Result;
use crate::events::{BusEvent, EventPublisher, RunnableChangedEvent};
use crate::listeners::EventListener;
use crate::models::Runnable;
use crate::state_machine::State;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Materializes published runnables on their framework and reports back
pub struct RunnableDispatcher {
    frameworks: Arc<FrameworkRegistry>,
    store: Arc<RunnableStore>,
    publisher: EventPublisher,
}

impl RunnableDispatcher {
    pub fn new(
        frameworks: Arc<FrameworkRegistry>,
        store: Arc<RunnableStore>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            frameworks,
            store,
            publisher,
        }
    }

    /// Act on `runnable.state` and publish the state the framework reports
    pub async fn dispatch(&self, runnable: Runnable) {
        let id = runnable.id.clone();
        let requested = runnable.state;
        let report = match self.apply(runnable.clone()).await {
            Ok(Some(report)) => report,
            Ok(None) => {
                debug!(run_id = %id, state = %requested, "runnable state needs no dispatch");
                return;
            }
            Err(e) => {
                warn!(run_id = %id, state = %requested, error = %e, "runnable dispatch failed");
                runnable.with_state(State::Error, Some(e.to_string()))
            }
        };

        self.publisher
            .publish(RunnableChangedEvent::from_runnable(report).into())
            .await;
    }

    async fn apply(&self, runnable: Runnable) -> FrameworkResult<Option<Runnable>> {
        match runnable.state {
            State::Ready | State::Running => {
                let framework = self.frameworks.get(&runnable.framework)?;
                let unit = framework.build(&runnable).await?;
                let unit = framework.apply(unit).await?;
                info!(
                    run_id = %runnable.id,
                    framework = %runnable.framework,
                    state = %unit.state,
                    "runnable applied"
                );
                let report = runnable.clone().with_state(unit.state, unit.message.clone());
                self.store.track(runnable, unit);
                Ok(Some(report))
            }
            State::Stopped => {
                self.teardown(&runnable).await?;
                Ok(Some(runnable.with_state(State::Stopped, None)))
            }
            State::Deleting => {
                self.teardown(&runnable).await?;
                Ok(Some(runnable.with_state(State::Deleted, None)))
            }
            _ => Ok(None),
        }
    }

    /// Delete the backend unit, if one was ever applied
    async fn teardown(&self, runnable: &Runnable) -> FrameworkResult<()> {
        let Some(tracked) = self.store.get(&runnable.id) else {
            debug!(run_id = %runnable.id, "no execution unit to remove");
            return Ok(());
        };
        let framework = self.frameworks.get(&tracked.runnable.framework)?;
        framework.delete(&tracked.unit).await?;
        self.store.untrack(&runnable.id);
        Ok(())
    }
}

#[async_trait]
impl EventListener for RunnableDispatcher {
    fn name(&self) -> &'static str {
        "runnable-dispatcher"
    }

    fn accepts(&self, event: &BusEvent) -> bool {
        matches!(event, BusEvent::RunnablePublished(_))
    }

    async fn handle(&self, event: &BusEvent) -> Result<()> {
        if let BusEvent::RunnablePublished(runnable) = event {
            self.dispatch(runnable.clone()).await;
        }
        Ok(())
    }
}
