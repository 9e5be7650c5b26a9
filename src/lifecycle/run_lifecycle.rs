use super::manager::{apply_transition_status, LifecycleManager};
use crate::error::{Result, RunplaneError};
use crate::events::{BusEvent, EntityOperation, EventPublisher, RunnableChangedEvent};
use crate::logging::log_lifecycle_operation;
use crate::models::{Run, Runnable};
use crate::registry::{ProcessorRegistry, RuntimeFactory};
use crate::services::StoreError;
use crate::state_machine::{RunContext, RunEvent, RunOutput, RunStateMachineFactory, State};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a transition is requested
#[derive(Debug, Clone, Copy)]
enum Step {
    /// Caller-requested event
    Perform(RunEvent),
    /// State reported by a framework
    GoTo(State),
}

struct Outcome {
    run: Run,
    output: Option<RunOutput>,
    changed: bool,
}

/// Drives runs through their lifecycle.
///
/// Every operation resolves the runtime for the run's kind, builds a state
/// machine on the persisted state, performs one transition under the run's
/// lock and merges the resulting status. A transition that is not valid from
/// the current state is a no-op returning the run unchanged.
pub struct RunLifecycleManager {
    manager: LifecycleManager<Run>,
    factory: RunStateMachineFactory,
    runtimes: Arc<RuntimeFactory>,
    processors: Arc<ProcessorRegistry<Run>>,
    publisher: EventPublisher,
}

impl RunLifecycleManager {
    pub fn new(
        manager: LifecycleManager<Run>,
        factory: RunStateMachineFactory,
        runtimes: Arc<RuntimeFactory>,
        processors: Arc<ProcessorRegistry<Run>>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            manager,
            factory,
            runtimes,
            processors,
            publisher,
        }
    }

    /// `CREATED -> BUILT`, replacing the run spec with the resolved one
    pub async fn build(&self, run: Run) -> Result<Run> {
        let outcome = self.transition(run, Step::Perform(RunEvent::Build), None).await?;
        Ok(outcome.run)
    }

    /// `BUILT -> READY`, publishing the runnable for dispatch
    pub async fn run(&self, run: Run) -> Result<Run> {
        self.perform_and_publish(run, RunEvent::Run).await
    }

    pub async fn stop(&self, run: Run) -> Result<Run> {
        self.perform_and_publish(run, RunEvent::Stop).await
    }

    pub async fn resume(&self, run: Run) -> Result<Run> {
        self.perform_and_publish(run, RunEvent::Resume).await
    }

    /// Move to `DELETING` and ask the framework to tear down.
    ///
    /// Runs without external resources get a synthetic `DELETED` report so the
    /// delete flow completes through the same listener path.
    pub async fn delete(&self, run: Run) -> Result<Run> {
        let outcome = self
            .transition(run, Step::Perform(RunEvent::Deleting), None)
            .await?;

        if outcome.changed {
            match outcome.output.and_then(RunOutput::into_runnable) {
                Some(runnable) => self.publish_runnable(runnable).await,
                None => {
                    debug!(run_id = %outcome.run.id, "no runnable to clean up, reporting deleted");
                    self.publisher
                        .publish(
                            RunnableChangedEvent::new(&outcome.run.id, State::Deleted, None).into(),
                        )
                        .await;
                }
            }
        }
        Ok(outcome.run)
    }

    pub async fn on_running(&self, run: Run, runnable: Option<Runnable>) -> Result<Run> {
        let outcome = self
            .transition(run, Step::GoTo(State::Running), runnable)
            .await?;
        Ok(outcome.run)
    }

    pub async fn on_stopped(&self, run: Run, runnable: Option<Runnable>) -> Result<Run> {
        let outcome = self
            .transition(run, Step::GoTo(State::Stopped), runnable)
            .await?;
        Ok(outcome.run)
    }

    pub async fn on_completed(&self, run: Run, runnable: Option<Runnable>) -> Result<Run> {
        self.finish(run, State::Completed, runnable).await
    }

    pub async fn on_error(&self, run: Run, runnable: Option<Runnable>) -> Result<Run> {
        self.finish(run, State::Error, runnable).await
    }

    /// Completes a delete flow: only acts while the persisted run is
    /// `DELETING`, then removes the record.
    pub async fn on_deleted(&self, run: Run, runnable: Option<Runnable>) -> Result<Run> {
        let persisted = match self.manager.service().find(&run.id).await? {
            Some(persisted) => persisted,
            None => {
                debug!(run_id = %run.id, "run already removed, ignoring deleted report");
                return Ok(run);
            }
        };
        if persisted.state() != State::Deleting {
            debug!(
                run_id = %run.id,
                state = %persisted.state(),
                "deleted report outside a delete flow, ignoring"
            );
            return Ok(persisted);
        }

        let outcome = self
            .transition(persisted, Step::GoTo(State::Deleted), runnable)
            .await?;
        if outcome.changed {
            match self.manager.service().delete(&outcome.run.id).await {
                Ok(()) | Err(StoreError::NotFound { .. }) => {
                    log_lifecycle_operation(
                        "delete",
                        "run",
                        &outcome.run.id,
                        Some(State::Deleted.as_str()),
                        "removed",
                        None,
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(outcome.run)
    }

    /// Terminal report: transition, then release the runtime's resources
    async fn finish(&self, run: Run, state: State, runnable: Option<Runnable>) -> Result<Run> {
        let outcome = self.transition(run, Step::GoTo(state), runnable).await?;
        if !outcome.changed {
            return Ok(outcome.run);
        }

        let runtime = self.runtimes.resolve(outcome.run.runtime_kind())?;
        match runtime.delete(&outcome.run).await {
            Ok(Some(cleanup)) => self.publish_runnable(cleanup).await,
            Ok(None) => {}
            Err(e) => warn!(
                run_id = %outcome.run.id,
                error = %e,
                "runtime cleanup failed after terminal state"
            ),
        }
        Ok(outcome.run)
    }

    async fn perform_and_publish(&self, run: Run, event: RunEvent) -> Result<Run> {
        let outcome = self.transition(run, Step::Perform(event), None).await?;
        if let Some(runnable) = outcome.output.and_then(RunOutput::into_runnable) {
            self.publish_runnable(runnable).await;
        }
        Ok(outcome.run)
    }

    async fn publish_runnable(&self, runnable: Runnable) {
        debug!(
            run_id = %runnable.id,
            framework = %runnable.framework,
            state = %runnable.state,
            "publishing runnable"
        );
        self.publisher.publish(BusEvent::RunnablePublished(runnable)).await;
    }

    async fn transition(
        &self,
        run: Run,
        step: Step,
        reported: Option<Runnable>,
    ) -> Result<Outcome> {
        let fallback = run.clone();
        let result = self
            .manager
            .exec(EntityOperation::update(run), |current| async move {
                let runtime = self.runtimes.resolve(current.runtime_kind())?;
                let previous = current.state();
                let mut fsm = self
                    .factory
                    .create(previous, RunContext::new(current.clone(), runtime));

                let output = match step {
                    Step::Perform(event) => fsm.perform(event, reported.as_ref()).await?,
                    Step::GoTo(target) => fsm.go_to_state(target, reported.as_ref()).await?,
                };
                let next = fsm.current_state();
                if next == previous && matches!(step, Step::GoTo(_)) {
                    return Ok((current, (None, false)));
                }

                let mut updated = current;
                if let Some(RunOutput::Spec(spec)) = &output {
                    updated.spec = spec.clone();
                }

                let published = match &output {
                    Some(RunOutput::Runnable(runnable)) => Some(runnable),
                    _ => None,
                };
                let message = reported
                    .as_ref()
                    .or(published)
                    .and_then(|r| r.message.clone());
                let updated = apply_transition_status(
                    &self.processors,
                    updated,
                    next,
                    message,
                    reported.as_ref().or(published),
                    None,
                )
                .await;

                Ok::<_, RunplaneError>((updated, (output, true)))
            })
            .await;

        match result {
            Ok((run, (output, changed))) => {
                if changed {
                    log_lifecycle_operation(
                        step_name(step),
                        "run",
                        &run.id,
                        Some(run.state().as_str()),
                        "transitioned",
                        None,
                    );
                }
                Ok(Outcome {
                    run,
                    output,
                    changed,
                })
            }
            Err(e) if e.is_invalid_transition() => {
                debug!(
                    run_id = %fallback.id,
                    error = %e,
                    "transition not applicable, run unchanged"
                );
                Ok(Outcome {
                    run: fallback,
                    output: None,
                    changed: false,
                })
            }
            Err(e) => {
                info!(
                    run_id = %fallback.id,
                    step = step_name(step),
                    error = %e,
                    "run transition failed"
                );
                Err(e)
            }
        }
    }
}

fn step_name(step: Step) -> &'static str {
    match step {
        Step::Perform(event) => event.event_type(),
        Step::GoTo(state) => state.as_str(),
    }
}
