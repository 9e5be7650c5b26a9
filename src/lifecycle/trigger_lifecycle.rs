use super::manager::{apply_transition_status, LifecycleManager};
use super::run_lifecycle::RunLifecycleManager;
use crate::error::{Result, RunplaneError};
use crate::events::EntityOperation;
use crate::logging::log_lifecycle_operation;
use crate::models::{Relationship, Run, RunSpec, Status, Task, TaskKey, Trigger};
use crate::registry::{ActuatorFactory, ProcessorRegistry};
use crate::services::{EntityService, StoreError};
use crate::state_machine::{TriggerContext, TriggerEvent, TriggerStateMachineFactory};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives triggers and turns each firing into a new run
pub struct TriggerLifecycleManager {
    manager: LifecycleManager<Trigger>,
    factory: TriggerStateMachineFactory,
    actuators: Arc<ActuatorFactory>,
    processors: Arc<ProcessorRegistry<Trigger>>,
    tasks: Arc<dyn EntityService<Task>>,
    runs: Arc<dyn EntityService<Run>>,
    run_manager: Arc<RunLifecycleManager>,
}

impl TriggerLifecycleManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        manager: LifecycleManager<Trigger>,
        factory: TriggerStateMachineFactory,
        actuators: Arc<ActuatorFactory>,
        processors: Arc<ProcessorRegistry<Trigger>>,
        tasks: Arc<dyn EntityService<Task>>,
        runs: Arc<dyn EntityService<Run>>,
        run_manager: Arc<RunLifecycleManager>,
    ) -> Self {
        Self {
            manager,
            factory,
            actuators,
            processors,
            tasks,
            runs,
            run_manager,
        }
    }

    /// Start the trigger through its actuator
    pub async fn run(&self, trigger: Trigger) -> Result<Trigger> {
        self.update(trigger, TriggerEvent::Run).await
    }

    pub async fn stop(&self, trigger: Trigger) -> Result<Trigger> {
        self.update(trigger, TriggerEvent::Stop).await
    }

    /// Fire without extra details
    pub async fn fire(&self, trigger: Trigger) -> Trigger {
        self.fire_with(trigger, None).await
    }

    /// Create and start a run for a ready trigger.
    ///
    /// The trigger row itself is not rewritten; the returned trigger carries
    /// the merged status. Every failure is logged and yields the trigger as
    /// it was passed in.
    pub async fn fire_with(&self, trigger: Trigger, details: Option<Status>) -> Trigger {
        let fallback = trigger.clone();
        let result = self
            .manager
            .exec(EntityOperation::read(trigger), |current| async move {
                let actuator = self.actuators.resolve(&current.kind)?;
                let mut fsm = self
                    .factory
                    .create(current.state(), TriggerContext::new(current.clone(), actuator));
                let fragment = fsm.perform(TriggerEvent::Fire, details.as_ref()).await?;

                let run = self.spawn_run(&current).await?;
                let message = fragment.as_ref().and_then(|f| f.message.clone());
                let updated = apply_transition_status(
                    &self.processors,
                    current,
                    fsm.current_state(),
                    message,
                    None,
                    fragment,
                )
                .await;
                Ok::<_, RunplaneError>((updated, run))
            })
            .await;

        let (updated, run) = match result {
            Ok(fired) => fired,
            Err(e) if e.is_invalid_transition() => {
                debug!(trigger_id = %fallback.id, error = %e, "trigger not ready, fire ignored");
                return fallback;
            }
            Err(e) => {
                warn!(trigger_id = %fallback.id, error = %e, "trigger fire failed");
                return fallback;
            }
        };

        let run_id = run.id.clone();
        let started = match self.run_manager.build(run).await {
            Ok(built) => self.run_manager.run(built).await,
            Err(e) => Err(e),
        };
        match started {
            Ok(run) => info!(
                trigger_id = %updated.id,
                run_id = %run.id,
                state = %run.state(),
                "trigger fired"
            ),
            Err(e) => warn!(
                trigger_id = %updated.id,
                run_id = %run_id,
                error = %e,
                "run produced by trigger failed to start"
            ),
        }
        updated
    }

    /// Resolve the trigger's task and persist a `CREATED` run for it
    async fn spawn_run(&self, trigger: &Trigger) -> Result<Run> {
        let key = TaskKey::parse(&trigger.spec.task)?;
        let task = match self.tasks.get(&key.id).await {
            Ok(task) => task,
            Err(StoreError::NotFound { .. }) => {
                return Err(RunplaneError::invalid_argument(format!("task not found: {key}")))
            }
            Err(e) => return Err(RunplaneError::system(e.to_string())),
        };
        if task.project != key.project {
            return Err(RunplaneError::invalid_argument(format!(
                "task {key} does not belong to project {}",
                key.project
            )));
        }

        let mut template = trigger.spec.template.clone();
        template.remove("task");
        template.remove("function");
        let spec = RunSpec {
            task: Some(key.to_string()),
            function: trigger.spec.function.clone().or_else(|| task.function.clone()),
            extra: template,
        };

        let mut run = Run::new(task.run_kind(), &trigger.project, spec);
        run.user = trigger.user.clone();
        run.relationships.push(Relationship::produced_by(trigger.key()));

        let run = self
            .runs
            .create(run)
            .await
            .map_err(|e| RunplaneError::system(format!("failed to create run: {e}")))?;
        debug!(trigger_id = %trigger.id, run_id = %run.id, "run created for trigger");
        Ok(run)
    }

    async fn update(&self, trigger: Trigger, event: TriggerEvent) -> Result<Trigger> {
        let fallback = trigger.clone();
        let result = self
            .manager
            .exec(EntityOperation::update(trigger), |current| async move {
                let actuator = self.actuators.resolve(&current.kind)?;
                let mut fsm = self
                    .factory
                    .create(current.state(), TriggerContext::new(current.clone(), actuator));
                let fragment = fsm.perform(event, None).await?;

                let message = fragment.as_ref().and_then(|f| f.message.clone());
                let updated = apply_transition_status(
                    &self.processors,
                    current,
                    fsm.current_state(),
                    message,
                    None,
                    fragment,
                )
                .await;
                Ok::<_, RunplaneError>((updated, ()))
            })
            .await;

        match result {
            Ok((updated, ())) => {
                log_lifecycle_operation(
                    event.event_type(),
                    "trigger",
                    &updated.id,
                    Some(updated.state().as_str()),
                    "transitioned",
                    None,
                );
                Ok(updated)
            }
            Err(e) if e.is_invalid_transition() => {
                debug!(
                    trigger_id = %fallback.id,
                    error = %e,
                    "transition not applicable, trigger unchanged"
                );
                Ok(fallback)
            }
            Err(e) => Err(e),
        }
    }
}
