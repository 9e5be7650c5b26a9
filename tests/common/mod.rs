//! Shared mocks and harnesses for integration tests
#![allow(dead_code)]


use async_trait::async_trait;
use runplane_core::config::{EventsConfig, RunplaneConfig};
use runplane_core::events::{BusEvent, EventPublisher, ShardReceiver};
use runplane_core::framework::{ExecutionUnit, Framework, FrameworkError, FrameworkResult};
use runplane_core::lifecycle::{
    EntityLocks, LifecycleManager, RunLifecycleManager, TriggerLifecycleManager,
};
use runplane_core::models::{Run, RunSpec, Runnable, Status, Task, Trigger, TriggerSpec};
use runplane_core::processors::TransitionsProcessor;
use runplane_core::registry::{ActuatorFactory, ProcessorRegistry, RuntimeFactory};
use runplane_core::runtime::{Actuator, Runtime, RuntimeError, RuntimeResult};
use runplane_core::services::{EntityService, InMemoryEntityService};
use runplane_core::state_machine::{RunStateMachineFactory, State, TriggerStateMachineFactory};
use serde_json::{json, Map};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const PROJECT: &str = "demo";
pub const FRAMEWORK: &str = "mockjob";

/// Runtime recording every call it receives
pub struct MockRuntime {
    calls: Arc<Mutex<Vec<String>>>,
    /// `delete` returns a teardown runnable instead of `None`
    cleanup_runnable: bool,
    fail_build: bool,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            cleanup_runnable: false,
            fail_build: false,
        }
    }

    pub fn with_cleanup_runnable(mut self) -> Self {
        self.cleanup_runnable = true;
        self
    }

    pub fn with_failing_build(mut self) -> Self {
        self.fail_build = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }

    fn runnable(run: &Run, state: State) -> Runnable {
        let mut runnable = Runnable::new(&run.id, FRAMEWORK, "python", &run.project, state);
        runnable.task = run.spec.task.clone();
        runnable.image = Some("python:3.11".to_string());
        runnable
    }
}

#[async_trait]
impl Runtime for MockRuntime {
    fn kind(&self) -> &str {
        "python"
    }

    async fn build(&self, run: &Run) -> RuntimeResult<RunSpec> {
        self.record("build");
        if self.fail_build {
            return Err(RuntimeError::Backend("registry unavailable".to_string()));
        }
        let mut extra = run.spec.extra.clone();
        extra.insert("image".to_string(), json!("python:3.11"));
        Ok(RunSpec {
            task: run.spec.task.clone(),
            function: Some("main".to_string()),
            extra,
        })
    }

    async fn run(&self, run: &Run) -> RuntimeResult<Runnable> {
        self.record("run");
        Ok(Self::runnable(run, State::Ready))
    }

    async fn stop(&self, run: &Run) -> RuntimeResult<Option<Runnable>> {
        self.record("stop");
        Ok(Some(Self::runnable(run, State::Stopped)))
    }

    async fn resume(&self, run: &Run) -> RuntimeResult<Option<Runnable>> {
        self.record("resume");
        Ok(Some(Self::runnable(run, State::Running)))
    }

    async fn delete(&self, run: &Run) -> RuntimeResult<Option<Runnable>> {
        self.record("delete");
        Ok(self
            .cleanup_runnable
            .then(|| Self::runnable(run, State::Deleting)))
    }
}

/// Actuator stamping a marker into trigger status
pub struct MockActuator;

#[async_trait]
impl Actuator for MockActuator {
    fn kind(&self) -> &str {
        "scheduler"
    }

    async fn run(&self, _trigger: &Trigger) -> RuntimeResult<Option<Status>> {
        Ok(Some(Status::default().with_extra("scheduler", json!("active"))))
    }

    async fn stop(&self, _trigger: &Trigger) -> RuntimeResult<Option<Status>> {
        Ok(Some(Status::default().with_extra("scheduler", json!("stopped"))))
    }

    async fn on_fire(&self, _trigger: &Trigger) -> RuntimeResult<Option<Status>> {
        Ok(Some(Status::default().with_extra("fired", json!(true))))
    }
}

/// Backend keeping unit states in memory; tests move units along with `set_state`
#[derive(Default)]
pub struct MockFramework {
    units: Mutex<HashMap<String, State>>,
    deleted: Mutex<Vec<String>>,
    fail_apply: bool,
}

impl MockFramework {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_apply: true,
            ..Self::default()
        }
    }

    pub fn set_state(&self, id: &str, state: State) {
        self.units.lock().insert(id.to_string(), state);
    }

    pub fn unit_state(&self, id: &str) -> Option<State> {
        self.units.lock().get(id).copied()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }
}

#[async_trait]
impl Framework for MockFramework {
    fn name(&self) -> &str {
        FRAMEWORK
    }

    async fn build(&self, runnable: &Runnable) -> FrameworkResult<ExecutionUnit> {
        Ok(ExecutionUnit::new(
            runnable,
            json!({"image": runnable.image, "task": runnable.task}),
        ))
    }

    async fn apply(&self, unit: ExecutionUnit) -> FrameworkResult<ExecutionUnit> {
        if self.fail_apply {
            return Err(FrameworkError::backend(FRAMEWORK, "apply", "quota exceeded"));
        }
        self.set_state(&unit.id, State::Running);
        Ok(unit.with_state(State::Running, None))
    }

    async fn get(&self, unit: &ExecutionUnit) -> FrameworkResult<Option<ExecutionUnit>> {
        Ok(self
            .unit_state(&unit.id)
            .map(|state| unit.clone().with_state(state, None)))
    }

    async fn delete(&self, unit: &ExecutionUnit) -> FrameworkResult<()> {
        self.units.lock().remove(&unit.id);
        self.deleted.lock().push(unit.id.clone());
        Ok(())
    }
}

/// Managers wired by hand; published events stay queued for inspection
pub struct Harness {
    pub runs: Arc<InMemoryEntityService<Run>>,
    pub triggers: Arc<InMemoryEntityService<Trigger>>,
    pub tasks: Arc<InMemoryEntityService<Task>>,
    pub runtime: Arc<MockRuntime>,
    pub run_manager: Arc<RunLifecycleManager>,
    pub trigger_manager: Arc<TriggerLifecycleManager>,
    pub run_processors: Arc<ProcessorRegistry<Run>>,
    pub locks: Arc<EntityLocks>,
    pub publisher: EventPublisher,
    receivers: Vec<ShardReceiver>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_runtime(MockRuntime::new(), Duration::from_secs(2))
    }

    pub fn with_runtime(runtime: MockRuntime, lock_timeout: Duration) -> Self {
        let runs = Arc::new(InMemoryEntityService::<Run>::new());
        let triggers = Arc::new(InMemoryEntityService::<Trigger>::new());
        let tasks = Arc::new(InMemoryEntityService::<Task>::new());
        let runtime = Arc::new(runtime);

        let runtimes = Arc::new(RuntimeFactory::new());
        runtimes.register(runtime.clone());
        let actuators = Arc::new(ActuatorFactory::new());
        actuators.register(Arc::new(MockActuator));

        let run_processors = Arc::new(ProcessorRegistry::<Run>::new());
        run_processors.register(Arc::new(TransitionsProcessor::<Run>::new(50)));
        let trigger_processors = Arc::new(ProcessorRegistry::<Trigger>::new());
        trigger_processors.register(Arc::new(TransitionsProcessor::<Trigger>::new(50)));

        // large queues: nothing drains them during a test
        let (publisher, receivers) = EventPublisher::channel(&EventsConfig {
            worker_shards: 2,
            shard_queue_capacity: 1024,
        });
        let locks = Arc::new(EntityLocks::new());

        let run_manager = Arc::new(RunLifecycleManager::new(
            LifecycleManager::new(runs.clone(), locks.clone(), publisher.clone(), lock_timeout),
            RunStateMachineFactory::new().unwrap(),
            runtimes,
            run_processors.clone(),
            publisher.clone(),
        ));
        let trigger_manager = Arc::new(TriggerLifecycleManager::new(
            LifecycleManager::new(triggers.clone(), locks.clone(), publisher.clone(), lock_timeout),
            TriggerStateMachineFactory::new().unwrap(),
            actuators,
            trigger_processors,
            tasks.clone(),
            runs.clone(),
            run_manager.clone(),
        ));

        Self {
            runs,
            triggers,
            tasks,
            runtime,
            run_manager,
            trigger_manager,
            run_processors,
            locks,
            publisher,
            receivers,
        }
    }

    /// Persist a `python+run` run in `CREATED` referencing a task
    pub async fn created_run(&self) -> Run {
        self.runs
            .create(Run::new("python+run", PROJECT, run_spec()))
            .await
            .unwrap()
    }

    /// Persist a run and force its status to `state`
    pub async fn run_in_state(&self, state: State) -> Run {
        let mut run = self.created_run().await;
        run.status = Status::base(state, None);
        self.runs.update(run).await.unwrap()
    }

    pub async fn stored_run(&self, id: &str) -> Option<Run> {
        self.runs.find(id).await.unwrap()
    }

    pub async fn task(&self) -> Task {
        self.tasks
            .create(Task {
                id: "train".to_string(),
                kind: "python+job".to_string(),
                project: PROJECT.to_string(),
                function: Some("trainer".to_string()),
                spec: Map::new(),
                status: Status::default(),
            })
            .await
            .unwrap()
    }

    pub async fn trigger(&self, task_key: &str, state: State) -> Trigger {
        let mut template = Map::new();
        template.insert("epochs".to_string(), json!(3));
        let mut trigger = Trigger::new(
            "scheduler",
            PROJECT,
            TriggerSpec {
                task: task_key.to_string(),
                function: None,
                template,
                extra: Map::new(),
            },
        );
        trigger.user = Some("alice".to_string());
        trigger.status = Status::base(state, None);
        self.triggers.create(trigger).await.unwrap()
    }

    /// Every queued event, per shard in publication order
    pub fn drain_events(&mut self) -> Vec<BusEvent> {
        let mut events = Vec::new();
        for rx in &mut self.receivers {
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
        }
        events
    }
}

pub fn run_spec() -> RunSpec {
    RunSpec {
        task: Some(format!("python+job://{PROJECT}/train")),
        function: None,
        extra: Map::new(),
    }
}

/// Configuration for a full system in tests: small queues, no background polling
pub fn test_config() -> RunplaneConfig {
    let mut config = RunplaneConfig::default();
    config.lifecycle.lock_timeout_seconds = 5;
    config.monitor.enabled = false;
    config
}

/// Poll the store until the run reaches `state` (or disappears, for `None`)
pub async fn wait_for_run(
    runs: &Arc<dyn EntityService<Run>>,
    id: &str,
    state: Option<State>,
) -> Option<Run> {
    for _ in 0..200 {
        let current = runs.find(id).await.unwrap();
        if current.as_ref().map(Run::state) == state {
            return current;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("run {id} never reached {state:?}");
}
