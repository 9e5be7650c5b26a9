//! # Lifecycle System Bootstrap
//!
//! Wires stores, kind registries, state machine factories, lifecycle managers,
//! listeners, the sharded event bus and the framework monitors into one
//! running system, and tears it down again.

use crate::config::RunplaneConfig;
use crate::error::Result;
use crate::events::{EventPublisher, EventRouter};
use crate::framework::{
    Framework, FrameworkRegistry, RunnableDispatcher, RunnableMonitor, RunnableStore,
};
use crate::lifecycle::{
    EntityLocks, LifecycleManager, RunLifecycleManager, TriggerLifecycleManager,
};
use crate::listeners::{EventListener, RunOperationsListener, RunnableListener, TriggerListener};
use crate::models::{Run, Task, Trigger};
use crate::processors::{Processor, TransitionsProcessor};
use crate::registry::{ActuatorFactory, ProcessorRegistry, RuntimeFactory};
use crate::runtime::{Actuator, Runtime};
use crate::services::{EntityService, InMemoryEntityService};
use crate::state_machine::{RunStateMachineFactory, TriggerStateMachineFactory};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// External collaborators plugged into the system
pub struct Collaborators {
    pub runs: Arc<dyn EntityService<Run>>,
    pub triggers: Arc<dyn EntityService<Trigger>>,
    pub tasks: Arc<dyn EntityService<Task>>,
    pub runtimes: Vec<Arc<dyn Runtime>>,
    pub actuators: Vec<Arc<dyn Actuator>>,
    pub frameworks: Vec<Arc<dyn Framework>>,
    /// Registered after the built-in transitions processor
    pub run_processors: Vec<Arc<dyn Processor<Run>>>,
    pub trigger_processors: Vec<Arc<dyn Processor<Trigger>>>,
}

impl Default for Collaborators {
    /// In-memory stores and no kind-specific collaborators
    fn default() -> Self {
        Self {
            runs: Arc::new(InMemoryEntityService::<Run>::new()),
            triggers: Arc::new(InMemoryEntityService::<Trigger>::new()),
            tasks: Arc::new(InMemoryEntityService::<Task>::new()),
            runtimes: Vec::new(),
            actuators: Vec::new(),
            frameworks: Vec::new(),
            run_processors: Vec::new(),
            trigger_processors: Vec::new(),
        }
    }
}

impl Collaborators {
    pub fn with_runtime(mut self, runtime: Arc<dyn Runtime>) -> Self {
        self.runtimes.push(runtime);
        self
    }

    pub fn with_actuator(mut self, actuator: Arc<dyn Actuator>) -> Self {
        self.actuators.push(actuator);
        self
    }

    pub fn with_framework(mut self, framework: Arc<dyn Framework>) -> Self {
        self.frameworks.push(framework);
        self
    }

    pub fn with_run_processor(mut self, processor: Arc<dyn Processor<Run>>) -> Self {
        self.run_processors.push(processor);
        self
    }

    pub fn with_trigger_processor(mut self, processor: Arc<dyn Processor<Trigger>>) -> Self {
        self.trigger_processors.push(processor);
        self
    }
}

/// A running control plane
pub struct LifecycleSystem {
    config: RunplaneConfig,
    runs: Arc<dyn EntityService<Run>>,
    triggers: Arc<dyn EntityService<Trigger>>,
    tasks: Arc<dyn EntityService<Task>>,
    run_manager: Arc<RunLifecycleManager>,
    trigger_manager: Arc<TriggerLifecycleManager>,
    publisher: EventPublisher,
    router: Arc<EventRouter>,
    runnables: Arc<RunnableStore>,
    monitor: Arc<RunnableMonitor>,
    shutdown_tx: broadcast::Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

impl LifecycleSystem {
    /// Build everything and start the shard workers (and monitors, when
    /// enabled). Must be called from within a tokio runtime.
    pub async fn bootstrap(config: RunplaneConfig, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;

        let Collaborators {
            runs,
            triggers,
            tasks,
            runtimes,
            actuators,
            frameworks,
            run_processors,
            trigger_processors,
        } = collaborators;

        let runtime_factory = Arc::new(RuntimeFactory::new());
        runtimes.into_iter().for_each(|r| runtime_factory.register(r));
        let actuator_factory = Arc::new(ActuatorFactory::new());
        actuators.into_iter().for_each(|a| actuator_factory.register(a));
        let framework_registry = Arc::new(FrameworkRegistry::new());
        frameworks.into_iter().for_each(|f| framework_registry.register(f));

        let history_limit = config.processors.transitions_history_limit;
        let run_registry = Arc::new(ProcessorRegistry::<Run>::new());
        run_registry.register(Arc::new(TransitionsProcessor::<Run>::new(history_limit)));
        run_processors.into_iter().for_each(|p| run_registry.register(p));
        let trigger_registry = Arc::new(ProcessorRegistry::<Trigger>::new());
        trigger_registry.register(Arc::new(TransitionsProcessor::<Trigger>::new(history_limit)));
        trigger_processors
            .into_iter()
            .for_each(|p| trigger_registry.register(p));

        let (publisher, receivers) = EventPublisher::channel(&config.events);
        let locks = Arc::new(EntityLocks::new());
        let lock_timeout = config.lifecycle.lock_timeout();

        let run_manager = Arc::new(RunLifecycleManager::new(
            LifecycleManager::new(
                Arc::clone(&runs),
                Arc::clone(&locks),
                publisher.clone(),
                lock_timeout,
            ),
            RunStateMachineFactory::new()?,
            Arc::clone(&runtime_factory),
            run_registry,
            publisher.clone(),
        ));
        let trigger_manager = Arc::new(TriggerLifecycleManager::new(
            LifecycleManager::new(Arc::clone(&triggers), locks, publisher.clone(), lock_timeout),
            TriggerStateMachineFactory::new()?,
            actuator_factory,
            trigger_registry,
            Arc::clone(&tasks),
            Arc::clone(&runs),
            Arc::clone(&run_manager),
        ));

        let runnables = Arc::new(RunnableStore::new());
        let listeners: Vec<Arc<dyn EventListener>> = vec![
            Arc::new(RunnableListener::new(Arc::clone(&runs), Arc::clone(&run_manager))),
            Arc::new(RunOperationsListener::new(Arc::clone(&runs), Arc::clone(&run_manager))),
            Arc::new(TriggerListener::new(Arc::clone(&triggers), Arc::clone(&trigger_manager))),
            Arc::new(RunnableDispatcher::new(
                Arc::clone(&framework_registry),
                Arc::clone(&runnables),
                publisher.clone(),
            )),
        ];
        let router = Arc::new(EventRouter::new(listeners));
        publisher.attach_router(&router);

        let (shutdown_tx, _) = broadcast::channel(1);
        let mut handles = router.spawn_workers(receivers, &shutdown_tx);

        let monitor = Arc::new(RunnableMonitor::new(
            framework_registry,
            Arc::clone(&runnables),
            publisher.clone(),
            &config.monitor,
        ));
        if config.monitor.enabled {
            handles.extend(monitor.spawn(&shutdown_tx));
        }

        info!(
            shards = publisher.shard_count(),
            listeners = ?router.listener_names(),
            runtimes = ?runtime_factory.kinds(),
            monitor = config.monitor.enabled,
            "lifecycle system started"
        );

        Ok(Self {
            config,
            runs,
            triggers,
            tasks,
            run_manager,
            trigger_manager,
            publisher,
            router,
            runnables,
            monitor,
            shutdown_tx,
            handles,
        })
    }

    pub fn config(&self) -> &RunplaneConfig {
        &self.config
    }

    pub fn runs(&self) -> &Arc<dyn EntityService<Run>> {
        &self.runs
    }

    pub fn triggers(&self) -> &Arc<dyn EntityService<Trigger>> {
        &self.triggers
    }

    pub fn tasks(&self) -> &Arc<dyn EntityService<Task>> {
        &self.tasks
    }

    pub fn run_manager(&self) -> &Arc<RunLifecycleManager> {
        &self.run_manager
    }

    pub fn trigger_manager(&self) -> &Arc<TriggerLifecycleManager> {
        &self.trigger_manager
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    pub fn router(&self) -> &Arc<EventRouter> {
        &self.router
    }

    pub fn runnables(&self) -> &Arc<RunnableStore> {
        &self.runnables
    }

    pub fn monitor(&self) -> &Arc<RunnableMonitor> {
        &self.monitor
    }

    /// Stop monitors and shard workers, letting workers drain their queues
    pub async fn shutdown(self) {
        // no subscribers left means every task already exited
        let _ = self.shutdown_tx.send(());
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                warn!(error = %e, "background task ended abnormally");
            }
        }
        info!("lifecycle system stopped");
    }
}
