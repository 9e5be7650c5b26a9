use super::{FrameworkRegistry, RunnableStore, TrackedRunnable};
use crate::config::MonitorConfig;
use crate::events::{EventPublisher, RunnableChangedEvent};
use crate::state_machine::State;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Polls frameworks for the state of active runnables.
///
/// One polling task per framework; the first poll of the n-th framework is
/// delayed by `n * stagger` so start-up does not hit every backend at once.
pub struct RunnableMonitor {
    frameworks: Arc<FrameworkRegistry>,
    store: Arc<RunnableStore>,
    publisher: EventPublisher,
    poll_interval: Duration,
    stagger: Duration,
}

impl RunnableMonitor {
    pub fn new(
        frameworks: Arc<FrameworkRegistry>,
        store: Arc<RunnableStore>,
        publisher: EventPublisher,
        config: &MonitorConfig,
    ) -> Self {
        Self {
            frameworks,
            store,
            publisher,
            poll_interval: config.poll_interval(),
            stagger: config.stagger(),
        }
    }

    pub fn spawn(
        self: &Arc<Self>,
        shutdown: &broadcast::Sender<()>,
    ) -> Vec<JoinHandle<()>> {
        self.frameworks
            .names()
            .into_iter()
            .enumerate()
            .map(|(index, framework)| {
                let monitor = Arc::clone(self);
                let mut shutdown_rx = shutdown.subscribe();
                let delay = monitor.stagger * index as u32;
                tokio::spawn(async move {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = shutdown_rx.recv() => return,
                    }
                    info!(
                        framework = %framework,
                        interval = ?monitor.poll_interval,
                        "runnable monitor started"
                    );

                    let mut ticker = tokio::time::interval(monitor.poll_interval);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        tokio::select! {
                            _ = ticker.tick() => {
                                monitor.poll_framework(&framework).await;
                            }
                            _ = shutdown_rx.recv() => break,
                        }
                    }
                    info!(framework = %framework, "runnable monitor stopped");
                })
            })
            .collect()
    }

    /// Poll every framework once
    pub async fn poll_once(&self) -> usize {
        let mut reported = 0;
        for framework in self.frameworks.names() {
            reported += self.poll_framework(&framework).await;
        }
        reported
    }

    /// Returns the number of state changes reported
    pub async fn poll_framework(&self, name: &str) -> usize {
        let framework = match self.frameworks.get(name) {
            Ok(framework) => framework,
            Err(e) => {
                warn!(framework = name, error = %e, "monitor skipped framework");
                return 0;
            }
        };

        let mut reported = 0;
        for tracked in self.store.active(name) {
            let TrackedRunnable { runnable, unit, .. } = tracked;
            let last = unit.state;
            let observed = match framework.get(&unit).await {
                Ok(Some(observed)) => observed,
                Ok(None) => unit.with_state(
                    State::Error,
                    Some("execution unit no longer exists".to_string()),
                ),
                Err(e) => {
                    warn!(
                        run_id = %runnable.id,
                        framework = name,
                        error = %e,
                        "status poll failed"
                    );
                    continue;
                }
            };

            if observed.state == last {
                continue;
            }
            debug!(run_id = %runnable.id, state = %observed.state, "runnable state changed");
            let report = runnable.with_state(observed.state, observed.message.clone());
            self.store.observe(&report.id, observed);
            self.publisher
                .publish(RunnableChangedEvent::from_runnable(report).into())
                .await;
            reported += 1;
        }
        reported
    }
}
