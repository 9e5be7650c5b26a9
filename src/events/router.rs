use super::publisher::ShardReceiver;
use super::types::BusEvent;
use crate::listeners::EventListener;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Fans bus events out to every listener that accepts them
pub struct EventRouter {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl EventRouter {
    pub fn new(listeners: Vec<Arc<dyn EventListener>>) -> Self {
        Self { listeners }
    }

    pub fn listener_names(&self) -> Vec<&'static str> {
        self.listeners.iter().map(|l| l.name()).collect()
    }

    /// Listener failures are logged and never reach the publisher
    pub async fn dispatch(&self, event: &BusEvent) {
        for listener in self.listeners.iter().filter(|l| l.accepts(event)) {
            debug!(
                listener = listener.name(),
                event = event.name(),
                entity_id = event.entity_id(),
                "dispatching event"
            );
            if let Err(e) = listener.handle(event).await {
                warn!(
                    listener = listener.name(),
                    event = event.name(),
                    entity_id = event.entity_id(),
                    error = %e,
                    "event listener failed"
                );
            }
        }
    }

    /// One worker per shard. On shutdown each worker drains what is already
    /// queued before exiting.
    pub fn spawn_workers(
        self: &Arc<Self>,
        receivers: Vec<ShardReceiver>,
        shutdown: &broadcast::Sender<()>,
    ) -> Vec<JoinHandle<()>> {
        receivers
            .into_iter()
            .map(|mut rx| {
                let router = Arc::clone(self);
                let mut shutdown_rx = shutdown.subscribe();
                tokio::spawn(async move {
                    let shard = rx.index();
                    debug!(shard, "event shard worker started");
                    loop {
                        tokio::select! {
                            event = rx.recv() => match event {
                                Some(event) => router.dispatch(&event).await,
                                None => break,
                            },
                            _ = shutdown_rx.recv() => {
                                while let Ok(event) = rx.try_recv() {
                                    router.dispatch(&event).await;
                                }
                                break;
                            }
                        }
                    }
                    info!(shard, "event shard worker stopped");
                })
            })
            .collect()
    }
}
