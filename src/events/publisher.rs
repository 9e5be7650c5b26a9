//! Sharded, bounded event publication with caller-runs backpressure.

use super::router::EventRouter;
use super::types::BusEvent;
use crate::config::EventsConfig;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::{debug, trace, warn};

/// Receiving end of one shard queue, drained by exactly one worker
#[derive(Debug)]
pub struct ShardReceiver {
    index: usize,
    rx: mpsc::Receiver<BusEvent>,
}

impl ShardReceiver {
    pub fn index(&self) -> usize {
        self.index
    }

    pub async fn recv(&mut self) -> Option<BusEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Result<BusEvent, TryRecvError> {
        self.rx.try_recv()
    }
}

/// Counters since start-up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventPublisherStats {
    pub queued: u64,
    /// Handled on the publishing task because the shard was full
    pub handled_inline: u64,
    pub dropped: u64,
}

struct PublisherInner {
    shards: Vec<mpsc::Sender<BusEvent>>,
    router: OnceLock<Weak<EventRouter>>,
    queued: AtomicU64,
    handled_inline: AtomicU64,
    dropped: AtomicU64,
}

/// Publishes bus events onto `N` bounded shard queues.
///
/// The shard is chosen by hashing the event's entity id, so queued events for
/// one entity are consumed in publication order; nothing is ordered across
/// entities. When the target shard is full the event is handled inline by the
/// attached router instead of being dropped or queued without bound. That
/// inline handling can overtake events still waiting in the queue, so under
/// saturation per-entity order is not kept; state changes stay serialized by
/// the lifecycle lock on each entity.
#[derive(Clone)]
pub struct EventPublisher {
    inner: Arc<PublisherInner>,
}

impl EventPublisher {
    /// Create a publisher and the receivers its shard workers consume
    pub fn channel(config: &EventsConfig) -> (Self, Vec<ShardReceiver>) {
        let shard_count = config.worker_shards.max(1);
        let capacity = config.shard_queue_capacity.max(1);

        let (shards, receivers): (Vec<_>, Vec<_>) = (0..shard_count)
            .map(|index| {
                let (tx, rx) = mpsc::channel(capacity);
                (tx, ShardReceiver { index, rx })
            })
            .unzip();

        let publisher = Self {
            inner: Arc::new(PublisherInner {
                shards,
                router: OnceLock::new(),
                queued: AtomicU64::new(0),
                handled_inline: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
        };
        (publisher, receivers)
    }

    /// Router used for caller-runs handling; only the first call takes effect
    pub fn attach_router(&self, router: &Arc<EventRouter>) {
        if self.inner.router.set(Arc::downgrade(router)).is_err() {
            warn!("event router already attached; ignoring");
        }
    }

    pub fn shard_count(&self) -> usize {
        self.inner.shards.len()
    }

    /// Stable shard index for an entity id
    pub fn shard_for(&self, entity_id: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        entity_id.hash(&mut hasher);
        (hasher.finish() % self.inner.shards.len() as u64) as usize
    }

    pub async fn publish(&self, event: BusEvent) {
        let shard = self.shard_for(event.entity_id());
        match self.inner.shards[shard].try_send(event) {
            Ok(()) => {
                self.inner.queued.fetch_add(1, Ordering::Relaxed);
                trace!(shard, "event queued");
            }
            Err(TrySendError::Full(event)) => self.handle_saturated(shard, event).await,
            Err(TrySendError::Closed(event)) => {
                self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    shard,
                    event = event.name(),
                    entity_id = event.entity_id(),
                    "event bus closed, event dropped"
                );
            }
        }
    }

    async fn handle_saturated(&self, shard: usize, event: BusEvent) {
        match self.inner.router.get().and_then(Weak::upgrade) {
            Some(router) => {
                self.inner.handled_inline.fetch_add(1, Ordering::Relaxed);
                debug!(
                    shard,
                    event = event.name(),
                    entity_id = event.entity_id(),
                    "shard saturated, handling event on publisher"
                );
                router.dispatch(&event).await;
            }
            None => {
                // Nothing to run the handler: wait for queue capacity instead
                match self.inner.shards[shard].send(event).await {
                    Ok(()) => {
                        self.inner.queued.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(_) => {
                        self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                        warn!(shard, "event bus closed, event dropped");
                    }
                }
            }
        }
    }

    pub fn stats(&self) -> EventPublisherStats {
        EventPublisherStats {
            queued: self.inner.queued.load(Ordering::Relaxed),
            handled_inline: self.inner.handled_inline.load(Ordering::Relaxed),
            dropped: self.inner.dropped.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("shards", &self.inner.shards.len())
            .field("stats", &self.stats())
            .finish()
    }
}
