use super::lock::EntityLocks;
use crate::error::{Result, RunplaneError};
use crate::events::{BusEvent, EntityAction, EntityChangedEvent, EntityOperation, EventPublisher};
use crate::models::{merge_transition_status, Entity, Runnable, Status};
use crate::registry::ProcessorRegistry;
use crate::services::EntityService;
use crate::state_machine::State;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Serializes every mutation of one entity id through a single lock.
///
/// `exec` re-reads the persisted entity once the lock is held, so the logic
/// always starts from the last committed state even when callers pass a stale
/// copy. Only `Update` operations that actually modify the stored entity are
/// persisted, and the change event is published after the lock has been
/// released.
pub struct LifecycleManager<D: Entity> {
    service: Arc<dyn EntityService<D>>,
    locks: Arc<EntityLocks>,
    publisher: EventPublisher,
    lock_timeout: Duration,
}

impl<D: Entity> LifecycleManager<D> {
    pub fn new(
        service: Arc<dyn EntityService<D>>,
        locks: Arc<EntityLocks>,
        publisher: EventPublisher,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            service,
            locks,
            publisher,
            lock_timeout,
        }
    }

    pub fn service(&self) -> &Arc<dyn EntityService<D>> {
        &self.service
    }

    /// Run `logic` under the entity lock.
    ///
    /// `logic` returns the resulting entity plus a value the caller acts on
    /// after the lock is gone (typically a runnable to publish).
    pub async fn exec<X, F, Fut>(&self, operation: EntityOperation<D>, logic: F) -> Result<(D, X)>
    where
        F: FnOnce(D) -> Fut + Send,
        Fut: Future<Output = Result<(D, X)>> + Send,
        X: Send,
    {
        let EntityOperation { dto, action } = operation;
        let id = dto.id().to_string();

        let (result, extra, changed) = {
            let _guard = self.locks.acquire(&id, self.lock_timeout).await?;

            let mut persisted = None;
            let current = match self.service.find(&id).await {
                Ok(Some(found)) => {
                    if action == EntityAction::Update {
                        persisted = Some(found.clone());
                    }
                    found
                }
                Ok(None) => dto,
                Err(e) => {
                    return Err(RunplaneError::system(format!(
                        "failed to read {} {id}: {e}",
                        D::KIND
                    )))
                }
            };

            let (result, extra) = logic(current).await?;

            // an update that leaves the stored entity as it was is not written
            let changed = action == EntityAction::Update && persisted.as_ref() != Some(&result);
            let result = if changed {
                self.service.update(result).await.map_err(|e| {
                    RunplaneError::system(format!("failed to persist {} {id}: {e}", D::KIND))
                })?
            } else {
                result
            };
            (result, extra, changed)
        };

        if changed {
            self.publisher
                .publish(BusEvent::EntityChanged(EntityChangedEvent {
                    kind: D::KIND.to_string(),
                    id,
                    state: result.status().state,
                    action,
                    timestamp: Utc::now(),
                }))
                .await;
        }

        Ok((result, extra))
    }
}

/// Apply the post-transition processors and the base status to `entity`.
///
/// A failing processor only loses its own fragment.
pub(crate) async fn apply_transition_status<E: Entity>(
    processors: &ProcessorRegistry<E>,
    mut entity: E,
    state: State,
    message: Option<String>,
    runnable: Option<&Runnable>,
    fragment: Option<Status>,
) -> E {
    let base = Status::base(state, message);
    let stage = state.stage_key();

    let mut fragments: Vec<Status> = fragment.into_iter().collect();
    for processor in processors.processors(&stage) {
        match processor.process(&entity, runnable, &base).await {
            Ok(Some(fragment)) => fragments.push(fragment),
            Ok(None) => {}
            Err(e) => warn!(
                entity = E::KIND,
                entity_id = entity.id(),
                processor = processor.name(),
                stage = %stage,
                error = %e,
                "processor failed, fragment skipped"
            ),
        }
    }

    debug!(
        entity = E::KIND,
        entity_id = entity.id(),
        stage = %stage,
        fragments = fragments.len(),
        "merging transition status"
    );
    let merged = merge_transition_status(entity.status().clone(), fragments, base);
    entity.set_status(merged);
    entity
}
