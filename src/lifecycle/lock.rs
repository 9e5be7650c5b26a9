//! Process-wide map of per-entity locks.
//!
//! Entries are created on first use and never evicted; `last_used` is kept so
//! an idle-eviction policy can be added without changing callers. Locks are
//! not reentrant: a task holding an entity's lock must not call `exec` for the
//! same entity again.

use crate::error::{Result, RunplaneError};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{trace, warn};

pub struct EntityLock {
    mutex: Arc<AsyncMutex<()>>,
    last_used: Mutex<DateTime<Utc>>,
}

impl EntityLock {
    fn new() -> Self {
        Self {
            mutex: Arc::new(AsyncMutex::new(())),
            last_used: Mutex::new(Utc::now()),
        }
    }

    fn touch(&self) {
        *self.last_used.lock() = Utc::now();
    }

    pub fn last_used(&self) -> DateTime<Utc> {
        *self.last_used.lock()
    }
}

/// Held for the duration of one entity mutation; released on drop
#[derive(Debug)]
pub struct EntityLockGuard {
    entity_id: String,
    _guard: OwnedMutexGuard<()>,
}

impl EntityLockGuard {
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }
}

impl Drop for EntityLockGuard {
    fn drop(&mut self) {
        trace!(entity_id = %self.entity_id, "entity lock released");
    }
}

#[derive(Default)]
pub struct EntityLocks {
    locks: DashMap<String, Arc<EntityLock>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait up to `timeout` for the lock of `entity_id`
    pub async fn acquire(&self, entity_id: &str, timeout: Duration) -> Result<EntityLockGuard> {
        let lock = Arc::clone(
            self.locks
                .entry(entity_id.to_string())
                .or_insert_with(|| Arc::new(EntityLock::new()))
                .value(),
        );
        lock.touch();

        match tokio::time::timeout(timeout, Arc::clone(&lock.mutex).lock_owned()).await {
            Ok(guard) => {
                trace!(entity_id, "entity lock acquired");
                Ok(EntityLockGuard {
                    entity_id: entity_id.to_string(),
                    _guard: guard,
                })
            }
            Err(_) => {
                warn!(entity_id, timeout_ms = timeout.as_millis() as u64, "entity lock timeout");
                Err(RunplaneError::system(format!(
                    "unable to acquire lock for {entity_id} within {}ms",
                    timeout.as_millis()
                )))
            }
        }
    }

    pub fn last_used(&self, entity_id: &str) -> Option<DateTime<Utc>> {
        self.locks.get(entity_id).map(|lock| lock.last_used())
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
