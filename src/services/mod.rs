//! # Entity Services
//!
//! Store-of-record contract consumed by the lifecycle managers and listeners.
//!
//! ## Overview
//!
//! The core never holds a long-lived copy of an entity: every transition and
//! every listener re-reads the persisted entity through an [`EntityService`]
//! first. Persistence itself is an external concern; [`InMemoryEntityService`]
//! is a reference implementation used by tests and embedded deployments.
//!
//! `update` is only ever called by the lifecycle manager while it holds the
//! entity's lock.

pub mod memory;

pub use memory::InMemoryEntityService;

use crate::models::{Entity, Run, Task, Trigger};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} already exists: {id}")]
    Duplicate { kind: &'static str, id: String },

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Generic persisted-entity CRUD
#[async_trait]
pub trait EntityService<D: Entity>: Send + Sync {
    /// Fetch by id, failing with `NotFound` when absent
    async fn get(&self, id: &str) -> StoreResult<D> {
        self.find(id).await?.ok_or_else(|| StoreError::NotFound {
            kind: D::KIND,
            id: id.to_string(),
        })
    }

    async fn find(&self, id: &str) -> StoreResult<Option<D>>;

    async fn create(&self, dto: D) -> StoreResult<D>;

    async fn update(&self, dto: D) -> StoreResult<D>;

    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Entities whose `project` matches, or every entity when `None`
    async fn list(&self, project: Option<&str>) -> StoreResult<Vec<D>>;
}

pub type RunService = Arc<dyn EntityService<Run>>;
pub type TriggerService = Arc<dyn EntityService<Trigger>>;
pub type TaskService = Arc<dyn EntityService<Task>>;
