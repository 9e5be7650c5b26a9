use super::{EntityService, StoreError, StoreResult};
use crate::models::Entity;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

/// Entity store backed by a concurrent map
pub struct InMemoryEntityService<D: Entity> {
    entities: DashMap<String, D>,
}

impl<D: Entity> InMemoryEntityService<D> {
    pub fn new() -> Self {
        Self {
            entities: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<D: Entity> Default for InMemoryEntityService<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<D: Entity> EntityService<D> for InMemoryEntityService<D> {
    async fn find(&self, id: &str) -> StoreResult<Option<D>> {
        Ok(self.entities.get(id).map(|entry| entry.value().clone()))
    }

    async fn create(&self, dto: D) -> StoreResult<D> {
        match self.entities.entry(dto.id().to_string()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate {
                kind: D::KIND,
                id: dto.id().to_string(),
            }),
            Entry::Vacant(slot) => {
                debug!(kind = D::KIND, id = dto.id(), "entity created");
                slot.insert(dto.clone());
                Ok(dto)
            }
        }
    }

    async fn update(&self, mut dto: D) -> StoreResult<D> {
        match self.entities.get_mut(dto.id()) {
            Some(mut entry) => {
                dto.touch();
                *entry = dto.clone();
                Ok(dto)
            }
            None => Err(StoreError::NotFound {
                kind: D::KIND,
                id: dto.id().to_string(),
            }),
        }
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.entities
            .remove(id)
            .map(|_| debug!(kind = D::KIND, id, "entity deleted"))
            .ok_or_else(|| StoreError::NotFound {
                kind: D::KIND,
                id: id.to_string(),
            })
    }

    async fn list(&self, project: Option<&str>) -> StoreResult<Vec<D>> {
        Ok(self
            .entities
            .iter()
            .filter(|entry| project.map_or(true, |p| entry.value().project() == p))
            .map(|entry| entry.value().clone())
            .collect())
    }
}
