//! Source-of-truth repository abstraction.
//!
//! The cache only needs one read operation from the primary store:
//! [`EntityRepository::fetch_all`], returning the full ordered collection.
//! Writes belong to the persistence layer; a layer that wants its writes to
//! invalidate the cache owns a [`LifecycleHub`] and notifies it after each
//! commit. [`InMemoryRepository`] does exactly that and doubles as the test
//! fixture for everything cache-related.

use crate::entity::Entity;
use crate::error::Result;
use crate::lifecycle::{LifecycleEvent, LifecycleHub, LifecycleListener};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Trait for the primary store holding the entity collection.
///
/// # Errors
///
/// Return `Err` (typically `Error::RepositoryError`) for connectivity
/// problems, timeouts or query failures. The collection accessor propagates
/// these unchanged; it never serves stale data in their place.
pub trait EntityRepository<T: Entity>: Send + Sync {
    /// Fetch the complete collection, in the store's order.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<T>>> + Send;
}

/// In-memory repository that announces its writes.
///
/// Entities keep insertion order; saving an existing id replaces it in place.
/// Each write commits first and then awaits every registered listener before
/// returning.
///
/// # Example
///
/// ```ignore
/// let mut repo = InMemoryRepository::new();
/// repo.subscribe(Arc::new(InvalidationListener::new(backend.clone(), config)));
///
/// repo.save(Property::new(1, "Loft", "Top floor", 1800.0, "Lisbon")).await?;
/// // collection key is already gone here
/// ```
pub struct InMemoryRepository<T: Entity> {
    data: RwLock<Vec<T>>,
    hub: LifecycleHub<T>,
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        InMemoryRepository {
            data: RwLock::new(Vec::new()),
            hub: LifecycleHub::new(),
        }
    }

    /// Repository pre-filled with fixtures. No events are emitted.
    pub fn with_entities(entities: Vec<T>) -> Self {
        InMemoryRepository {
            data: RwLock::new(entities),
            hub: LifecycleHub::new(),
        }
    }

    /// Register a post-commit listener.
    pub fn subscribe(&mut self, listener: Arc<dyn LifecycleListener<T>>) {
        self.hub.subscribe(listener);
    }

    /// Insert or replace an entity, then notify listeners.
    ///
    /// Returns `true` when the entity was newly created.
    ///
    /// # Errors
    /// Never fails for the in-memory store; the signature matches real stores.
    pub async fn save(&self, entity: T) -> Result<bool> {
        let id = entity.entity_id();
        let created = {
            let mut data = self.data.write().await;
            match data.iter().position(|e| e.entity_id() == id) {
                Some(index) => {
                    data[index] = entity;
                    false
                }
                None => {
                    data.push(entity);
                    true
                }
            }
        };

        let event = if created {
            LifecycleEvent::Created { id }
        } else {
            LifecycleEvent::Updated { id }
        };
        debug!("{} {} committed", T::entity_name(), event);
        self.hub.notify(&event).await;
        Ok(created)
    }

    /// Remove an entity by id, then notify listeners if it existed.
    ///
    /// # Errors
    /// Never fails for the in-memory store; the signature matches real stores.
    pub async fn delete(&self, id: &T::Id) -> Result<bool> {
        let removed = {
            let mut data = self.data.write().await;
            let before = data.len();
            data.retain(|e| e.entity_id() != *id);
            data.len() != before
        };

        if removed {
            let event = LifecycleEvent::Deleted { id: id.clone() };
            debug!("{} {} committed", T::entity_name(), event);
            self.hub.notify(&event).await;
        }
        Ok(removed)
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> EntityRepository<T> for InMemoryRepository<T> {
    async fn fetch_all(&self) -> Result<Vec<T>> {
        Ok(self.data.read().await.clone())
    }
}

impl<T: Entity, R: EntityRepository<T>> EntityRepository<T> for Arc<R> {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<T>>> + Send {
        (**self).fetch_all()
    }
}
