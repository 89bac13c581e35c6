// ABOUTME: The uniform repository contract every storage backend implements.
// ABOUTME: Five CRUD operations plus next_id and count, all synchronous and ID-keyed.

use eventhub_core::{Entity, EntityId};

use crate::error::StoreResult;

/// Typed CRUD access to one entity kind in one persistence scope.
///
/// `add` is idempotent by ID: an entity whose ID is already stored is left
/// untouched. An unassigned entity receives one past the largest stored ID.
pub trait Repository<T: Entity>: Send {
    /// `None` when no entity has `id`.
    fn get_by_id(&self, id: EntityId) -> StoreResult<Option<T>>;

    /// Every stored entity. Order is stable for one load.
    fn get_all(&self) -> StoreResult<Vec<T>>;

    /// Persist `entity` and return the ID it is stored under.
    fn add(&self, entity: &T) -> StoreResult<EntityId>;

    /// Replace the stored entity carrying `entity`'s ID.
    fn update(&self, entity: &T) -> StoreResult<()>;

    /// Remove the entity with `id`. Absent IDs are a no-op.
    fn delete(&self, id: EntityId) -> StoreResult<()>;

    /// The ID the next unassigned `add` would receive.
    fn next_id(&self) -> StoreResult<EntityId>;

    fn count(&self) -> StoreResult<usize> {
        Ok(self.get_all()?.len())
    }
}

impl<T: Entity, R: Repository<T> + ?Sized> Repository<T> for Box<R> {
    fn get_by_id(&self, id: EntityId) -> StoreResult<Option<T>> {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> StoreResult<Vec<T>> {
        (**self).get_all()
    }

    fn add(&self, entity: &T) -> StoreResult<EntityId> {
        (**self).add(entity)
    }

    fn update(&self, entity: &T) -> StoreResult<()> {
        (**self).update(entity)
    }

    fn delete(&self, id: EntityId) -> StoreResult<()> {
        (**self).delete(id)
    }

    fn next_id(&self) -> StoreResult<EntityId> {
        (**self).next_id()
    }

    fn count(&self) -> StoreResult<usize> {
        (**self).count()
    }
}
