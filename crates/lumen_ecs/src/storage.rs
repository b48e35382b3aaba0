//! Sparse-set component storage.
//!
//! Every component type gets its own [`ComponentStore`]:
//!
//! - `dense`    → components packed contiguously (fast iteration)
//! - `entities` → owning entity for each dense slot
//! - `sparse`   → entity index → dense slot, or [`ABSENT`]
//!
//! Invariant: `sparse[entities[i]] == i` for every `i < len()`.

use std::any::Any;

use crate::entity::Entity;

/// Sentinel marking "no component" in the sparse array.
pub const ABSENT: u32 = u32::MAX;

/// Marker for types that can be stored as components.
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Typed sparse-set storage for one component type.
pub struct ComponentStore<T> {
    dense: Vec<T>,
    entities: Vec<Entity>,
    sparse: Vec<u32>,
    /// Bumped on every membership change so cached views can detect staleness.
    revision: u64,
}

impl<T: Component> ComponentStore<T> {
    /// Create a store able to hold components for `capacity` entity slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            dense: Vec::new(),
            entities: Vec::new(),
            sparse: vec![ABSENT; capacity],
            revision: 0,
        }
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Dense slot currently holding `entity`'s component.
    #[inline]
    pub fn dense_index(&self, entity: Entity) -> Option<usize> {
        match self.sparse.get(entity.index()) {
            Some(&slot) if slot != ABSENT => Some(slot as usize),
            _ => None,
        }
    }

    /// Attach `value` to `entity`.
    ///
    /// # Panics
    /// If the entity already has this component or lies outside the store.
    pub fn insert(&mut self, entity: Entity, value: T) {
        assert!(
            entity.index() < self.sparse.len(),
            "entity {entity:?} out of range for {} store",
            std::any::type_name::<T>()
        );
        assert!(
            !self.contains(entity),
            "component {} added to entity {entity:?} more than once",
            std::any::type_name::<T>()
        );

        self.sparse[entity.index()] = self.dense.len() as u32;
        self.dense.push(value);
        self.entities.push(entity);
        self.revision += 1;
    }

    /// Detach and return `entity`'s component.
    ///
    /// Swap-remove: the last dense slot moves into the hole, so the entity
    /// that owned it changes dense position.
    ///
    /// # Panics
    /// If the entity does not have this component.
    pub fn remove(&mut self, entity: Entity) -> T {
        let Some(index) = self.dense_index(entity) else {
            panic!(
                "removing non-existent component {} from entity {entity:?}",
                std::any::type_name::<T>()
            );
        };

        let value = self.dense.swap_remove(index);
        self.entities.swap_remove(index);
        if let Some(&moved) = self.entities.get(index) {
            self.sparse[moved.index()] = index as u32;
        }
        self.sparse[entity.index()] = ABSENT;
        self.revision += 1;
        value
    }

    /// # Panics
    /// If the entity does not have this component.
    #[inline]
    pub fn get(&self, entity: Entity) -> &T {
        match self.try_get(entity) {
            Some(value) => value,
            None => panic!(
                "component {} not found for entity {entity:?}",
                std::any::type_name::<T>()
            ),
        }
    }

    /// # Panics
    /// If the entity does not have this component.
    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> &mut T {
        match self.dense_index(entity) {
            Some(index) => &mut self.dense[index],
            None => panic!(
                "component {} not found for entity {entity:?}",
                std::any::type_name::<T>()
            ),
        }
    }

    #[inline]
    pub fn try_get(&self, entity: Entity) -> Option<&T> {
        self.dense_index(entity).map(|index| &self.dense[index])
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Owning entities in dense order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Components in dense order.
    pub fn components(&self) -> &[T] {
        &self.dense
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Iterate over `(entity, &component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }
}

/// Type-erased view of a [`ComponentStore`], used by the registry.
pub trait ErasedStore: Any + Send + Sync {
    fn type_name(&self) -> &'static str;
    fn len(&self) -> usize;
    fn contains(&self, entity: Entity) -> bool;
    fn revision(&self) -> u64;
    /// Drop the entity's component if it has one.
    fn entity_destroyed(&mut self, entity: Entity);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStore for ComponentStore<T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn len(&self) -> usize {
        self.dense.len()
    }

    fn contains(&self, entity: Entity) -> bool {
        ComponentStore::contains(self, entity)
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn entity_destroyed(&mut self, entity: Entity) {
        if ComponentStore::contains(self, entity) {
            self.remove(entity);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
