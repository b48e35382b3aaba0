//! The registry that owns entities and their component stores.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::entity::{Entities, Entity, DEFAULT_MAX_ENTITIES};
use crate::error::{EcsError, EcsResult};
use crate::storage::{Component, ComponentStore, ErasedStore};
use crate::view::{Query, View};

/// Maximum number of distinct component types per world.
pub const MAX_COMPONENTS: usize = 32;

static NEXT_WORLD_ID: AtomicU64 = AtomicU64::new(0);

/// Entities plus one sparse-set store per registered component type.
///
/// Stores are keyed by [`TypeId`] and held behind [`ErasedStore`]; typed
/// access downcasts back to [`ComponentStore<T>`].
pub struct World {
    id: u64,
    entities: Entities,
    stores: HashMap<TypeId, Box<dyn ErasedStore>>,
}

impl World {
    /// Create a world with [`DEFAULT_MAX_ENTITIES`] entity slots.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTITIES)
    }

    /// Create a world with a fixed number of entity slots.
    pub fn with_capacity(max_entities: usize) -> Self {
        Self {
            id: NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed),
            entities: Entities::with_capacity(max_entities),
            stores: HashMap::new(),
        }
    }

    /// Process-unique identifier, used by views to detect a foreign world.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.entities.capacity()
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.stores.contains_key(&TypeId::of::<T>())
    }

    /// Register a component type.
    pub fn try_register<T: Component>(&mut self) -> EcsResult<()> {
        if self.is_registered::<T>() {
            return Err(EcsError::AlreadyRegistered(type_name::<T>()));
        }
        if self.stores.len() >= MAX_COMPONENTS {
            return Err(EcsError::ComponentCapacity {
                max: MAX_COMPONENTS,
            });
        }
        self.stores.insert(
            TypeId::of::<T>(),
            Box::new(ComponentStore::<T>::with_capacity(self.capacity())),
        );
        log::trace!("registered component {}", type_name::<T>());
        Ok(())
    }

    /// Register a component type.
    ///
    /// # Panics
    /// If the type is already registered or the component table is full.
    pub fn register<T: Component>(&mut self) {
        if let Err(err) = self.try_register::<T>() {
            panic!("{err}");
        }
    }

    pub fn create_entity(&mut self) -> EcsResult<Entity> {
        let entity = self.entities.allocate()?;
        log::trace!("created entity {}", entity.id());
        Ok(entity)
    }

    /// Destroy an entity and drop every component it owns.
    ///
    /// # Panics
    /// If the entity is not alive.
    pub fn destroy_entity(&mut self, entity: Entity) {
        assert!(self.is_alive(entity), "destroying dead entity {entity:?}");
        for store in self.stores.values_mut() {
            store.entity_destroyed(entity);
        }
        self.entities.release(entity);
        log::trace!("destroyed entity {}", entity.id());
    }

    /// # Panics
    /// If `T` is unregistered, the entity is dead, or it already has a `T`.
    pub fn add<T: Component>(&mut self, entity: Entity, component: T) {
        assert!(self.is_alive(entity), "adding component to dead entity {entity:?}");
        self.store_mut::<T>().insert(entity, component);
    }

    /// # Panics
    /// If `T` is unregistered or the entity has no `T`.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> T {
        self.store_mut::<T>().remove(entity)
    }

    /// # Panics
    /// If `T` is unregistered or the entity has no `T`.
    pub fn get<T: Component>(&self, entity: Entity) -> &T {
        self.store::<T>().get(entity)
    }

    /// # Panics
    /// If `T` is unregistered or the entity has no `T`.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        self.store_mut::<T>().get_mut(entity)
    }

    pub fn try_get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.try_store::<T>().and_then(|store| store.try_get(entity))
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.try_store::<T>()
            .map(|store| store.contains(entity))
            .unwrap_or(false)
    }

    pub fn try_store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.stores
            .get(&TypeId::of::<T>())
            .and_then(|store| store.as_any().downcast_ref::<ComponentStore<T>>())
    }

    /// # Panics
    /// If `T` is not registered.
    pub fn store<T: Component>(&self) -> &ComponentStore<T> {
        match self.try_store::<T>() {
            Some(store) => store,
            None => panic!("component {} not registered", type_name::<T>()),
        }
    }

    /// # Panics
    /// If `T` is not registered.
    pub fn store_mut<T: Component>(&mut self) -> &mut ComponentStore<T> {
        match self
            .stores
            .get_mut(&TypeId::of::<T>())
            .and_then(|store| store.as_any_mut().downcast_mut::<ComponentStore<T>>())
        {
            Some(store) => store,
            None => panic!("component {} not registered", type_name::<T>()),
        }
    }

    /// Build a fresh view over the entities holding every component in `Q`.
    pub fn view<Q: Query>(&self) -> View<Q> {
        let mut view = View::new();
        view.refresh(self);
        view
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
