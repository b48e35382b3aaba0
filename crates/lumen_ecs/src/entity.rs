//! Entity handles and the free-list allocator that hands them out.

use std::collections::VecDeque;

use crate::error::{EcsError, EcsResult};

/// Raw integer behind an [`Entity`].
pub type EntityId = u32;

/// Default number of entity slots in a world.
pub const DEFAULT_MAX_ENTITIES: usize = 5000;

/// Opaque handle identifying a logical object. Carries no data of its own.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Entity(EntityId);

impl Entity {
    /// Wrap a raw id. Only meaningful for ids handed out by the same world.
    #[inline]
    pub const fn from_raw(id: EntityId) -> Self {
        Entity(id)
    }

    #[inline]
    pub const fn id(self) -> EntityId {
        self.0
    }

    /// Slot in the sparse arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// FIFO free-list of entity ids with a fixed capacity.
///
/// Released ids go to the back of the queue so a freshly destroyed id is the
/// last one to be reused.
#[derive(Debug)]
pub(crate) struct Entities {
    available: VecDeque<EntityId>,
    alive: Vec<bool>,
}

impl Entities {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity <= EntityId::MAX as usize,
            "entity capacity {capacity} does not fit in an EntityId"
        );
        Self {
            available: (0..capacity as EntityId).collect(),
            alive: vec![false; capacity],
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.alive.len()
    }

    pub(crate) fn alive_count(&self) -> usize {
        self.capacity() - self.available.len()
    }

    pub(crate) fn is_alive(&self, entity: Entity) -> bool {
        self.alive.get(entity.index()).copied().unwrap_or(false)
    }

    pub(crate) fn allocate(&mut self) -> EcsResult<Entity> {
        let id = self.available.pop_front().ok_or(EcsError::EntityCapacity {
            capacity: self.capacity(),
        })?;
        self.alive[id as usize] = true;
        Ok(Entity(id))
    }

    pub(crate) fn release(&mut self, entity: Entity) {
        assert!(
            entity.index() < self.capacity(),
            "entity {entity:?} out of range (capacity {})",
            self.capacity()
        );
        assert!(self.alive[entity.index()], "entity {entity:?} destroyed twice");
        self.alive[entity.index()] = false;
        self.available.push_back(entity.0);
    }
}
