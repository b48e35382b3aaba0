//! Cached joins over component stores.
//!
//! A [`View`] remembers which entities hold every component of its query.
//! It is built by walking the *first* store's dense entity list and keeping
//! the entities present in all the others, so put the smallest store first.
//!
//! Each view records the revision of every store it was built from. A store's
//! revision changes whenever an entity gains or loses that component, which
//! makes the cache stale. [`View::refresh`] rebuilds only when needed, and
//! [`View::iter`] refuses to walk a stale cache.

use std::marker::PhantomData;

use crate::entity::Entity;
use crate::storage::{Component, ComponentStore};
use crate::world::World;

/// A tuple of component types that can be joined by a [`View`].
///
/// Implemented for `(A,)`, `(A, B)` and `(A, B, C)`.
pub trait Query: 'static {
    /// Borrowed stores, fetched once per iteration.
    type Stores<'w>: Copy;
    /// Component references yielded for one entity.
    type Item<'w>;

    fn stores(world: &World) -> Self::Stores<'_>;
    fn lead_entities<'w>(stores: Self::Stores<'w>) -> &'w [Entity];
    fn matches(stores: Self::Stores<'_>, entity: Entity) -> bool;
    fn fetch<'w>(stores: Self::Stores<'w>, entity: Entity) -> Self::Item<'w>;
    fn record_revisions(world: &World, out: &mut Vec<u64>);
    fn revisions_match(world: &World, recorded: &[u64]) -> bool;
}

macro_rules! impl_query {
    ($($ty:ident),+) => {
        impl<$($ty: Component),+> Query for ($($ty,)+) {
            type Stores<'w> = ($(&'w ComponentStore<$ty>,)+);
            type Item<'w> = ($(&'w $ty,)+);

            fn stores(world: &World) -> Self::Stores<'_> {
                ($(world.store::<$ty>(),)+)
            }

            #[allow(non_snake_case, unused_variables)]
            fn lead_entities<'w>(stores: Self::Stores<'w>) -> &'w [Entity] {
                impl_query!(@lead stores; $($ty),+)
            }

            #[allow(non_snake_case)]
            fn matches(stores: Self::Stores<'_>, entity: Entity) -> bool {
                let ($($ty,)+) = stores;
                true $(&& $ty.contains(entity))+
            }

            #[allow(non_snake_case)]
            fn fetch<'w>(stores: Self::Stores<'w>, entity: Entity) -> Self::Item<'w> {
                let ($($ty,)+) = stores;
                ($($ty.get(entity),)+)
            }

            fn record_revisions(world: &World, out: &mut Vec<u64>) {
                out.clear();
                $(out.push(world.store::<$ty>().revision());)+
            }

            fn revisions_match(world: &World, recorded: &[u64]) -> bool {
                let mut recorded = recorded.iter();
                true $(&& recorded.next() == Some(&world.store::<$ty>().revision()))+
            }
        }
    };
    (@lead $stores:ident; $lead:ident $(, $rest:ident)*) => {{
        let ($lead, $($rest,)*) = $stores;
        $lead.entities()
    }};
}

impl_query!(A);
impl_query!(A, B);
impl_query!(A, B, C);

/// Cached list of entities matching query `Q`.
pub struct View<Q: Query> {
    entities: Vec<Entity>,
    revisions: Vec<u64>,
    world: Option<u64>,
    _query: PhantomData<fn() -> Q>,
}

impl<Q: Query> View<Q> {
    /// Create an unbuilt (dirty) view. Call [`View::refresh`] before iterating.
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            revisions: Vec::new(),
            world: None,
            _query: PhantomData,
        }
    }

    /// Force the next [`View::refresh`] to rebuild.
    pub fn mark_dirty(&mut self) {
        self.world = None;
    }

    /// True if the cache reflects the current memberships of `world`.
    pub fn is_current(&self, world: &World) -> bool {
        self.world == Some(world.id()) && Q::revisions_match(world, &self.revisions)
    }

    /// Rebuild the cache if it is stale. Returns true if a rebuild happened.
    pub fn refresh(&mut self, world: &World) -> bool {
        if self.is_current(world) {
            return false;
        }

        let stores = Q::stores(world);
        self.entities.clear();
        self.entities.extend(
            Q::lead_entities(stores)
                .iter()
                .copied()
                .filter(|&entity| Q::matches(stores, entity)),
        );
        Q::record_revisions(world, &mut self.revisions);
        self.world = Some(world.id());

        log::debug!(
            "rebuilt view {} ({} entities)",
            std::any::type_name::<Q>(),
            self.entities.len()
        );
        true
    }

    /// Entities from the last build, in lead-store dense order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate `(entity, components)` tuples.
    ///
    /// # Panics
    /// If the view is stale for `world`.
    pub fn iter<'w>(&'w self, world: &'w World) -> ViewIter<'w, Q> {
        assert!(
            self.is_current(world),
            "iterating stale view {}; call refresh() after changing memberships",
            std::any::type_name::<Q>()
        );
        ViewIter {
            stores: Q::stores(world),
            entities: self.entities.iter(),
        }
    }
}

impl<Q: Query> Default for View<Q> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`View::iter`].
pub struct ViewIter<'w, Q: Query> {
    stores: Q::Stores<'w>,
    entities: std::slice::Iter<'w, Entity>,
}

impl<'w, Q: Query> Iterator for ViewIter<'w, Q> {
    type Item = (Entity, Q::Item<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        let entity = *self.entities.next()?;
        Some((entity, Q::fetch(self.stores, entity)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entities.size_hint()
    }
}

impl<'w, Q: Query> ExactSizeIterator for ViewIter<'w, Q> {}
