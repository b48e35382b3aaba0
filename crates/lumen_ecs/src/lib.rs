//! Sparse-set entity/component store for lumen scenes.
//!
//! - [`World`] hands out [`Entity`] handles and owns one [`ComponentStore`]
//!   per registered component type.
//! - [`View`] caches the entities that hold a fixed set of components and
//!   rebuilds itself when store memberships change.
//!
//! # Example
//!
//! ```
//! use lumen_ecs::World;
//!
//! struct Radius(f64);
//! struct Tag;
//!
//! let mut world = World::new();
//! world.register::<Radius>();
//! world.register::<Tag>();
//!
//! let e = world.create_entity()?;
//! world.add(e, Radius(2.0));
//! world.add(e, Tag);
//!
//! let view = world.view::<(Radius, Tag)>();
//! for (entity, (radius, _)) in view.iter(&world) {
//!     assert_eq!(entity, e);
//!     assert_eq!(radius.0, 2.0);
//! }
//! # Ok::<(), lumen_ecs::EcsError>(())
//! ```

pub mod entity;
pub mod error;
pub mod storage;
pub mod view;
pub mod world;

pub use entity::{Entity, EntityId, DEFAULT_MAX_ENTITIES};
pub use error::{EcsError, EcsResult};
pub use storage::{Component, ComponentStore, ErasedStore, ABSENT};
pub use view::{Query, View, ViewIter};
pub use world::{World, MAX_COMPONENTS};
