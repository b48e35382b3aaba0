//! Hit records and nearest-hit queries against the scene.

use lumen_ecs::{ComponentStore, Entity, View, World};
use lumen_math::{Interval, Vec3};

use crate::bvh::{Bvh, Traversal};
use crate::{Material, Ray, Sphere};

/// Query over entities that can be rendered.
pub type RenderView = View<(Sphere, Material)>;

/// Record of a ray-object intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Entity whose geometry was hit
    pub entity: Entity,
    /// Parameter t where the intersection occurs
    pub t: f64,
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection (always points against ray)
    pub normal: Vec3,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl HitRecord {
    /// Build a record, orienting the normal against the incoming ray.
    pub fn new(entity: Entity, t: f64, p: Vec3, outward_normal: Vec3, ray: &Ray) -> Self {
        let front_face = ray.direction().dot(outward_normal) < 0.0;
        let normal = if front_face {
            outward_normal
        } else {
            -outward_normal
        };
        Self {
            entity,
            t,
            p,
            normal,
            front_face,
        }
    }
}

/// Read-only borrow of everything the kernel needs from a prepared world.
///
/// Shared by all render workers; holds only shared references, so it is
/// `Sync` and needs no locking.
#[derive(Clone, Copy)]
pub struct SceneRef<'w> {
    spheres: &'w ComponentStore<Sphere>,
    materials: &'w ComponentStore<Material>,
    entities: &'w [Entity],
    bvh: Option<&'w Bvh>,
}

impl<'w> SceneRef<'w> {
    /// Borrow the scene through its render view.
    ///
    /// With a BVH, candidates come from the tree; otherwise every entity in
    /// the view is tested.
    ///
    /// # Panics
    /// If the view is stale for `world`.
    pub fn new(world: &'w World, view: &'w RenderView, bvh: Option<&'w Bvh>) -> Self {
        assert!(
            view.is_current(world),
            "render view is stale; refresh it before rendering"
        );
        Self {
            spheres: world.store::<Sphere>(),
            materials: world.store::<Material>(),
            entities: view.entities(),
            bvh,
        }
    }

    pub fn uses_bvh(&self) -> bool {
        self.bvh.is_some()
    }

    /// Number of renderable entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// # Panics
    /// If the entity has no material.
    #[inline]
    pub fn material(&self, entity: Entity) -> &'w Material {
        self.materials.get(entity)
    }

    /// Find the nearest hit in `ray_t`.
    pub fn hit(&self, ray: &Ray, ray_t: Interval, traversal: &mut Traversal) -> Option<HitRecord> {
        match self.bvh {
            Some(bvh) => {
                let candidates = bvh.intersect(&ray.geometry(), ray_t, traversal);
                // BVH leaves may include bounded entities without a material
                self.closest(
                    candidates
                        .iter()
                        .copied()
                        .filter(|&entity| self.materials.contains(entity)),
                    ray,
                    ray_t,
                )
            }
            None => self.closest(self.entities.iter().copied(), ray, ray_t),
        }
    }

    fn closest(
        &self,
        entities: impl Iterator<Item = Entity>,
        ray: &Ray,
        ray_t: Interval,
    ) -> Option<HitRecord> {
        let mut closest: Option<HitRecord> = None;
        let mut closest_so_far = ray_t.max;

        for entity in entities {
            let Some(sphere) = self.spheres.try_get(entity) else {
                continue;
            };
            if let Some(rec) = sphere.hit(entity, ray, Interval::new(ray_t.min, closest_so_far)) {
                closest_so_far = rec.t;
                closest = Some(rec);
            }
        }

        closest
    }
}
