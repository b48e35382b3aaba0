//! World-space bounds of scene geometry.

use lumen_ecs::{View, World};
use lumen_math::{near_zero, Aabb, Vec3};

use crate::Sphere;

/// Query over entities whose bounds are derived from a sphere.
pub type BoundsView = View<(Sphere, Bounds)>;

/// Axis-aligned world bounds of an entity's geometry over the whole shutter
/// interval. Consumed by the BVH builder.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub world: Aabb,
}

impl Bounds {
    pub fn new(world: Aabb) -> Self {
        Self { world }
    }

    /// Bounds enclosing the sphere at every time in [0, 1].
    ///
    /// Motion is linear and the sphere only translates, so the union of the
    /// boxes at both ends covers every intermediate position.
    pub fn of_sphere(sphere: &Sphere) -> Self {
        let extent = Vec3::splat(sphere.radius);
        let start = Aabb::from_points(sphere.center - extent, sphere.center + extent);
        if near_zero(sphere.motion) {
            return Self::new(start);
        }
        let end = start.translate(sphere.motion);
        Self::new(Aabb::surrounding(&start, &end))
    }
}

/// Recompute [`Bounds`] for every entity that has a [`Sphere`].
///
/// Must run after any geometry change and before the BVH is rebuilt.
pub fn update_bounds(world: &mut World, view: &mut BoundsView) {
    view.refresh(world);
    for &entity in view.entities() {
        let bounds = Bounds::of_sphere(world.get::<Sphere>(entity));
        *world.get_mut::<Bounds>(entity) = bounds;
    }
    log::debug!("updated bounds for {} entities", view.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::Interval;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_static_sphere_bounds_are_exact() {
        let sphere = Sphere::new(Vec3::new(1.0, -2.0, 3.0), 0.5);
        let bounds = Bounds::of_sphere(&sphere);

        assert_eq!(bounds.world.x, Interval::new(0.5, 1.5));
        assert_eq!(bounds.world.y, Interval::new(-2.5, -1.5));
        assert_eq!(bounds.world.z, Interval::new(2.5, 3.5));
    }

    #[test]
    fn test_moving_sphere_bounds_cover_sweep() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let center = Vec3::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0));
            let motion = Vec3::new(rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0));
            let sphere = Sphere::moving(center, rng.gen_range(0.0..2.0), motion);
            let bounds = Bounds::of_sphere(&sphere);

            for step in 0..=10 {
                let t = step as f64 / 10.0;
                let c = sphere.center_at(t);
                let r = Vec3::splat(sphere.radius);
                let at_t = Aabb::from_points(c - r, c + r);
                // Allow for rounding in center + motion * t
                let slack = Vec3::splat(1e-9);
                let grown = Aabb::from_points(bounds.world.min() - slack, bounds.world.max() + slack);
                assert!(grown.encloses(&at_t), "t={t} sphere={sphere:?}");
            }
        }
    }

    #[test]
    fn test_update_bounds_writes_every_sphere() {
        let mut world = World::with_capacity(8);
        world.register::<Sphere>();
        world.register::<Bounds>();

        let still = world.create_entity().unwrap();
        world.add(still, Sphere::new(Vec3::ZERO, 1.0));
        world.add(still, Bounds::default());

        let moving = world.create_entity().unwrap();
        world.add(moving, Sphere::moving(Vec3::ZERO, 1.0, Vec3::new(0.0, 3.0, 0.0)));
        world.add(moving, Bounds::default());

        // No Bounds component: ignored
        let bare = world.create_entity().unwrap();
        world.add(bare, Sphere::new(Vec3::ONE, 1.0));

        let mut view = BoundsView::new();
        update_bounds(&mut world, &mut view);

        assert_eq!(view.len(), 2);
        assert_eq!(
            world.get::<Bounds>(still).world,
            Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))
        );
        assert_eq!(
            world.get::<Bounds>(moving).world,
            Aabb::from_points(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 4.0, 1.0))
        );
    }
}
