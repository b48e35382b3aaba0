//! Scene: a world of renderable spheres plus its cached views and BVH.

use lumen_ecs::{EcsResult, Entity, World, DEFAULT_MAX_ENTITIES};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::{
    render_tiled, update_bounds, Bounds, BoundsView, Bvh, BvhView, Camera, ImageBuffer, Material,
    RenderError, RenderSettings, RenderStats, RenderView, SceneRef, Sphere,
};

/// Owns a [`World`] with the sphere, material and bounds stores registered,
/// and the views and acceleration structure derived from it.
pub struct Scene {
    world: World,
    render_view: RenderView,
    bounds_view: BoundsView,
    bvh_view: BvhView,
    bvh: Option<Bvh>,
}

impl Scene {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTITIES)
    }

    pub fn with_capacity(max_entities: usize) -> Self {
        let mut world = World::with_capacity(max_entities);
        world.register::<Sphere>();
        world.register::<Material>();
        world.register::<Bounds>();
        Self {
            world,
            render_view: RenderView::new(),
            bounds_view: BoundsView::new(),
            bvh_view: BvhView::new(),
            bvh: None,
        }
    }

    /// Add a renderable sphere.
    pub fn add_sphere(&mut self, sphere: Sphere, material: Material) -> EcsResult<Entity> {
        let entity = self.world.create_entity()?;
        self.world.add(entity, sphere);
        self.world.add(entity, material);
        self.world.add(entity, Bounds::default());
        self.bvh = None;
        Ok(entity)
    }

    pub fn destroy(&mut self, entity: Entity) {
        self.world.destroy_entity(entity);
        self.bvh = None;
    }

    pub fn len(&self) -> usize {
        self.world.store::<Sphere>().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world. Drops the BVH, since geometry may change.
    pub fn world_mut(&mut self) -> &mut World {
        self.bvh = None;
        &mut self.world
    }

    pub fn bvh(&self) -> Option<&Bvh> {
        self.bvh.as_ref()
    }

    /// Recompute bounds and refresh views, then rebuild the BVH if requested.
    ///
    /// Randomness for BVH split axes is taken from `rng`. An empty scene gets
    /// no BVH.
    pub fn prepare(&mut self, rng: &mut dyn RngCore, use_bvh: bool) {
        update_bounds(&mut self.world, &mut self.bounds_view);
        self.render_view.refresh(&self.world);
        self.bvh_view.refresh(&self.world);

        self.bvh = if use_bvh && !self.bvh_view.is_empty() {
            Some(Bvh::build(&self.world, &self.bvh_view, rng))
        } else {
            None
        };
    }

    /// Borrow the prepared scene for rendering.
    ///
    /// # Panics
    /// If the scene changed since the last [`Scene::prepare`].
    pub fn scene_ref(&self) -> SceneRef<'_> {
        SceneRef::new(&self.world, &self.render_view, self.bvh.as_ref())
    }

    /// Prepare and render with a master RNG seeded from `settings.seed`.
    ///
    /// The master stream first feeds the BVH build, then the tile seeds.
    pub fn render(
        &mut self,
        camera: &Camera,
        settings: &RenderSettings,
    ) -> Result<(ImageBuffer, RenderStats), RenderError> {
        let mut rng = StdRng::seed_from_u64(settings.seed);
        self.prepare(&mut rng, settings.use_bvh);
        render_tiled(&self.scene_ref(), camera, settings, &mut rng)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CameraBuilder, Color, Ray, Traversal, HIT_EPSILON};
    use lumen_math::{Aabb, Interval, Vec3};
    use rand::Rng;

    fn camera() -> Camera {
        CameraBuilder::new()
            .with_resolution(12, 8)
            .with_quality(3, 5)
            .with_position(Vec3::new(0.0, 1.0, 4.0), Vec3::ZERO, Vec3::Y)
            .build()
    }

    #[test]
    fn test_prepare_fills_bounds_and_bvh() {
        let mut scene = Scene::with_capacity(8);
        let a = scene
            .add_sphere(Sphere::new(Vec3::ZERO, 1.0), Material::default())
            .unwrap();
        scene
            .add_sphere(
                Sphere::moving(Vec3::new(3.0, 0.0, 0.0), 0.5, Vec3::Y),
                Material::metal(Color::ONE, 0.1),
            )
            .unwrap();

        scene.prepare(&mut StdRng::seed_from_u64(0), true);

        assert_eq!(
            scene.world().get::<Bounds>(a).world,
            Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))
        );
        let bvh = scene.bvh().expect("bvh requested");
        assert_eq!(bvh.leaf_count(), 2);
        assert_eq!(
            *bvh.root_bounds(),
            Aabb::from_points(Vec3::splat(-1.0), Vec3::new(3.5, 1.5, 1.0))
        );
    }

    #[test]
    fn test_empty_scene_renders_sky() {
        let mut scene = Scene::new();
        assert!(scene.is_empty());

        let (image, _) = scene.render(&camera(), &RenderSettings::default()).unwrap();
        assert!(scene.bvh().is_none());
        // Every pixel sees sky, which is never black
        assert!(image.data.chunks_exact(3).all(|px| px[2] > 0.9));
    }

    #[test]
    fn test_render_is_reproducible() {
        let build = || {
            let mut scene = Scene::with_capacity(16);
            scene
                .add_sphere(Sphere::new(Vec3::new(0.0, -100.5, 0.0), 100.0), Material::default())
                .unwrap();
            scene
                .add_sphere(Sphere::new(Vec3::ZERO, 0.5), Material::dielectric(1.5))
                .unwrap();
            scene
        };
        let settings = RenderSettings::default().with_tile_height(3);

        let (a, _) = build().render(&camera(), &settings).unwrap();
        let (b, _) = build().render(&camera(), &settings.clone().with_threads(2)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_linear_scan_matches_bvh_hits() {
        let mut scene = Scene::with_capacity(16);
        scene
            .add_sphere(Sphere::new(Vec3::new(0.0, -100.5, 0.0), 100.0), Material::default())
            .unwrap();
        scene
            .add_sphere(Sphere::new(Vec3::ZERO, 0.5), Material::metal(Color::splat(0.8), 0.2))
            .unwrap();
        scene
            .add_sphere(Sphere::new(Vec3::new(1.0, 0.0, -1.0), 0.5), Material::dielectric(1.5))
            .unwrap();

        let settings = RenderSettings::default().with_bvh(false);
        let (image, _) = scene.render(&camera(), &settings).unwrap();
        assert!(scene.bvh().is_none());
        assert_eq!(scene.render(&camera(), &settings).unwrap().0, image);

        let hits = |scene: &Scene| {
            let mut rng = StdRng::seed_from_u64(8);
            let mut traversal = Traversal::new();
            let scene_ref = scene.scene_ref();
            (0..500)
                .map(|_| {
                    let direction = Vec3::new(
                        rng.gen_range(-1.0..1.0),
                        rng.gen_range(-1.0..0.5),
                        rng.gen_range(-1.0..1.0),
                    );
                    let ray = Ray::new(Vec3::new(0.0, 1.0, 4.0), direction, 0, 1, 0.0);
                    scene_ref
                        .hit(&ray, Interval::new(HIT_EPSILON, f64::INFINITY), &mut traversal)
                        .map(|rec| (rec.entity, rec.t))
                })
                .collect::<Vec<_>>()
        };
        let linear = hits(&scene);
        assert!(linear.iter().any(Option::is_some));

        scene.prepare(&mut StdRng::seed_from_u64(0), true);
        assert!(scene.bvh().is_some());
        assert_eq!(hits(&scene), linear);
    }

    #[test]
    #[should_panic(expected = "stale")]
    fn test_scene_ref_requires_prepare() {
        let mut scene = Scene::with_capacity(4);
        scene.prepare(&mut StdRng::seed_from_u64(0), true);
        scene
            .add_sphere(Sphere::new(Vec3::ZERO, 1.0), Material::default())
            .unwrap();
        let _ = scene.scene_ref();
    }

    #[test]
    fn test_destroyed_sphere_leaves_render() {
        let mut scene = Scene::with_capacity(4);
        let a = scene
            .add_sphere(Sphere::new(Vec3::ZERO, 1.0), Material::default())
            .unwrap();
        scene
            .add_sphere(Sphere::new(Vec3::X, 1.0), Material::default())
            .unwrap();
        scene.destroy(a);
        scene.prepare(&mut StdRng::seed_from_u64(0), true);

        assert_eq!(scene.len(), 1);
        assert_eq!(scene.scene_ref().len(), 1);
        assert_eq!(scene.bvh().map(Bvh::leaf_count), Some(1));
    }
}
