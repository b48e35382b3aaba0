//! Tile-based parallel rendering.
//!
//! Divides the image into horizontal row tiles that are rendered independently
//! and in parallel using rayon. Each tile owns a disjoint chunk of the output
//! buffer and its own RNG, seeded from the master RNG in tile order, so the
//! result does not depend on how many threads run or how tiles are scheduled.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;

use crate::bvh::Traversal;
use crate::renderer::{render_pixel, write_pixel, CHANNELS};
use crate::{Camera, ImageBuffer, RenderSettings, SceneRef};

/// Errors raised while setting up a render.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A band of full-width image rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// First row of the tile
    pub y: usize,
    /// Number of rows
    pub height: usize,
    /// Position in dispatch order
    pub index: usize,
}

impl Tile {
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.y..self.y + self.height
    }
}

/// Split `height` rows into tiles of `tile_height` rows, top to bottom.
/// The last tile may be shorter.
pub fn generate_tiles(height: usize, tile_height: usize) -> Vec<Tile> {
    let tile_height = tile_height.max(1);
    (0..height)
        .step_by(tile_height)
        .enumerate()
        .map(|(index, y)| Tile {
            y,
            height: tile_height.min(height - y),
            index,
        })
        .collect()
}

/// Summary of a finished render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStats {
    pub tiles: usize,
    pub threads: usize,
    pub elapsed: Duration,
}

/// Render one tile into its slice of the output buffer.
///
/// `out` holds exactly the tile's rows, RGB interleaved.
pub fn render_tile(
    tile: &Tile,
    scene: &SceneRef<'_>,
    camera: &Camera,
    rng: &mut dyn RngCore,
    out: &mut [f32],
) {
    debug_assert_eq!(out.len(), tile.height * camera.width * CHANNELS);

    let mut traversal = Traversal::new();
    let mut pixels = out.chunks_exact_mut(CHANNELS);
    for y in tile.rows() {
        for x in 0..camera.width {
            let color = render_pixel(scene, camera, x, y, rng, &mut traversal);
            if let Some(slot) = pixels.next() {
                write_pixel(slot, color);
            }
        }
    }
}

/// Render the whole image in parallel tiles.
///
/// Tile seeds are drawn from `rng` in tile order before any tile starts.
pub fn render_tiled(
    scene: &SceneRef<'_>,
    camera: &Camera,
    settings: &RenderSettings,
    rng: &mut dyn RngCore,
) -> Result<(ImageBuffer, RenderStats), RenderError> {
    let tiles = generate_tiles(camera.height, settings.tile_height);
    let seeds: Vec<u64> = tiles.iter().map(|_| rng.next_u64()).collect();

    let pool = match settings.threads {
        Some(threads) => Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?,
        ),
        None => None,
    };
    let threads = pool
        .as_ref()
        .map_or_else(rayon::current_num_threads, |p| p.current_num_threads());

    log::info!(
        "rendering {}x{} @ {} spp: {} tiles on {} threads ({})",
        camera.width,
        camera.height,
        camera.samples_per_pixel,
        tiles.len(),
        threads,
        if scene.uses_bvh() { "bvh" } else { "linear" }
    );

    let start = Instant::now();
    let mut image = ImageBuffer::new(camera.width, camera.height);
    let completed = AtomicUsize::new(0);
    let total = tiles.len();
    let chunk_len = settings.tile_height.max(1) * camera.width * CHANNELS;

    let work = |data: &mut [f32]| {
        data.par_chunks_mut(chunk_len)
            .zip(tiles.par_iter().zip(seeds.par_iter()))
            .for_each(|(out, (tile, &seed))| {
                let mut tile_rng = StdRng::seed_from_u64(seed);
                render_tile(tile, scene, camera, &mut tile_rng, out);

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                log::debug!("tile {}/{} done (rows {:?})", done, total, tile.rows());
            });
    };

    match &pool {
        Some(pool) => pool.install(|| work(image.data.as_mut_slice())),
        None => work(image.data.as_mut_slice()),
    }

    let stats = RenderStats {
        tiles: completed.load(Ordering::Relaxed),
        threads,
        elapsed: start.elapsed(),
    };
    log::info!(
        "render finished in {:.2}s ({} tiles)",
        stats.elapsed.as_secs_f64(),
        stats.tiles
    );

    Ok((image, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bounds, Bvh, CameraBuilder, Color, Material, RenderView, Sphere};
    use lumen_ecs::World;
    use lumen_math::Vec3;

    #[test]
    fn test_generate_tiles_cover_image() {
        let tiles = generate_tiles(10, 4);
        assert_eq!(tiles.len(), 3);
        assert_eq!(tiles[2], Tile { y: 8, height: 2, index: 2 });

        let rows: usize = tiles.iter().map(|t| t.height).sum();
        assert_eq!(rows, 10);

        let single_rows = generate_tiles(5, 1);
        assert_eq!(single_rows.len(), 5);
        assert!(single_rows.iter().enumerate().all(|(i, t)| t.y == i && t.height == 1));
    }

    #[test]
    fn test_zero_tile_height_treated_as_one() {
        assert_eq!(generate_tiles(3, 0).len(), 3);
    }

    fn small_scene() -> World {
        let mut world = World::with_capacity(16);
        world.register::<Sphere>();
        world.register::<Material>();
        world.register::<Bounds>();

        let spheres = [
            (Sphere::new(Vec3::new(0.0, -100.5, -1.0), 100.0), Material::lambertian(Color::splat(0.5))),
            (Sphere::new(Vec3::new(0.0, 0.0, -1.2), 0.5), Material::lambertian(Color::new(0.1, 0.2, 0.5))),
            (Sphere::new(Vec3::new(-1.0, 0.0, -1.0), 0.5), Material::dielectric(1.5)),
            (Sphere::new(Vec3::new(1.0, 0.0, -1.0), 0.5), Material::metal(Color::new(0.8, 0.6, 0.2), 0.3)),
            (
                Sphere::moving(Vec3::new(0.3, 0.6, -1.5), 0.2, Vec3::new(0.0, 0.2, 0.0)),
                Material::new(Color::splat(0.7), 0.5, 0.3, 0.1, 1.3),
            ),
        ];
        for (sphere, material) in spheres {
            let e = world.create_entity().unwrap();
            world.add(e, Bounds::of_sphere(&sphere));
            world.add(e, sphere);
            world.add(e, material);
        }
        world
    }

    fn camera() -> Camera {
        CameraBuilder::new()
            .with_resolution(16, 9)
            .with_quality(4, 6)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .build()
    }

    fn render(world: &World, bvh: Option<&Bvh>, settings: &RenderSettings) -> ImageBuffer {
        let view: RenderView = world.view();
        let scene = SceneRef::new(world, &view, bvh);
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let (image, stats) = render_tiled(&scene, &camera(), settings, &mut rng).unwrap();
        assert_eq!(stats.tiles, generate_tiles(9, settings.tile_height).len());
        image
    }

    #[test]
    fn test_same_image_across_thread_counts() {
        let world = small_scene();
        let settings = RenderSettings::default().with_tile_height(2);

        let one = render(&world, None, &settings.clone().with_threads(1));
        let four = render(&world, None, &settings.clone().with_threads(4));
        let global = render(&world, None, &settings);

        assert_eq!(one, four);
        assert_eq!(one, global);
    }

    #[test]
    fn test_bvh_matches_linear_scan() {
        let world = small_scene();
        let view = world.view::<(Bounds,)>();
        let bvh = Bvh::build(&world, &view, &mut StdRng::seed_from_u64(8));

        let settings = RenderSettings::default();
        let linear = render(&world, None, &settings);
        let accelerated = render(&world, Some(&bvh), &settings);

        // Candidate order differs, so ties may resolve differently; allow rounding
        for (a, b) in linear.data.iter().zip(&accelerated.data) {
            assert!((a - b).abs() < 1e-5, "{a} vs {b}");
        }
    }

    #[test]
    fn test_output_in_unit_range() {
        let world = small_scene();
        let image = render(&world, None, &RenderSettings::default().with_tile_height(4));

        assert_eq!(image.data.len(), 16 * 9 * 3);
        assert!(image.data.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(image.data.iter().any(|&v| v > 0.0));
    }

    #[test]
    fn test_different_seeds_differ() {
        let world = small_scene();
        let a = render(&world, None, &RenderSettings::default().with_seed(1));
        let b = render(&world, None, &RenderSettings::default().with_seed(2));
        assert_ne!(a, b);
    }
}
