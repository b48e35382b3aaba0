//! Renders the classic "many spheres" scene and saves it as Radiance HDR.
//!
//! Usage: `cargo run --release --example spheres -- [output.hdr] [settings.json]`

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use image::codecs::hdr::HdrEncoder;
use image::Rgb;
use lumen_renderer::random::{gen_f64, gen_range_f64};
use lumen_renderer::{CameraBuilder, Color, ImageBuffer, Material, RenderSettings, Scene, Sphere, Vec3};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = std::env::args().skip(1);
    let output = PathBuf::from(args.next().unwrap_or_else(|| "spheres.hdr".to_string()));
    let settings: RenderSettings = match args.next() {
        Some(path) => {
            let file = File::open(&path).with_context(|| format!("opening settings {path}"))?;
            serde_json::from_reader(file).with_context(|| format!("parsing settings {path}"))?
        }
        None => RenderSettings::default(),
    };
    log::info!("settings: {settings:?}");

    let mut scene = Scene::new();
    let mut rng = StdRng::seed_from_u64(settings.seed);
    build_scene(&mut scene, &mut rng)?;
    log::info!("scene has {} spheres", scene.len());

    let camera = CameraBuilder::new()
        .with_aspect(1200, 16.0 / 9.0)
        .with_quality(100, 50)
        .with_position(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y)
        .with_lens(20.0, 0.6, 10.0)
        .build();

    let (image, stats) = scene.render(&camera, &settings)?;
    log::info!(
        "rendered {} tiles on {} threads in {:?}",
        stats.tiles,
        stats.threads,
        stats.elapsed
    );

    save_hdr(&image, &output)?;
    log::info!("saved {}", output.display());
    Ok(())
}

fn build_scene(scene: &mut Scene, rng: &mut dyn RngCore) -> anyhow::Result<()> {
    // Ground
    scene.add_sphere(
        Sphere::new(Vec3::new(0.0, -1000.0, 0.0), 1000.0),
        Material::lambertian(Color::splat(0.5)),
    )?;

    // Three main spheres
    scene.add_sphere(Sphere::new(Vec3::new(0.0, 1.0, 0.0), 1.0), Material::dielectric(1.5))?;
    scene.add_sphere(
        Sphere::new(Vec3::new(-4.0, 1.0, 0.0), 1.0),
        Material::lambertian(Color::new(0.4, 0.2, 0.1)),
    )?;
    scene.add_sphere(
        Sphere::new(Vec3::new(4.0, 1.0, 0.0), 1.0),
        Material::metal(Color::new(0.7, 0.6, 0.5), 0.0),
    )?;

    // Small random spheres
    for a in -11..11 {
        for b in -11..11 {
            let choose_mat = gen_f64(rng);
            let center = Vec3::new(
                a as f64 + 0.9 * gen_f64(rng),
                0.2,
                b as f64 + 0.9 * gen_f64(rng),
            );

            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            if choose_mat < 0.8 {
                // Diffuse, bouncing upwards during the exposure
                let albedo = random_color(rng) * random_color(rng);
                let motion = Vec3::new(0.0, gen_range_f64(rng, 0.0, 0.5), 0.0);
                scene.add_sphere(Sphere::moving(center, 0.2, motion), Material::lambertian(albedo))?;
            } else if choose_mat < 0.95 {
                let albedo = random_color(rng);
                let fuzz = gen_range_f64(rng, 0.0, 0.5);
                scene.add_sphere(Sphere::new(center, 0.2), Material::metal(albedo, fuzz))?;
            } else {
                scene.add_sphere(Sphere::new(center, 0.2), Material::dielectric(1.5))?;
            }
        }
    }

    Ok(())
}

fn random_color(rng: &mut dyn RngCore) -> Color {
    Color::new(gen_f64(rng), gen_f64(rng), gen_f64(rng))
}

fn save_hdr(image: &ImageBuffer, path: &Path) -> anyhow::Result<()> {
    let pixels: Vec<Rgb<f32>> = image
        .data
        .chunks_exact(3)
        .map(|px| Rgb([px[0], px[1], px[2]]))
        .collect();

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    HdrEncoder::new(BufWriter::new(file))
        .encode(&pixels, image.width, image.height)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
