//! Core path tracing kernel.
//!
//! The bounce loop is iterative: each scattered [`Ray`] carries its own
//! attenuation, pixel and remaining depth, so no call stack grows with the
//! number of bounces.

use lumen_math::{Interval, Vec3};
use rand::RngCore;

use crate::bvh::Traversal;
use crate::{Camera, Color, Ray, SceneRef};

/// Minimum hit distance, to avoid self-intersection.
pub const HIT_EPSILON: f64 = 1e-3;

/// Number of channels per pixel in [`ImageBuffer`].
pub const CHANNELS: usize = 3;

/// Sky gradient seen by rays that escape the scene.
pub fn sky_color(direction: Vec3) -> Color {
    let unit_direction = direction.normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    white * (1.0 - a) + blue * a
}

/// Follow one path until it escapes, is absorbed, or runs out of bounces.
///
/// Returns the radiance the path contributes to its pixel.
pub fn trace_path(
    scene: &SceneRef<'_>,
    ray: Ray,
    rng: &mut dyn RngCore,
    traversal: &mut Traversal,
) -> Color {
    let mut ray = ray;
    let ray_t = Interval::new(HIT_EPSILON, f64::INFINITY);

    while ray.depth() >= 0 {
        let Some(rec) = scene.hit(&ray, ray_t, traversal) else {
            return sky_color(ray.direction()) * ray.attenuation();
        };

        match scene.material(rec.entity).scatter(&ray, &rec, rng) {
            Some(scattered) => ray = scattered,
            None => return Color::ZERO,
        }
    }

    // Bounce budget exhausted
    Color::ZERO
}

/// Average `samples_per_pixel` paths through pixel (x, y), clamped to [0, 1].
pub fn render_pixel(
    scene: &SceneRef<'_>,
    camera: &Camera,
    x: usize,
    y: usize,
    rng: &mut dyn RngCore,
    traversal: &mut Traversal,
) -> Color {
    let mut pixel_color = Color::ZERO;

    for _ in 0..camera.samples_per_pixel {
        let ray = camera.generate_ray(x, y, rng);
        pixel_color += trace_path(scene, ray, rng, traversal);
    }

    (pixel_color / camera.samples_per_pixel as f64).clamp(Color::ZERO, Color::ONE)
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear RGB triple to gamma-encoded 8-bit RGBA.
pub fn color_to_rgba(rgb: [f32; 3]) -> [u8; 4] {
    let encode = |c: f32| (255.999 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [encode(rgb[0]), encode(rgb[1]), encode(rgb[2]), 255]
}

/// Row-major, RGB-interleaved float image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: usize,
    pub height: usize,
    /// `width * height * 3` linear values
    pub data: Vec<f32>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height * CHANNELS],
        }
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * CHANNELS
    }

    pub fn get(&self, x: usize, y: usize) -> Color {
        let i = self.offset(x, y);
        Color::new(
            self.data[i] as f64,
            self.data[i + 1] as f64,
            self.data[i + 2] as f64,
        )
    }

    pub fn set(&mut self, x: usize, y: usize, color: Color) {
        let i = self.offset(x, y);
        write_pixel(&mut self.data[i..i + CHANNELS], color);
    }

    /// Gamma-encoded RGBA bytes for previews.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.width * self.height * 4);
        for rgb in self.data.chunks_exact(CHANNELS) {
            bytes.extend_from_slice(&color_to_rgba([rgb[0], rgb[1], rgb[2]]));
        }
        bytes
    }
}

/// Store a color into a 3-float slot.
#[inline]
pub(crate) fn write_pixel(slot: &mut [f32], color: Color) {
    slot[0] = color.x as f32;
    slot[1] = color.y as f32;
    slot[2] = color.z as f32;
}
