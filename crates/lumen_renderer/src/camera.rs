//! Camera for ray generation.

use lumen_math::Vec3;
use rand::RngCore;

use crate::random::{gen_f64, random_in_unit_disk};
use crate::Ray;

/// Resolved pinhole/thin-lens camera.
///
/// All derived quantities are precomputed; use [`CameraBuilder`] to construct
/// one from look-at parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub width: usize,
    pub height: usize,
    pub samples_per_pixel: u32,
    /// Bounce budget of every primary ray
    pub max_depth: u32,
    pub center: Vec3,
    /// Location of the upper left pixel center
    pub pixel00_loc: Vec3,
    /// Offset to the pixel to the right
    pub pixel_delta_u: Vec3,
    /// Offset to the pixel below
    pub pixel_delta_v: Vec3,
    pub u: Vec3,
    pub v: Vec3,
    pub w: Vec3,
    /// Variation angle of rays through each pixel, in degrees
    pub defocus_angle: f64,
    pub defocus_disk_u: Vec3,
    pub defocus_disk_v: Vec3,
}

impl Camera {
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Generate a primary ray through pixel (x, y) with a jittered sub-pixel
    /// offset, sampling the defocus disk when the lens has an aperture.
    ///
    /// The direction is normalized and the ray time is uniform in [0, 1).
    pub fn generate_ray(&self, x: usize, y: usize, rng: &mut dyn RngCore) -> Ray {
        debug_assert!(x < self.width && y < self.height);

        let offset_x = gen_f64(rng) - 0.5;
        let offset_y = gen_f64(rng) - 0.5;
        let pixel_sample = self.pixel00_loc
            + (x as f64 + offset_x) * self.pixel_delta_u
            + (y as f64 + offset_y) * self.pixel_delta_v;

        let origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };

        let direction = (pixel_sample - origin).normalize();
        let time = gen_f64(rng);

        Ray::new(
            origin,
            direction,
            y * self.width + x,
            self.max_depth as i32,
            time,
        )
    }

    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }
}

/// Builder deriving a [`Camera`] from image and look-at settings.
#[derive(Debug, Clone)]
pub struct CameraBuilder {
    width: usize,
    height: usize,
    samples_per_pixel: u32,
    max_depth: u32,

    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    vfov: f64,          // Vertical field of view in degrees
    defocus_angle: f64, // Variation angle of rays through each pixel
    focus_dist: f64,    // Distance from camera to plane of perfect focus
}

impl CameraBuilder {
    pub fn new() -> Self {
        Self {
            width: 800,
            height: 450,
            samples_per_pixel: 100,
            max_depth: 100,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: 1.0,
        }
    }

    /// Set image resolution. Zero dimensions are raised to one pixel.
    pub fn with_resolution(mut self, width: usize, height: usize) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    /// Set width and derive height from an aspect ratio.
    pub fn with_aspect(self, width: usize, aspect_ratio: f64) -> Self {
        let height = (width as f64 / aspect_ratio) as usize;
        self.with_resolution(width, height)
    }

    /// Set quality settings.
    pub fn with_quality(mut self, samples: u32, max_depth: u32) -> Self {
        self.samples_per_pixel = samples.max(1);
        self.max_depth = max_depth;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f64, defocus_angle: f64, focus_dist: f64) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self
    }

    pub fn build(&self) -> Camera {
        let center = self.look_from;

        // Viewport dimensions
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width = viewport_height * (self.width as f64 / self.height as f64);

        // Basis vectors
        let w = (self.look_from - self.look_at).normalize();
        let u = self.vup.cross(w).normalize();
        let v = w.cross(u);

        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        let pixel_delta_u = viewport_u / self.width as f64;
        let pixel_delta_v = viewport_v / self.height as f64;

        let viewport_upper_left = center - self.focus_dist * w - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00_loc = viewport_upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        let defocus_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();

        Camera {
            width: self.width,
            height: self.height,
            samples_per_pixel: self.samples_per_pixel,
            max_depth: self.max_depth,
            center,
            pixel00_loc,
            pixel_delta_u,
            pixel_delta_v,
            u,
            v,
            w,
            defocus_angle: self.defocus_angle,
            defocus_disk_u: u * defocus_radius,
            defocus_disk_v: v * defocus_radius,
        }
    }
}

impl Default for CameraBuilder {
    fn default() -> Self {
        Self::new()
    }
}
