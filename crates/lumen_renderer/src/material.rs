//! Surface material component and scattering.
//!
//! A single [`Material`] blends three lobes by stochastic selection: metallic
//! reflection, dielectric refraction, and lambertian diffuse.

use lumen_math::{near_zero, reflect, refract, Vec3};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::random::{gen_f64, random_unit_vector};
use crate::{HitRecord, Ray};

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// Offset applied to refracted/reflected dielectric origins along the new direction.
pub const DIELECTRIC_OFFSET: f64 = 1e-3;

/// Surface description attached to renderable entities.
///
/// Deserialization goes through [`Material::try_new`], so weights and fuzz
/// are clamped and a bad refraction index is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MaterialDesc")]
pub struct Material {
    pub albedo: Color,
    /// Probability of a metallic bounce, in [0, 1]
    pub metallic: f64,
    /// Probability of a dielectric bounce when not metallic, in [0, 1]
    pub dielectric: f64,
    /// Metallic roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fuzz: f64,
    pub refraction_index: f64,
}

/// Unchecked serialized form of [`Material`].
#[derive(Deserialize)]
struct MaterialDesc {
    albedo: Color,
    metallic: f64,
    dielectric: f64,
    #[serde(default)]
    fuzz: f64,
    #[serde(default = "default_refraction_index")]
    refraction_index: f64,
}

fn default_refraction_index() -> f64 {
    1.0
}

impl TryFrom<MaterialDesc> for Material {
    type Error = MaterialError;

    fn try_from(desc: MaterialDesc) -> Result<Self, Self::Error> {
        Material::try_new(
            desc.albedo,
            desc.metallic,
            desc.dielectric,
            desc.fuzz,
            desc.refraction_index,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MaterialError {
    #[error("refraction index must be positive, got {0}")]
    InvalidRefractionIndex(f64),
}

/// Which lobe a scatter event took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScatterKind {
    Metallic,
    Dielectric,
    Lambertian,
}

impl Material {
    /// Create a material, clamping weights and fuzz to [0, 1].
    ///
    /// # Panics
    /// If `refraction_index` is not positive.
    pub fn new(albedo: Color, metallic: f64, dielectric: f64, fuzz: f64, refraction_index: f64) -> Self {
        match Self::try_new(albedo, metallic, dielectric, fuzz, refraction_index) {
            Ok(material) => material,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible [`Material::new`]. NaN counts as not positive.
    pub fn try_new(
        albedo: Color,
        metallic: f64,
        dielectric: f64,
        fuzz: f64,
        refraction_index: f64,
    ) -> Result<Self, MaterialError> {
        if refraction_index.is_nan() || refraction_index <= 0.0 {
            return Err(MaterialError::InvalidRefractionIndex(refraction_index));
        }
        Ok(Self {
            albedo,
            metallic: metallic.clamp(0.0, 1.0),
            dielectric: dielectric.clamp(0.0, 1.0),
            fuzz: fuzz.clamp(0.0, 1.0),
            refraction_index,
        })
    }

    /// Purely diffuse material.
    pub fn lambertian(albedo: Color) -> Self {
        Self::new(albedo, 0.0, 0.0, 0.0, 1.0)
    }

    /// Purely metallic material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn metal(albedo: Color, fuzz: f64) -> Self {
        Self::new(albedo, 1.0, 0.0, fuzz, 1.0)
    }

    /// Clear glass-like material.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn dielectric(ior: f64) -> Self {
        Self::new(Color::ONE, 0.0, 1.0, 0.0, ior)
    }

    /// Pick a lobe. A second draw is only taken when the first rejects metal.
    pub fn choose_lobe(&self, rng: &mut dyn RngCore) -> ScatterKind {
        if gen_f64(rng) <= self.metallic {
            ScatterKind::Metallic
        } else if gen_f64(rng) <= self.dielectric {
            ScatterKind::Dielectric
        } else {
            ScatterKind::Lambertian
        }
    }

    /// Scatter an incoming path ray.
    ///
    /// Returns the next ray of the path, one bounce shallower and with its
    /// attenuation updated, or `None` if the ray is absorbed.
    pub fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<Ray> {
        match self.choose_lobe(rng) {
            ScatterKind::Metallic => self.scatter_metallic(ray_in, rec, rng),
            ScatterKind::Dielectric => Some(self.scatter_dielectric(ray_in, rec, rng)),
            ScatterKind::Lambertian => Some(self.scatter_lambertian(ray_in, rec, rng)),
        }
    }

    fn scatter_lambertian(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Ray {
        let mut direction = rec.normal + random_unit_vector(rng);

        // Catch degenerate scatter direction
        if near_zero(direction) {
            direction = rec.normal;
        }

        ray_in.scattered(rec.p, direction, ray_in.attenuation() * self.albedo)
    }

    fn scatter_metallic(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<Ray> {
        let reflected = reflect(ray_in.direction().normalize(), rec.normal);
        let direction = reflected + self.fuzz * random_unit_vector(rng);

        // Fuzz pushed the reflection below the surface
        if direction.dot(rec.normal) < 0.0 {
            return None;
        }

        Some(ray_in.scattered(rec.p, direction, ray_in.attenuation() * self.albedo))
    }

    fn scatter_dielectric(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Ray {
        let ratio = if rec.front_face {
            1.0 / self.refraction_index
        } else {
            self.refraction_index
        };

        let unit_direction = ray_in.direction().normalize();
        let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

        // Total internal reflection
        let cannot_refract = ratio * sin_theta > 1.0;

        let direction = if cannot_refract || reflectance(cos_theta, ratio) > gen_f64(rng) {
            reflect(unit_direction, rec.normal)
        } else {
            refract(unit_direction, rec.normal, ratio)
        };

        ray_in.scattered(
            rec.p + DIELECTRIC_OFFSET * direction,
            direction,
            ray_in.attenuation(),
        )
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::lambertian(Color::splat(0.5))
    }
}

/// Schlick's approximation for reflectance.
#[inline]
pub fn reflectance(cosine: f64, refraction_ratio: f64) -> f64 {
    let r0 = ((1.0 - refraction_ratio) / (1.0 + refraction_ratio)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}
