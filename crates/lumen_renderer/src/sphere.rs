//! Sphere geometry component.

use lumen_ecs::Entity;
use lumen_math::{Interval, Vec3};
use serde::{Deserialize, Serialize};

use crate::{HitRecord, Ray};

/// A sphere, optionally moving linearly over the shutter interval.
///
/// The center at time `t` is `center + motion * t` for `t` in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f64,
    #[serde(default)]
    pub motion: Vec3,
}

impl Sphere {
    /// Create a static sphere. Negative radii are clamped to zero.
    pub fn new(center: Vec3, radius: f64) -> Self {
        Self::moving(center, radius, Vec3::ZERO)
    }

    /// Create a sphere that travels by `motion` between time 0 and 1.
    pub fn moving(center: Vec3, radius: f64, motion: Vec3) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
            motion,
        }
    }

    /// Center at the given time.
    #[inline]
    pub fn center_at(&self, time: f64) -> Vec3 {
        self.center + self.motion * time
    }

    /// Outward unit normal at a surface point, for a sphere centered at `center`.
    #[inline]
    fn outward_normal(&self, center: Vec3, p: Vec3) -> Vec3 {
        (p - center) / self.radius
    }

    /// Intersect the ray, returning the nearest root strictly inside `ray_t`.
    pub fn hit(&self, entity: Entity, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let center = self.center_at(ray.time());
        let oc = center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let p = ray.at(root);
        Some(HitRecord::new(
            entity,
            root,
            p,
            self.outward_normal(center, p),
            ray,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> Entity {
        Entity::from_raw(0)
    }

    #[test]
    fn test_sphere_hit() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 0, 1, 0.0);

        let rec = sphere
            .hit(entity(), &ray, Interval::new(0.001, f64::INFINITY))
            .expect("ray aimed at the sphere must hit");
        assert!((rec.t - 0.5).abs() < 1e-12);
        assert!(rec.front_face);
        assert_eq!(rec.normal, Vec3::Z);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5);

        // Ray pointing away from sphere
        let ray = Ray::new(Vec3::ZERO, Vec3::Y, 0, 1, 0.0);
        assert!(sphere
            .hit(entity(), &ray, Interval::new(0.001, f64::INFINITY))
            .is_none());
    }

    #[test]
    fn test_sphere_hit_from_inside_is_back_face() {
        let sphere = Sphere::new(Vec3::ZERO, 2.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::X, 0, 1, 0.0);

        let rec = sphere
            .hit(entity(), &ray, Interval::new(0.001, f64::INFINITY))
            .unwrap();
        assert!((rec.t - 2.0).abs() < 1e-12);
        assert!(!rec.front_face);
        // Stored normal opposes the ray
        assert_eq!(rec.normal, -Vec3::X);
    }

    #[test]
    fn test_moving_sphere_follows_time() {
        let sphere = Sphere::moving(Vec3::ZERO, 0.5, Vec3::new(4.0, 0.0, 0.0));
        let interval = Interval::new(0.001, f64::INFINITY);

        // Aimed at where the sphere is at t = 1
        let late = Ray::new(Vec3::new(4.0, 0.0, 5.0), -Vec3::Z, 0, 1, 1.0);
        let early = Ray::new(Vec3::new(4.0, 0.0, 5.0), -Vec3::Z, 0, 1, 0.0);

        assert!(sphere.hit(entity(), &late, interval).is_some());
        assert!(sphere.hit(entity(), &early, interval).is_none());
        assert_eq!(sphere.center_at(0.5), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_negative_radius_clamped() {
        assert_eq!(Sphere::new(Vec3::ZERO, -3.0).radius, 0.0);
    }
}
