use crate::{Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// An AABB is defined by three intervals (one per axis) that bound a 3D volume.
/// Unlike mesh-oriented boxes, no minimum padding is applied: a box built from
/// two corner points is exactly those corners.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create a new AABB from three intervals.
    pub const fn new(x: Interval, y: Interval, z: Interval) -> Self {
        Self { x, y, z }
    }

    /// Create an AABB from two corner points (in any order).
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            x: Interval::new(a.x.min(b.x), a.x.max(b.x)),
            y: Interval::new(a.y.min(b.y), a.y.max(b.y)),
            z: Interval::new(a.z.min(b.z), a.z.max(b.z)),
        }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    #[inline]
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Minimum corner.
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// Test if a ray intersects this AABB within the given interval.
    ///
    /// Slab method. Zero direction components are not special-cased: the
    /// division yields ±infinity and the interval logic handles the rest.
    /// The swap keys on the sign bit, so a `-0.0` component orders its
    /// infinities the same way as any other negative direction.
    pub fn hit(&self, r: &Ray, mut ray_t: Interval) -> bool {
        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let origin = r.origin[axis];
            let direction = r.direction[axis];

            let mut t0 = (slab.min - origin) / direction;
            let mut t1 = (slab.max - origin) / direction;
            if direction.is_sign_negative() {
                std::mem::swap(&mut t0, &mut t1);
            }

            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max <= ray_t.min {
                return false;
            }
        }
        true
    }

    /// Translate (move) the AABB by an offset vector.
    pub fn translate(&self, offset: Vec3) -> Aabb {
        Aabb::new(
            self.x.add_scalar(offset.x),
            self.y.add_scalar(offset.y),
            self.z.add_scalar(offset.z),
        )
    }

    /// Returns true if the point lies inside or on the box.
    pub fn contains(&self, p: Vec3) -> bool {
        self.x.contains(p.x) && self.y.contains(p.y) && self.z.contains(p.z)
    }

    /// Returns true if `other` lies entirely inside this box.
    pub fn encloses(&self, other: &Aabb) -> bool {
        self.contains(other.min()) && self.contains(other.max())
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn test_aabb_from_points_unordered() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 5.0), Vec3::new(0.0, 10.0, -5.0));

        assert_eq!(aabb.x, Interval::new(0.0, 10.0));
        assert_eq!(aabb.y, Interval::new(0.0, 10.0));
        assert_eq!(aabb.z, Interval::new(-5.0, 5.0));
    }

    #[test]
    fn test_aabb_degenerate_is_not_padded() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let aabb = Aabb::from_points(p, p);
        assert_eq!(aabb.min(), p);
        assert_eq!(aabb.max(), p);
    }

    #[test]
    fn test_aabb_surrounding() {
        let box1 = Aabb::from_points(Vec3::ZERO, Vec3::splat(5.0));
        let box2 = Aabb::from_points(Vec3::splat(3.0), Vec3::splat(10.0));
        let surrounding = Aabb::surrounding(&box1, &box2);

        assert_eq!(surrounding.min(), Vec3::ZERO);
        assert_eq!(surrounding.max(), Vec3::splat(10.0));
        assert!(surrounding.encloses(&box1));
        assert!(surrounding.encloses(&box2));
        assert_eq!(Aabb::surrounding(&Aabb::EMPTY, &box1), box1);
    }

    #[test]
    fn test_aabb_hit() {
        let aabb = unit_box();

        // Ray pointing at center
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(aabb.hit(&ray, Interval::new(0.0, 100.0)));

        // Ray pointing away
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z);
        assert!(!aabb.hit(&ray, Interval::new(0.0, 100.0)));

        // Ray missing the box
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::Z);
        assert!(!aabb.hit(&ray, Interval::new(0.0, 100.0)));

        // Interval ends before the box
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(!aabb.hit(&ray, Interval::new(0.0, 3.0)));
    }

    #[test]
    fn test_aabb_hit_zero_direction_components() {
        let aabb = unit_box();

        // Axis-parallel ray inside the x/y slabs
        let inside = Ray::new(Vec3::new(0.5, -0.5, 4.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(aabb.hit(&inside, Interval::new(0.0, f64::INFINITY)));

        // Axis-parallel ray outside the x slab never enters
        let outside = Ray::new(Vec3::new(2.0, 0.0, 4.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(!aabb.hit(&outside, Interval::new(0.0, f64::INFINITY)));
    }

    #[test]
    fn test_aabb_hit_negative_zero_components() {
        let aabb = unit_box();
        let forever = Interval::new(0.0, f64::INFINITY);

        // -Vec3::Z carries -0.0 in x and y
        let down_z = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        assert!(down_z.direction.x.is_sign_negative());
        assert!(aabb.hit(&down_z, forever));

        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            let toward = Ray::new(axis * 5.0, -axis);
            let away = Ray::new(-axis * 5.0, -axis);
            assert!(aabb.hit(&toward, forever), "-{axis:?} from outside");
            assert!(!aabb.hit(&away, forever), "-{axis:?} heading away");
        }

        // Explicit negative zeros, origin off-center inside the flat slabs
        let ray = Ray::new(Vec3::new(0.5, -0.5, -4.0), Vec3::new(-0.0, -0.0, 1.0));
        assert!(aabb.hit(&ray, forever));
        let ray = Ray::new(Vec3::new(1.5, 0.0, -4.0), Vec3::new(-0.0, 0.0, 1.0));
        assert!(!aabb.hit(&ray, forever));
    }

    #[test]
    fn test_aabb_hit_segment_symmetry() {
        use glam::DVec3;

        // Deterministic pseudo-random sweep over segments and boxes
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 11) as f64 / (1u64 << 53) as f64 * 8.0 - 4.0
        };

        for i in 0..3000 {
            let aabb = Aabb::from_points(
                DVec3::new(next(), next(), next()),
                DVec3::new(next(), next(), next()),
            );
            let a = DVec3::new(next(), next(), next());
            let mut b = DVec3::new(next(), next(), next());
            // Every third segment is parallel to one or two axis planes
            match i % 3 {
                1 => b.x = a.x,
                2 => {
                    b.y = a.y;
                    b.z = a.z;
                }
                _ => {}
            }
            let segment = Interval::new(0.0, 1.0);

            // Negating the direction turns zero components into -0.0
            let direction = b - a;
            let forward = aabb.hit(&Ray::new(a, direction), segment);
            let backward = aabb.hit(&Ray::new(b, -direction), segment);
            assert_eq!(forward, backward, "a={a:?} b={b:?} box={aabb:?}");
        }
    }

    #[test]
    fn test_aabb_translate() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::splat(10.0));
        let translated = aabb.translate(Vec3::new(5.0, 0.0, -1.0));
        assert_eq!(translated.x, Interval::new(5.0, 15.0));
        assert_eq!(translated.z, Interval::new(-1.0, 9.0));
    }
}
