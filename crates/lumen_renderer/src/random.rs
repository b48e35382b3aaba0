//! Sampling helpers on top of an opaque `RngCore` stream.

use lumen_math::Vec3;
use rand::{Rng, RngCore};

/// Uniform double in [0, 1).
#[inline]
pub fn gen_f64(rng: &mut dyn RngCore) -> f64 {
    rng.gen::<f64>()
}

/// Uniform double in [min, max).
#[inline]
pub fn gen_range_f64(rng: &mut dyn RngCore, min: f64, max: f64) -> f64 {
    min + (max - min) * gen_f64(rng)
}

/// Uniform integer in [min, max] (inclusive).
#[inline]
pub fn gen_int(rng: &mut dyn RngCore, min: i32, max: i32) -> i32 {
    rng.gen_range(min..=max)
}

/// Uniformly distributed unit vector, by rejection sampling the unit ball.
pub fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(
            gen_range_f64(rng, -1.0, 1.0),
            gen_range_f64(rng, -1.0, 1.0),
            gen_range_f64(rng, -1.0, 1.0),
        );
        let len_sq = p.length_squared();
        if 1e-160 < len_sq && len_sq <= 1.0 {
            return p / len_sq.sqrt();
        }
    }
}

/// Uniform point in the unit disk on the z = 0 plane.
pub fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(gen_range_f64(rng, -1.0, 1.0), gen_range_f64(rng, -1.0, 1.0), 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_unit_vector_has_unit_length() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unit_disk_sample_is_planar() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..1000 {
            let p = random_in_unit_disk(&mut rng);
            assert_eq!(p.z, 0.0);
            assert!(p.length_squared() < 1.0);
        }
    }

    #[test]
    fn test_gen_int_covers_inclusive_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = [false; 3];
        for _ in 0..300 {
            let axis = gen_int(&mut rng, 0, 2);
            seen[axis as usize] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for _ in 0..16 {
            assert_eq!(gen_f64(&mut a), gen_f64(&mut b));
        }
    }
}
