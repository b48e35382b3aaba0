//! Path ray carried through the bounce loop.
//!
//! Besides origin and direction, a path ray carries everything the iterative
//! trace loop needs to stand in for recursion: the attenuation gathered so far,
//! the pixel it contributes to, and the bounces it has left.

use lumen_math::Vec3;

use crate::material::Color;

/// A ray with origin, direction, time, and per-path state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Origin point of the ray
    origin: Vec3,
    /// Direction vector (not necessarily normalized)
    direction: Vec3,
    /// Product of the attenuations along the path so far
    attenuation: Color,
    /// Row-major pixel index this path contributes to
    pixel: usize,
    /// Remaining bounce budget; the path stops once this drops below zero
    depth: i32,
    /// Time in [0, 1) for motion blur
    time: f64,
}

impl Ray {
    /// Create a primary ray with white attenuation.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3, pixel: usize, depth: i32, time: f64) -> Self {
        Self {
            origin,
            direction,
            attenuation: Color::ONE,
            pixel,
            depth,
            time,
        }
    }

    /// Derive the next ray of the same path, one bounce further.
    #[inline]
    pub fn scattered(&self, origin: Vec3, direction: Vec3, attenuation: Color) -> Self {
        Self {
            origin,
            direction,
            attenuation,
            pixel: self.pixel,
            depth: self.depth - 1,
            time: self.time,
        }
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    pub fn attenuation(&self) -> Color {
        self.attenuation
    }

    #[inline]
    pub fn pixel(&self) -> usize {
        self.pixel
    }

    #[inline]
    pub fn depth(&self) -> i32 {
        self.depth
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Compute a point along the ray at parameter t.
    #[inline]
    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + t * self.direction
    }

    /// Origin and direction only, for bounding-box tests.
    #[inline]
    pub fn geometry(&self) -> lumen_math::Ray {
        lumen_math::Ray::new(self.origin, self.direction)
    }
}
