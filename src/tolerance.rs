//! Shared floating-point closeness policy
//!
//! All "equal", "coincident", "parallel" style decisions in the crate go
//! through a [`Tolerance`], so a single absolute + relative epsilon pair
//! governs every comparison.

use crate::kernel::{Point2, Point3, TAU, Vector2, Vector3};

/// Absolute + relative epsilon used for every numeric comparison
///
/// Two values `a` and `b` are close when
/// `|a - b| <= max(absolute, relative * max(|a|, |b|))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Absolute epsilon, dominant for values near zero
    pub absolute: f64,
    /// Relative epsilon, dominant for large magnitudes
    pub relative: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            absolute: 1e-9,
            relative: 1e-9,
        }
    }
}

impl Tolerance {
    /// Create a tolerance from explicit epsilons
    pub fn new(absolute: f64, relative: f64) -> Self {
        Self { absolute, relative }
    }

    /// Tolerance with only an absolute component
    pub fn absolute(absolute: f64) -> Self {
        Self {
            absolute,
            relative: 0.0,
        }
    }

    /// Whether `a` and `b` are equal within this tolerance
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        let scale = a.abs().max(b.abs());
        (a - b).abs() <= self.absolute.max(self.relative * scale)
    }

    /// Whether `value` is zero within the absolute epsilon
    pub fn is_zero(&self, value: f64) -> bool {
        value.abs() <= self.absolute
    }

    /// Whether two 2D points coincide
    pub fn points_close(&self, a: &Point2, b: &Point2) -> bool {
        self.is_close(a.x, b.x) && self.is_close(a.y, b.y)
    }

    /// Whether two 3D points coincide
    pub fn points_close3(&self, a: &Point3, b: &Point3) -> bool {
        self.is_close(a.x, b.x) && self.is_close(a.y, b.y) && self.is_close(a.z, b.z)
    }

    /// Whether two angles name the same direction, comparing modulo a full turn
    pub fn angles_close(&self, a: f64, b: f64) -> bool {
        let diff = (a - b).rem_euclid(TAU);
        self.is_zero(diff) || self.is_zero(TAU - diff)
    }

    /// Whether two 2D directions are parallel (or anti-parallel)
    ///
    /// Compares the sine of the enclosed angle, so the result does not depend
    /// on the vectors' lengths.
    pub fn parallel2(&self, a: &Vector2, b: &Vector2) -> bool {
        let scale = a.norm() * b.norm();
        if scale == 0.0 {
            return false;
        }
        self.is_zero(a.perp(b) / scale)
    }

    /// Whether two 3D directions are parallel (or anti-parallel)
    pub fn parallel3(&self, a: &Vector3, b: &Vector3) -> bool {
        let scale = a.norm() * b.norm();
        if scale == 0.0 {
            return false;
        }
        self.is_zero(a.cross(b).norm() / scale)
    }

    /// Whether two 3D directions are perpendicular
    pub fn perpendicular3(&self, a: &Vector3, b: &Vector3) -> bool {
        let scale = a.norm() * b.norm();
        if scale == 0.0 {
            return false;
        }
        self.is_zero(a.dot(b) / scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_component_scales() {
        let tol = Tolerance::default();
        assert!(tol.is_close(1e12, 1e12 + 1.0));
        assert!(!tol.is_close(1.0, 1.0 + 1e-6));
        assert!(tol.is_close(0.0, 1e-10));
    }

    #[test]
    fn test_absolute_only() {
        let tol = Tolerance::absolute(0.5);
        assert!(tol.is_close(1.0, 1.4));
        assert!(!tol.is_close(100.0, 101.0));
    }

    #[test]
    fn test_angles_wrap() {
        let tol = Tolerance::default();
        assert!(tol.angles_close(0.0, TAU));
        assert!(tol.angles_close(-1e-12, 0.0));
        assert!(tol.angles_close(3.0 * TAU + 1.0, 1.0));
        assert!(!tol.angles_close(0.0, 0.1));
    }

    #[test]
    fn test_parallel_ignores_length() {
        let tol = Tolerance::default();
        assert!(tol.parallel2(&Vector2::new(1.0, 1.0), &Vector2::new(-300.0, -300.0)));
        assert!(!tol.parallel2(&Vector2::new(1.0, 0.0), &Vector2::new(1.0, 1e-3)));
        assert!(!tol.parallel2(&Vector2::zeros(), &Vector2::new(1.0, 0.0)));
        assert!(tol.perpendicular3(&Vector3::new(1.0, 0.0, 0.0), &Vector3::new(0.0, 0.0, 5.0)));
    }
}
