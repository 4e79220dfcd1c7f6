//! Vector and frame kernel
//!
//! Thin layer over `nalgebra` providing the vector, angle and coordinate
//! conversions the rest of the crate builds on. All functions are pure.

mod frame;

pub use frame::{CoordinateSystem, Plane};

use crate::error::{Error, Result};

/// A point in a sketch plane
pub type Point2 = nalgebra::Point2<f64>;
/// A displacement in a sketch plane
pub type Vector2 = nalgebra::Vector2<f64>;
/// A point in model space
pub type Point3 = nalgebra::Point3<f64>;
/// A displacement in model space
pub type Vector3 = nalgebra::Vector3<f64>;
/// Unit-norm orientation quantity
pub type Orientation = nalgebra::UnitQuaternion<f64>;

pub use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Magnitudes at or below this are treated as zero-length directions
const DEGENERATE_NORM: f64 = 1e-12;

/// Normalize a 2D vector
///
/// Fails with [`Error::DegenerateVector`] when the vector has (near) zero length.
pub fn normalize2(v: &Vector2) -> Result<Vector2> {
    let norm = v.norm();
    if !norm.is_finite() || norm <= DEGENERATE_NORM {
        return Err(Error::DegenerateVector(format!(
            "cannot normalize ({}, {})",
            v.x, v.y
        )));
    }
    Ok(v / norm)
}

/// Normalize a 3D vector
///
/// Fails with [`Error::DegenerateVector`] when the vector has (near) zero length.
pub fn normalize3(v: &Vector3) -> Result<Vector3> {
    let norm = v.norm();
    if !norm.is_finite() || norm <= DEGENERATE_NORM {
        return Err(Error::DegenerateVector(format!(
            "cannot normalize ({}, {}, {})",
            v.x, v.y, v.z
        )));
    }
    Ok(v / norm)
}

/// Rotate a 2D vector counter-clockwise by `angle` radians
pub fn rotate2(v: &Vector2, angle: f64) -> Vector2 {
    let (sin, cos) = angle.sin_cos();
    Vector2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Rotate a 3D vector by an orientation
pub fn rotate3(orientation: &Orientation, v: &Vector3) -> Vector3 {
    orientation * v
}

/// Compose two orientations: the result applies `second` after `first`
pub fn compose(first: &Orientation, second: &Orientation) -> Orientation {
    second * first
}

/// Map an angle into `[0, 2π)`
pub fn positive_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Wrap an angle into `(-2π, 2π)` keeping its sign
///
/// Angles that are whole turns map to zero.
pub fn angle_mod(angle: f64) -> f64 {
    angle % TAU
}

/// Counter-clockwise angle of a 2D vector from +x, in `[0, 2π)`
pub fn direction_angle(v: &Vector2) -> Result<f64> {
    let (_, azimuth) = to_polar(v)?;
    Ok(azimuth)
}

/// Signed angle from `from` to `to`, in `(-π, π]`
pub fn signed_angle(from: &Vector2, to: &Vector2) -> f64 {
    from.perp(to).atan2(from.dot(to))
}

/// Convert a 2D Cartesian vector to polar `(r, φ)` with `φ` in `[0, 2π)`
///
/// The azimuth of a zero vector is undefined, so it fails with
/// [`Error::DegenerateVector`].
pub fn to_polar(v: &Vector2) -> Result<(f64, f64)> {
    let r = v.norm();
    if r <= DEGENERATE_NORM {
        return Err(Error::DegenerateVector(
            "azimuth of a zero vector is undefined".to_string(),
        ));
    }
    Ok((r, positive_angle(v.y.atan2(v.x))))
}

/// Convert polar `(r, φ)` to a 2D Cartesian vector
pub fn from_polar(r: f64, azimuth: f64) -> Vector2 {
    let (sin, cos) = azimuth.sin_cos();
    Vector2::new(r * cos, r * sin)
}

/// Convert a 3D Cartesian vector to spherical `(r, θ, φ)`
///
/// `θ` is the inclination from +z in `[0, π]`, `φ` the azimuth in `[0, 2π)`.
/// Vectors on the z axis have an azimuth of zero.
pub fn to_spherical(v: &Vector3) -> Result<(f64, f64, f64)> {
    let r = v.norm();
    if r <= DEGENERATE_NORM {
        return Err(Error::DegenerateVector(
            "inclination of a zero vector is undefined".to_string(),
        ));
    }
    let planar = v.x.hypot(v.y);
    let inclination = planar.atan2(v.z);
    let azimuth = if planar <= DEGENERATE_NORM {
        0.0
    } else {
        positive_angle(v.y.atan2(v.x))
    };
    Ok((r, inclination, azimuth))
}

/// Convert spherical `(r, θ, φ)` to a 3D Cartesian vector
pub fn from_spherical(r: f64, inclination: f64, azimuth: f64) -> Vector3 {
    let (sin_t, cos_t) = inclination.sin_cos();
    let (sin_p, cos_p) = azimuth.sin_cos();
    Vector3::new(r * sin_t * cos_p, r * sin_t * sin_p, r * cos_t)
}

/// Lift a sketch-plane point into the z = 0 plane
pub fn lift(p: &Point2) -> Point3 {
    Point3::new(p.x, p.y, 0.0)
}

/// Fail with [`Error::InvalidGeometry`] if any coordinate is not finite
pub(crate) fn ensure_finite(what: &str, values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(Error::InvalidGeometry(format!(
            "{} has non-finite parameters {:?}",
            what, values
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_rejects_zero() {
        assert!(matches!(
            normalize2(&Vector2::new(0.0, 0.0)),
            Err(Error::DegenerateVector(_))
        ));
        assert!(normalize3(&Vector3::new(1e-15, 0.0, 0.0)).is_err());
        let n = normalize3(&Vector3::new(3.0, 0.0, 4.0)).unwrap();
        assert_relative_eq!(n.norm(), 1.0);
    }

    #[test]
    fn test_positive_angle_range() {
        assert_relative_eq!(positive_angle(-FRAC_PI_2), 1.5 * PI);
        assert_relative_eq!(positive_angle(5.0 * PI), PI, epsilon = 1e-12);
        assert_eq!(positive_angle(TAU), 0.0);
        assert!(positive_angle(-1e-300) < TAU);
    }

    #[test]
    fn test_angle_mod_keeps_sign() {
        assert_relative_eq!(angle_mod(-2.5 * PI), -0.5 * PI, epsilon = 1e-12);
        assert_relative_eq!(angle_mod(2.5 * PI), 0.5 * PI, epsilon = 1e-12);
        assert_eq!(angle_mod(-TAU), 0.0);
    }

    #[test]
    fn test_polar_round_trip() {
        let v = Vector2::new(-1.0, -1.0);
        let (r, phi) = to_polar(&v).unwrap();
        assert_relative_eq!(r, 2f64.sqrt());
        assert_relative_eq!(phi, 1.25 * PI);
        let back = from_polar(r, phi);
        assert_relative_eq!(back.x, -1.0, epsilon = 1e-12);
        assert_relative_eq!(back.y, -1.0, epsilon = 1e-12);
        assert!(to_polar(&Vector2::zeros()).is_err());
    }

    #[test]
    fn test_spherical_round_trip() {
        let v = Vector3::new(1.0, 2.0, -3.0);
        let (r, theta, phi) = to_spherical(&v).unwrap();
        assert!(theta > FRAC_PI_2);
        let back = from_spherical(r, theta, phi);
        assert_relative_eq!(back, v, epsilon = 1e-12);

        let (_, theta, phi) = to_spherical(&Vector3::new(0.0, 0.0, -2.0)).unwrap();
        assert_relative_eq!(theta, PI);
        assert_eq!(phi, 0.0);
    }

    #[test]
    fn test_signed_angle_and_rotation() {
        let x = Vector2::new(1.0, 0.0);
        let y = rotate2(&x, FRAC_PI_2);
        assert_relative_eq!(y, Vector2::new(0.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(signed_angle(&x, &y), FRAC_PI_2);
        assert_relative_eq!(signed_angle(&y, &x), -FRAC_PI_2);
    }

    #[test]
    fn test_compose_order() {
        let a = Orientation::from_euler_angles(0.0, 0.0, FRAC_PI_2);
        let b = Orientation::from_euler_angles(FRAC_PI_2, 0.0, 0.0);
        let v = Vector3::new(1.0, 0.0, 0.0);
        let composed = rotate3(&compose(&a, &b), &v);
        let stepwise = rotate3(&b, &rotate3(&a, &v));
        assert_relative_eq!(composed, stepwise, epsilon = 1e-12);
    }
}
