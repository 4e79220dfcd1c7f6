use nalgebra::{Quaternion, UnitQuaternion};

use super::{Orientation, Point2, Point3, Vector3, normalize3};
use crate::error::{Error, Result};

/// Allowed deviation of a quaternion norm from one
const UNIT_NORM_TOLERANCE: f64 = 1e-9;

/// An origin plus an orientation placing a reference frame in model space
///
/// Sketch geometry is expressed in the frame's local XY plane; the local z
/// axis is the sketch normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateSystem {
    origin: Point3,
    orientation: Orientation,
}

impl Default for CoordinateSystem {
    fn default() -> Self {
        Self::world()
    }
}

impl CoordinateSystem {
    /// Create a coordinate system from an origin and a quaternion
    ///
    /// The quaternion must already have unit norm; anything else is rejected
    /// rather than silently renormalized.
    pub fn new(origin: Point3, quaternion: Quaternion<f64>) -> Result<Self> {
        super::ensure_finite(
            "coordinate system",
            &[
                origin.x,
                origin.y,
                origin.z,
                quaternion.w,
                quaternion.i,
                quaternion.j,
                quaternion.k,
            ],
        )?;
        let norm = quaternion.norm();
        if (norm - 1.0).abs() > UNIT_NORM_TOLERANCE {
            return Err(Error::InvalidGeometry(format!(
                "orientation quaternion must have unit norm, got {}",
                norm
            )));
        }
        Ok(Self {
            origin,
            orientation: UnitQuaternion::new_unchecked(quaternion),
        })
    }

    /// Create a coordinate system from an origin and an already unit orientation
    pub fn from_orientation(origin: Point3, orientation: Orientation) -> Self {
        Self {
            origin,
            orientation,
        }
    }

    /// Create a coordinate system from intrinsic roll/pitch/yaw angles in radians
    pub fn from_euler(origin: Point3, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            origin,
            orientation: UnitQuaternion::from_euler_angles(roll, pitch, yaw),
        }
    }

    /// The world frame: origin at zero, identity orientation
    pub fn world() -> Self {
        Self {
            origin: Point3::origin(),
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Standard XZ frame (front plane), local y along world +z
    pub fn xz() -> Self {
        Self::from_euler(Point3::origin(), std::f64::consts::FRAC_PI_2, 0.0, 0.0)
    }

    /// Standard YZ frame (side plane), local x along world +y
    pub fn yz() -> Self {
        let to_xz = UnitQuaternion::from_euler_angles(std::f64::consts::FRAC_PI_2, 0.0, 0.0);
        let spin = UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        Self::from_orientation(Point3::origin(), spin * to_xz)
    }

    /// Origin of the frame in world coordinates
    pub fn origin(&self) -> Point3 {
        self.origin
    }

    /// Orientation of the frame
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Local x axis in world coordinates
    pub fn x_axis(&self) -> Vector3 {
        self.orientation * Vector3::new(1.0, 0.0, 0.0)
    }

    /// Local y axis in world coordinates
    pub fn y_axis(&self) -> Vector3 {
        self.orientation * Vector3::new(0.0, 1.0, 0.0)
    }

    /// Local z axis (sketch normal) in world coordinates
    pub fn z_axis(&self) -> Vector3 {
        self.orientation * Vector3::new(0.0, 0.0, 1.0)
    }

    /// Place this frame inside `parent`, returning the frame in world terms
    pub fn compose(&self, parent: &CoordinateSystem) -> CoordinateSystem {
        CoordinateSystem {
            origin: parent.origin + parent.orientation * self.origin.coords,
            orientation: parent.orientation * self.orientation,
        }
    }

    /// Map a point given in frame-local coordinates into world coordinates
    pub fn point_to_world(&self, local: &Point3) -> Point3 {
        self.origin + self.orientation * local.coords
    }

    /// Map a sketch-plane point into world coordinates
    pub fn to_world(&self, local: &Point2) -> Point3 {
        self.point_to_world(&Point3::new(local.x, local.y, 0.0))
    }

    /// Map a world direction into frame-local coordinates
    pub fn vector_to_local(&self, world: &Vector3) -> Vector3 {
        self.orientation.inverse() * world
    }

    /// Map a world point into frame-local coordinates (including the normal offset)
    pub fn point_to_local(&self, world: &Point3) -> Point3 {
        Point3::from(self.orientation.inverse() * (world - self.origin))
    }

    /// Project a world point into the sketch plane, dropping the normal offset
    pub fn to_local(&self, world: &Point3) -> Point2 {
        let local = self.point_to_local(world);
        Point2::new(local.x, local.y)
    }

    /// The plane spanned by the local x and y axes
    pub fn plane(&self) -> Plane {
        Plane {
            point: self.origin,
            normal: self.z_axis(),
        }
    }
}

/// An infinite plane given by a point and a unit normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    point: Point3,
    normal: Vector3,
}

impl Plane {
    /// Create a plane, normalizing the normal
    pub fn new(point: Point3, normal: Vector3) -> Result<Self> {
        Ok(Self {
            point,
            normal: normalize3(&normal)?,
        })
    }

    /// A point on the plane
    pub fn point(&self) -> Point3 {
        self.point
    }

    /// Unit normal of the plane
    pub fn normal(&self) -> Vector3 {
        self.normal
    }

    /// Coefficients `(a, b, c, d)` of `ax + by + cz + d = 0`
    pub fn coefficients(&self) -> (f64, f64, f64, f64) {
        let d = -self.normal.dot(&self.point.coords);
        (self.normal.x, self.normal.y, self.normal.z, d)
    }

    /// Signed distance of a point from the plane along its normal
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&(p - self.point))
    }

    /// Orthogonal projection of a point onto the plane
    pub fn project_point(&self, p: &Point3) -> Point3 {
        p - self.normal * self.signed_distance(p)
    }

    /// Whether the point lies on the plane within `tol`
    pub fn contains(&self, p: &Point3, tol: &crate::Tolerance) -> bool {
        tol.is_zero(self.signed_distance(p))
    }

    /// Whether two planes are the same set of points
    pub fn coincides_with(&self, other: &Plane, tol: &crate::Tolerance) -> bool {
        tol.parallel3(&self.normal, &other.normal) && self.contains(&other.point, tol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tolerance;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_non_unit_quaternion() {
        let q = Quaternion::new(2.0, 0.0, 0.0, 0.0);
        let result = CoordinateSystem::new(Point3::origin(), q);
        assert!(matches!(result, Err(Error::InvalidGeometry(_))));

        let q = Quaternion::new(1.0, 0.0, 0.0, 0.0);
        assert!(CoordinateSystem::new(Point3::origin(), q).is_ok());
    }

    #[test]
    fn test_standard_frames() {
        let xz = CoordinateSystem::xz();
        assert_relative_eq!(xz.y_axis(), Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(xz.z_axis(), Vector3::new(0.0, -1.0, 0.0), epsilon = 1e-12);

        let yz = CoordinateSystem::yz();
        assert_relative_eq!(yz.x_axis(), Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(yz.y_axis(), Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(yz.z_axis(), Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_local_world_round_trip() {
        let frame = CoordinateSystem::from_euler(Point3::new(1.0, 2.0, 3.0), 0.3, -0.7, 1.1);
        let local = Point2::new(4.0, -5.0);
        let world = frame.to_world(&local);
        let back = frame.to_local(&world);
        assert_relative_eq!(back, local, epsilon = 1e-12);
        assert!(frame.plane().contains(&world, &Tolerance::default()));
    }

    #[test]
    fn test_compose_places_child() {
        let parent = CoordinateSystem::from_euler(Point3::new(10.0, 0.0, 0.0), 0.0, 0.0, std::f64::consts::FRAC_PI_2);
        let child = CoordinateSystem::from_orientation(Point3::new(1.0, 0.0, 0.0), Orientation::identity());
        let placed = child.compose(&parent);
        assert_relative_eq!(placed.origin(), Point3::new(10.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_plane_equation() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 2.0), Vector3::new(0.0, 0.0, 5.0)).unwrap();
        let (a, b, c, d) = plane.coefficients();
        assert_eq!((a, b, c, d), (0.0, 0.0, 1.0, -2.0));
        assert_relative_eq!(plane.signed_distance(&Point3::new(7.0, 7.0, 5.0)), 3.0);
        let p = plane.project_point(&Point3::new(1.0, 1.0, -4.0));
        assert_relative_eq!(p, Point3::new(1.0, 1.0, 2.0));
        assert!(Plane::new(Point3::origin(), Vector3::zeros()).is_err());
    }
}
