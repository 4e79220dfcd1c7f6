//! Arc and ellipse parameterization
//!
//! Converts between the two descriptions of a circular or elliptical arc:
//!
//! - **Center form** ([`CenterArc`]): center, radii, axis rotation, start
//!   angle and signed sweep.
//! - **Endpoint form** ([`EndpointArc`]): start and end points, radii, axis
//!   rotation and the large-arc / sweep flags used by path data.
//!
//! Angles on an ellipse are parametric (eccentric anomaly) angles: the point
//! at parameter `t` is `center + R(rotation) * (rx cos t, ry sin t)`. For a
//! circle this is the ordinary polar angle.

mod bounds;

pub use bounds::{BoundingBox, arc_bounds, bounds_of, ellipse_bounds};

use crate::error::{Error, Result};
use crate::kernel::{PI, Point2, TAU, Vector2, positive_angle, rotate2, signed_angle};
use crate::tolerance::Tolerance;

/// Chord-to-radius ratios this close to the limit are not reported as a correction
const SCALE_REPORT_THRESHOLD: f64 = 1e-9;

/// Arc described by its center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterArc {
    /// Center of the underlying circle or ellipse
    pub center: Point2,
    /// Semi-axis along the rotated x direction
    pub rx: f64,
    /// Semi-axis along the rotated y direction
    pub ry: f64,
    /// Rotation of the x semi-axis from +x, radians
    pub rotation: f64,
    /// Parametric start angle, radians
    pub start: f64,
    /// Signed sweep, radians; positive is counter-clockwise
    pub sweep: f64,
}

/// Arc described by its endpoints, as in path data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointArc {
    /// Start point
    pub start: Point2,
    /// End point
    pub end: Point2,
    /// Semi-axis along the rotated x direction
    pub rx: f64,
    /// Semi-axis along the rotated y direction
    pub ry: f64,
    /// Rotation of the x semi-axis from +x, radians
    pub rotation: f64,
    /// Whether the arc spans more than half a turn
    pub large_arc: bool,
    /// Whether the arc runs in the positive-angle direction
    pub sweep_positive: bool,
}

/// Result of fitting a center to an endpoint arc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcFit {
    /// The fitted arc
    pub arc: CenterArc,
    /// Factor the radii were scaled up by to reach the chord (1.0 if unchanged)
    pub radii_scale: f64,
}

impl ArcFit {
    /// Whether the given radii were too small and had to be enlarged
    pub fn radii_adjusted(&self) -> bool {
        self.radii_scale > 1.0 + SCALE_REPORT_THRESHOLD
    }
}

impl CenterArc {
    /// Circular arc with the given radius
    pub fn circular(center: Point2, radius: f64, start: f64, sweep: f64) -> Self {
        Self {
            center,
            rx: radius,
            ry: radius,
            rotation: 0.0,
            start,
            sweep,
        }
    }

    /// Point at parametric angle `t`
    pub fn point_at(&self, t: f64) -> Point2 {
        ellipse_point(&self.center, self.rx, self.ry, self.rotation, t)
    }

    /// First point of the arc
    pub fn start_point(&self) -> Point2 {
        self.point_at(self.start)
    }

    /// Last point of the arc
    pub fn end_point(&self) -> Point2 {
        self.point_at(self.start + self.sweep)
    }

    /// End angle normalized into `[0, 2π)`
    pub fn end(&self) -> f64 {
        positive_angle(self.start + self.sweep)
    }

    /// Whether parametric angle `t` lies on the swept range
    pub fn contains_angle(&self, t: f64, tol: &Tolerance) -> bool {
        let offset = if self.sweep >= 0.0 {
            positive_angle(t - self.start)
        } else {
            positive_angle(self.start - t)
        };
        offset <= self.sweep.abs()
            || tol.is_zero(offset - TAU)
            || tol.is_zero(offset - self.sweep.abs())
    }

    /// Convert to endpoint form
    ///
    /// Fails with [`Error::DegenerateGeometry`] for zero radii and for sweeps
    /// that return to the start point (zero or full turns), since neither has
    /// distinct endpoints.
    pub fn to_endpoint_form(&self) -> Result<EndpointArc> {
        check_radii(self.rx, self.ry)?;
        let magnitude = self.sweep.abs();
        let closes_on_itself = magnitude <= SCALE_REPORT_THRESHOLD
            || (TAU - magnitude).abs() <= SCALE_REPORT_THRESHOLD
            || magnitude > TAU;
        if !magnitude.is_finite() || closes_on_itself {
            return Err(Error::DegenerateGeometry(format!(
                "arc sweep of {} rad has coincident endpoints",
                self.sweep
            )));
        }
        Ok(EndpointArc {
            start: self.start_point(),
            end: self.end_point(),
            rx: self.rx,
            ry: self.ry,
            rotation: self.rotation,
            large_arc: magnitude > PI,
            sweep_positive: self.sweep > 0.0,
        })
    }
}

impl EndpointArc {
    /// Convert to center form, discarding the radii correction report
    pub fn to_center_form(&self, tol: &Tolerance) -> Result<CenterArc> {
        self.fit(tol).map(|fit| fit.arc)
    }

    /// Solve for the center of this arc
    ///
    /// Radii that cannot reach across the chord are scaled up uniformly until
    /// they just do; this is reported through [`ArcFit::radii_scale`] rather
    /// than treated as an error. Coincident endpoints or zero radii fail with
    /// [`Error::DegenerateGeometry`]; `tol` decides when endpoints coincide.
    pub fn fit(&self, tol: &Tolerance) -> Result<ArcFit> {
        check_radii(self.rx, self.ry)?;
        if tol.points_close(&self.start, &self.end) {
            return Err(Error::DegenerateGeometry(format!(
                "arc endpoints coincide at ({}, {})",
                self.start.x, self.start.y
            )));
        }

        let mut rx = self.rx.abs();
        let mut ry = self.ry.abs();
        let half_chord = (self.start - self.end) / 2.0;
        let p = rotate2(&half_chord, -self.rotation);

        let lambda = (p.x * p.x) / (rx * rx) + (p.y * p.y) / (ry * ry);
        let mut radii_scale = 1.0;
        if lambda > 1.0 {
            radii_scale = lambda.sqrt();
            rx *= radii_scale;
            ry *= radii_scale;
            if radii_scale > 1.0 + SCALE_REPORT_THRESHOLD {
                tracing::warn!(
                    from = self.rx,
                    to = rx,
                    "arc radii too small for chord, scaled by {:.6}",
                    radii_scale
                );
            }
        }

        let rx2 = rx * rx;
        let ry2 = ry * ry;
        let numerator = rx2 * ry2 - rx2 * p.y * p.y - ry2 * p.x * p.x;
        let denominator = rx2 * p.y * p.y + ry2 * p.x * p.x;
        let mut coefficient = (numerator / denominator).max(0.0).sqrt();
        if self.large_arc == self.sweep_positive {
            coefficient = -coefficient;
        }
        let center_rotated = Vector2::new(coefficient * rx * p.y / ry, -coefficient * ry * p.x / rx);
        let midpoint = Point2::from((self.start.coords + self.end.coords) / 2.0);
        let center = midpoint + rotate2(&center_rotated, self.rotation);

        let u = Vector2::new((p.x - center_rotated.x) / rx, (p.y - center_rotated.y) / ry);
        let v = Vector2::new((-p.x - center_rotated.x) / rx, (-p.y - center_rotated.y) / ry);
        let start = positive_angle(u.y.atan2(u.x));
        let mut sweep = signed_angle(&u, &v);
        if !self.sweep_positive && sweep > 0.0 {
            sweep -= TAU;
        } else if self.sweep_positive && sweep < 0.0 {
            sweep += TAU;
        }

        Ok(ArcFit {
            arc: CenterArc {
                center,
                rx,
                ry,
                rotation: self.rotation,
                start,
                sweep,
            },
            radii_scale,
        })
    }
}

/// Point on an ellipse at parametric angle `t`
pub fn ellipse_point(center: &Point2, rx: f64, ry: f64, rotation: f64, t: f64) -> Point2 {
    let (sin, cos) = t.sin_cos();
    *center + rotate2(&Vector2::new(rx * cos, ry * sin), rotation)
}

/// Convert a parametric angle into the polar angle seen from the center
///
/// Both angles are measured in the ellipse's own (unrotated) frame.
pub fn parametric_to_polar(t: f64, rx: f64, ry: f64) -> f64 {
    let (sin, cos) = t.sin_cos();
    positive_angle((ry * sin).atan2(rx * cos))
}

/// Convert a polar angle seen from the center into a parametric angle
pub fn polar_to_parametric(theta: f64, rx: f64, ry: f64) -> f64 {
    let (sin, cos) = theta.sin_cos();
    positive_angle((rx * sin).atan2(ry * cos))
}

fn check_radii(rx: f64, ry: f64) -> Result<()> {
    if !rx.is_finite() || !ry.is_finite() {
        return Err(Error::InvalidGeometry(format!(
            "arc radii must be finite, got ({}, {})",
            rx, ry
        )));
    }
    if rx == 0.0 || ry == 0.0 {
        return Err(Error::DegenerateGeometry(format!(
            "arc radii must be non-zero, got ({}, {})",
            rx, ry
        )));
    }
    Ok(())
}
