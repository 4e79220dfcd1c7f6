use crate::arc::CenterArc;
use crate::error::{Error, Result};
use crate::kernel::{FRAC_PI_2, Point2, TAU, Vector2, ensure_finite, positive_angle};
use crate::tolerance::Tolerance;

/// Direction an arc runs from its start angle to its end angle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArcDirection {
    /// Positive-angle direction
    #[default]
    CounterClockwise,
    /// Negative-angle direction
    Clockwise,
}

impl ArcDirection {
    /// Direction of a signed sweep
    pub fn of_sweep(sweep: f64) -> Self {
        if sweep < 0.0 {
            ArcDirection::Clockwise
        } else {
            ArcDirection::CounterClockwise
        }
    }

    /// The opposite direction
    pub fn reversed(self) -> Self {
        match self {
            ArcDirection::CounterClockwise => ArcDirection::Clockwise,
            ArcDirection::Clockwise => ArcDirection::CounterClockwise,
        }
    }
}

fn check_length(what: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidGeometry(format!(
            "{} must be a positive finite number, got {}",
            what, value
        )));
    }
    if value == 0.0 {
        return Err(Error::DegenerateGeometry(format!("{} is zero", what)));
    }
    Ok(())
}

/// Signed sweep from `start` to `end` in the given direction, in `(-2π, 2π)`
fn sweep_between(start: f64, end: f64, direction: ArcDirection) -> f64 {
    match direction {
        ArcDirection::CounterClockwise => positive_angle(end - start),
        ArcDirection::Clockwise => -positive_angle(start - end),
    }
}

fn check_sweep(start: f64, end: f64) -> Result<()> {
    ensure_finite("arc angles", &[start, end])?;
    if Tolerance::default().angles_close(start, end) {
        return Err(Error::DegenerateGeometry(format!(
            "arc start and end angles coincide at {} rad",
            start
        )));
    }
    Ok(())
}

/// A full circle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    center: Point2,
    radius: f64,
}

impl Circle {
    /// Create a circle; the radius must be positive
    pub fn new(center: Point2, radius: f64) -> Result<Self> {
        ensure_finite("circle center", &[center.x, center.y])?;
        check_length("circle radius", radius)?;
        Ok(Self { center, radius })
    }

    /// Center of the circle
    pub fn center(&self) -> Point2 {
        self.center
    }

    /// Radius of the circle
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Change the radius, re-validating it
    pub fn set_radius(&mut self, radius: f64) -> Result<()> {
        check_length("circle radius", radius)?;
        self.radius = radius;
        Ok(())
    }

    /// The circle as a full counter-clockwise center-form arc starting at angle 0
    pub fn to_center_arc(&self) -> CenterArc {
        CenterArc::circular(self.center, self.radius, 0.0, TAU)
    }

    pub(crate) fn mirrored_y(&self) -> Self {
        Self {
            center: flip(&self.center),
            ..*self
        }
    }

    pub(crate) fn translated(&self, offset: &Vector2) -> Self {
        Self {
            center: self.center + *offset,
            ..*self
        }
    }
}

fn flip(p: &Point2) -> Point2 {
    Point2::new(p.x, -p.y)
}

/// A circular arc between two angles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularArc {
    center: Point2,
    radius: f64,
    start_angle: f64,
    end_angle: f64,
    direction: ArcDirection,
}

impl CircularArc {
    /// Create an arc; angles are normalized into `[0, 2π)`
    ///
    /// Equal start and end angles fail with [`Error::DegenerateGeometry`]; use
    /// a [`Circle`] for a full turn.
    pub fn new(
        center: Point2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        direction: ArcDirection,
    ) -> Result<Self> {
        ensure_finite("arc center", &[center.x, center.y])?;
        check_length("arc radius", radius)?;
        check_sweep(start_angle, end_angle)?;
        Ok(Self {
            center,
            radius,
            start_angle: positive_angle(start_angle),
            end_angle: positive_angle(end_angle),
            direction,
        })
    }

    /// Build from a center-form arc with equal radii
    pub fn from_center_arc(arc: &CenterArc) -> Result<Self> {
        if arc.rx != arc.ry {
            return Err(Error::InvalidGeometry(format!(
                "circular arc needs equal radii, got ({}, {})",
                arc.rx, arc.ry
            )));
        }
        // for a circle the axis rotation only shifts the parameter
        let start = arc.start + arc.rotation;
        Self::new(
            arc.center,
            arc.rx,
            start,
            start + arc.sweep,
            ArcDirection::of_sweep(arc.sweep),
        )
    }

    /// Center-form equivalent of this arc
    pub fn to_center_arc(&self) -> CenterArc {
        CenterArc::circular(self.center, self.radius, self.start_angle, self.sweep())
    }

    /// Center of the arc
    pub fn center(&self) -> Point2 {
        self.center
    }

    /// Radius of the arc
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Change the radius, re-validating it
    pub fn set_radius(&mut self, radius: f64) -> Result<()> {
        check_length("arc radius", radius)?;
        self.radius = radius;
        Ok(())
    }

    /// Start angle in `[0, 2π)`
    pub fn start_angle(&self) -> f64 {
        self.start_angle
    }

    /// End angle in `[0, 2π)`
    pub fn end_angle(&self) -> f64 {
        self.end_angle
    }

    /// Running direction
    pub fn direction(&self) -> ArcDirection {
        self.direction
    }

    /// Signed sweep from start to end
    pub fn sweep(&self) -> f64 {
        sweep_between(self.start_angle, self.end_angle, self.direction)
    }

    /// Arc length
    pub fn length(&self) -> f64 {
        self.radius * self.sweep().abs()
    }

    /// First point of the arc
    pub fn start_point(&self) -> Point2 {
        self.to_center_arc().start_point()
    }

    /// Last point of the arc
    pub fn end_point(&self) -> Point2 {
        self.to_center_arc().end_point()
    }

    /// The same point set traversed counter-clockwise
    pub fn to_counter_clockwise(&self) -> CircularArc {
        match self.direction {
            ArcDirection::CounterClockwise => *self,
            ArcDirection::Clockwise => CircularArc {
                start_angle: self.end_angle,
                end_angle: self.start_angle,
                direction: ArcDirection::CounterClockwise,
                ..*self
            },
        }
    }

    pub(crate) fn mirrored_y(&self) -> Self {
        Self {
            center: flip(&self.center),
            radius: self.radius,
            start_angle: positive_angle(-self.start_angle),
            end_angle: positive_angle(-self.end_angle),
            direction: self.direction.reversed(),
        }
    }

    pub(crate) fn translated(&self, offset: &Vector2) -> Self {
        Self {
            center: self.center + *offset,
            ..*self
        }
    }
}

/// A full ellipse
///
/// The major semi-axis points along `rotation`; constructors swap the axes
/// (turning the ellipse by a quarter) when given a larger minor axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    center: Point2,
    semi_major: f64,
    semi_minor: f64,
    rotation: f64,
}

/// Order two semi-axes, returning the rotation correction applied
fn order_axes(a: f64, b: f64, rotation: f64) -> (f64, f64, f64, f64) {
    if b > a {
        (b, a, positive_angle(rotation + FRAC_PI_2), -FRAC_PI_2)
    } else {
        (a, b, positive_angle(rotation), 0.0)
    }
}

impl Ellipse {
    /// Create an ellipse from its semi-axes and the rotation of the first one
    pub fn new(center: Point2, semi_major: f64, semi_minor: f64, rotation: f64) -> Result<Self> {
        ensure_finite("ellipse", &[center.x, center.y, rotation])?;
        check_length("ellipse major axis", semi_major)?;
        check_length("ellipse minor axis", semi_minor)?;
        let (semi_major, semi_minor, rotation, _) = order_axes(semi_major, semi_minor, rotation);
        Ok(Self {
            center,
            semi_major,
            semi_minor,
            rotation,
        })
    }

    /// Center of the ellipse
    pub fn center(&self) -> Point2 {
        self.center
    }

    /// Major semi-axis length
    pub fn semi_major(&self) -> f64 {
        self.semi_major
    }

    /// Minor semi-axis length
    pub fn semi_minor(&self) -> f64 {
        self.semi_minor
    }

    /// Rotation of the major axis from +x
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Change both semi-axes, re-validating them
    pub fn set_axes(&mut self, semi_major: f64, semi_minor: f64) -> Result<()> {
        *self = Self::new(self.center, semi_major, semi_minor, self.rotation)?;
        Ok(())
    }

    /// Distance from the center to each focus
    pub fn focal_distance(&self) -> f64 {
        (self.semi_major * self.semi_major - self.semi_minor * self.semi_minor).sqrt()
    }

    /// The ellipse as a full counter-clockwise center-form arc starting on the major axis
    pub fn to_center_arc(&self) -> CenterArc {
        CenterArc {
            center: self.center,
            rx: self.semi_major,
            ry: self.semi_minor,
            rotation: self.rotation,
            start: 0.0,
            sweep: TAU,
        }
    }

    pub(crate) fn mirrored_y(&self) -> Self {
        Self {
            center: flip(&self.center),
            rotation: positive_angle(-self.rotation),
            ..*self
        }
    }

    pub(crate) fn translated(&self, offset: &Vector2) -> Self {
        Self {
            center: self.center + *offset,
            ..*self
        }
    }
}

/// An arc of an ellipse between two parametric angles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipticalArc {
    ellipse: Ellipse,
    start_angle: f64,
    end_angle: f64,
    direction: ArcDirection,
}

impl EllipticalArc {
    /// Create an elliptical arc between parametric angles of `ellipse`
    pub fn new(
        ellipse: Ellipse,
        start_angle: f64,
        end_angle: f64,
        direction: ArcDirection,
    ) -> Result<Self> {
        check_sweep(start_angle, end_angle)?;
        Ok(Self {
            ellipse,
            start_angle: positive_angle(start_angle),
            end_angle: positive_angle(end_angle),
            direction,
        })
    }

    /// Build from a center-form arc, reordering the axes if needed
    pub fn from_center_arc(arc: &CenterArc) -> Result<Self> {
        ensure_finite("ellipse", &[arc.center.x, arc.center.y, arc.rotation])?;
        check_length("ellipse major axis", arc.rx)?;
        check_length("ellipse minor axis", arc.ry)?;
        let (a, b, rotation, shift) = order_axes(arc.rx, arc.ry, arc.rotation);
        let ellipse = Ellipse {
            center: arc.center,
            semi_major: a,
            semi_minor: b,
            rotation,
        };
        let start = arc.start + shift;
        Self::new(
            ellipse,
            start,
            start + arc.sweep,
            ArcDirection::of_sweep(arc.sweep),
        )
    }

    /// Center-form equivalent of this arc
    pub fn to_center_arc(&self) -> CenterArc {
        CenterArc {
            sweep: self.sweep(),
            start: self.start_angle,
            ..self.ellipse.to_center_arc()
        }
    }

    /// The full ellipse this arc lies on
    pub fn ellipse(&self) -> &Ellipse {
        &self.ellipse
    }

    /// Center of the underlying ellipse
    pub fn center(&self) -> Point2 {
        self.ellipse.center
    }

    /// Parametric start angle in `[0, 2π)`
    pub fn start_angle(&self) -> f64 {
        self.start_angle
    }

    /// Parametric end angle in `[0, 2π)`
    pub fn end_angle(&self) -> f64 {
        self.end_angle
    }

    /// Running direction
    pub fn direction(&self) -> ArcDirection {
        self.direction
    }

    /// Signed parametric sweep from start to end
    pub fn sweep(&self) -> f64 {
        sweep_between(self.start_angle, self.end_angle, self.direction)
    }

    /// First point of the arc
    pub fn start_point(&self) -> Point2 {
        self.to_center_arc().start_point()
    }

    /// Last point of the arc
    pub fn end_point(&self) -> Point2 {
        self.to_center_arc().end_point()
    }

    /// The same point set traversed counter-clockwise
    pub fn to_counter_clockwise(&self) -> EllipticalArc {
        match self.direction {
            ArcDirection::CounterClockwise => *self,
            ArcDirection::Clockwise => EllipticalArc {
                start_angle: self.end_angle,
                end_angle: self.start_angle,
                direction: ArcDirection::CounterClockwise,
                ..*self
            },
        }
    }

    pub(crate) fn mirrored_y(&self) -> Self {
        Self {
            ellipse: self.ellipse.mirrored_y(),
            start_angle: positive_angle(-self.start_angle),
            end_angle: positive_angle(-self.end_angle),
            direction: self.direction.reversed(),
        }
    }

    pub(crate) fn translated(&self, offset: &Vector2) -> Self {
        Self {
            ellipse: self.ellipse.translated(offset),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::PI;
    use approx::assert_relative_eq;

    #[test]
    fn test_radius_validation() {
        assert!(matches!(
            Circle::new(Point2::origin(), 0.0),
            Err(Error::DegenerateGeometry(_))
        ));
        assert!(matches!(
            Circle::new(Point2::origin(), -1.0),
            Err(Error::InvalidGeometry(_))
        ));
        let mut c = Circle::new(Point2::origin(), 2.0).unwrap();
        assert!(c.set_radius(0.0).is_err());
        assert_eq!(c.radius(), 2.0);
    }

    #[test]
    fn test_arc_sweep_by_direction() {
        let ccw = CircularArc::new(Point2::origin(), 1.0, 0.0, FRAC_PI_2, ArcDirection::CounterClockwise).unwrap();
        assert_relative_eq!(ccw.sweep(), FRAC_PI_2);
        let cw = CircularArc::new(Point2::origin(), 1.0, 0.0, FRAC_PI_2, ArcDirection::Clockwise).unwrap();
        assert_relative_eq!(cw.sweep(), -1.5 * PI);
        assert_relative_eq!(cw.end_point(), Point2::new(0.0, 1.0), epsilon = 1e-12);

        let flipped = cw.to_counter_clockwise();
        assert_relative_eq!(flipped.start_point(), cw.end_point(), epsilon = 1e-12);
        assert_relative_eq!(flipped.sweep(), 1.5 * PI);
    }

    #[test]
    fn test_zero_sweep_rejected() {
        let result = CircularArc::new(Point2::origin(), 1.0, 1.0, 1.0 + TAU, ArcDirection::CounterClockwise);
        assert!(matches!(result, Err(Error::DegenerateGeometry(_))));
    }

    #[test]
    fn test_axes_are_ordered() {
        let e = Ellipse::new(Point2::origin(), 1.0, 3.0, 0.0).unwrap();
        assert_eq!(e.semi_major(), 3.0);
        assert_relative_eq!(e.rotation(), FRAC_PI_2);
        assert_relative_eq!(e.focal_distance(), 8f64.sqrt());
    }

    #[test]
    fn test_elliptical_arc_axis_swap_keeps_points() {
        let arc = CenterArc {
            center: Point2::new(1.0, -1.0),
            rx: 1.0,
            ry: 4.0,
            rotation: 0.2,
            start: 0.5,
            sweep: 2.0,
        };
        let ell = EllipticalArc::from_center_arc(&arc).unwrap();
        assert_eq!(ell.ellipse().semi_major(), 4.0);
        assert_relative_eq!(ell.start_point(), arc.start_point(), epsilon = 1e-12);
        assert_relative_eq!(ell.end_point(), arc.end_point(), epsilon = 1e-12);
    }

    #[test]
    fn test_circular_arc_absorbs_rotation() {
        let arc = CenterArc {
            center: Point2::origin(),
            rx: 2.0,
            ry: 2.0,
            rotation: 1.0,
            start: 0.5,
            sweep: -1.0,
        };
        let circ = CircularArc::from_center_arc(&arc).unwrap();
        assert_eq!(circ.direction(), ArcDirection::Clockwise);
        assert_relative_eq!(circ.start_point(), arc.start_point(), epsilon = 1e-12);
        assert_relative_eq!(circ.end_point(), arc.end_point(), epsilon = 1e-12);
    }
}
