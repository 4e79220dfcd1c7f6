//! Constraint model
//!
//! Constraints are declarative facts about sketch geometry: "this segment is
//! horizontal", "these endpoints coincide", "this radius is 5 mm". They are
//! validated structurally when built with [`make_constraint`] (operand count,
//! operand kinds, value type and sign) and never solved. Whether the geometry
//! actually satisfies a constraint is answered separately by
//! [`Constraint::is_satisfied`].

mod reference;
mod units;

pub use reference::{ConstraintReference, Operand, SKETCH_REFERENCES, Target, valid_references};
pub use units::{Angle, AngleUnit, Length, LengthUnit, Quantity};

use std::fmt;

use crate::error::{Error, Result};
use crate::geometry::{Shape, ShapeKind};
use crate::id::{ConstraintId, GeometryId};
use crate::kernel::{Point2, Vector2};
use crate::relations;
use crate::sketch::Sketch;
use crate::tolerance::Tolerance;

/// Kind of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// Two points are the same point
    Coincident,
    /// Two straight entities run parallel
    Parallel,
    /// Two straight entities meet at a right angle
    Perpendicular,
    /// Two segments have equal length, or two curves equal radii
    Equal,
    /// A straight entity, or the line through two points, is horizontal
    Horizontal,
    /// A straight entity, or the line through two points, is vertical
    Vertical,
    /// Distance between two entities, or length of a segment
    Distance,
    /// Signed horizontal offset between two points
    HorizontalDistance,
    /// Signed vertical offset between two points
    VerticalDistance,
    /// Radius of a circle or circular arc
    Radius,
    /// Diameter of a circle or circular arc
    Diameter,
    /// Angle between two straight entities
    Angle,
}

impl ConstraintKind {
    /// All kinds, in declaration order
    pub const ALL: [ConstraintKind; 12] = [
        ConstraintKind::Coincident,
        ConstraintKind::Parallel,
        ConstraintKind::Perpendicular,
        ConstraintKind::Equal,
        ConstraintKind::Horizontal,
        ConstraintKind::Vertical,
        ConstraintKind::Distance,
        ConstraintKind::HorizontalDistance,
        ConstraintKind::VerticalDistance,
        ConstraintKind::Radius,
        ConstraintKind::Diameter,
        ConstraintKind::Angle,
    ];

    /// Stable name used in documents
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Coincident => "coincident",
            ConstraintKind::Parallel => "parallel",
            ConstraintKind::Perpendicular => "perpendicular",
            ConstraintKind::Equal => "equal",
            ConstraintKind::Horizontal => "horizontal",
            ConstraintKind::Vertical => "vertical",
            ConstraintKind::Distance => "distance",
            ConstraintKind::HorizontalDistance => "horizontal-distance",
            ConstraintKind::VerticalDistance => "vertical-distance",
            ConstraintKind::Radius => "radius",
            ConstraintKind::Diameter => "diameter",
            ConstraintKind::Angle => "angle",
        }
    }

    /// Parse a name produced by [`ConstraintKind::as_str`]
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| Error::UnsupportedConstraint(format!("unknown constraint kind '{}'", name)))
    }

    /// Whether constraints of this kind carry a value
    pub fn is_dimensional(&self) -> bool {
        matches!(
            self,
            ConstraintKind::Distance
                | ConstraintKind::HorizontalDistance
                | ConstraintKind::VerticalDistance
                | ConstraintKind::Radius
                | ConstraintKind::Diameter
                | ConstraintKind::Angle
        )
    }

    /// Whether the value must not be negative
    fn non_negative(&self) -> bool {
        matches!(
            self,
            ConstraintKind::Distance | ConstraintKind::Radius | ConstraintKind::Diameter
        )
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated constraint record
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    id: ConstraintId,
    kind: ConstraintKind,
    operands: Vec<Operand>,
    value: Option<Quantity>,
}

/// Build a constraint, validating operands and value for `kind`
///
/// Operand rules:
///
/// | kind | operands |
/// |------|----------|
/// | coincident | two points |
/// | horizontal, vertical | one line, or two points |
/// | parallel, perpendicular, angle | two lines |
/// | equal | two segments, two circular curves, or two elliptical curves |
/// | distance | one segment, or two points/lines |
/// | horizontal/vertical distance | one segment, or two points |
/// | radius, diameter | one circle or circular arc |
///
/// "Point" means a point entity or a start/end/center/origin reference;
/// "line" means a line or segment core or a sketch axis.
///
/// Wrong operand shapes fail with [`Error::Structural`]. Dimensional kinds
/// need a finite value of the matching quantity, and distance, radius and
/// diameter values must not be negative ([`Error::InvalidGeometry`]).
pub fn make_constraint(kind: ConstraintKind, operands: Vec<Operand>, value: Option<Quantity>) -> Result<Constraint> {
    check_operands(kind, &operands)?;
    check_value(kind, value)?;
    Ok(Constraint {
        id: ConstraintId::new(),
        kind,
        operands,
        value,
    })
}

fn describe(operands: &[Operand]) -> String {
    let parts: Vec<String> = operands
        .iter()
        .map(|op| match op.kind() {
            Some(kind) => format!("{} of {}", op.reference(), kind),
            None => format!("sketch {}", op.reference()),
        })
        .collect();
    if parts.is_empty() {
        "no operands".to_string()
    } else {
        parts.join(", ")
    }
}

fn check_operands(kind: ConstraintKind, operands: &[Operand]) -> Result<()> {
    use ConstraintKind::*;

    let is_segment = |op: &Operand| op.is_core_of(|k| k == ShapeKind::LineSegment);
    let same_family = |a: &Operand, b: &Operand| {
        (is_segment(a) && is_segment(b))
            || (a.is_core_of(|k| k.is_circular()) && b.is_core_of(|k| k.is_circular()))
            || (a.is_core_of(|k| k.is_elliptical()) && b.is_core_of(|k| k.is_elliptical()))
    };
    let point_or_line = |op: &Operand| op.is_point_like() || op.is_line_like();

    let (ok, expected) = match (kind, operands) {
        (Coincident, [a, b]) => (a.is_point_like() && b.is_point_like(), "two points"),
        (Horizontal | Vertical, [a]) => (a.is_line_like(), "one line or two points"),
        (Horizontal | Vertical, [a, b]) => (a.is_point_like() && b.is_point_like(), "one line or two points"),
        (Parallel | Perpendicular | ConstraintKind::Angle, [a, b]) => (a.is_line_like() && b.is_line_like(), "two lines"),
        (Equal, [a, b]) => (same_family(a, b), "two curves of the same family"),
        (Distance, [a]) => (is_segment(a), "one segment or two points/lines"),
        (Distance, [a, b]) => (point_or_line(a) && point_or_line(b), "one segment or two points/lines"),
        (HorizontalDistance | VerticalDistance, [a]) => (is_segment(a), "one segment or two points"),
        (HorizontalDistance | VerticalDistance, [a, b]) => {
            (a.is_point_like() && b.is_point_like(), "one segment or two points")
        }
        (Radius | Diameter, [a]) => (a.is_core_of(|k| k.is_circular()), "one circle or circular arc"),
        (Coincident | Parallel | Perpendicular | ConstraintKind::Angle | Equal, _) => (false, "exactly two operands"),
        (Horizontal | Vertical | Distance | HorizontalDistance | VerticalDistance, _) => {
            (false, "one or two operands")
        }
        (Radius | Diameter, _) => (false, "exactly one operand"),
    };
    if !ok {
        return Err(Error::Structural(format!(
            "{} constraint expects {}, got {}",
            kind,
            expected,
            describe(operands)
        )));
    }
    if let [a, b] = operands
        && a == b
    {
        return Err(Error::Structural(format!(
            "{} constraint binds the same operand twice ({})",
            kind,
            describe(&[*a])
        )));
    }
    Ok(())
}

fn check_value(kind: ConstraintKind, value: Option<Quantity>) -> Result<()> {
    let quantity = match (kind.is_dimensional(), value) {
        (false, None) => return Ok(()),
        (false, Some(q)) => {
            return Err(Error::Structural(format!("{} constraint takes no value, got {}", kind, q)));
        }
        (true, None) => return Err(Error::Structural(format!("{} constraint requires a value", kind))),
        (true, Some(q)) => q,
    };
    if !quantity.value().is_finite() {
        return Err(Error::InvalidGeometry(format!(
            "{} constraint value must be finite, got {}",
            kind,
            quantity.value()
        )));
    }
    match (kind, quantity) {
        (ConstraintKind::Angle, Quantity::Angle(_)) => Ok(()),
        (ConstraintKind::Angle, Quantity::Length(_)) => {
            Err(Error::Structural(format!("{} constraint expects an angle, got {}", kind, quantity)))
        }
        (_, Quantity::Angle(_)) => Err(Error::Structural(format!(
            "{} constraint expects a length, got {}",
            kind, quantity
        ))),
        (_, Quantity::Length(length)) if kind.non_negative() && length.value < 0.0 => Err(Error::InvalidGeometry(
            format!("{} constraint value must not be negative, got {}", kind, quantity),
        )),
        _ => Ok(()),
    }
}

fn position(shape: &Shape) -> Option<Point2> {
    match shape {
        Shape::Point(p) => Some(p.position()),
        _ => None,
    }
}

fn direction(shape: &Shape) -> Option<Vector2> {
    match shape {
        Shape::Line(l) => Some(l.direction()),
        Shape::LineSegment(s) => Some(s.end() - s.start()),
        _ => None,
    }
}

fn segment_delta(shape: &Shape) -> Option<Vector2> {
    match shape {
        Shape::LineSegment(s) => Some(s.end() - s.start()),
        _ => None,
    }
}

fn radius(shape: &Shape) -> Option<f64> {
    match shape {
        Shape::Circle(c) => Some(c.radius()),
        Shape::CircularArc(a) => Some(a.radius()),
        _ => None,
    }
}

impl Constraint {
    /// Replace the identifier (used by importers to keep document ids)
    pub fn with_id(mut self, id: ConstraintId) -> Self {
        self.id = id;
        self
    }

    /// Identifier, unique within the owning sketch
    pub fn id(&self) -> ConstraintId {
        self.id
    }

    /// Kind of the constraint
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// Operands in declaration order
    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// Value of a dimensional constraint
    pub fn value(&self) -> Option<Quantity> {
        self.value
    }

    /// Whether the constraint carries a value
    pub fn is_dimensional(&self) -> bool {
        self.kind.is_dimensional()
    }

    /// Whether any operand refers to geometry `id`
    pub fn references(&self, id: GeometryId) -> bool {
        self.geometry_ids().any(|g| g == id)
    }

    /// Ids of all referenced geometry
    pub fn geometry_ids(&self) -> impl Iterator<Item = GeometryId> + '_ {
        self.operands.iter().filter_map(Operand::geometry_id)
    }

    /// Whether the sketch geometry currently satisfies this constraint
    ///
    /// Sketch coordinates are millimeters; values are compared in canonical
    /// units. Angles compare the undirected angle between the two lines.
    /// Fails with [`Error::Structural`] if a referenced geometry is missing.
    pub fn is_satisfied(&self, sketch: &Sketch, tol: &Tolerance) -> Result<bool> {
        use ConstraintKind::*;

        let shapes = self
            .operands
            .iter()
            .map(|op| op.resolve(sketch))
            .collect::<Result<Vec<_>>>()?;
        let target = self.value.map(|q| q.canonical()).unwrap_or_default();
        let malformed = || Error::Structural(format!("{} constraint {} has malformed operands", self.kind, self.id));

        let satisfied = match (self.kind, shapes.as_slice()) {
            (Coincident, [a, b]) => relations::coincident(a, b, tol)?,
            (Horizontal, [a]) => {
                let d = direction(a).ok_or_else(malformed)?;
                tol.is_zero(d.y / d.norm())
            }
            (Vertical, [a]) => {
                let d = direction(a).ok_or_else(malformed)?;
                tol.is_zero(d.x / d.norm())
            }
            (Horizontal | Vertical, [a, b]) => {
                let (p, q) = (position(a).ok_or_else(malformed)?, position(b).ok_or_else(malformed)?);
                if self.kind == Horizontal {
                    tol.is_close(p.y, q.y)
                } else {
                    tol.is_close(p.x, q.x)
                }
            }
            (Parallel, [a, b]) => relations::parallel(a, b, tol)?,
            (Perpendicular, [a, b]) => relations::perpendicular(a, b, tol)?,
            (Equal, [a, b]) => relations::equal(a, b, tol)?,
            (ConstraintKind::Angle, [a, b]) => tol.is_close(relations::angle_between(a, b)?, target),
            (Distance, [a]) => tol.is_close(segment_delta(a).ok_or_else(malformed)?.norm(), target),
            (Distance, [a, b]) => tol.is_close(relations::distance_between(a, b, tol)?, target),
            (HorizontalDistance | VerticalDistance, [a]) => {
                let d = segment_delta(a).ok_or_else(malformed)?;
                let offset = if self.kind == HorizontalDistance { d.x } else { d.y };
                tol.is_close(offset, target)
            }
            (HorizontalDistance | VerticalDistance, [a, b]) => {
                let d = position(b).ok_or_else(malformed)? - position(a).ok_or_else(malformed)?;
                let offset = if self.kind == HorizontalDistance { d.x } else { d.y };
                tol.is_close(offset, target)
            }
            (Radius, [a]) => tol.is_close(radius(a).ok_or_else(malformed)?, target),
            (Diameter, [a]) => tol.is_close(2.0 * radius(a).ok_or_else(malformed)?, target),
            _ => return Err(malformed()),
        };
        Ok(satisfied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ArcDirection, Circle, CircularArc, Geometry, LineSegment, Point};
    use crate::kernel::FRAC_PI_2;

    fn segment() -> Geometry {
        Geometry::new(LineSegment::new(Point2::new(0.0, 0.0), Point2::new(2.0, 0.0)).unwrap())
    }

    fn core(g: &Geometry) -> Operand {
        Operand::on(g, ConstraintReference::Core).unwrap()
    }

    #[test]
    fn test_horizontal_one_or_two_operands() {
        let seg = segment();
        let start = Operand::on(&seg, ConstraintReference::Start).unwrap();
        let end = Operand::on(&seg, ConstraintReference::End).unwrap();
        assert!(make_constraint(ConstraintKind::Horizontal, vec![core(&seg)], None).is_ok());
        assert!(make_constraint(ConstraintKind::Horizontal, vec![start, end], None).is_ok());
        let err = make_constraint(ConstraintKind::Horizontal, vec![start], None).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_radius_requires_circular_core() {
        let seg = segment();
        let circle = Geometry::new(Circle::new(Point2::origin(), 1.0).unwrap());
        assert!(make_constraint(ConstraintKind::Radius, vec![core(&circle)], Some(Quantity::mm(1.0))).is_ok());
        assert!(make_constraint(ConstraintKind::Radius, vec![core(&seg)], Some(Quantity::mm(1.0))).is_err());
        assert!(matches!(
            make_constraint(ConstraintKind::Radius, vec![core(&circle)], Some(Quantity::mm(-1.0))),
            Err(Error::InvalidGeometry(_))
        ));
        assert!(matches!(
            make_constraint(ConstraintKind::Radius, vec![core(&circle)], None),
            Err(Error::Structural(_))
        ));
    }

    #[test]
    fn test_value_type_must_match_kind() {
        let a = segment();
        let b = Geometry::new(LineSegment::new(Point2::new(0.0, 0.0), Point2::new(0.0, 1.0)).unwrap());
        assert!(make_constraint(ConstraintKind::Angle, vec![core(&a), core(&b)], Some(Quantity::degrees(90.0))).is_ok());
        assert!(make_constraint(ConstraintKind::Angle, vec![core(&a), core(&b)], Some(Quantity::mm(90.0))).is_err());
        assert!(make_constraint(ConstraintKind::Parallel, vec![core(&a), core(&b)], Some(Quantity::mm(1.0))).is_err());
        assert!(matches!(
            make_constraint(ConstraintKind::Distance, vec![core(&a)], Some(Quantity::mm(f64::NAN))),
            Err(Error::InvalidGeometry(_))
        ));
        // signed offsets are allowed
        assert!(make_constraint(ConstraintKind::HorizontalDistance, vec![core(&a)], Some(Quantity::mm(-2.0))).is_ok());
    }

    #[test]
    fn test_same_operand_twice_rejected() {
        let seg = segment();
        let start = Operand::on(&seg, ConstraintReference::Start).unwrap();
        assert!(make_constraint(ConstraintKind::Coincident, vec![start, start], None).is_err());
    }

    #[test]
    fn test_equal_families() {
        let circle = Geometry::new(Circle::new(Point2::origin(), 1.0).unwrap());
        let arc = Geometry::new(
            CircularArc::new(Point2::origin(), 2.0, 0.0, FRAC_PI_2, ArcDirection::CounterClockwise).unwrap(),
        );
        assert!(make_constraint(ConstraintKind::Equal, vec![core(&circle), core(&arc)], None).is_ok());
        assert!(make_constraint(ConstraintKind::Equal, vec![core(&circle), core(&segment())], None).is_err());
    }

    #[test]
    fn test_is_satisfied_against_sketch() {
        let mut sketch = Sketch::new("s", crate::kernel::CoordinateSystem::world());
        let seg = sketch.add_geometry(LineSegment::new(Point2::new(1.0, 1.0), Point2::new(4.0, 1.0)).unwrap());
        let point = sketch.add_geometry(Point::new(0.0, 0.0).unwrap());
        let seg_core = Operand::new(seg, ShapeKind::LineSegment, ConstraintReference::Core).unwrap();
        let seg_start = Operand::new(seg, ShapeKind::LineSegment, ConstraintReference::Start).unwrap();
        let pt = Operand::new(point, ShapeKind::Point, ConstraintReference::Core).unwrap();
        let tol = Tolerance::default();

        let horizontal = make_constraint(ConstraintKind::Horizontal, vec![seg_core], None).unwrap();
        assert!(horizontal.is_satisfied(&sketch, &tol).unwrap());
        let length = make_constraint(ConstraintKind::Distance, vec![seg_core], Some(Quantity::mm(3.0))).unwrap();
        assert!(length.is_satisfied(&sketch, &tol).unwrap());
        let inches = make_constraint(
            ConstraintKind::Distance,
            vec![seg_core],
            Some(Quantity::Length(Length::new(3.0, LengthUnit::Inch))),
        )
        .unwrap();
        assert!(!inches.is_satisfied(&sketch, &tol).unwrap());
        let pinned = make_constraint(ConstraintKind::Coincident, vec![pt, Operand::sketch_origin()], None).unwrap();
        assert!(pinned.is_satisfied(&sketch, &tol).unwrap());
        let offset = make_constraint(
            ConstraintKind::VerticalDistance,
            vec![pt, seg_start],
            Some(Quantity::mm(1.0)),
        )
        .unwrap();
        assert!(offset.is_satisfied(&sketch, &tol).unwrap());
        assert!(offset.references(seg));
    }
}
