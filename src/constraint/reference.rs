//! Which sub-part of a shape a constraint binds to

use std::fmt;

use crate::error::{Error, Result};
use crate::geometry::{Geometry, Line, Point, Shape, ShapeKind};
use crate::id::GeometryId;
use crate::kernel::{Point2, Vector2};
use crate::sketch::Sketch;

/// Sub-element selector of a constraint operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintReference {
    /// The whole curve or point
    Core,
    /// First endpoint of a segment or arc
    Start,
    /// Last endpoint of a segment or arc
    End,
    /// Center of a circle, ellipse or arc
    Center,
    /// Origin of the sketch frame
    Origin,
    /// Horizontal axis of the sketch frame
    XAxis,
    /// Vertical axis of the sketch frame
    YAxis,
}

impl ConstraintReference {
    /// All references, in declaration order
    pub const ALL: [ConstraintReference; 7] = [
        ConstraintReference::Core,
        ConstraintReference::Start,
        ConstraintReference::End,
        ConstraintReference::Center,
        ConstraintReference::Origin,
        ConstraintReference::XAxis,
        ConstraintReference::YAxis,
    ];

    /// Stable name used in documents
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintReference::Core => "core",
            ConstraintReference::Start => "start",
            ConstraintReference::End => "end",
            ConstraintReference::Center => "center",
            ConstraintReference::Origin => "origin",
            ConstraintReference::XAxis => "x-axis",
            ConstraintReference::YAxis => "y-axis",
        }
    }

    /// Parse a name produced by [`ConstraintReference::as_str`]
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == name)
            .ok_or_else(|| Error::parse_error_with_context("constraint reference", name, "a reference name"))
    }

    /// Whether this reference selects a point
    pub fn is_point(&self) -> bool {
        matches!(
            self,
            ConstraintReference::Start
                | ConstraintReference::End
                | ConstraintReference::Center
                | ConstraintReference::Origin
        )
    }
}

impl fmt::Display for ConstraintReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// References a shape of the given kind exposes
pub fn valid_references(kind: ShapeKind) -> &'static [ConstraintReference] {
    use ConstraintReference::*;
    match kind {
        ShapeKind::Point | ShapeKind::Line => &[Core],
        ShapeKind::LineSegment => &[Core, Start, End],
        ShapeKind::Circle | ShapeKind::Ellipse => &[Core, Center],
        ShapeKind::CircularArc | ShapeKind::EllipticalArc => &[Core, Start, End, Center],
    }
}

/// References the sketch frame itself exposes
pub const SKETCH_REFERENCES: [ConstraintReference; 3] = [
    ConstraintReference::Origin,
    ConstraintReference::XAxis,
    ConstraintReference::YAxis,
];

/// What an operand points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// A geometry entity of the owning sketch, with its kind at binding time
    Geometry(GeometryId, ShapeKind),
    /// The sketch's own coordinate frame
    Sketch,
}

/// One side of a constraint: a target plus the sub-element it binds to
///
/// Operands can only be built through validating constructors, so every
/// operand in a constraint names a reference its target actually has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operand {
    target: Target,
    reference: ConstraintReference,
}

impl Operand {
    /// Bind to a sub-element of `geometry`
    ///
    /// Fails with [`Error::Structural`] when the reference does not exist on
    /// the geometry's kind, e.g. an endpoint of a circle.
    pub fn on(geometry: &Geometry, reference: ConstraintReference) -> Result<Self> {
        Self::new(geometry.id, geometry.kind(), reference)
    }

    /// Bind to a geometry known only by id and kind (used by importers)
    pub fn new(id: GeometryId, kind: ShapeKind, reference: ConstraintReference) -> Result<Self> {
        if !valid_references(kind).contains(&reference) {
            return Err(Error::Structural(format!(
                "Reference '{}' is not valid for {} geometry {}",
                reference, kind, id
            )));
        }
        Ok(Self {
            target: Target::Geometry(id, kind),
            reference,
        })
    }

    /// Bind to a part of the sketch frame
    pub fn sketch(reference: ConstraintReference) -> Result<Self> {
        if !SKETCH_REFERENCES.contains(&reference) {
            return Err(Error::Structural(format!(
                "Reference '{}' is not valid for the sketch frame",
                reference
            )));
        }
        Ok(Self {
            target: Target::Sketch,
            reference,
        })
    }

    /// The sketch origin
    pub fn sketch_origin() -> Self {
        Self {
            target: Target::Sketch,
            reference: ConstraintReference::Origin,
        }
    }

    /// The sketch's horizontal axis
    pub fn sketch_x_axis() -> Self {
        Self {
            target: Target::Sketch,
            reference: ConstraintReference::XAxis,
        }
    }

    /// The sketch's vertical axis
    pub fn sketch_y_axis() -> Self {
        Self {
            target: Target::Sketch,
            reference: ConstraintReference::YAxis,
        }
    }

    /// Target of the operand
    pub fn target(&self) -> Target {
        self.target
    }

    /// Sub-element selector
    pub fn reference(&self) -> ConstraintReference {
        self.reference
    }

    /// Id of the referenced geometry, if any
    pub fn geometry_id(&self) -> Option<GeometryId> {
        match self.target {
            Target::Geometry(id, _) => Some(id),
            Target::Sketch => None,
        }
    }

    /// Kind of the referenced geometry, if any
    pub fn kind(&self) -> Option<ShapeKind> {
        match self.target {
            Target::Geometry(_, kind) => Some(kind),
            Target::Sketch => None,
        }
    }

    /// Whether the operand denotes a single point
    pub fn is_point_like(&self) -> bool {
        self.reference.is_point()
            || (self.reference == ConstraintReference::Core && self.kind() == Some(ShapeKind::Point))
    }

    /// Whether the operand denotes a straight line or segment
    pub fn is_line_like(&self) -> bool {
        match self.reference {
            ConstraintReference::XAxis | ConstraintReference::YAxis => true,
            ConstraintReference::Core => self.kind().is_some_and(|k| k.is_linear()),
            _ => false,
        }
    }

    /// Whether the operand is the whole curve of a shape of `kind`
    pub fn is_core_of(&self, predicate: impl Fn(ShapeKind) -> bool) -> bool {
        self.reference == ConstraintReference::Core && self.kind().is_some_and(predicate)
    }

    /// Resolve the operand to a concrete shape in sketch coordinates
    ///
    /// Point references resolve to [`Shape::Point`], frame axes to
    /// [`Shape::Line`]. Fails with [`Error::Structural`] if the geometry is no
    /// longer in the sketch or changed kind.
    pub fn resolve(&self, sketch: &Sketch) -> Result<Shape> {
        let (id, kind) = match self.target {
            Target::Sketch => return Ok(frame_shape(self.reference)),
            Target::Geometry(id, kind) => (id, kind),
        };
        let geometry = sketch
            .geometry(id)
            .ok_or_else(|| Error::missing_id("geometry", id))?;
        if geometry.kind() != kind {
            return Err(Error::Structural(format!(
                "Geometry {} is a {} but the constraint expects a {}",
                id,
                geometry.kind(),
                kind
            )));
        }
        let shape = geometry.shape;
        let point = match self.reference {
            ConstraintReference::Core => return Ok(shape),
            ConstraintReference::Start => shape.start_point(),
            ConstraintReference::End => shape.end_point(),
            ConstraintReference::Center => shape.center(),
            _ => None,
        };
        point
            .map(|p| Shape::Point(Point::from_position(p)))
            .ok_or_else(|| Error::Structural(format!("Geometry {} has no {} point", id, self.reference)))
    }
}

fn frame_shape(reference: ConstraintReference) -> Shape {
    match reference {
        ConstraintReference::XAxis => Shape::Line(Line::from_unit(Point2::origin(), Vector2::x())),
        ConstraintReference::YAxis => Shape::Line(Line::from_unit(Point2::origin(), Vector2::y())),
        _ => Shape::Point(Point::from_position(Point2::origin())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Circle, LineSegment};

    #[test]
    fn test_validity_table() {
        for kind in ShapeKind::ALL {
            let valid = valid_references(kind);
            assert!(valid.contains(&ConstraintReference::Core));
            assert!(!valid.contains(&ConstraintReference::Origin));
            assert_eq!(valid.contains(&ConstraintReference::Start), kind.has_endpoints());
            assert_eq!(valid.contains(&ConstraintReference::Center), kind.has_center());
        }
    }

    #[test]
    fn test_circle_has_no_endpoints() {
        let circle = Geometry::new(Circle::new(Point2::origin(), 1.0).unwrap());
        let err = Operand::on(&circle, ConstraintReference::Start).unwrap_err();
        assert!(err.is_structural());
        assert!(Operand::on(&circle, ConstraintReference::Center).is_ok());
    }

    #[test]
    fn test_point_and_line_likeness() {
        let seg = Geometry::new(LineSegment::new(Point2::origin(), Point2::new(1.0, 0.0)).unwrap());
        assert!(Operand::on(&seg, ConstraintReference::Core).unwrap().is_line_like());
        assert!(Operand::on(&seg, ConstraintReference::End).unwrap().is_point_like());
        assert!(Operand::sketch_origin().is_point_like());
        assert!(Operand::sketch_y_axis().is_line_like());
        assert!(Operand::sketch(ConstraintReference::Start).is_err());
    }
}
