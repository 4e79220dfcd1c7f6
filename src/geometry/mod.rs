//! Geometry model
//!
//! Seven entity kinds make up a sketch: [`Point`], [`Line`], [`LineSegment`],
//! [`Circle`], [`CircularArc`], [`Ellipse`] and [`EllipticalArc`]. They are
//! collected in the closed [`Shape`] variant, and a sketch owns them as
//! [`Geometry`] records carrying a stable [`GeometryId`].
//!
//! Shapes are expressed in the 2D coordinates of the plane they are drawn on.
//! [`Placed`] pairs a shape with that plane's [`CoordinateSystem`] when an
//! operation needs model-space positions.

mod conic;
mod line;

pub use conic::{ArcDirection, Circle, CircularArc, Ellipse, EllipticalArc};
pub use line::{Line, LineSegment, Point};

use std::fmt;

use crate::arc::{BoundingBox, arc_bounds, ellipse_bounds};
use crate::id::GeometryId;
use crate::kernel::{CoordinateSystem, Point2, Vector2};

/// Discriminant of [`Shape`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// [`Point`]
    Point,
    /// [`Line`]
    Line,
    /// [`LineSegment`]
    LineSegment,
    /// [`Circle`]
    Circle,
    /// [`CircularArc`]
    CircularArc,
    /// [`Ellipse`]
    Ellipse,
    /// [`EllipticalArc`]
    EllipticalArc,
}

impl ShapeKind {
    /// All kinds, in declaration order
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::Point,
        ShapeKind::Line,
        ShapeKind::LineSegment,
        ShapeKind::Circle,
        ShapeKind::CircularArc,
        ShapeKind::Ellipse,
        ShapeKind::EllipticalArc,
    ];

    /// Stable name used in documents and messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Point => "point",
            ShapeKind::Line => "line",
            ShapeKind::LineSegment => "line-segment",
            ShapeKind::Circle => "circle",
            ShapeKind::CircularArc => "circular-arc",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::EllipticalArc => "elliptical-arc",
        }
    }

    /// Parse a name produced by [`ShapeKind::as_str`]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Whether shapes of this kind are straight
    pub fn is_linear(&self) -> bool {
        matches!(self, ShapeKind::Line | ShapeKind::LineSegment)
    }

    /// Whether shapes of this kind have a circular edge
    pub fn is_circular(&self) -> bool {
        matches!(self, ShapeKind::Circle | ShapeKind::CircularArc)
    }

    /// Whether shapes of this kind have an elliptical edge
    pub fn is_elliptical(&self) -> bool {
        matches!(self, ShapeKind::Ellipse | ShapeKind::EllipticalArc)
    }

    /// Whether shapes of this kind have start and end points
    pub fn has_endpoints(&self) -> bool {
        matches!(
            self,
            ShapeKind::LineSegment | ShapeKind::CircularArc | ShapeKind::EllipticalArc
        )
    }

    /// Whether shapes of this kind have a center
    pub fn has_center(&self) -> bool {
        self.is_circular() || self.is_elliptical()
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A geometric entity in sketch-plane coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// A single point
    Point(Point),
    /// An infinite line
    Line(Line),
    /// A bounded segment
    LineSegment(LineSegment),
    /// A full circle
    Circle(Circle),
    /// An arc of a circle
    CircularArc(CircularArc),
    /// A full ellipse
    Ellipse(Ellipse),
    /// An arc of an ellipse
    EllipticalArc(EllipticalArc),
}

impl Shape {
    /// Kind of this shape
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Point(_) => ShapeKind::Point,
            Shape::Line(_) => ShapeKind::Line,
            Shape::LineSegment(_) => ShapeKind::LineSegment,
            Shape::Circle(_) => ShapeKind::Circle,
            Shape::CircularArc(_) => ShapeKind::CircularArc,
            Shape::Ellipse(_) => ShapeKind::Ellipse,
            Shape::EllipticalArc(_) => ShapeKind::EllipticalArc,
        }
    }

    /// Start point of segments and arcs; the position of a point
    pub fn start_point(&self) -> Option<Point2> {
        match self {
            Shape::Point(p) => Some(p.position()),
            Shape::LineSegment(s) => Some(s.start()),
            Shape::CircularArc(a) => Some(a.start_point()),
            Shape::EllipticalArc(a) => Some(a.start_point()),
            Shape::Line(_) | Shape::Circle(_) | Shape::Ellipse(_) => None,
        }
    }

    /// End point of segments and arcs; the position of a point
    pub fn end_point(&self) -> Option<Point2> {
        match self {
            Shape::Point(p) => Some(p.position()),
            Shape::LineSegment(s) => Some(s.end()),
            Shape::CircularArc(a) => Some(a.end_point()),
            Shape::EllipticalArc(a) => Some(a.end_point()),
            Shape::Line(_) | Shape::Circle(_) | Shape::Ellipse(_) => None,
        }
    }

    /// Center of circles, ellipses and their arcs
    pub fn center(&self) -> Option<Point2> {
        match self {
            Shape::Circle(c) => Some(c.center()),
            Shape::CircularArc(a) => Some(a.center()),
            Shape::Ellipse(e) => Some(e.center()),
            Shape::EllipticalArc(a) => Some(a.center()),
            Shape::Point(_) | Shape::Line(_) | Shape::LineSegment(_) => None,
        }
    }

    /// Axis-aligned bounds; `None` for unbounded lines
    pub fn bounds(&self) -> Option<BoundingBox> {
        match self {
            Shape::Point(p) => Some(BoundingBox::from_point(p.position())),
            Shape::Line(_) => None,
            Shape::LineSegment(s) => BoundingBox::from_points([s.start(), s.end()]),
            Shape::Circle(c) => Some(ellipse_bounds(&c.center(), c.radius(), c.radius(), 0.0)),
            Shape::CircularArc(a) => Some(arc_bounds(&a.to_center_arc())),
            Shape::Ellipse(e) => Some(ellipse_bounds(
                &e.center(),
                e.semi_major(),
                e.semi_minor(),
                e.rotation(),
            )),
            Shape::EllipticalArc(a) => Some(arc_bounds(&a.to_center_arc())),
        }
    }

    /// Mirror image across the x axis
    ///
    /// Used by bridges whose documents run the y axis downwards. Mirroring
    /// negates angles, so arc directions flip.
    pub fn mirrored_y(&self) -> Shape {
        match self {
            Shape::Point(p) => Shape::Point(p.mirrored_y()),
            Shape::Line(l) => Shape::Line(l.mirrored_y()),
            Shape::LineSegment(s) => Shape::LineSegment(s.mirrored_y()),
            Shape::Circle(c) => Shape::Circle(c.mirrored_y()),
            Shape::CircularArc(a) => Shape::CircularArc(a.mirrored_y()),
            Shape::Ellipse(e) => Shape::Ellipse(e.mirrored_y()),
            Shape::EllipticalArc(a) => Shape::EllipticalArc(a.mirrored_y()),
        }
    }

    /// The same shape moved by `offset`
    pub fn translated(&self, offset: &Vector2) -> Shape {
        match self {
            Shape::Point(p) => Shape::Point(p.translated(offset)),
            Shape::Line(l) => Shape::Line(l.translated(offset)),
            Shape::LineSegment(s) => Shape::LineSegment(s.translated(offset)),
            Shape::Circle(c) => Shape::Circle(c.translated(offset)),
            Shape::CircularArc(a) => Shape::CircularArc(a.translated(offset)),
            Shape::Ellipse(e) => Shape::Ellipse(e.translated(offset)),
            Shape::EllipticalArc(a) => Shape::EllipticalArc(a.translated(offset)),
        }
    }

    /// Pair this shape with the frame it is drawn on
    pub fn on<'a>(&'a self, frame: &CoordinateSystem) -> Placed<'a> {
        Placed {
            shape: self,
            frame: *frame,
        }
    }
}

macro_rules! shape_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Shape {
                fn from(value: $variant) -> Self {
                    Shape::$variant(value)
                }
            }
        )*
    };
}

shape_from!(Point, Line, LineSegment, Circle, CircularArc, Ellipse, EllipticalArc);

/// A shape owned by a sketch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// Identifier, unique within the owning sketch
    pub id: GeometryId,
    /// The shape itself
    pub shape: Shape,
    /// Construction geometry guides constraints but is not part of the profile
    pub construction: bool,
}

impl Geometry {
    /// Wrap a shape with a fresh identifier
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self::with_id(GeometryId::new(), shape)
    }

    /// Wrap a shape with a known identifier (used by importers)
    pub fn with_id(id: GeometryId, shape: impl Into<Shape>) -> Self {
        Self {
            id,
            shape: shape.into(),
            construction: false,
        }
    }

    /// Mark as construction geometry
    pub fn construction(mut self) -> Self {
        self.construction = true;
        self
    }

    /// Kind of the wrapped shape
    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }
}

/// A shape together with the coordinate system it is drawn on
#[derive(Debug, Clone, Copy)]
pub struct Placed<'a> {
    /// The shape in frame-local coordinates
    pub shape: &'a Shape,
    /// Frame of the sketch plane
    pub frame: CoordinateSystem,
}

impl<'a> From<&'a Shape> for Placed<'a> {
    fn from(shape: &'a Shape) -> Self {
        Placed {
            shape,
            frame: CoordinateSystem::world(),
        }
    }
}

impl<'a> From<&'a Geometry> for Placed<'a> {
    fn from(geometry: &'a Geometry) -> Self {
        Placed::from(&geometry.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{FRAC_PI_2, Vector2};
    use approx::assert_relative_eq;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ShapeKind::ALL {
            assert_eq!(ShapeKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(ShapeKind::from_name("spline"), None);
    }

    #[test]
    fn test_mirror_flips_arc_direction() {
        let arc = CircularArc::new(Point2::new(0.0, 1.0), 2.0, 0.0, FRAC_PI_2, ArcDirection::CounterClockwise).unwrap();
        let mirrored = Shape::from(arc).mirrored_y();
        let Shape::CircularArc(m) = mirrored else {
            panic!("mirroring changed the kind");
        };
        assert_eq!(m.direction(), ArcDirection::Clockwise);
        assert_relative_eq!(m.start_point(), Point2::new(2.0, -1.0), epsilon = 1e-12);
        assert_relative_eq!(m.end_point(), Point2::new(0.0, -3.0), epsilon = 1e-12);
        assert_eq!(mirrored.mirrored_y().kind(), ShapeKind::CircularArc);
    }

    #[test]
    fn test_mirror_elliptical_arc_points() {
        let ellipse = Ellipse::new(Point2::new(1.0, 2.0), 3.0, 1.0, 0.4).unwrap();
        let arc = EllipticalArc::new(ellipse, 0.3, 2.0, ArcDirection::CounterClockwise).unwrap();
        let mirrored = Shape::from(arc).mirrored_y();
        let start = mirrored.start_point().unwrap();
        let end = mirrored.end_point().unwrap();
        assert_relative_eq!(start, Point2::new(arc.start_point().x, -arc.start_point().y), epsilon = 1e-12);
        assert_relative_eq!(end, Point2::new(arc.end_point().x, -arc.end_point().y), epsilon = 1e-12);
    }

    #[test]
    fn test_bounds_of_line_is_none() {
        let line = Line::new(Point2::origin(), Vector2::new(1.0, 0.0)).unwrap();
        assert!(Shape::from(line).bounds().is_none());
        let circle = Circle::new(Point2::new(1.0, 1.0), 1.0).unwrap();
        let bbox = Shape::from(circle).bounds().unwrap();
        assert_relative_eq!(bbox.min, Point2::new(0.0, 0.0));
    }
}
