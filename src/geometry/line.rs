use crate::error::{Error, Result};
use crate::kernel::{Point2, Vector2, ensure_finite, normalize2};

/// A sketch point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    position: Point2,
}

impl Point {
    /// Create a point from coordinates
    pub fn new(x: f64, y: f64) -> Result<Self> {
        ensure_finite("point", &[x, y])?;
        Ok(Self {
            position: Point2::new(x, y),
        })
    }

    /// Create a point from an existing position
    pub fn at(position: Point2) -> Result<Self> {
        Self::new(position.x, position.y)
    }

    /// Position of the point
    pub fn position(&self) -> Point2 {
        self.position
    }

    /// Move the point
    pub fn set_position(&mut self, position: Point2) -> Result<()> {
        *self = Self::at(position)?;
        Ok(())
    }

    /// Wrap a position already known to be finite
    pub(crate) fn from_position(position: Point2) -> Self {
        Self { position }
    }

    pub(crate) fn mirrored_y(&self) -> Self {
        Self {
            position: flip(&self.position),
        }
    }

    pub(crate) fn translated(&self, offset: &Vector2) -> Self {
        Self {
            position: self.position + *offset,
        }
    }
}

fn flip(p: &Point2) -> Point2 {
    Point2::new(p.x, -p.y)
}

/// An infinite line through a point along a unit direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    origin: Point2,
    direction: Vector2,
}

impl Line {
    /// Create a line through `origin` along `direction`
    ///
    /// The direction is normalized; a zero direction fails with
    /// [`Error::DegenerateVector`].
    pub fn new(origin: Point2, direction: Vector2) -> Result<Self> {
        ensure_finite("line", &[origin.x, origin.y, direction.x, direction.y])?;
        Ok(Self {
            origin,
            direction: normalize2(&direction)?,
        })
    }

    /// Line through two distinct points
    pub fn through(a: Point2, b: Point2) -> Result<Self> {
        Self::new(a, b - a)
    }

    /// A point on the line
    pub fn origin(&self) -> Point2 {
        self.origin
    }

    /// Unit direction of the line
    pub fn direction(&self) -> Vector2 {
        self.direction
    }

    /// Line along an axis that is already unit length
    pub(crate) fn from_unit(origin: Point2, direction: Vector2) -> Self {
        Self { origin, direction }
    }

    /// Point at signed distance `s` from the origin
    pub fn point_at(&self, s: f64) -> Point2 {
        self.origin + self.direction * s
    }

    pub(crate) fn mirrored_y(&self) -> Self {
        Self {
            origin: flip(&self.origin),
            direction: Vector2::new(self.direction.x, -self.direction.y),
        }
    }

    pub(crate) fn translated(&self, offset: &Vector2) -> Self {
        Self {
            origin: self.origin + *offset,
            direction: self.direction,
        }
    }
}

/// A finite line segment between two distinct points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    start: Point2,
    end: Point2,
}

impl LineSegment {
    /// Create a segment
    ///
    /// Coincident endpoints fail with [`Error::DegenerateGeometry`].
    pub fn new(start: Point2, end: Point2) -> Result<Self> {
        ensure_finite("line segment", &[start.x, start.y, end.x, end.y])?;
        if start == end {
            return Err(Error::DegenerateGeometry(format!(
                "line segment has zero length at ({}, {})",
                start.x, start.y
            )));
        }
        Ok(Self { start, end })
    }

    /// Start point
    pub fn start(&self) -> Point2 {
        self.start
    }

    /// End point
    pub fn end(&self) -> Point2 {
        self.end
    }

    /// Replace both endpoints, re-validating the segment
    pub fn set_endpoints(&mut self, start: Point2, end: Point2) -> Result<()> {
        *self = Self::new(start, end)?;
        Ok(())
    }

    /// Length of the segment
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Unit direction from start to end
    pub fn direction(&self) -> Vector2 {
        (self.end - self.start) / self.length()
    }

    /// Midpoint of the segment
    pub fn midpoint(&self) -> Point2 {
        nalgebra::center(&self.start, &self.end)
    }

    /// Infinite line carrying the segment
    pub fn to_line(&self) -> Line {
        Line {
            origin: self.start,
            direction: self.direction(),
        }
    }

    /// Segment with start and end swapped
    pub fn reversed(&self) -> LineSegment {
        LineSegment {
            start: self.end,
            end: self.start,
        }
    }

    pub(crate) fn mirrored_y(&self) -> Self {
        Self {
            start: flip(&self.start),
            end: flip(&self.end),
        }
    }

    pub(crate) fn translated(&self, offset: &Vector2) -> Self {
        Self {
            start: self.start + *offset,
            end: self.end + *offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_rejects_nan() {
        assert!(matches!(
            Point::new(f64::NAN, 0.0),
            Err(Error::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_line_normalizes_direction() {
        let line = Line::new(Point2::new(1.0, 1.0), Vector2::new(0.0, 5.0)).unwrap();
        assert_relative_eq!(line.direction(), Vector2::new(0.0, 1.0));
        assert_relative_eq!(line.point_at(2.0), Point2::new(1.0, 3.0));
        assert!(Line::through(Point2::origin(), Point2::origin()).is_err());
    }

    #[test]
    fn test_segment_invariants() {
        let mut seg = LineSegment::new(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0)).unwrap();
        assert_relative_eq!(seg.length(), 5.0);
        assert_relative_eq!(seg.midpoint(), Point2::new(1.5, 2.0));
        assert!(matches!(
            seg.set_endpoints(Point2::new(1.0, 1.0), Point2::new(1.0, 1.0)),
            Err(Error::DegenerateGeometry(_))
        ));
        // failed setter leaves the segment untouched
        assert_relative_eq!(seg.end(), Point2::new(3.0, 4.0));
        assert_eq!(seg.reversed().start(), seg.end());
    }
}
