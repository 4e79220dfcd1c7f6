use super::CenterArc;
use crate::kernel::{PI, Point2, Vector2};
use crate::tolerance::Tolerance;

/// Axis-aligned bounding box in a sketch plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Point2,
    /// Maximum corner
    pub max: Point2,
}

impl BoundingBox {
    /// Degenerate box around a single point
    pub fn from_point(p: Point2) -> Self {
        Self { min: p, max: p }
    }

    /// Smallest box enclosing all points, or `None` for an empty iterator
    pub fn from_points<I: IntoIterator<Item = Point2>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::from_point(first);
        for p in iter {
            bbox.include(&p);
        }
        Some(bbox)
    }

    /// Grow the box to include `p`
    pub fn include(&mut self, p: &Point2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// Smallest box enclosing both boxes
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let mut out = *self;
        out.include(&other.min);
        out.include(&other.max);
        out
    }

    /// Box grown by `margin` on every side
    pub fn expand(&self, margin: f64) -> BoundingBox {
        let m = Vector2::new(margin, margin);
        BoundingBox {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Whether `p` is inside the box or on its boundary, within `tol`
    pub fn contains(&self, p: &Point2, tol: &Tolerance) -> bool {
        let inside = |v: f64, lo: f64, hi: f64| {
            (v >= lo || tol.is_close(v, lo)) && (v <= hi || tol.is_close(v, hi))
        };
        inside(p.x, self.min.x, self.max.x) && inside(p.y, self.min.y, self.max.y)
    }

    /// Extent along x
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Extent along y
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Union of several boxes, or `None` if there are none
pub fn bounds_of<'a, I: IntoIterator<Item = &'a BoundingBox>>(boxes: I) -> Option<BoundingBox> {
    boxes.into_iter().fold(None, |acc, b| match acc {
        None => Some(*b),
        Some(a) => Some(a.union(b)),
    })
}

/// Tight box around a full ellipse (or circle when `rx == ry`)
pub fn ellipse_bounds(center: &Point2, rx: f64, ry: f64, rotation: f64) -> BoundingBox {
    let (sin, cos) = rotation.sin_cos();
    let half_width = (rx * rx * cos * cos + ry * ry * sin * sin).sqrt();
    let half_height = (rx * rx * sin * sin + ry * ry * cos * cos).sqrt();
    let half = Vector2::new(half_width, half_height);
    BoundingBox {
        min: *center - half,
        max: *center + half,
    }
}

/// Tight box around a circular or elliptical arc
///
/// Starts from the two endpoints and adds each axis extremum whose parametric
/// angle falls inside the swept range, so arcs crossing an extremum (for
/// example 350° through 0° to 10°) are not clipped to their chord.
pub fn arc_bounds(arc: &CenterArc) -> BoundingBox {
    let tol = Tolerance::default();
    let mut bbox = BoundingBox::from_point(arc.start_point());
    bbox.include(&arc.end_point());

    let (sin, cos) = arc.rotation.sin_cos();
    let x_extremum = (-arc.ry * sin).atan2(arc.rx * cos);
    let y_extremum = (arc.ry * cos).atan2(arc.rx * sin);
    for t in [x_extremum, x_extremum + PI, y_extremum, y_extremum + PI] {
        if arc.contains_angle(t, &tol) {
            bbox.include(&arc.point_at(t));
        }
    }
    bbox
}
