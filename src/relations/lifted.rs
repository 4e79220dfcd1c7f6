//! World-space and plane-local views of shapes used by the relation functions

use crate::arc::CenterArc;
use crate::geometry::{Placed, Shape, ShapeKind};
use crate::kernel::{CoordinateSystem, FRAC_PI_2, Point2, Point3, Vector2, Vector3, positive_angle};
use crate::tolerance::Tolerance;

/// A straight entity: `origin + dir * s` for `s` in `[lo, hi]`
#[derive(Debug, Clone, Copy)]
pub(super) struct Linear {
    pub origin: Point3,
    pub dir: Vector3,
    pub lo: f64,
    pub hi: f64,
    pub kind: ShapeKind,
}

/// A circle, ellipse or arc of either, still attached to its frame
#[derive(Debug, Clone, Copy)]
pub(super) struct Conic {
    pub frame: CoordinateSystem,
    pub arc: CenterArc,
    pub full: bool,
    pub kind: ShapeKind,
}

#[derive(Debug, Clone, Copy)]
pub(super) enum Lifted {
    Point(Point3),
    Linear(Linear),
    Conic(Conic),
}

impl Lifted {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Lifted::Point(_) => ShapeKind::Point,
            Lifted::Linear(l) => l.kind,
            Lifted::Conic(c) => c.kind,
        }
    }

    /// Frame of the first conic of a pair, used as the common plane
    pub fn conic_frame(a: &Lifted, b: &Lifted) -> Option<CoordinateSystem> {
        match (a, b) {
            (Lifted::Conic(c), _) | (_, Lifted::Conic(c)) => Some(c.frame),
            _ => None,
        }
    }
}

impl<'a> From<Placed<'a>> for Lifted {
    fn from(placed: Placed<'a>) -> Self {
        let frame = placed.frame;
        let conic = |arc: CenterArc, full: bool, kind: ShapeKind| {
            Lifted::Conic(Conic {
                frame,
                arc,
                full,
                kind,
            })
        };
        match placed.shape {
            Shape::Point(p) => Lifted::Point(frame.to_world(&p.position())),
            Shape::Line(l) => {
                let d = l.direction();
                Lifted::Linear(Linear {
                    origin: frame.to_world(&l.origin()),
                    dir: frame.orientation() * Vector3::new(d.x, d.y, 0.0),
                    lo: f64::NEG_INFINITY,
                    hi: f64::INFINITY,
                    kind: ShapeKind::Line,
                })
            }
            Shape::LineSegment(s) => {
                let start = frame.to_world(&s.start());
                Lifted::Linear(Linear {
                    origin: start,
                    dir: frame.to_world(&s.end()) - start,
                    lo: 0.0,
                    hi: 1.0,
                    kind: ShapeKind::LineSegment,
                })
            }
            Shape::Circle(c) => conic(c.to_center_arc(), true, ShapeKind::Circle),
            Shape::CircularArc(a) => conic(a.to_center_arc(), false, ShapeKind::CircularArc),
            Shape::Ellipse(e) => conic(e.to_center_arc(), true, ShapeKind::Ellipse),
            Shape::EllipticalArc(a) => conic(a.to_center_arc(), false, ShapeKind::EllipticalArc),
        }
    }
}

impl Linear {
    pub fn is_bounded(&self) -> bool {
        self.lo.is_finite() && self.hi.is_finite()
    }

    pub fn point_at(&self, s: f64) -> Point3 {
        self.origin + self.dir * s
    }

    pub fn unit_dir(&self) -> Vector3 {
        self.dir.normalize()
    }

    pub fn endpoints(&self) -> Vec<Point3> {
        if self.is_bounded() {
            vec![self.point_at(self.lo), self.point_at(self.hi)]
        } else {
            Vec::new()
        }
    }

    /// Parameter of the foot of `p` on the carrier line (unclamped)
    pub fn param_of(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(&self.dir) / self.dir.norm_squared()
    }

    /// Foot of the perpendicular from `p` on the carrier line
    pub fn foot(&self, p: &Point3) -> Point3 {
        self.point_at(self.param_of(p))
    }

    /// Distance from `p` to the entity itself (clamped to its extent)
    pub fn distance_to(&self, p: &Point3) -> f64 {
        let s = self.param_of(p).clamp(self.lo, self.hi);
        (p - self.point_at(s)).norm()
    }

    /// Distance from `p` to the carrier line
    pub fn carrier_distance(&self, p: &Point3) -> f64 {
        (p - self.foot(p)).norm()
    }

    pub fn contains(&self, p: &Point3, tol: &Tolerance) -> bool {
        tol.is_zero(self.distance_to(p))
    }

    pub fn is_endpoint(&self, p: &Point3, tol: &Tolerance) -> bool {
        self.endpoints().iter().any(|e| tol.points_close3(e, p))
    }

    pub fn parallel_to(&self, other: &Linear, tol: &Tolerance) -> bool {
        tol.parallel3(&self.dir, &other.dir)
    }

    /// Whether the two carrier lines are the same line
    pub fn same_carrier(&self, other: &Linear, tol: &Tolerance) -> bool {
        self.parallel_to(other, tol) && tol.is_zero(self.carrier_distance(&other.origin))
    }

    /// Extent of `other` expressed in this entity's parameter
    fn interval_of(&self, other: &Linear) -> (f64, f64) {
        if !other.is_bounded() {
            return (f64::NEG_INFINITY, f64::INFINITY);
        }
        let a = self.param_of(&other.point_at(other.lo));
        let b = self.param_of(&other.point_at(other.hi));
        (a.min(b), a.max(b))
    }

    /// Shared parameter interval of two entities on the same carrier
    pub fn overlap_with(&self, other: &Linear) -> Option<(f64, f64)> {
        let (a, b) = self.interval_of(other);
        let lo = self.lo.max(a);
        let hi = self.hi.min(b);
        let slack = 1e-12;
        (lo <= hi + slack).then_some((lo, hi.max(lo)))
    }

    /// Closest points between two non-parallel straight entities
    ///
    /// Returns the parameters on `self` and `other`.
    pub fn closest_params(&self, other: &Linear) -> (f64, f64) {
        let r = self.origin - other.origin;
        let a = self.dir.dot(&self.dir);
        let e = other.dir.dot(&other.dir);
        let f = other.dir.dot(&r);
        let c = self.dir.dot(&r);
        let b = self.dir.dot(&other.dir);
        let denom = a * e - b * b;

        let mut s = if denom > 0.0 {
            ((b * f - c * e) / denom).clamp(self.lo, self.hi)
        } else {
            clamp_finite(0.0, self.lo, self.hi)
        };
        let mut t = (b * s + f) / e;
        if t < other.lo {
            t = other.lo;
            s = ((b * t - c) / a).clamp(self.lo, self.hi);
        } else if t > other.hi {
            t = other.hi;
            s = ((b * t - c) / a).clamp(self.lo, self.hi);
        }
        (s, t)
    }

    /// Minimum distance between two straight entities
    pub fn distance_to_linear(&self, other: &Linear, tol: &Tolerance) -> f64 {
        if self.parallel_to(other, tol) {
            if self.overlap_with(other).is_some() {
                return self.carrier_distance(&other.origin);
            }
            let mut best = f64::INFINITY;
            for p in other.endpoints() {
                best = best.min(self.distance_to(&p));
            }
            for p in self.endpoints() {
                best = best.min(other.distance_to(&p));
            }
            return best;
        }
        let (s, t) = self.closest_params(other);
        (self.point_at(s) - other.point_at(t)).norm()
    }
}

fn clamp_finite(value: f64, lo: f64, hi: f64) -> f64 {
    if lo.is_finite() { lo.max(value.min(hi)) } else { value.min(hi) }
}

impl Conic {
    pub fn is_circular(&self) -> bool {
        self.kind.is_circular()
    }

    pub fn center_world(&self) -> Point3 {
        self.frame.to_world(&self.arc.center)
    }

    pub fn endpoints_world(&self) -> Vec<Point3> {
        if self.full {
            Vec::new()
        } else {
            vec![
                self.frame.to_world(&self.arc.start_point()),
                self.frame.to_world(&self.arc.end_point()),
            ]
        }
    }

    pub fn same_plane(&self, other: &Conic, tol: &Tolerance) -> bool {
        self.frame.plane().coincides_with(&other.frame.plane(), tol)
    }

    pub fn contains_world(&self, p: &Point3, tol: &Tolerance) -> bool {
        self.frame.plane().contains(p, tol) && conic_contains(&self.arc, self.full, &self.frame.to_local(p), tol)
    }

    /// Re-express `other` in this conic's frame; `None` if it leaves the plane
    pub fn flatten(&self, other: &Lifted, tol: &Tolerance) -> Option<Flat> {
        flatten(other, &self.frame, tol)
    }
}

/// A shape expressed in the 2D coordinates of a shared plane
#[derive(Debug, Clone, Copy)]
pub(super) enum Flat {
    Point(Point2),
    Linear {
        origin: Point2,
        dir: Vector2,
        lo: f64,
        hi: f64,
    },
    Conic {
        arc: CenterArc,
        full: bool,
    },
}

pub(super) fn flatten(lifted: &Lifted, frame: &CoordinateSystem, tol: &Tolerance) -> Option<Flat> {
    let plane = frame.plane();
    match lifted {
        Lifted::Point(p) => plane.contains(p, tol).then(|| Flat::Point(frame.to_local(p))),
        Lifted::Linear(l) => {
            let second = l.origin + l.unit_dir();
            if !(plane.contains(&l.origin, tol) && plane.contains(&second, tol)) {
                return None;
            }
            let origin = frame.to_local(&l.origin);
            let d = frame.vector_to_local(&l.dir);
            Some(Flat::Linear {
                origin,
                dir: Vector2::new(d.x, d.y),
                lo: l.lo,
                hi: l.hi,
            })
        }
        Lifted::Conic(c) => {
            if !plane.coincides_with(&c.frame.plane(), tol) {
                return None;
            }
            // carry three reference points across and rebuild the parameterization
            let center = frame.to_local(&c.frame.to_world(&c.arc.center));
            let axis_point = frame.to_local(&c.frame.to_world(&c.arc.point_at(0.0)));
            let quarter_point = frame.to_local(&c.frame.to_world(&c.arc.point_at(FRAC_PI_2)));
            let u = axis_point - center;
            let v = quarter_point - center;
            let rotation = positive_angle(u.y.atan2(u.x));
            let mirrored = u.perp(&v) < 0.0;
            let (start, sweep) = if mirrored {
                (-c.arc.start, -c.arc.sweep)
            } else {
                (c.arc.start, c.arc.sweep)
            };
            Some(Flat::Conic {
                arc: CenterArc {
                    center,
                    rx: c.arc.rx,
                    ry: c.arc.ry,
                    rotation,
                    start: positive_angle(start),
                    sweep,
                },
                full: c.full,
            })
        }
    }
}

/// An intersection point found in a shared plane
#[derive(Debug, Clone, Copy)]
pub(super) struct Hit {
    pub point: Point2,
    /// The two curves share a tangent direction here
    pub tangent: bool,
}

/// Result of intersecting two flat curves
#[derive(Debug, Clone)]
pub(super) enum FlatIntersection {
    Hits(Vec<Hit>),
    Overlap,
    /// No closed form for this pair
    Unsupported,
}

/// Map a point into the unit-circle space of an ellipse
fn to_unit(arc: &CenterArc, p: &Point2) -> Point2 {
    let local = crate::kernel::rotate2(&(p - arc.center), -arc.rotation);
    Point2::new(local.x / arc.rx, local.y / arc.ry)
}

fn to_unit_vec(arc: &CenterArc, v: &Vector2) -> Vector2 {
    let local = crate::kernel::rotate2(v, -arc.rotation);
    Vector2::new(local.x / arc.rx, local.y / arc.ry)
}

fn from_unit(arc: &CenterArc, q: &Point2) -> Point2 {
    arc.center + crate::kernel::rotate2(&Vector2::new(q.x * arc.rx, q.y * arc.ry), arc.rotation)
}

/// Parametric angle of a point (on or near) the conic
pub(super) fn conic_param(arc: &CenterArc, p: &Point2) -> f64 {
    let q = to_unit(arc, p);
    positive_angle(q.y.atan2(q.x))
}

pub(super) fn conic_contains(arc: &CenterArc, full: bool, p: &Point2, tol: &Tolerance) -> bool {
    let q = to_unit(arc, p);
    // scale the unit-space residual back to a length so the absolute epsilon applies
    let residual = (q.coords.norm() - 1.0) * arc.rx.min(arc.ry);
    tol.is_zero(residual) && (full || arc.contains_angle(conic_param(arc, p), tol))
}

pub(super) fn conic_endpoints(arc: &CenterArc, full: bool) -> Vec<Point2> {
    if full {
        Vec::new()
    } else {
        vec![arc.start_point(), arc.end_point()]
    }
}

fn within(s: f64, lo: f64, hi: f64, dir: &Vector2, tol: &Tolerance) -> bool {
    let slack = tol.absolute / dir.norm();
    s >= lo - slack && s <= hi + slack
}

/// Intersections of a straight entity with a conic, solved in the conic's unit-circle space
pub(super) fn linear_conic_hits(
    origin: &Point2,
    dir: &Vector2,
    lo: f64,
    hi: f64,
    arc: &CenterArc,
    full: bool,
    tol: &Tolerance,
) -> Vec<Hit> {
    let o = to_unit(arc, origin);
    let d = to_unit_vec(arc, dir);
    let dd = d.norm_squared();
    let s0 = -o.coords.dot(&d) / dd;
    let foot = o + d * s0;
    let h = foot.coords.norm();
    let scale = arc.rx.min(arc.ry);

    let candidates: Vec<(f64, bool)> = if tol.is_zero((h - 1.0) * scale) {
        vec![(s0, true)]
    } else if h > 1.0 {
        Vec::new()
    } else {
        let half = (1.0 - h * h).sqrt() / dd.sqrt();
        vec![(s0 - half, false), (s0 + half, false)]
    };

    candidates
        .into_iter()
        .filter(|(s, _)| within(*s, lo, hi, dir, tol))
        .map(|(s, tangent)| Hit {
            point: from_unit(arc, &(o + d * s)),
            tangent,
        })
        .filter(|hit| full || arc.contains_angle(conic_param(arc, &hit.point), tol))
        .collect()
}

/// Intersections of two circles (or circular arcs)
pub(super) fn circle_circle(
    a: &CenterArc,
    a_full: bool,
    b: &CenterArc,
    b_full: bool,
    tol: &Tolerance,
) -> FlatIntersection {
    let (r1, r2) = (a.rx, b.rx);
    let offset = b.center - a.center;
    let d = offset.norm();

    if tol.is_zero(d) {
        if !tol.is_close(r1, r2) {
            return FlatIntersection::Hits(Vec::new());
        }
        if a_full || b_full {
            return FlatIntersection::Overlap;
        }
        // same carrier circle: overlapping if either arc reaches into the other
        let inside = |arc: &CenterArc, other: &CenterArc| {
            let mid = arc.point_at(arc.start + arc.sweep / 2.0);
            conic_contains(other, false, &mid, tol)
        };
        if inside(a, b) || inside(b, a) {
            return FlatIntersection::Overlap;
        }
        let shared: Vec<Hit> = conic_endpoints(a, false)
            .into_iter()
            .filter(|p| conic_contains(b, false, p, tol))
            .map(|point| Hit {
                point,
                tangent: true,
            })
            .collect();
        return FlatIntersection::Hits(shared);
    }

    let external = tol.is_close(d, r1 + r2);
    let internal = tol.is_close(d, (r1 - r2).abs());
    if !external && !internal && (d > r1 + r2 || d < (r1 - r2).abs()) {
        return FlatIntersection::Hits(Vec::new());
    }

    let along = (d * d + r1 * r1 - r2 * r2) / (2.0 * d);
    let unit = offset / d;
    let base = a.center + unit * along;
    let points = if external || internal {
        vec![Hit {
            point: base,
            tangent: true,
        }]
    } else {
        let h = (r1 * r1 - along * along).max(0.0).sqrt();
        let normal = Vector2::new(-unit.y, unit.x);
        vec![
            Hit {
                point: base + normal * h,
                tangent: false,
            },
            Hit {
                point: base - normal * h,
                tangent: false,
            },
        ]
    };

    FlatIntersection::Hits(
        points
            .into_iter()
            .filter(|hit| a_full || a.contains_angle(conic_param(a, &hit.point), tol))
            .filter(|hit| b_full || b.contains_angle(conic_param(b, &hit.point), tol))
            .collect(),
    )
}

/// Intersect two flat entities, at least one of them a conic
pub(super) fn intersect_flat(a: &Flat, b: &Flat, tol: &Tolerance) -> FlatIntersection {
    match (a, b) {
        (Flat::Linear { origin, dir, lo, hi }, Flat::Conic { arc, full })
        | (Flat::Conic { arc, full }, Flat::Linear { origin, dir, lo, hi }) => {
            FlatIntersection::Hits(linear_conic_hits(origin, dir, *lo, *hi, arc, *full, tol))
        }
        (Flat::Conic { arc: a, full: af }, Flat::Conic { arc: b, full: bf }) => {
            if a.rx == a.ry && b.rx == b.ry {
                circle_circle(a, *af, b, *bf, tol)
            } else {
                FlatIntersection::Unsupported
            }
        }
        (Flat::Point(p), other) | (other, Flat::Point(p)) => {
            if flat_contains(other, p, tol) {
                FlatIntersection::Hits(vec![Hit {
                    point: *p,
                    tangent: false,
                }])
            } else {
                FlatIntersection::Hits(Vec::new())
            }
        }
        (Flat::Linear { .. }, Flat::Linear { .. }) => FlatIntersection::Unsupported,
    }
}

pub(super) fn flat_contains(flat: &Flat, p: &Point2, tol: &Tolerance) -> bool {
    match flat {
        Flat::Point(q) => tol.points_close(p, q),
        Flat::Linear { origin, dir, lo, hi } => {
            let s = ((p - origin).dot(dir) / dir.norm_squared()).clamp(*lo, *hi);
            tol.is_zero((p - (origin + dir * s)).norm())
        }
        Flat::Conic { arc, full } => conic_contains(arc, *full, p, tol),
    }
}

pub(super) fn flat_endpoints(flat: &Flat) -> Vec<Point2> {
    match flat {
        Flat::Point(_) => Vec::new(),
        Flat::Linear { origin, dir, lo, hi } => {
            if lo.is_finite() && hi.is_finite() {
                vec![origin + dir * *lo, origin + dir * *hi]
            } else {
                Vec::new()
            }
        }
        Flat::Conic { arc, full } => conic_endpoints(arc, *full),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_closest_params_skew_lines() {
        let a = Linear {
            origin: Point3::new(0.0, 0.0, 0.0),
            dir: Vector3::new(1.0, 0.0, 0.0),
            lo: f64::NEG_INFINITY,
            hi: f64::INFINITY,
            kind: ShapeKind::Line,
        };
        let b = Linear {
            origin: Point3::new(0.0, 5.0, 2.0),
            dir: Vector3::new(0.0, 1.0, 0.0),
            lo: f64::NEG_INFINITY,
            hi: f64::INFINITY,
            kind: ShapeKind::Line,
        };
        let tol = Tolerance::default();
        assert_relative_eq!(a.distance_to_linear(&b, &tol), 2.0, epsilon = 1e-12);
        let (s, t) = a.closest_params(&b);
        assert_relative_eq!(s, 0.0, epsilon = 1e-12);
        assert_relative_eq!(t, -5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_line_ellipse_tangent_in_unit_space() {
        let arc = CenterArc {
            center: Point2::origin(),
            rx: 4.0,
            ry: 2.0,
            rotation: 0.0,
            start: 0.0,
            sweep: crate::kernel::TAU,
        };
        let tol = Tolerance::default();
        let hits = linear_conic_hits(
            &Point2::new(-10.0, 2.0),
            &Vector2::new(1.0, 0.0),
            f64::NEG_INFINITY,
            f64::INFINITY,
            &arc,
            true,
            &tol,
        );
        assert_eq!(hits.len(), 1);
        assert!(hits[0].tangent);
        assert_relative_eq!(hits[0].point, Point2::new(0.0, 2.0), epsilon = 1e-9);
    }

    #[test]
    fn test_circle_circle_crossing() {
        let a = CenterArc::circular(Point2::origin(), 1.0, 0.0, crate::kernel::TAU);
        let b = CenterArc::circular(Point2::new(1.0, 0.0), 1.0, 0.0, crate::kernel::TAU);
        let FlatIntersection::Hits(hits) = circle_circle(&a, true, &b, true, &Tolerance::default()) else {
            panic!("expected hits");
        };
        assert_eq!(hits.len(), 2);
        assert_relative_eq!(hits[0].point.x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(hits[0].point.y.abs(), 0.75f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_flatten_mirrored_frame() {
        // a frame whose normal points down sees the same circle with reversed sweep
        let down = CoordinateSystem::from_euler(Point3::origin(), crate::kernel::PI, 0.0, 0.0);
        let arc = CenterArc::circular(Point2::new(1.0, 1.0), 1.0, 0.0, 1.0);
        let lifted = Lifted::Conic(Conic {
            frame: CoordinateSystem::world(),
            arc,
            full: false,
            kind: ShapeKind::CircularArc,
        });
        let tol = Tolerance::default();
        let Some(Flat::Conic { arc: flat, .. }) = flatten(&lifted, &down, &tol) else {
            panic!("expected a coplanar conic");
        };
        assert!(flat.sweep < 0.0);
        let start_world = down.to_world(&flat.start_point());
        assert_relative_eq!(start_world, Point3::new(2.0, 1.0, 0.0), epsilon = 1e-12);
        let end_world = down.to_world(&flat.end_point());
        let expected = CoordinateSystem::world().to_world(&arc.end_point());
        assert_relative_eq!(end_world, expected, epsilon = 1e-12);
    }
}
