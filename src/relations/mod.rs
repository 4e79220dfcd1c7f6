//! Spatial relations between shapes
//!
//! Predicates ([`coincident`], [`parallel`], [`tangent`], ...) and measurements
//! ([`distance_between`], [`intersection`], [`project`], ...) over pairs of
//! shapes. Every function accepts anything convertible into a [`Placed`]
//! shape, so a bare `&Shape` or `&Geometry` works on the world XY plane and
//! `shape.on(&frame)` places it on another sketch plane.
//!
//! Straight entities are compared in model space, which is what makes
//! [`skew`] and [`coplanar`] meaningful. Pairs involving a circle or ellipse
//! are solved in the plane of that conic.
//!
//! Pairs without a closed-form answer fail with
//! [`Error::UnsupportedRelation`] instead of guessing.

mod lifted;

use crate::error::{Error, Result};
use crate::geometry::Placed;
use crate::kernel::{CoordinateSystem, PI, Point3, Vector3};
use crate::tolerance::Tolerance;

use lifted::{Conic, Flat, FlatIntersection, Hit, Lifted, Linear, conic_contains, flat_endpoints, flatten, intersect_flat};

/// Where two shapes meet
#[derive(Debug, Clone, PartialEq)]
pub enum Intersection {
    /// The shapes do not meet
    None,
    /// The shapes meet at isolated points (model space)
    Points(Vec<Point3>),
    /// The shapes share a stretch of curve
    Overlap,
}

impl Intersection {
    /// Whether the shapes are disjoint
    pub fn is_empty(&self) -> bool {
        matches!(self, Intersection::None)
    }
}

/// Image of an orthogonal projection
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// A single point
    Point(Point3),
    /// A bounded stretch between two points
    Segment(Point3, Point3),
    /// A whole line
    Line {
        /// A point on the line
        origin: Point3,
        /// Unit direction
        direction: Vector3,
    },
}

fn lift<'a>(shape: impl Into<Placed<'a>>) -> Lifted {
    Lifted::from(shape.into())
}

fn unsupported(relation: &'static str, a: &Lifted, b: &Lifted) -> Error {
    Error::unsupported_relation(relation, a.kind(), b.kind())
}

/// Both shapes expressed in the plane of the first conic, `None` when they are not coplanar
fn shared_plane(a: &Lifted, b: &Lifted, tol: &Tolerance) -> Option<(CoordinateSystem, Flat, Flat)> {
    let frame = Lifted::conic_frame(a, b)?;
    let fa = flatten(a, &frame, tol)?;
    let fb = flatten(b, &frame, tol)?;
    Some((frame, fa, fb))
}

/// Intersection points of two coplanar flat shapes; `None` on overlap
fn flat_hits(relation: &'static str, a: &Lifted, b: &Lifted, fa: &Flat, fb: &Flat, tol: &Tolerance) -> Result<Option<Vec<Hit>>> {
    match intersect_flat(fa, fb, tol) {
        FlatIntersection::Hits(hits) => Ok(Some(hits)),
        FlatIntersection::Overlap => Ok(None),
        FlatIntersection::Unsupported => Err(unsupported(relation, a, b)),
    }
}

fn contains_point(shape: &Lifted, p: &Point3, tol: &Tolerance) -> bool {
    match shape {
        Lifted::Point(q) => tol.points_close3(p, q),
        Lifted::Linear(l) => l.contains(p, tol),
        Lifted::Conic(c) => c.contains_world(p, tol),
    }
}

fn is_boundary_point(shape: &Lifted, p: &Point3, tol: &Tolerance) -> bool {
    match shape {
        Lifted::Point(_) => false,
        Lifted::Linear(l) => l.is_endpoint(p, tol),
        Lifted::Conic(c) => c.endpoints_world().iter().any(|e| tol.points_close3(e, p)),
    }
}

fn linear_coplanar(l: &Linear, m: &Linear, tol: &Tolerance) -> bool {
    if l.parallel_to(m, tol) {
        return true;
    }
    let n = l.dir.cross(&m.dir);
    tol.is_zero((m.origin - l.origin).dot(&n) / n.norm())
}

fn same_linear(l: &Linear, m: &Linear, tol: &Tolerance) -> bool {
    match (l.is_bounded(), m.is_bounded()) {
        (false, false) => l.same_carrier(m, tol),
        (true, true) => same_endpoints(&l.endpoints(), &m.endpoints(), tol),
        _ => false,
    }
}

fn same_endpoints(a: &[Point3], b: &[Point3], tol: &Tolerance) -> bool {
    match (a, b) {
        ([a0, a1], [b0, b1]) => {
            (tol.points_close3(a0, b0) && tol.points_close3(a1, b1))
                || (tol.points_close3(a0, b1) && tol.points_close3(a1, b0))
        }
        _ => a.is_empty() && b.is_empty(),
    }
}

fn same_conic(c: &Conic, d: &Conic, tol: &Tolerance) -> bool {
    if c.kind != d.kind {
        return false;
    }
    let Some(Flat::Conic { arc: other, .. }) = c.flatten(&Lifted::Conic(*d), tol) else {
        return false;
    };
    let arc = &c.arc;
    if !tol.points_close(&arc.center, &other.center)
        || !tol.is_close(arc.rx, other.rx)
        || !tol.is_close(arc.ry, other.ry)
    {
        return false;
    }
    if c.kind.is_elliptical() && !tol.is_close(arc.rx, arc.ry) {
        // the major axis is undirected
        let diff = (arc.rotation - other.rotation).rem_euclid(PI);
        if !(tol.is_zero(diff) || tol.is_zero(PI - diff)) {
            return false;
        }
    }
    if c.full {
        return true;
    }
    let mid = arc.point_at(arc.start + arc.sweep / 2.0);
    same_endpoints(&c.endpoints_world(), &d.endpoints_world(), tol) && conic_contains(&other, false, &mid, tol)
}

/// Whether two shapes are the same point set
///
/// Points compare by position, a point against a curve tests membership, and
/// curves of the same kind compare their defining data. A straight entity
/// never coincides with a curved one.
pub fn coincident<'a, 'b>(a: impl Into<Placed<'a>>, b: impl Into<Placed<'b>>, tol: &Tolerance) -> Result<bool> {
    let (a, b) = (lift(a), lift(b));
    Ok(match (&a, &b) {
        (Lifted::Point(p), other) | (other, Lifted::Point(p)) => contains_point(other, p, tol),
        (Lifted::Linear(l), Lifted::Linear(m)) => same_linear(l, m, tol),
        (Lifted::Conic(c), Lifted::Conic(d)) => same_conic(c, d, tol),
        (Lifted::Linear(_), Lifted::Conic(_)) | (Lifted::Conic(_), Lifted::Linear(_)) => false,
    })
}

/// Whether two points or straight entities lie on one common line
pub fn collinear<'a, 'b>(a: impl Into<Placed<'a>>, b: impl Into<Placed<'b>>, tol: &Tolerance) -> Result<bool> {
    let (a, b) = (lift(a), lift(b));
    match (&a, &b) {
        (Lifted::Point(_), Lifted::Point(_)) => Ok(true),
        (Lifted::Point(p), Lifted::Linear(l)) | (Lifted::Linear(l), Lifted::Point(p)) => {
            Ok(tol.is_zero(l.carrier_distance(p)))
        }
        (Lifted::Linear(l), Lifted::Linear(m)) => Ok(l.same_carrier(m, tol)),
        _ => Err(unsupported("collinear", &a, &b)),
    }
}

/// Whether a single plane contains both shapes
pub fn coplanar<'a, 'b>(a: impl Into<Placed<'a>>, b: impl Into<Placed<'b>>, tol: &Tolerance) -> Result<bool> {
    let (a, b) = (lift(a), lift(b));
    Ok(match (&a, &b) {
        (Lifted::Point(_), Lifted::Point(_))
        | (Lifted::Point(_), Lifted::Linear(_))
        | (Lifted::Linear(_), Lifted::Point(_)) => true,
        (Lifted::Linear(l), Lifted::Linear(m)) => linear_coplanar(l, m, tol),
        (Lifted::Point(p), Lifted::Conic(c)) | (Lifted::Conic(c), Lifted::Point(p)) => c.frame.plane().contains(p, tol),
        (Lifted::Linear(l), Lifted::Conic(c)) | (Lifted::Conic(c), Lifted::Linear(l)) => {
            let plane = c.frame.plane();
            plane.contains(&l.origin, tol) && tol.is_zero(plane.normal().dot(&l.unit_dir()))
        }
        (Lifted::Conic(c), Lifted::Conic(d)) => c.same_plane(d, tol),
    })
}

/// Whether two straight entities have parallel directions
pub fn parallel<'a, 'b>(a: impl Into<Placed<'a>>, b: impl Into<Placed<'b>>, tol: &Tolerance) -> Result<bool> {
    let (a, b) = (lift(a), lift(b));
    match (&a, &b) {
        (Lifted::Linear(l), Lifted::Linear(m)) => Ok(l.parallel_to(m, tol)),
        _ => Err(unsupported("parallel", &a, &b)),
    }
}

/// Whether two straight entities have perpendicular directions
pub fn perpendicular<'a, 'b>(a: impl Into<Placed<'a>>, b: impl Into<Placed<'b>>, tol: &Tolerance) -> Result<bool> {
    let (a, b) = (lift(a), lift(b));
    match (&a, &b) {
        (Lifted::Linear(l), Lifted::Linear(m)) => Ok(tol.perpendicular3(&l.dir, &m.dir)),
        _ => Err(unsupported("perpendicular", &a, &b)),
    }
}

/// Whether two straight lines neither meet nor run parallel
pub fn skew<'a, 'b>(a: impl Into<Placed<'a>>, b: impl Into<Placed<'b>>, tol: &Tolerance) -> Result<bool> {
    let (a, b) = (lift(a), lift(b));
    match (&a, &b) {
        (Lifted::Linear(l), Lifted::Linear(m)) => Ok(!l.parallel_to(m, tol) && !linear_coplanar(l, m, tol)),
        _ => Err(unsupported("skew", &a, &b)),
    }
}

/// Whether two shapes meet at exactly one point with a shared tangent
///
/// Supported for a straight entity against any conic and for pairs of
/// circles or circular arcs. Shapes on different planes are never tangent.
pub fn tangent<'a, 'b>(a: impl Into<Placed<'a>>, b: impl Into<Placed<'b>>, tol: &Tolerance) -> Result<bool> {
    let (a, b) = (lift(a), lift(b));
    let supported = match (&a, &b) {
        (Lifted::Linear(_), Lifted::Conic(_)) | (Lifted::Conic(_), Lifted::Linear(_)) => true,
        (Lifted::Conic(c), Lifted::Conic(d)) => c.is_circular() && d.is_circular(),
        _ => false,
    };
    if !supported {
        return Err(unsupported("tangent", &a, &b));
    }
    let Some((_, fa, fb)) = shared_plane(&a, &b, tol) else {
        return Ok(false);
    };
    Ok(match flat_hits("tangent", &a, &b, &fa, &fb, tol)? {
        Some(hits) => !hits.is_empty() && hits.iter().all(|hit| hit.tangent),
        None => false,
    })
}

/// How two non-point shapes meet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Contact {
    Disjoint,
    Overlap,
    Touch,
    Cross,
}

/// Point where a straight entity passes through the plane of a conic
fn pierce(l: &Linear, c: &Conic, tol: &Tolerance) -> Option<Point3> {
    let plane = c.frame.plane();
    let denom = plane.normal().dot(&l.dir);
    if tol.is_zero(denom / l.dir.norm()) {
        return None;
    }
    let s = plane.normal().dot(&(plane.point() - l.origin)) / denom;
    let slack = tol.absolute / l.dir.norm();
    if s < l.lo - slack || s > l.hi + slack {
        return None;
    }
    let p = l.point_at(s);
    c.contains_world(&p, tol).then_some(p)
}

fn contact(relation: &'static str, a: &Lifted, b: &Lifted, tol: &Tolerance) -> Result<Contact> {
    match (a, b) {
        (Lifted::Point(_), _) | (_, Lifted::Point(_)) => Err(unsupported(relation, a, b)),
        (Lifted::Linear(l), Lifted::Linear(m)) => Ok(match linear_intersection(l, m, tol) {
            Intersection::None => Contact::Disjoint,
            Intersection::Overlap => Contact::Overlap,
            Intersection::Points(points) => {
                if points.iter().all(|p| l.is_endpoint(p, tol) || m.is_endpoint(p, tol)) {
                    Contact::Touch
                } else {
                    Contact::Cross
                }
            }
        }),
        _ => {
            let Some((_, fa, fb)) = shared_plane(a, b, tol) else {
                let pierced = match (a, b) {
                    (Lifted::Linear(l), Lifted::Conic(c)) | (Lifted::Conic(c), Lifted::Linear(l)) => pierce(l, c, tol),
                    _ => return Err(unsupported(relation, a, b)),
                };
                return Ok(match pierced {
                    None => Contact::Disjoint,
                    Some(p) if is_boundary_point(a, &p, tol) || is_boundary_point(b, &p, tol) => Contact::Touch,
                    Some(_) => Contact::Cross,
                });
            };
            let Some(hits) = flat_hits(relation, a, b, &fa, &fb, tol)? else {
                return Ok(Contact::Overlap);
            };
            if hits.is_empty() {
                return Ok(Contact::Disjoint);
            }
            let (ends_a, ends_b) = (flat_endpoints(&fa), flat_endpoints(&fb));
            let on_boundary = |hit: &Hit| {
                ends_a.iter().chain(ends_b.iter()).any(|e| tol.points_close(e, &hit.point))
            };
            Ok(if hits.iter().any(|hit| !hit.tangent && !on_boundary(hit)) {
                Contact::Cross
            } else {
                Contact::Touch
            })
        }
    }
}

/// Whether two shapes meet without their interiors crossing
///
/// A point touches a curve only at one of its endpoints. Curves touch when
/// every shared point is an endpoint of one of them or a tangency.
pub fn touches<'a, 'b>(a: impl Into<Placed<'a>>, b: impl Into<Placed<'b>>, tol: &Tolerance) -> Result<bool> {
    let (a, b) = (lift(a), lift(b));
    match (&a, &b) {
        (Lifted::Point(_), Lifted::Point(_)) => Err(unsupported("touches", &a, &b)),
        (Lifted::Point(p), other) | (other, Lifted::Point(p)) => Ok(is_boundary_point(other, p, tol)),
        _ => Ok(contact("touches", &a, &b, tol)? == Contact::Touch),
    }
}

/// Whether two curves pass through each other at an interior point
pub fn crosses<'a, 'b>(a: impl Into<Placed<'a>>, b: impl Into<Placed<'b>>, tol: &Tolerance) -> Result<bool> {
    let (a, b) = (lift(a), lift(b));
    Ok(contact("crosses", &a, &b, tol)? == Contact::Cross)
}

/// Whether two shapes have equal size
///
/// Segments compare lengths, circles and circular arcs compare radii,
/// ellipses and elliptical arcs compare both semi-axes.
pub fn equal<'a, 'b>(a: impl Into<Placed<'a>>, b: impl Into<Placed<'b>>, tol: &Tolerance) -> Result<bool> {
    let (a, b) = (lift(a), lift(b));
    match (&a, &b) {
        (Lifted::Linear(l), Lifted::Linear(m)) if l.is_bounded() && m.is_bounded() => {
            Ok(tol.is_close(l.dir.norm(), m.dir.norm()))
        }
        (Lifted::Conic(c), Lifted::Conic(d)) if c.is_circular() && d.is_circular() => {
            Ok(tol.is_close(c.arc.rx, d.arc.rx))
        }
        (Lifted::Conic(c), Lifted::Conic(d)) if c.kind.is_elliptical() && d.kind.is_elliptical() => {
            Ok(tol.is_close(c.arc.rx, d.arc.rx) && tol.is_close(c.arc.ry, d.arc.ry))
        }
        _ => Err(unsupported("equal", &a, &b)),
    }
}

/// Whether `b` is the mirror image of `a` across the straight entity `axis`
pub fn symmetric<'a, 'b, 'c>(
    a: impl Into<Placed<'a>>,
    b: impl Into<Placed<'b>>,
    axis: impl Into<Placed<'c>>,
    tol: &Tolerance,
) -> Result<bool> {
    let (a, b) = (lift(a), lift(b));
    let axis = match lift(axis) {
        Lifted::Linear(l) => l,
        other => return Err(Error::unsupported_relation("symmetric", a.kind(), other.kind())),
    };
    let u = axis.unit_dir();
    let reflect = |p: &Point3| Point3::from(axis.foot(p).coords * 2.0 - p.coords);
    let reflect_vec = |v: &Vector3| u * (2.0 * v.dot(&u)) - v;
    let reflect_all = |points: Vec<Point3>| points.iter().map(reflect).collect::<Vec<_>>();

    match (&a, &b) {
        (Lifted::Point(p), Lifted::Point(q)) => Ok(tol.points_close3(&reflect(p), q)),
        (Lifted::Linear(l), Lifted::Linear(m)) if l.is_bounded() && m.is_bounded() => {
            Ok(same_endpoints(&reflect_all(l.endpoints()), &m.endpoints(), tol))
        }
        (Lifted::Linear(l), Lifted::Linear(m)) if !l.is_bounded() && !m.is_bounded() => {
            Ok(tol.is_zero(m.carrier_distance(&reflect(&l.origin))) && tol.parallel3(&reflect_vec(&l.dir), &m.dir))
        }
        (Lifted::Conic(c), Lifted::Conic(d)) if c.kind == d.kind => {
            let sized = tol.is_close(c.arc.rx, d.arc.rx) && tol.is_close(c.arc.ry, d.arc.ry);
            let centered = tol.points_close3(&reflect(&c.center_world()), &d.center_world());
            let planar = tol.parallel3(&reflect_vec(&c.frame.z_axis()), &d.frame.z_axis());
            let ends = same_endpoints(&reflect_all(c.endpoints_world()), &d.endpoints_world(), tol);
            let axes = if c.kind.is_elliptical() && !tol.is_close(c.arc.rx, c.arc.ry) {
                let major = |k: &Conic| k.frame.orientation() * Vector3::new(k.arc.rotation.cos(), k.arc.rotation.sin(), 0.0);
                tol.parallel3(&reflect_vec(&major(c)), &major(d))
            } else {
                true
            };
            Ok(sized && centered && planar && ends && axes)
        }
        _ => Err(unsupported("symmetric", &a, &b)),
    }
}

/// Angle between the directions of two straight entities, in `[0, π]`
pub fn angle_between<'a, 'b>(a: impl Into<Placed<'a>>, b: impl Into<Placed<'b>>) -> Result<f64> {
    let (a, b) = (lift(a), lift(b));
    match (&a, &b) {
        (Lifted::Linear(l), Lifted::Linear(m)) => {
            let cos = l.dir.dot(&m.dir) / (l.dir.norm() * m.dir.norm());
            Ok(cos.clamp(-1.0, 1.0).acos())
        }
        _ => Err(unsupported("angle", &a, &b)),
    }
}

/// Distance from a point to a circle or circular arc anywhere in space
fn point_circle_distance(p: &Point3, c: &Conic, tol: &Tolerance) -> f64 {
    let height = c.frame.plane().signed_distance(p);
    let local = c.frame.to_local(p);
    let radial = (local - c.arc.center).norm();
    let r = c.arc.rx;
    if tol.is_zero(radial) || c.full || c.arc.contains_angle(lifted::conic_param(&c.arc, &local), tol) {
        return (height * height + (radial - r).powi(2)).sqrt();
    }
    c.endpoints_world()
        .iter()
        .map(|e| (p - e).norm())
        .fold(f64::INFINITY, f64::min)
}

/// Minimum distance between two shapes
///
/// Supported for points and straight entities in any placement, a point
/// against a circle or circular arc, and full circles against coplanar
/// straight entities or circles.
pub fn distance_between<'a, 'b>(a: impl Into<Placed<'a>>, b: impl Into<Placed<'b>>, tol: &Tolerance) -> Result<f64> {
    let (a, b) = (lift(a), lift(b));
    match (&a, &b) {
        (Lifted::Point(p), Lifted::Point(q)) => Ok((p - q).norm()),
        (Lifted::Point(p), Lifted::Linear(l)) | (Lifted::Linear(l), Lifted::Point(p)) => Ok(l.distance_to(p)),
        (Lifted::Linear(l), Lifted::Linear(m)) => Ok(l.distance_to_linear(m, tol)),
        (Lifted::Point(p), Lifted::Conic(c)) | (Lifted::Conic(c), Lifted::Point(p)) if c.is_circular() => {
            Ok(point_circle_distance(p, c, tol))
        }
        (Lifted::Linear(l), Lifted::Conic(c)) | (Lifted::Conic(c), Lifted::Linear(l)) if c.is_circular() && c.full => {
            let Some((_, fa, fb)) = shared_plane(&a, &b, tol) else {
                return Err(unsupported("distance", &a, &b));
            };
            if flat_hits("distance", &a, &b, &fa, &fb, tol)?.is_none_or(|hits| !hits.is_empty()) {
                return Ok(0.0);
            }
            let center = c.center_world();
            let r = c.arc.rx;
            let gap = l.distance_to(&center);
            if gap >= r {
                return Ok(gap - r);
            }
            // a segment lying entirely inside the circle
            let farthest = l
                .endpoints()
                .iter()
                .map(|e| (e - center).norm())
                .fold(0.0, f64::max);
            Ok(r - farthest)
        }
        (Lifted::Conic(c), Lifted::Conic(d)) if c.is_circular() && d.is_circular() && c.full && d.full => {
            if !c.same_plane(d, tol) {
                return Err(unsupported("distance", &a, &b));
            }
            let (r1, r2) = (c.arc.rx, d.arc.rx);
            let gap = (c.center_world() - d.center_world()).norm();
            Ok(if gap > r1 + r2 {
                gap - r1 - r2
            } else if gap < (r1 - r2).abs() {
                (r1 - r2).abs() - gap
            } else {
                0.0
            })
        }
        _ => Err(unsupported("distance", &a, &b)),
    }
}

fn linear_intersection(l: &Linear, m: &Linear, tol: &Tolerance) -> Intersection {
    if l.parallel_to(m, tol) {
        if !l.same_carrier(m, tol) {
            return Intersection::None;
        }
        return match l.overlap_with(m) {
            None => Intersection::None,
            Some((lo, hi)) if tol.is_zero((hi - lo) * l.dir.norm()) => Intersection::Points(vec![l.point_at(lo)]),
            Some(_) => Intersection::Overlap,
        };
    }
    let (s, t) = l.closest_params(m);
    let (p, q) = (l.point_at(s), m.point_at(t));
    if tol.points_close3(&p, &q) {
        Intersection::Points(vec![p])
    } else {
        Intersection::None
    }
}

/// Points shared by two shapes
pub fn intersection<'a, 'b>(a: impl Into<Placed<'a>>, b: impl Into<Placed<'b>>, tol: &Tolerance) -> Result<Intersection> {
    let (a, b) = (lift(a), lift(b));
    match (&a, &b) {
        (Lifted::Point(p), other) | (other, Lifted::Point(p)) => Ok(if contains_point(other, p, tol) {
            Intersection::Points(vec![*p])
        } else {
            Intersection::None
        }),
        (Lifted::Linear(l), Lifted::Linear(m)) => Ok(linear_intersection(l, m, tol)),
        _ => {
            let Some((frame, fa, fb)) = shared_plane(&a, &b, tol) else {
                return match (&a, &b) {
                    (Lifted::Linear(l), Lifted::Conic(c)) | (Lifted::Conic(c), Lifted::Linear(l)) => {
                        Ok(match pierce(l, c, tol) {
                            Some(p) => Intersection::Points(vec![p]),
                            None => Intersection::None,
                        })
                    }
                    _ => Err(unsupported("intersection", &a, &b)),
                };
            };
            Ok(match flat_hits("intersection", &a, &b, &fa, &fb, tol)? {
                None => Intersection::Overlap,
                Some(hits) if hits.is_empty() => Intersection::None,
                Some(hits) => Intersection::Points(hits.iter().map(|hit| frame.to_world(&hit.point)).collect()),
            })
        }
    }
}

/// Orthogonal projection of `a` onto `onto`
///
/// Straight targets project onto their carrier line. Points project onto the
/// carrier circle of circles and circular arcs; a point on the circle's axis
/// has no unique image and fails with [`Error::DegenerateGeometry`].
pub fn project<'a, 'b>(a: impl Into<Placed<'a>>, onto: impl Into<Placed<'b>>, tol: &Tolerance) -> Result<Projection> {
    let (a, onto) = (lift(a), lift(onto));
    match (&a, &onto) {
        (Lifted::Point(p), Lifted::Linear(l)) => Ok(Projection::Point(l.foot(p))),
        (Lifted::Linear(s), Lifted::Linear(l)) if s.is_bounded() => {
            let p = l.foot(&s.point_at(s.lo));
            let q = l.foot(&s.point_at(s.hi));
            Ok(if tol.points_close3(&p, &q) {
                Projection::Point(p)
            } else {
                Projection::Segment(p, q)
            })
        }
        (Lifted::Linear(s), Lifted::Linear(l)) => {
            let origin = l.foot(&s.origin);
            if tol.perpendicular3(&s.dir, &l.dir) {
                return Ok(Projection::Point(origin));
            }
            let direction = if s.dir.dot(&l.dir) < 0.0 { -l.unit_dir() } else { l.unit_dir() };
            Ok(Projection::Line { origin, direction })
        }
        (Lifted::Point(p), Lifted::Conic(c)) if c.is_circular() => {
            let offset = c.frame.to_local(p) - c.arc.center;
            let radial = offset.norm();
            if tol.is_zero(radial) {
                return Err(Error::DegenerateGeometry(
                    "point lies on the circle axis and has no unique projection".to_string(),
                ));
            }
            Ok(Projection::Point(c.frame.to_world(&(c.arc.center + offset * (c.arc.rx / radial)))))
        }
        _ => Err(unsupported("project", &a, &onto)),
    }
}
