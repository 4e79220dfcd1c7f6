use std::ops::Range;

use tracing::trace;

use super::{ArcTo, PathCommand};
use crate::arc::CenterArc;
use crate::error::{Error, Result};
use crate::geometry::{Circle, CircularArc, EllipticalArc, LineSegment, Point, Shape, ShapeKind};
use crate::kernel::{Point2, TAU};
use crate::tolerance::Tolerance;

/// Shapes read from path commands
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathShapes {
    /// One shape per drawn segment, in path order
    pub shapes: Vec<Shape>,
    /// Indices into `shapes` of arcs whose radii were enlarged to reach their chord
    pub radii_adjusted: Vec<usize>,
}

/// Path commands written for a list of shapes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathOutput {
    /// The canonical commands
    pub commands: Vec<PathCommand>,
    /// For each input shape, the indices of the segments [`shapes_from_path`]
    /// reads back for it; empty for shapes that were not written
    pub spans: Vec<Range<usize>>,
    /// Indices of input shapes with no path form
    pub unrepresentable: Vec<usize>,
}

/// Convert canonical commands into sketch shapes
///
/// - A moveto that starts a subpath with nothing drawn becomes a [`Point`]
/// - Each line command becomes a [`LineSegment`]
/// - Each arc command becomes a circular or elliptical arc; zero radii make
///   a segment, as path readers do
/// - A close command becomes a segment back to the subpath start, unless
///   the pen is already there
///
/// Zero-length segments and arcs are skipped. Full turns drawn as several
/// arcs stay separate; see [`merge_full_turns`].
pub fn shapes_from_path(commands: &[PathCommand], tol: &Tolerance) -> Result<PathShapes> {
    let mut out = PathShapes::default();
    let mut pen = Point2::origin();
    let mut subpath_start = Point2::origin();
    let mut pending_move: Option<Point2> = None;

    for command in commands {
        match command {
            PathCommand::MoveTo(p) => {
                if let Some(lone) = pending_move.take() {
                    out.shapes.push(Shape::Point(Point::at(lone)?));
                }
                pending_move = Some(*p);
                subpath_start = *p;
                pen = *p;
            }
            PathCommand::LineTo(p) => {
                if tol.points_close(&pen, p) {
                    trace!("skipping zero-length line at ({}, {})", p.x, p.y);
                    continue;
                }
                out.shapes.push(Shape::LineSegment(LineSegment::new(pen, *p)?));
                pending_move = None;
                pen = *p;
            }
            PathCommand::ArcTo(arc) => {
                if tol.points_close(&pen, &arc.end) {
                    trace!("skipping arc with coincident endpoints at ({}, {})", pen.x, pen.y);
                    continue;
                }
                if arc.rx == 0.0 || arc.ry == 0.0 {
                    out.shapes.push(Shape::LineSegment(LineSegment::new(pen, arc.end)?));
                } else {
                    let fit = arc.to_endpoint_arc(pen).fit(tol)?;
                    if fit.radii_adjusted() {
                        out.radii_adjusted.push(out.shapes.len());
                    }
                    out.shapes.push(arc_shape(&fit.arc, tol)?);
                }
                pending_move = None;
                pen = arc.end;
            }
            PathCommand::ClosePath => {
                if !tol.points_close(&pen, &subpath_start) {
                    out.shapes.push(Shape::LineSegment(LineSegment::new(pen, subpath_start)?));
                    pending_move = None;
                }
                pen = subpath_start;
            }
        }
    }

    if let Some(lone) = pending_move {
        out.shapes.push(Shape::Point(Point::at(lone)?));
    }
    Ok(out)
}

/// Circular arc when the radii agree, elliptical otherwise
fn arc_shape(arc: &CenterArc, tol: &Tolerance) -> Result<Shape> {
    if tol.is_close(arc.rx, arc.ry) {
        let circular = CenterArc { ry: arc.rx, ..*arc };
        Ok(Shape::CircularArc(CircularArc::from_center_arc(&circular)?))
    } else {
        Ok(Shape::EllipticalArc(EllipticalArc::from_center_arc(arc)?))
    }
}

/// State of the subpath being written
#[derive(Default)]
struct Chain {
    pen: Option<Point2>,
    start: Point2,
    drawn: usize,
}

struct PathWriter<'a> {
    tol: &'a Tolerance,
    commands: Vec<PathCommand>,
    chain: Chain,
    segments: usize,
}

impl PathWriter<'_> {
    /// Continue the current subpath from `p`, or start a new one there
    fn move_to(&mut self, p: Point2) {
        let continues = self.chain.pen.is_some_and(|pen| self.tol.points_close(&pen, &p));
        if !continues {
            self.commands.push(PathCommand::MoveTo(p));
            self.chain = Chain {
                pen: Some(p),
                start: p,
                drawn: 0,
            };
        }
    }

    /// Whether a segment ending at `p` closes the current subpath
    fn closes_at(&self, p: &Point2) -> bool {
        self.chain.drawn > 0 && self.tol.points_close(p, &self.chain.start)
    }

    fn finish_segment(&mut self, end: Option<Point2>) {
        self.segments += 1;
        self.chain.drawn += 1;
        self.chain.pen = end;
    }

    fn point(&mut self, p: Point2) {
        self.commands.push(PathCommand::MoveTo(p));
        self.chain = Chain::default();
        self.segments += 1;
    }

    fn segment(&mut self, segment: &LineSegment) {
        self.move_to(segment.start());
        if self.closes_at(&segment.end()) {
            self.commands.push(PathCommand::ClosePath);
            self.finish_segment(None);
        } else {
            self.commands.push(PathCommand::LineTo(segment.end()));
            self.finish_segment(Some(segment.end()));
        }
    }

    fn arc(&mut self, arc: &CenterArc) -> Result<()> {
        let mut endpoint = arc.to_endpoint_form()?;
        self.move_to(endpoint.start);
        let closes = self.closes_at(&endpoint.end);
        if closes {
            endpoint.end = self.chain.start;
        }
        self.commands.push(PathCommand::ArcTo(ArcTo::from_endpoint_arc(&endpoint)));
        if closes {
            self.commands.push(PathCommand::ClosePath);
            self.finish_segment(None);
        } else {
            self.finish_segment(Some(endpoint.end));
        }
        Ok(())
    }

    fn full_turn(&mut self, full: &CenterArc, pieces: usize) -> Result<()> {
        self.chain = Chain::default();
        let sweep = TAU / pieces as f64;
        for k in 0..pieces {
            self.arc(&CenterArc {
                start: full.start + k as f64 * sweep,
                sweep,
                ..*full
            })?;
        }
        Ok(())
    }
}

/// Write shapes as canonical path commands
///
/// Shapes that continue where the previous one ended share a subpath; a
/// chain that returns to its start is closed with `Z`, which replaces a
/// final straight segment. Circles and ellipses are drawn as
/// `circle_segments` arcs (2 or 4). Infinite lines cannot be drawn and are
/// listed in [`PathOutput::unrepresentable`].
pub fn path_from_shapes(shapes: &[Shape], tol: &Tolerance, circle_segments: usize) -> Result<PathOutput> {
    if !matches!(circle_segments, 2 | 4) {
        return Err(Error::InvalidGeometry(format!(
            "circles can be drawn with 2 or 4 arcs, not {}",
            circle_segments
        )));
    }

    let mut writer = PathWriter {
        tol,
        commands: Vec::new(),
        chain: Chain::default(),
        segments: 0,
    };
    let mut spans = Vec::with_capacity(shapes.len());
    let mut unrepresentable = Vec::new();

    for (index, shape) in shapes.iter().enumerate() {
        let first = writer.segments;
        match shape {
            Shape::Line(_) => unrepresentable.push(index),
            Shape::Point(p) => writer.point(p.position()),
            Shape::LineSegment(s) => writer.segment(s),
            Shape::CircularArc(a) => writer.arc(&a.to_center_arc())?,
            Shape::EllipticalArc(a) => writer.arc(&a.to_center_arc())?,
            Shape::Circle(c) => writer.full_turn(&c.to_center_arc(), circle_segments)?,
            Shape::Ellipse(e) => writer.full_turn(&e.to_center_arc(), circle_segments)?,
        }
        spans.push(first..writer.segments);
    }

    Ok(PathOutput {
        commands: writer.commands,
        spans,
        unrepresentable,
    })
}

fn is_arc(shape: &Shape) -> bool {
    matches!(shape, Shape::CircularArc(_) | Shape::EllipticalArc(_))
}

fn arc_parts(shape: &Shape) -> Option<CenterArc> {
    match shape {
        Shape::CircularArc(a) => Some(a.to_center_arc()),
        Shape::EllipticalArc(a) => Some(a.to_center_arc()),
        _ => None,
    }
}

/// Merge arcs that together trace one full circle or ellipse
///
/// The arcs must be of the same kind, share center, radii and direction,
/// follow on from each other and return to the first start point after one
/// full turn. Returns `None` if they do not.
pub fn merge_arcs(run: &[Shape], tol: &Tolerance) -> Option<Shape> {
    if run.len() < 2 {
        return None;
    }
    let kind = run[0].kind();
    let arcs: Vec<CenterArc> = run.iter().map(arc_parts).collect::<Option<_>>()?;
    let first = arcs[0];

    for (shape, arc) in run.iter().zip(&arcs).skip(1) {
        let same_conic = shape.kind() == kind
            && tol.points_close(&arc.center, &first.center)
            && tol.is_close(arc.rx, first.rx)
            && tol.is_close(arc.ry, first.ry)
            && (kind == ShapeKind::CircularArc || tol.angles_close(2.0 * arc.rotation, 2.0 * first.rotation))
            && (arc.sweep > 0.0) == (first.sweep > 0.0);
        if !same_conic {
            return None;
        }
    }
    for pair in run.windows(2) {
        if !tol.points_close(&pair[0].end_point()?, &pair[1].start_point()?) {
            return None;
        }
    }
    let closes = tol.points_close(&run[run.len() - 1].end_point()?, &run[0].start_point()?);
    let total: f64 = arcs.iter().map(|a| a.sweep.abs()).sum();
    if !closes || !tol.is_close(total, TAU) {
        return None;
    }

    match &run[0] {
        Shape::CircularArc(a) => Circle::new(a.center(), a.radius()).ok().map(Shape::Circle),
        Shape::EllipticalArc(a) => Some(Shape::Ellipse(*a.ellipse())),
        _ => None,
    }
}

/// Length of the run of contiguous arcs starting at `start` that closes on itself
fn closed_run_at(shapes: &[Shape], start: usize, tol: &Tolerance) -> Option<usize> {
    if !is_arc(&shapes[start]) {
        return None;
    }
    let origin = shapes[start].start_point()?;
    let mut end = shapes[start].end_point()?;
    for len in 2..=shapes.len() - start {
        let next = &shapes[start + len - 1];
        if !is_arc(next) || !tol.points_close(&end, &next.start_point()?) {
            return None;
        }
        end = next.end_point()?;
        if tol.points_close(&end, &origin) {
            return Some(len);
        }
    }
    None
}

/// Replace every run of arcs that traces a full turn with the circle or ellipse
pub fn merge_full_turns(shapes: &[Shape], tol: &Tolerance) -> Vec<Shape> {
    let mut merged = Vec::with_capacity(shapes.len());
    let mut i = 0;
    while i < shapes.len() {
        let full = closed_run_at(shapes, i, tol)
            .and_then(|len| merge_arcs(&shapes[i..i + len], tol).map(|shape| (shape, len)));
        match full {
            Some((shape, len)) => {
                merged.push(shape);
                i += len;
            }
            None => {
                merged.push(shapes[i]);
                i += 1;
            }
        }
    }
    merged
}
