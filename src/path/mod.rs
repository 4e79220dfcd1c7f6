//! Path mini-language translator
//!
//! Path data is a string of command letters, each followed by numeric
//! arguments. This module reads it into a canonical absolute command list,
//! writes that list back as text, and maps commands to and from sketch
//! shapes.
//!
//! Supported commands:
//!
//! | Letter | Arguments                        | Maps to              |
//! |--------|----------------------------------|----------------------|
//! | `M`    | x y                              | new subpath / point  |
//! | `L`    | x y                              | [`LineSegment`]      |
//! | `H`    | x                                | [`LineSegment`]      |
//! | `V`    | y                                | [`LineSegment`]      |
//! | `A`    | rx ry rotation large sweep x y   | circular or elliptical arc |
//! | `Z`    |                                  | closing segment      |
//!
//! Lowercase letters take coordinates relative to the current point. Curve
//! commands (`C`, `S`, `Q`, `T`) have no sketch counterpart and are rejected.
//!
//! [`LineSegment`]: crate::geometry::LineSegment

mod generator;
mod parser;
mod shapes;

use std::fmt;

use crate::arc::EndpointArc;
use crate::kernel::Point2;

pub use generator::{format_number, generate_path};
pub use parser::{parse_path, tokenize};
pub use shapes::{PathOutput, PathShapes, merge_arcs, merge_full_turns, path_from_shapes, shapes_from_path};

/// Arguments of an absolute arc command
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcTo {
    /// Radius along the rotated x axis
    pub rx: f64,
    /// Radius along the rotated y axis
    pub ry: f64,
    /// Rotation of the x axis in degrees, as written in path data
    pub rotation: f64,
    /// Large-arc flag
    pub large_arc: bool,
    /// Sweep flag; set for the positive-angle direction
    pub sweep: bool,
    /// End point
    pub end: Point2,
}

impl ArcTo {
    /// Build from an endpoint-form arc, discarding its start point
    pub fn from_endpoint_arc(arc: &EndpointArc) -> Self {
        Self {
            rx: arc.rx,
            ry: arc.ry,
            rotation: arc.rotation.to_degrees(),
            large_arc: arc.large_arc,
            sweep: arc.sweep_positive,
            end: arc.end,
        }
    }

    /// Endpoint-form arc starting at `start`
    ///
    /// Negative radii are taken by magnitude, as path readers do.
    pub fn to_endpoint_arc(&self, start: Point2) -> EndpointArc {
        EndpointArc {
            start,
            end: self.end,
            rx: self.rx.abs(),
            ry: self.ry.abs(),
            rotation: self.rotation.to_radians(),
            large_arc: self.large_arc,
            sweep_positive: self.sweep,
        }
    }
}

/// One canonical path command with absolute coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Start a new subpath
    MoveTo(Point2),
    /// Straight line to a point
    LineTo(Point2),
    /// Elliptical arc to a point
    ArcTo(ArcTo),
    /// Straight line back to the start of the subpath
    ClosePath,
}

impl PathCommand {
    /// Whether every coordinate of the command is finite
    pub fn is_finite(&self) -> bool {
        match self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => p.x.is_finite() && p.y.is_finite(),
            PathCommand::ArcTo(a) => [a.rx, a.ry, a.rotation, a.end.x, a.end.y].iter().all(|v| v.is_finite()),
            PathCommand::ClosePath => true,
        }
    }

    /// Command letter used when writing this command
    pub fn letter(&self) -> char {
        match self {
            PathCommand::MoveTo(_) => 'M',
            PathCommand::LineTo(_) => 'L',
            PathCommand::ArcTo(_) => 'A',
            PathCommand::ClosePath => 'Z',
        }
    }
}

impl fmt::Display for PathCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => write!(
                f,
                "{} {} {}",
                self.letter(),
                format_number(p.x),
                format_number(p.y)
            ),
            PathCommand::ArcTo(arc) => write!(
                f,
                "A {} {} {} {} {} {} {}",
                format_number(arc.rx),
                format_number(arc.ry),
                format_number(arc.rotation),
                u8::from(arc.large_arc),
                u8::from(arc.sweep),
                format_number(arc.end.x),
                format_number(arc.end.y)
            ),
            PathCommand::ClosePath => f.write_str("Z"),
        }
    }
}

/// A command as written, before relative coordinates and shorthand are resolved
#[derive(Debug, Clone, PartialEq)]
pub struct RawCommand {
    /// The command letter, case preserved
    pub letter: char,
    /// All numeric arguments following the letter, flags as 0 or 1
    pub args: Vec<f64>,
    /// Byte offset of the letter in the path text
    pub position: usize,
}

impl RawCommand {
    /// Number of arguments one repetition of this command takes
    pub fn arity(&self) -> usize {
        arity(self.letter)
    }

    /// Whether the coordinates are relative to the current point
    pub fn is_relative(&self) -> bool {
        self.letter.is_ascii_lowercase()
    }
}

pub(crate) fn arity(letter: char) -> usize {
    match letter.to_ascii_uppercase() {
        'M' | 'L' => 2,
        'H' | 'V' => 1,
        'A' => 7,
        _ => 0,
    }
}
