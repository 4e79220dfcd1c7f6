//! # cadbridge
//!
//! Geometry interchange and constraint engine for 2D CAD sketches.
//!
//! A part is an ordered history of features: sketches placed on planes in
//! space, holding geometry (points, lines, segments, circles, arcs, ellipses)
//! and declarative constraints, followed by extrusions of those sketches.
//! Format bridges translate parts to and from external documents:
//!
//! - SVG drawings, through the path mini-language (`M`, `L`, `A`, `Z`), with
//!   an optional metadata side channel carrying what paths cannot express
//! - FreeCAD documents with native sketcher geometry and constraints,
//!   optionally wrapped in an `.FCStd` zip archive
//!
//! ## Features
//!
//! - Pure Rust implementation with no unsafe code
//! - Exact conversion between center and endpoint arc descriptions
//! - Spatial relations (parallel, tangent, intersection, projection) across
//!   sketch planes
//! - Lossy exports report what was left out instead of failing
//!
//! ## Example
//!
//! ```
//! use cadbridge::{BridgeRegistry, Format, FormatBridge, PartFile, Sketch, CoordinateSystem};
//! use cadbridge::geometry::LineSegment;
//! use cadbridge::kernel::Point2;
//!
//! # fn main() -> cadbridge::Result<()> {
//! let mut sketch = Sketch::new("Base", CoordinateSystem::world());
//! sketch.add_geometry(LineSegment::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0))?);
//!
//! let mut part = PartFile::new("Plate");
//! part.body.add_feature(sketch)?;
//!
//! let registry = BridgeRegistry::with_default_bridges();
//! let svg = registry.get(Format::Svg).expect("registered").export(&part)?;
//! assert!(svg.output.contains("M 0 0 L 10 0"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod arc;
pub mod archive;
pub mod bridge;
pub mod constraint;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod id;
pub mod kernel;
pub mod path;
pub mod relations;
pub mod sketch;
pub mod tolerance;
pub mod validator;

pub use bridge::{
    BridgeRegistry, CoordinateConvention, FcstdBridge, Format, FormatBridge, SvgBridge, Translated,
    TranslationConfig, TranslationWarning,
};
pub use constraint::{Constraint, ConstraintKind, ConstraintReference, LengthUnit, Operand, Quantity, make_constraint};
pub use error::{Error, Result};
pub use feature::{Extrude, ExtrudeMode, Feature, FeatureContainer, MetadataEntry, PartFile, SketchFeature};
pub use geometry::{Geometry, Shape, ShapeKind};
pub use id::{ConstraintId, FeatureId, GeometryId};
pub use kernel::CoordinateSystem;
pub use sketch::Sketch;
pub use tolerance::Tolerance;
pub use validator::validate_part;
