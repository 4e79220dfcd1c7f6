//! Format bridges
//!
//! A bridge translates a [`PartFile`] to and from one external document
//! format. Every bridge implements [`FormatBridge`]; a [`BridgeRegistry`]
//! holds one bridge per [`Format`] and converts documents between them.
//!
//! Bridges own the coordinate handling of their format: each declares a
//! [`CoordinateConvention`] and converts between it and the canonical y-up
//! convention of the model, so callers never flip axes themselves.
//!
//! Exports are lossy where the target format cannot carry something; what was
//! left out is listed as [`TranslationWarning`]s next to the output.

pub mod fcstd;
pub mod svg;
pub(crate) mod xml;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::constraint::Constraint;
use crate::error::{Error, Result};
use crate::feature::PartFile;
use crate::geometry::Shape;
use crate::id::{ConstraintId, GeometryId};
use crate::kernel::{Point2, Vector2};
use crate::sketch::Sketch;
use crate::tolerance::Tolerance;

pub use fcstd::FcstdBridge;
pub use svg::SvgBridge;

/// External document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Vector drawing with path data
    Svg,
    /// Parametric CAD document with native sketches
    Fcstd,
}

impl Format {
    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Format::Svg => "SVG",
            Format::Fcstd => "FreeCAD document",
        }
    }

    /// Usual file extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Svg => "svg",
            Format::Fcstd => "FCStd",
        }
    }

    /// Format for a file extension, ignoring case
    pub fn from_extension(extension: &str) -> Option<Self> {
        [Format::Svg, Format::Fcstd]
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(extension))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which way the y axis of a document points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisDirection {
    /// Upwards, as in the model
    #[default]
    Up,
    /// Downwards, as on a screen
    Down,
}

/// Where the document origin sits relative to the sketch
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OriginPlacement {
    /// Document and sketch share their origin
    #[default]
    SketchOrigin,
    /// The document origin lies at this sketch point
    At(Point2),
}

/// Axis direction and origin of a document format
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoordinateConvention {
    /// Direction of the document's y axis
    pub y_axis: AxisDirection,
    /// Document origin
    pub origin: OriginPlacement,
}

impl CoordinateConvention {
    /// Convention of the model itself
    pub fn y_up() -> Self {
        Self::default()
    }

    /// Screen-style convention with y pointing down
    pub fn y_down() -> Self {
        Self {
            y_axis: AxisDirection::Down,
            origin: OriginPlacement::SketchOrigin,
        }
    }

    /// Whether document and model coordinates coincide
    pub fn is_identity(&self) -> bool {
        self.y_axis == AxisDirection::Up && self.offset() == Vector2::zeros()
    }

    fn offset(&self) -> Vector2 {
        match self.origin {
            OriginPlacement::SketchOrigin => Vector2::zeros(),
            OriginPlacement::At(p) => p.coords,
        }
    }

    /// Map a model point into document coordinates
    pub fn point_to_document(&self, p: Point2) -> Point2 {
        let local = p - self.offset();
        match self.y_axis {
            AxisDirection::Up => local,
            AxisDirection::Down => Point2::new(local.x, -local.y),
        }
    }

    /// Map a document point into model coordinates
    pub fn point_to_canonical(&self, p: Point2) -> Point2 {
        let flipped = match self.y_axis {
            AxisDirection::Up => p,
            AxisDirection::Down => Point2::new(p.x, -p.y),
        };
        flipped + self.offset()
    }

    /// Map a model shape into document coordinates
    pub fn to_document(&self, shape: &Shape) -> Shape {
        let moved = shape.translated(&-self.offset());
        match self.y_axis {
            AxisDirection::Up => moved,
            AxisDirection::Down => moved.mirrored_y(),
        }
    }

    /// Map a document shape into model coordinates
    pub fn to_canonical(&self, shape: &Shape) -> Shape {
        let flipped = match self.y_axis {
            AxisDirection::Up => *shape,
            AxisDirection::Down => shape.mirrored_y(),
        };
        flipped.translated(&self.offset())
    }
}

/// Something a translation left out or changed
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationWarning {
    /// A constraint the target format cannot carry
    DroppedConstraint {
        /// Sketch holding the constraint
        sketch: String,
        /// The constraint, when it had an id
        constraint: Option<ConstraintId>,
        /// Why it was dropped
        reason: String,
    },
    /// Geometry the target format cannot draw
    DroppedGeometry {
        /// Sketch holding the geometry
        sketch: String,
        /// The geometry, when it had an id
        geometry: Option<GeometryId>,
        /// Why it was dropped
        reason: String,
    },
    /// A feature the target format cannot carry
    DroppedFeature {
        /// Name of the feature
        feature: String,
        /// Why it was dropped
        reason: String,
    },
    /// An entity skipped in best-effort mode
    SkippedEntity {
        /// Where the entity was found
        context: String,
        /// The error that caused the skip
        reason: String,
    },
    /// An arc whose radii were too small for its endpoints and were enlarged
    RadiiAdjusted {
        /// Sketch holding the arc
        sketch: String,
        /// Index of the arc among the sketch's drawn segments
        segment: usize,
    },
}

impl fmt::Display for TranslationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationWarning::DroppedConstraint {
                sketch,
                constraint,
                reason,
            } => match constraint {
                Some(id) => write!(f, "dropped constraint {} in sketch '{}': {}", id, sketch, reason),
                None => write!(f, "dropped constraint in sketch '{}': {}", sketch, reason),
            },
            TranslationWarning::DroppedGeometry {
                sketch,
                geometry,
                reason,
            } => match geometry {
                Some(id) => write!(f, "dropped geometry {} in sketch '{}': {}", id, sketch, reason),
                None => write!(f, "dropped geometry in sketch '{}': {}", sketch, reason),
            },
            TranslationWarning::DroppedFeature { feature, reason } => {
                write!(f, "dropped feature '{}': {}", feature, reason)
            }
            TranslationWarning::SkippedEntity { context, reason } => {
                write!(f, "skipped {}: {}", context, reason)
            }
            TranslationWarning::RadiiAdjusted { sketch, segment } => write!(
                f,
                "enlarged the radii of arc segment {} in sketch '{}' to reach its endpoints",
                segment, sketch
            ),
        }
    }
}

/// Output of a translation plus everything it could not carry over
#[derive(Debug, Clone, PartialEq)]
pub struct Translated<T> {
    /// The translated document or part
    pub output: T,
    /// Losses and corrections, in the order they happened
    pub warnings: Vec<TranslationWarning>,
}

impl<T> Translated<T> {
    /// Wrap an output with its warnings
    pub fn new(output: T, warnings: Vec<TranslationWarning>) -> Self {
        Self { output, warnings }
    }

    /// Whether nothing was lost or changed
    pub fn is_lossless(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Transform the output, keeping the warnings
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Translated<U> {
        Translated {
            output: f(self.output),
            warnings: self.warnings,
        }
    }
}

/// Options shared by all bridges
///
/// # Example
///
/// ```
/// use cadbridge::bridge::TranslationConfig;
///
/// let config = TranslationConfig::new()
///     .best_effort()
///     .with_circle_segments(4)
///     .with_margin(2.0);
/// assert!(config.best_effort);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslationConfig {
    /// Closeness policy for chaining, merging and consistency checks
    pub tolerance: Tolerance,
    /// Skip and report degenerate or unsupported entities instead of failing
    ///
    /// Documents that cannot be read at all still fail.
    pub best_effort: bool,
    /// Whether path documents carry the metadata block that preserves ids,
    /// constraints and features
    pub side_channel: bool,
    /// Number of arcs (2 or 4) a full circle or ellipse is drawn with
    pub circle_segments: usize,
    /// Space added around the drawing bounds, in millimeters
    pub margin: f64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslationConfig {
    /// Strict translation with the side channel enabled
    pub fn new() -> Self {
        Self {
            tolerance: Tolerance::default(),
            best_effort: false,
            side_channel: true,
            circle_segments: 2,
            margin: 0.0,
        }
    }

    /// Skip and report entities that cannot be translated
    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    /// Use a different closeness policy
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Enable or disable the metadata side channel
    pub fn with_side_channel(mut self, enabled: bool) -> Self {
        self.side_channel = enabled;
        self
    }

    /// Number of arcs per full circle or ellipse
    pub fn with_circle_segments(mut self, segments: usize) -> Self {
        self.circle_segments = segments;
        self
    }

    /// Margin around the drawing bounds
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Apply best-effort handling to the result of translating one entity
    ///
    /// In best-effort mode, degenerate geometry and fidelity gaps are turned
    /// into a [`TranslationWarning::SkippedEntity`] and `None`. Anything
    /// else, and every error in strict mode, is returned.
    pub(crate) fn recover<T>(
        &self,
        result: Result<T>,
        context: impl FnOnce() -> String,
        warnings: &mut Vec<TranslationWarning>,
    ) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if self.best_effort && is_recoverable(&e) => {
                let context = context();
                warn!("Skipping {}: {}", context, e);
                warnings.push(TranslationWarning::SkippedEntity {
                    context,
                    reason: e.to_string(),
                });
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Structural errors are never recoverable
fn is_recoverable(error: &Error) -> bool {
    matches!(
        error,
        Error::DegenerateGeometry(_)
            | Error::DegenerateVector(_)
            | Error::InvalidGeometry(_)
            | Error::UnsupportedConstraint(_)
    )
}

/// Constraints of `sketch` that can be exported
///
/// Dangling constraints are left out and reported as dropped.
pub(crate) fn exportable_constraints<'a>(
    sketch: &'a Sketch,
    warnings: &mut Vec<TranslationWarning>,
) -> Vec<&'a Constraint> {
    let mut exportable = Vec::with_capacity(sketch.constraints().len());
    for constraint in sketch.constraints() {
        if sketch.is_dangling(constraint) {
            warn!(
                "Dropping dangling {} constraint {} in sketch '{}'",
                constraint.kind(),
                constraint.id(),
                sketch.name()
            );
            warnings.push(TranslationWarning::DroppedConstraint {
                sketch: sketch.name().to_string(),
                constraint: Some(constraint.id()),
                reason: "refers to geometry that is no longer in the sketch".to_string(),
            });
        } else {
            exportable.push(constraint);
        }
    }
    exportable
}

/// Translator between the model and one external format
///
/// Implementations must be stateless apart from their configuration so a
/// registry can share them across threads.
///
/// # Example
///
/// ```ignore
/// struct TextBridge;
///
/// impl FormatBridge for TextBridge {
///     fn format(&self) -> Format { Format::Svg }
///     fn convention(&self) -> CoordinateConvention { CoordinateConvention::y_down() }
///     fn export(&self, part: &PartFile) -> Result<Translated<String>> { todo!() }
///     fn import(&self, document: &str) -> Result<Translated<PartFile>> { todo!() }
/// }
/// ```
pub trait FormatBridge: Send + Sync {
    /// The format this bridge reads and writes
    fn format(&self) -> Format;

    /// Human-readable name of the bridge
    fn name(&self) -> &'static str {
        self.format().name()
    }

    /// Coordinate convention of the format's documents
    fn convention(&self) -> CoordinateConvention;

    /// Write a part as a document
    ///
    /// Elements the format cannot carry are left out and reported as
    /// warnings.
    fn export(&self, part: &PartFile) -> Result<Translated<String>>;

    /// Read a part from a document
    ///
    /// Malformed documents fail; in best-effort mode, entities that cannot
    /// be translated are skipped and reported.
    fn import(&self, document: &str) -> Result<Translated<PartFile>>;
}

/// Collection of bridges, at most one per format
#[derive(Clone, Default)]
pub struct BridgeRegistry {
    bridges: Vec<Arc<dyn FormatBridge>>,
}

impl BridgeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            bridges: Vec::new(),
        }
    }

    /// Registry with the SVG and FreeCAD bridges using the default configuration
    pub fn with_default_bridges() -> Self {
        Self::with_config(TranslationConfig::default())
    }

    /// Registry with the SVG and FreeCAD bridges sharing one configuration
    pub fn with_config(config: TranslationConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SvgBridge::new(config)));
        registry.register(Arc::new(FcstdBridge::new(config)));
        registry
    }

    /// Register a bridge, replacing any bridge for the same format
    pub fn register(&mut self, bridge: Arc<dyn FormatBridge>) {
        self.bridges.retain(|b| b.format() != bridge.format());
        self.bridges.push(bridge);
    }

    /// Bridge for a format
    pub fn get(&self, format: Format) -> Option<&dyn FormatBridge> {
        self.bridges
            .iter()
            .find(|b| b.format() == format)
            .map(|b| b.as_ref())
    }

    /// Formats with a registered bridge
    pub fn formats(&self) -> Vec<Format> {
        self.bridges.iter().map(|b| b.format()).collect()
    }

    fn require(&self, format: Format) -> Result<&dyn FormatBridge> {
        self.get(format)
            .ok_or_else(|| Error::InvalidFormat(format!("No bridge registered for {}", format)))
    }

    /// Translate a document from one format to another
    ///
    /// Warnings of the import and the export are returned together.
    pub fn convert(&self, document: &str, from: Format, to: Format) -> Result<Translated<String>> {
        let source = self.require(from)?;
        let target = self.require(to)?;
        debug!("Converting {} document to {}", from, to);

        let imported = source.import(document)?;
        let exported = target.export(&imported.output)?;

        let mut warnings = imported.warnings;
        warnings.extend(exported.warnings);
        Ok(Translated::new(exported.output, warnings))
    }
}
