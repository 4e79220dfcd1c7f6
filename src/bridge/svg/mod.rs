//! SVG bridge
//!
//! Each sketch becomes one `<g>` element holding a `<path>` per chained
//! subpath. SVG has no notion of constraints or features, so unless the
//! side channel is disabled, a `<metadata>` block in the
//! `urn:cadbridge:sketch:1` namespace records everything the drawing cannot:
//!
//! | Element            | Carries                                              |
//! |--------------------|------------------------------------------------------|
//! | `cad:part`         | part name, unit and, as children, the feature history |
//! | `cad:meta`         | one metadata entry                                   |
//! | `cad:sketch`       | sketch feature id and name                           |
//! | `cad:placement`    | sketch frame origin and orientation                  |
//! | `cad:geometry`     | id, kind and the path segments drawn for it          |
//! | `cad:constraint`   | id, kind, value and `cad:operand` children           |
//! | `cad:extrude`      | extrude feature                                      |
//!
//! Geometry is tied to the drawing through segment indices: the segments of
//! a sketch's group are numbered in document order, and each geometry record
//! names the first segment and how many it spans. Infinite lines have no
//! drawing and keep their definition in the record.
//!
//! Documents use y-down coordinates in millimeters.

mod reader;
mod writer;

use crate::error::{Error, Result};
use crate::feature::{ExtrudeMode, PartFile};

use super::{CoordinateConvention, Format, FormatBridge, TranslationConfig, Translated};

/// SVG namespace
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Namespace of the metadata side channel
pub const CAD_NAMESPACE: &str = "urn:cadbridge:sketch:1";

/// Bridge between parts and SVG drawings
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgBridge {
    config: TranslationConfig,
}

impl SvgBridge {
    /// Create a bridge with the given configuration
    pub fn new(config: TranslationConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }
}

impl FormatBridge for SvgBridge {
    fn format(&self) -> Format {
        Format::Svg
    }

    fn convention(&self) -> CoordinateConvention {
        CoordinateConvention::y_down()
    }

    fn export(&self, part: &PartFile) -> Result<Translated<String>> {
        writer::write_svg(part, &self.config, &self.convention())
    }

    fn import(&self, document: &str) -> Result<Translated<PartFile>> {
        reader::read_svg(document, &self.config, &self.convention())
    }
}

fn mode_name(mode: &ExtrudeMode) -> &'static str {
    match mode {
        ExtrudeMode::OneSided => "one-sided",
        ExtrudeMode::Symmetric => "symmetric",
        ExtrudeMode::TwoSided { .. } => "two-sided",
    }
}

fn mode_from_name(name: &str, opposite: f64) -> Result<ExtrudeMode> {
    match name {
        "one-sided" => Ok(ExtrudeMode::OneSided),
        "symmetric" => Ok(ExtrudeMode::Symmetric),
        "two-sided" => Ok(ExtrudeMode::TwoSided { opposite }),
        other => Err(Error::parse_error_with_context("extrude mode", other, "an extrude mode")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::TranslationWarning;
    use crate::constraint::{ConstraintKind, ConstraintReference, Operand, Quantity, make_constraint};
    use crate::feature::{Extrude, SketchFeature};
    use crate::geometry::{ArcDirection, Circle, CircularArc, Geometry, Line, LineSegment, Shape};
    use crate::kernel::{CoordinateSystem, FRAC_PI_2, Point2, Point3, Vector2};
    use crate::sketch::Sketch;
    use approx::assert_relative_eq;

    fn segment(x0: f64, y0: f64, x1: f64, y1: f64) -> LineSegment {
        LineSegment::new(Point2::new(x0, y0), Point2::new(x1, y1)).unwrap()
    }

    fn square_part() -> PartFile {
        let mut sketch = Sketch::new("Profile", CoordinateSystem::world());
        let edges = [
            sketch.add_geometry(segment(0.0, 0.0, 10.0, 0.0)),
            sketch.add_geometry(segment(10.0, 0.0, 10.0, 10.0)),
            sketch.add_geometry(segment(10.0, 10.0, 0.0, 10.0)),
            sketch.add_geometry(segment(0.0, 10.0, 0.0, 0.0)),
        ];
        let bottom = *sketch.geometry(edges[0]).unwrap();
        let right = *sketch.geometry(edges[1]).unwrap();
        sketch
            .add_constraint(make_constraint(ConstraintKind::Horizontal, vec![Operand::on(&bottom, ConstraintReference::Core).unwrap()], None).unwrap())
            .unwrap();
        sketch
            .add_constraint(
                make_constraint(
                    ConstraintKind::Coincident,
                    vec![
                        Operand::on(&bottom, ConstraintReference::End).unwrap(),
                        Operand::on(&right, ConstraintReference::Start).unwrap(),
                    ],
                    None,
                )
                .unwrap(),
            )
            .unwrap();
        sketch
            .add_constraint(
                make_constraint(
                    ConstraintKind::Distance,
                    vec![Operand::on(&bottom, ConstraintReference::Core).unwrap()],
                    Some(Quantity::mm(10.0)),
                )
                .unwrap(),
            )
            .unwrap();

        let mut part = PartFile::new("Bracket");
        part.add_metadata("author", "R&D <cad>");
        let profile = part.body.add_feature(sketch).unwrap();
        part.body
            .add_feature(Extrude::new("Pad", profile, 5.0).unwrap().with_mode(ExtrudeMode::TwoSided { opposite: 2.0 }).unwrap())
            .unwrap();
        part
    }

    #[test]
    fn test_square_exports_one_closed_path() {
        let exported = SvgBridge::default().export(&square_part()).unwrap();
        assert!(exported.is_lossless());
        assert!(exported.output.contains("d=\"M 0 0 L 10 0 L 10 -10 L 0 -10 Z\""));
        assert!(exported.output.contains("viewBox=\"0 -10 10 10\""));
        assert_eq!(exported.output.matches("<path ").count(), 1);
    }

    #[test]
    fn test_side_channel_round_trip() {
        let part = square_part();
        let bridge = SvgBridge::default();
        let exported = bridge.export(&part).unwrap();
        let imported = bridge.import(&exported.output).unwrap();
        assert!(imported.is_lossless());

        let back = imported.output;
        assert_eq!(back.name, "Bracket");
        assert_eq!(back.metadata_value("author"), Some("R&D <cad>"));
        assert_eq!(back.body.len(), 2);

        let original = part.body.sketches().next().unwrap();
        let sketch = back.body.sketches().next().unwrap();
        assert_eq!(sketch.id, original.id);
        assert_eq!(sketch.sketch.name(), "Profile");
        for (a, b) in original.sketch.iter_geometry().zip(sketch.sketch.iter_geometry()) {
            assert_eq!(a.id, b.id);
            assert_relative_eq!(a.shape.start_point().unwrap(), b.shape.start_point().unwrap(), epsilon = 1e-9);
            assert_relative_eq!(a.shape.end_point().unwrap(), b.shape.end_point().unwrap(), epsilon = 1e-9);
        }
        assert_eq!(sketch.sketch.constraints(), original.sketch.constraints());

        let extrude = back.body.extrudes().next().unwrap();
        assert_eq!(extrude.profile, original.id);
        assert_eq!(extrude.mode, ExtrudeMode::TwoSided { opposite: 2.0 });
        assert_relative_eq!(extrude.length, 5.0);
    }

    #[test]
    fn test_without_side_channel_reports_losses() {
        let mut part = square_part();
        let sketch_id = part.body.sketches().next().unwrap().id;
        part.body
            .sketch_mut(sketch_id)
            .unwrap()
            .add_geometry(Line::new(Point2::origin(), Vector2::x()).unwrap());

        let bridge = SvgBridge::new(TranslationConfig::new().with_side_channel(false));
        let exported = bridge.export(&part).unwrap();
        assert!(!exported.output.contains("metadata"));
        let dropped_constraints = exported
            .warnings
            .iter()
            .filter(|w| matches!(w, TranslationWarning::DroppedConstraint { .. }))
            .count();
        assert_eq!(dropped_constraints, 3);
        assert!(exported.warnings.iter().any(|w| matches!(w, TranslationWarning::DroppedFeature { .. })));
        assert!(exported.warnings.iter().any(|w| matches!(w, TranslationWarning::DroppedGeometry { .. })));

        let imported = bridge.import(&exported.output).unwrap();
        let sketch = imported.output.body.sketches().next().unwrap();
        assert_eq!(sketch.sketch.name(), "Profile");
        assert_eq!(sketch.sketch.geometry_count(), 4);
        assert!(sketch.sketch.constraints().is_empty());
    }

    #[test]
    fn test_circle_and_arc_recovered() {
        let mut sketch = Sketch::new("Round", CoordinateSystem::world());
        let circle = sketch.add_geometry(Circle::new(Point2::new(2.0, -1.0), 5.0).unwrap());
        let arc = sketch.add_geometry(
            CircularArc::new(Point2::new(20.0, 0.0), 3.0, 0.0, FRAC_PI_2, ArcDirection::Clockwise).unwrap(),
        );
        let mut part = PartFile::new("Round");
        part.body.add_feature(sketch).unwrap();

        for segments in [2, 4] {
            let bridge = SvgBridge::new(TranslationConfig::new().with_circle_segments(segments));
            let exported = bridge.export(&part).unwrap();
            let imported = bridge.import(&exported.output).unwrap();
            let sketch = &imported.output.body.sketches().next().unwrap().sketch;

            match sketch.geometry(circle).unwrap().shape {
                Shape::Circle(c) => {
                    assert_relative_eq!(c.center(), Point2::new(2.0, -1.0), epsilon = 1e-9);
                    assert_relative_eq!(c.radius(), 5.0, epsilon = 1e-9);
                }
                other => panic!("expected a circle, got {other:?}"),
            }
            match sketch.geometry(arc).unwrap().shape {
                Shape::CircularArc(a) => {
                    assert_eq!(a.direction(), ArcDirection::Clockwise);
                    assert_relative_eq!(a.radius(), 3.0, epsilon = 1e-9);
                    assert_relative_eq!(a.start_point(), Point2::new(23.0, 0.0), epsilon = 1e-9);
                    assert_relative_eq!(a.end_point(), Point2::new(20.0, 3.0), epsilon = 1e-9);
                }
                other => panic!("expected an arc, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_sketch_frame_preserved() {
        let frame = CoordinateSystem::from_euler(Point3::new(1.0, 2.0, 3.0), FRAC_PI_2, 0.0, 0.0);
        let mut sketch = Sketch::new("Side", frame);
        sketch.insert_geometry(Geometry::new(segment(0.0, 0.0, 1.0, 1.0)).construction()).unwrap();
        let mut part = PartFile::new("Framed");
        part.body.add_feature(SketchFeature::new(sketch)).unwrap();

        let bridge = SvgBridge::default();
        let imported = bridge.import(&bridge.export(&part).unwrap().output).unwrap();
        let sketch = &imported.output.body.sketches().next().unwrap().sketch;
        assert_relative_eq!(sketch.frame().origin(), Point3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(sketch.frame().z_axis(), frame.z_axis(), epsilon = 1e-12);
        assert!(sketch.iter_geometry().next().unwrap().construction);
    }

    #[test]
    fn test_extrude_mode_names() {
        for mode in [ExtrudeMode::OneSided, ExtrudeMode::Symmetric, ExtrudeMode::TwoSided { opposite: 1.5 }] {
            let opposite = match mode {
                ExtrudeMode::TwoSided { opposite } => opposite,
                _ => 0.0,
            };
            assert_eq!(mode_from_name(mode_name(&mode), opposite).unwrap(), mode);
        }
        assert!(mode_from_name("both", 0.0).is_err());
    }
}
