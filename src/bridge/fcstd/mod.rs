//! FreeCAD document bridge
//!
//! Parts are written as the `Document.xml` of a FreeCAD document: a
//! `PartDesign::Body` whose `Group` lists the features in history order, one
//! `Sketcher::SketchObject` per sketch and one `PartDesign::Pad` per extrude.
//! Use [`crate::archive`] to wrap the document in an `.FCStd` zip container.
//!
//! Sketcher documents use the model's own y-up convention, so no flip is
//! applied. Their limitations show up elsewhere:
//!
//! - arcs always run counter-clockwise; clockwise arcs are written as the
//!   same curve traversed the other way, with start and end references of
//!   their constraints swapped
//! - dimensional values are stored in millimeters and radians
//! - entities carry no stable identifiers, so imported geometry, constraints
//!   and features receive fresh ids
//!
//! Constraint types are translated through the lookup table in [`table`].

mod reader;
pub mod table;
mod writer;

use crate::error::Result;
use crate::feature::PartFile;

use super::{CoordinateConvention, Format, FormatBridge, TranslationConfig, Translated};

pub(crate) const BODY_TYPE: &str = "PartDesign::Body";
pub(crate) const SKETCH_TYPE: &str = "Sketcher::SketchObject";
pub(crate) const PAD_TYPE: &str = "PartDesign::Pad";

/// Pad type: a single length
pub(crate) const PAD_LENGTH: i64 = 0;
/// Pad type: a length on each side
pub(crate) const PAD_TWO_LENGTHS: i64 = 4;

/// Bridge between parts and FreeCAD documents
#[derive(Debug, Clone, Copy, Default)]
pub struct FcstdBridge {
    config: TranslationConfig,
}

impl FcstdBridge {
    /// Create a bridge with the given configuration
    pub fn new(config: TranslationConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }
}

impl FormatBridge for FcstdBridge {
    fn format(&self) -> Format {
        Format::Fcstd
    }

    fn convention(&self) -> CoordinateConvention {
        CoordinateConvention::y_up()
    }

    fn export(&self, part: &PartFile) -> Result<Translated<String>> {
        writer::write_document(part, &self.config, &self.convention())
    }

    fn import(&self, document: &str) -> Result<Translated<PartFile>> {
        reader::read_document(document, &self.config, &self.convention())
    }
}

/// FreeCAD-style unique object name: `Sketch`, `Sketch001`, `Sketch002`, ...
pub(crate) fn object_name(base: &str, index: usize) -> String {
    if index == 0 {
        base.to_string()
    } else {
        format!("{}{:03}", base, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::TranslationWarning;
    use crate::constraint::{ConstraintKind, ConstraintReference, Operand, Quantity, make_constraint};
    use crate::feature::{Extrude, ExtrudeMode};
    use crate::geometry::{ArcDirection, CircularArc, Ellipse, EllipticalArc, Geometry, LineSegment, Shape};
    use crate::kernel::{CoordinateSystem, FRAC_PI_2, PI, Point2, Point3};
    use crate::sketch::Sketch;
    use approx::assert_relative_eq;

    fn segment(x0: f64, y0: f64, x1: f64, y1: f64) -> LineSegment {
        LineSegment::new(Point2::new(x0, y0), Point2::new(x1, y1)).unwrap()
    }

    #[test]
    fn test_object_names() {
        assert_eq!(object_name("Sketch", 0), "Sketch");
        assert_eq!(object_name("Sketch", 1), "Sketch001");
        assert_eq!(object_name("Pad", 12), "Pad012");
    }

    #[test]
    fn test_document_layout() {
        let mut sketch = Sketch::new("Profile", CoordinateSystem::world());
        let edge = sketch.add_geometry(segment(0.0, 0.0, 4.0, 0.0));
        let edge = *sketch.geometry(edge).unwrap();
        sketch
            .add_constraint(
                make_constraint(
                    ConstraintKind::Coincident,
                    vec![Operand::on(&edge, ConstraintReference::Start).unwrap(), Operand::sketch_origin()],
                    None,
                )
                .unwrap(),
            )
            .unwrap();
        let mut part = PartFile::new("Plate");
        let profile = part.body.add_feature(sketch).unwrap();
        part.body.add_feature(Extrude::new("Pad", profile, -3.0).unwrap()).unwrap();

        let exported = FcstdBridge::default().export(&part).unwrap();
        assert!(exported.is_lossless());
        let xml = exported.output;
        assert!(xml.contains(r#"<Object type="Sketcher::SketchObject" name="Sketch" id="2"/>"#));
        assert!(xml.contains(r#"<Geometry type="Part::GeomLineSegment">"#));
        assert!(xml.contains(r#"Type="1" Value="0" First="0" FirstPos="1" Second="-1" SecondPos="1" Third="-2000" ThirdPos="0""#));
        assert!(xml.contains(r#"<LinkSub value="Sketch" count="0"/>"#));
        assert!(xml.contains(r#"<Bool value="true"/>"#));
    }

    #[test]
    fn test_clockwise_arc_written_counter_clockwise() {
        let mut sketch = Sketch::new("Arc", CoordinateSystem::world());
        let arc = sketch.add_geometry(
            CircularArc::new(Point2::origin(), 2.0, FRAC_PI_2, 0.0, ArcDirection::Clockwise).unwrap(),
        );
        let arc = *sketch.geometry(arc).unwrap();
        let pin = make_constraint(
            ConstraintKind::Coincident,
            vec![Operand::on(&arc, ConstraintReference::Start).unwrap(), Operand::sketch_origin()],
            None,
        )
        .unwrap();
        sketch.add_constraint(pin).unwrap();
        let mut part = PartFile::new("Arc");
        part.body.add_feature(sketch).unwrap();

        let bridge = FcstdBridge::default();
        let exported = bridge.export(&part).unwrap();
        assert!(exported.output.contains("FirstPos=\"2\""));

        let imported = bridge.import(&exported.output).unwrap().output;
        let sketch = &imported.body.sketches().next().unwrap().sketch;
        let geometry = sketch.iter_geometry().next().unwrap();
        match geometry.shape {
            Shape::CircularArc(a) => {
                assert_eq!(a.direction(), ArcDirection::CounterClockwise);
                assert_relative_eq!(a.start_point(), Point2::new(2.0, 0.0), epsilon = 1e-12);
                assert_relative_eq!(a.end_point(), Point2::new(0.0, 2.0), epsilon = 1e-12);
            }
            other => panic!("expected an arc, got {other:?}"),
        }
        assert_eq!(sketch.constraints()[0].operands()[0].reference(), ConstraintReference::End);
    }

    #[test]
    fn test_round_trip_keeps_shapes_frame_and_values() {
        let frame = CoordinateSystem::from_euler(Point3::new(0.0, 0.0, 10.0), 0.0, FRAC_PI_2, 0.0);
        let mut sketch = Sketch::new("Mixed", frame);
        let ellipse = Ellipse::new(Point2::new(1.0, 2.0), 3.0, 1.0, 0.5).unwrap();
        let shapes: Vec<Shape> = vec![
            segment(0.0, 0.0, 5.0, 5.0).into(),
            Shape::Ellipse(ellipse),
            Shape::EllipticalArc(EllipticalArc::new(ellipse, 0.2, 2.0, ArcDirection::CounterClockwise).unwrap()),
        ];
        for shape in &shapes {
            sketch.add_geometry(*shape);
        }
        sketch.insert_geometry(Geometry::new(segment(0.0, 1.0, 0.0, 2.0)).construction()).unwrap();
        let first = *sketch.iter_geometry().next().unwrap();
        sketch
            .add_constraint(
                make_constraint(
                    ConstraintKind::Angle,
                    vec![Operand::on(&first, ConstraintReference::Core).unwrap(), Operand::sketch_x_axis()],
                    Some(Quantity::degrees(45.0)),
                )
                .unwrap(),
            )
            .unwrap();
        let mut part = PartFile::new("Mixed");
        let profile = part.body.add_feature(sketch).unwrap();
        part.body
            .add_feature(Extrude::new("Pad", profile, 8.0).unwrap().with_mode(ExtrudeMode::Symmetric).unwrap())
            .unwrap();

        let bridge = FcstdBridge::default();
        let imported = bridge.import(&bridge.export(&part).unwrap().output).unwrap();
        assert!(imported.is_lossless());
        let back = imported.output;

        let sketch = &back.body.sketches().next().unwrap().sketch;
        assert_relative_eq!(sketch.frame().origin(), Point3::new(0.0, 0.0, 10.0));
        assert_relative_eq!(sketch.frame().z_axis(), frame.z_axis(), epsilon = 1e-12);
        let read: Vec<&Geometry> = sketch.iter_geometry().collect();
        assert_eq!(read.len(), 4);
        for (original, read) in shapes.iter().zip(&read) {
            assert_eq!(original, &read.shape);
        }
        assert!(read[3].construction);

        let angle = &sketch.constraints()[0];
        assert_eq!(angle.kind(), ConstraintKind::Angle);
        assert_relative_eq!(angle.value().unwrap().canonical(), PI / 4.0, epsilon = 1e-12);

        let extrude = back.body.extrudes().next().unwrap();
        assert_eq!(extrude.mode, ExtrudeMode::Symmetric);
        assert_relative_eq!(extrude.length, 8.0);
    }

    #[test]
    fn test_unknown_native_constraint() {
        let document = r#"<?xml version="1.0" encoding="UTF-8"?>
<Document SchemaVersion="4">
  <Objects Count="1">
    <Object type="Sketcher::SketchObject" name="Sketch"/>
  </Objects>
  <ObjectData Count="1">
    <Object name="Sketch">
      <Properties Count="2">
        <Property name="Geometry" type="Part::PropertyGeometryList">
          <GeometryList count="1">
            <Geometry type="Part::GeomLineSegment">
              <LineSegment StartX="0" StartY="0" StartZ="0" EndX="1" EndY="0" EndZ="0"/>
              <Construction value="0"/>
            </Geometry>
          </GeometryList>
        </Property>
        <Property name="Constraints" type="Sketcher::PropertyConstraintList">
          <ConstraintList count="2">
            <Constrain Name="" Type="5" Value="0" First="0" FirstPos="0" Second="-1" SecondPos="0" Third="-2000" ThirdPos="0"/>
            <Constrain Name="" Type="2" Value="0" First="0" FirstPos="0" Second="-2000" SecondPos="0" Third="-2000" ThirdPos="0"/>
          </ConstraintList>
        </Property>
      </Properties>
    </Object>
  </ObjectData>
</Document>"#;
        let strict = FcstdBridge::default().import(document);
        assert!(matches!(strict, Err(crate::error::Error::UnsupportedConstraint(_))));

        let lenient = FcstdBridge::new(TranslationConfig::new().best_effort()).import(document).unwrap();
        assert_eq!(lenient.warnings.len(), 1);
        assert!(matches!(lenient.warnings[0], TranslationWarning::SkippedEntity { .. }));
        let sketch = &lenient.output.body.sketches().next().unwrap().sketch;
        assert_eq!(sketch.constraints().len(), 1);
        assert_eq!(sketch.constraints()[0].kind(), ConstraintKind::Horizontal);
    }
}
