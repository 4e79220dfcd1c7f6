//! Integration tests for cadbridge
//!
//! These tests build parts through the public API and translate them through
//! both bridges, the registry and the archive container.

use approx::assert_relative_eq;
use cadbridge::geometry::{ArcDirection, Circle, Ellipse, EllipticalArc, LineSegment};
use cadbridge::kernel::{CoordinateSystem, Point2};
use cadbridge::{
    BridgeRegistry, ConstraintId, ConstraintKind, ConstraintReference, Error, Extrude, ExtrudeMode, FcstdBridge,
    Format, FormatBridge, Geometry, Operand, PartFile, Quantity, Shape, Sketch, SvgBridge, Tolerance,
    TranslationConfig, TranslationWarning, archive, make_constraint, validate_part,
};

fn segment(x0: f64, y0: f64, x1: f64, y1: f64) -> LineSegment {
    LineSegment::new(Point2::new(x0, y0), Point2::new(x1, y1)).unwrap()
}

fn constrain(sketch: &mut Sketch, kind: ConstraintKind, operands: Vec<Operand>, value: Option<Quantity>) {
    sketch.add_constraint(make_constraint(kind, operands, value).unwrap()).unwrap();
}

/// Unit square with corner, orientation, size and origin constraints
fn unit_square() -> Sketch {
    let mut sketch = Sketch::new("Square", CoordinateSystem::world());
    let ids = [
        sketch.add_geometry(segment(0.0, 0.0, 1.0, 0.0)),
        sketch.add_geometry(segment(1.0, 0.0, 1.0, 1.0)),
        sketch.add_geometry(segment(1.0, 1.0, 0.0, 1.0)),
        sketch.add_geometry(segment(0.0, 1.0, 0.0, 0.0)),
    ];
    let edges: Vec<Geometry> = ids.iter().map(|id| *sketch.geometry(*id).unwrap()).collect();

    for i in 0..4 {
        let next = &edges[(i + 1) % 4];
        constrain(
            &mut sketch,
            ConstraintKind::Coincident,
            vec![
                Operand::on(&edges[i], ConstraintReference::End).unwrap(),
                Operand::on(next, ConstraintReference::Start).unwrap(),
            ],
            None,
        );
    }
    for (i, edge) in edges.iter().enumerate() {
        let kind = if i % 2 == 0 {
            ConstraintKind::Horizontal
        } else {
            ConstraintKind::Vertical
        };
        constrain(
            &mut sketch,
            kind,
            vec![Operand::on(edge, ConstraintReference::Core).unwrap()],
            None,
        );
    }
    for edge in &edges[..2] {
        constrain(
            &mut sketch,
            ConstraintKind::Distance,
            vec![Operand::on(edge, ConstraintReference::Core).unwrap()],
            Some(Quantity::mm(1.0)),
        );
    }
    constrain(
        &mut sketch,
        ConstraintKind::Coincident,
        vec![
            Operand::on(&edges[0], ConstraintReference::Start).unwrap(),
            Operand::sketch_origin(),
        ],
        None,
    );
    sketch
}

fn assert_same_geometry(original: &Sketch, read: &Sketch) {
    assert_eq!(original.geometry_count(), read.geometry_count());
    let tol = Tolerance::default();
    for (a, b) in original.iter_geometry().zip(read.iter_geometry()) {
        assert_eq!(a.kind(), b.kind());
        assert!(tol.points_close(&a.shape.start_point().unwrap(), &b.shape.start_point().unwrap()));
        assert!(tol.points_close(&a.shape.end_point().unwrap(), &b.shape.end_point().unwrap()));
    }
}

/// The square exports as a single closed subpath and reimports unchanged
#[test]
fn test_square_through_svg() {
    let mut part = PartFile::new("Square");
    part.body.add_feature(unit_square()).unwrap();

    let bridge = SvgBridge::new(TranslationConfig::new().with_side_channel(false));
    let exported = bridge.export(&part).unwrap();
    assert!(exported.output.contains(r#"d="M 0 0 L 1 0 L 1 -1 L 0 -1 Z""#));
    assert_eq!(exported.warnings.len(), 11);

    let imported = bridge.import(&exported.output).unwrap().output;
    let read = &imported.body.sketches().next().unwrap().sketch;
    assert_same_geometry(&part.body.sketches().next().unwrap().sketch, read);
}

/// With the side channel the square keeps its constraints through SVG
#[test]
fn test_square_through_svg_side_channel() {
    let mut part = PartFile::new("Square");
    part.body.add_feature(unit_square()).unwrap();

    let bridge = SvgBridge::default();
    let exported = bridge.export(&part).unwrap();
    assert!(exported.is_lossless());

    let imported = bridge.import(&exported.output).unwrap();
    assert!(imported.is_lossless());
    let original = &part.body.sketches().next().unwrap().sketch;
    let read = &imported.output.body.sketches().next().unwrap().sketch;
    assert_same_geometry(original, read);
    assert_eq!(read.constraints(), original.constraints());
}

/// The square exports to the sketcher format with native constraints
#[test]
fn test_square_through_fcstd() {
    let mut part = PartFile::new("Square");
    part.body.add_feature(unit_square()).unwrap();

    let bridge = FcstdBridge::default();
    let exported = bridge.export(&part).unwrap();
    assert!(exported.is_lossless());
    assert!(exported.output.contains(r#"<GeometryList count="4">"#));
    assert!(exported.output.contains(r#"<ConstraintList count="11">"#));

    let imported = bridge.import(&exported.output).unwrap();
    assert!(imported.is_lossless());
    let original = &part.body.sketches().next().unwrap().sketch;
    let read = &imported.output.body.sketches().next().unwrap().sketch;
    assert_same_geometry(original, read);

    let kinds: Vec<ConstraintKind> = read.constraints().iter().map(|c| c.kind()).collect();
    let expected: Vec<ConstraintKind> = original.constraints().iter().map(|c| c.kind()).collect();
    assert_eq!(kinds, expected);
    assert!(read.check_consistency(&Tolerance::default()).is_consistent());
    validate_part(&imported.output, &Tolerance::default()).unwrap();
}

/// Constraints left behind by removed geometry are dropped on export
#[test]
fn test_dangling_constraints_dropped_on_export() {
    let mut sketch = unit_square();
    let top = sketch.iter_geometry().nth(2).unwrap().id;
    sketch.remove_geometry(top).unwrap();
    let dangling: Vec<ConstraintId> = sketch
        .constraints()
        .iter()
        .filter(|c| c.references(top))
        .map(|c| c.id())
        .collect();
    assert_eq!(dangling.len(), 3);

    let mut part = PartFile::new("Open");
    part.body.add_feature(sketch).unwrap();

    let bridges: [&dyn FormatBridge; 2] = [&SvgBridge::default(), &FcstdBridge::default()];
    for bridge in bridges {
        let exported = bridge.export(&part).unwrap();
        let dropped: Vec<ConstraintId> = exported
            .warnings
            .iter()
            .filter_map(|w| match w {
                TranslationWarning::DroppedConstraint { constraint, .. } => *constraint,
                _ => None,
            })
            .collect();
        assert_eq!(dropped, dangling, "{}", bridge.name());
        assert_eq!(exported.warnings.len(), 3);

        let imported = bridge.import(&exported.output).unwrap();
        assert!(imported.is_lossless());
        let read = &imported.output.body.sketches().next().unwrap().sketch;
        assert_eq!(read.geometry_count(), 3);
        assert_eq!(read.constraints().len(), 8);
    }
}

/// A circle drawn as two or four arcs comes back as a circle
#[test]
fn test_circle_through_arcs() {
    for segments in [2, 4] {
        let mut sketch = Sketch::new("Hole", CoordinateSystem::world());
        sketch.add_geometry(Circle::new(Point2::new(3.0, 4.0), 5.0).unwrap());
        let mut part = PartFile::new("Hole");
        part.body.add_feature(sketch).unwrap();

        let config = TranslationConfig::new()
            .with_side_channel(false)
            .with_circle_segments(segments);
        let bridge = SvgBridge::new(config);
        let exported = bridge.export(&part).unwrap();
        assert_eq!(exported.output.matches(" A ").count(), segments);

        let imported = bridge.import(&exported.output).unwrap().output;
        let sketch = &imported.body.sketches().next().unwrap().sketch;
        assert_eq!(sketch.geometry_count(), 1);
        match sketch.iter_geometry().next().unwrap().shape {
            Shape::Circle(c) => {
                assert_relative_eq!(c.center(), Point2::new(3.0, 4.0), epsilon = 1e-9);
                assert_relative_eq!(c.radius(), 5.0, epsilon = 1e-9);
            }
            other => panic!("expected a circle, got {other:?}"),
        }
    }
}

/// Bounds of an arc crossing zero include the extremum at zero
#[test]
fn test_bounds_of_arc_across_zero() {
    let ellipse = Ellipse::new(Point2::origin(), 2.0, 1.0, 0.0).unwrap();
    let arc = EllipticalArc::new(
        ellipse,
        350f64.to_radians(),
        10f64.to_radians(),
        ArcDirection::CounterClockwise,
    )
    .unwrap();
    let bounds = Shape::EllipticalArc(arc).bounds().unwrap();
    assert_relative_eq!(bounds.max.x, 2.0, epsilon = 1e-12);
    assert_relative_eq!(bounds.min.x, 2.0 * 10f64.to_radians().cos(), epsilon = 1e-12);
    assert_relative_eq!(bounds.max.y, 10f64.to_radians().sin(), epsilon = 1e-12);
    assert_relative_eq!(bounds.min.y, -(10f64.to_radians().sin()), epsilon = 1e-12);
}

/// Sketch and extrude survive the sketcher format in order
#[test]
fn test_extrude_round_trip() {
    let mut part = PartFile::new("Block");
    let profile = part.body.add_feature(unit_square()).unwrap();
    part.body
        .add_feature(
            Extrude::new("Pad", profile, -12.5)
                .unwrap()
                .with_mode(ExtrudeMode::TwoSided { opposite: 2.0 })
                .unwrap(),
        )
        .unwrap();

    let bridge = FcstdBridge::default();
    let back = bridge.import(&bridge.export(&part).unwrap().output).unwrap().output;
    assert_eq!(back.body.len(), 2);

    let sketch_id = back.body.sketches().next().unwrap().id;
    let names: Vec<&str> = back.body.iter().map(|f| f.name()).collect();
    assert_eq!(names, ["Square", "Pad"]);

    let extrude = back.body.extrudes().next().unwrap();
    assert_eq!(extrude.profile, sketch_id);
    assert_relative_eq!(extrude.length, -12.5);
    assert_eq!(extrude.mode, ExtrudeMode::TwoSided { opposite: 2.0 });
}

/// An extrude cannot come before the sketch it uses
#[test]
fn test_dependency_order() {
    let mut part = PartFile::new("Broken");
    let sketch = cadbridge::SketchFeature::new(unit_square());
    let err = part
        .body
        .add_feature(Extrude::new("Pad", sketch.id, 1.0).unwrap())
        .unwrap_err();
    assert!(matches!(err, Error::DependencyOrder { .. }));
    assert!(err.is_structural());
    assert!(part.body.is_empty());
}

/// References must exist on the geometry kind they target
#[test]
fn test_invalid_reference_is_structural() {
    let circle = Geometry::new(Circle::new(Point2::origin(), 1.0).unwrap());
    let err = Operand::on(&circle, ConstraintReference::Start).unwrap_err();
    assert!(matches!(err, Error::Structural(_)));
}

/// The registry converts an SVG drawing into a sketcher document
#[test]
fn test_registry_convert() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 -10 10 10">
  <g id="outline"><path d="M 0 0 L 10 0 L 10 -10 Z"/></g>
</svg>"#;
    let registry = BridgeRegistry::with_default_bridges();
    let converted = registry.convert(svg, Format::Svg, Format::Fcstd).unwrap();
    assert!(converted.is_lossless());
    assert!(converted.output.contains(r#"<GeometryList count="3">"#));
    assert!(converted.output.contains(r#"<String value="outline"/>"#));
}

/// Parts saved to an archive load back
#[test]
fn test_archive_file() {
    let mut part = PartFile::new("Archived");
    part.add_metadata("Revision", "B");
    part.body.add_feature(unit_square()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("square.FCStd");
    archive::save(&path, &part, &TranslationConfig::new()).unwrap();

    let loaded = archive::load(&path, &TranslationConfig::new()).unwrap().output;
    assert_eq!(loaded.name, "Archived");
    assert_eq!(loaded.metadata_value("Revision"), Some("B"));
    assert_eq!(loaded.body.sketches().next().unwrap().sketch.constraints().len(), 11);
}
