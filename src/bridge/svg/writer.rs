use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use tracing::{debug, warn};

use super::{CAD_NAMESPACE, SVG_NAMESPACE, mode_name};
use crate::arc::{BoundingBox, bounds_of};
use crate::bridge::xml::{into_string, write_empty, write_end, write_start};
use crate::bridge::{CoordinateConvention, TranslationConfig, TranslationWarning, Translated, exportable_constraints};
use crate::constraint::{Constraint, Target};
use crate::error::{Error, Result};
use crate::feature::{Extrude, ExtrudeMode, Feature, PartFile, SketchFeature};
use crate::geometry::{Geometry, Shape};
use crate::kernel::Point2;
use crate::path::{PathCommand, PathOutput, format_number, generate_path, path_from_shapes};

/// Stroke width of drawn paths, in millimeters
const STROKE_WIDTH: &str = "0.35";

/// A sketch converted to path commands in document coordinates
struct SketchDrawing<'a> {
    feature: &'a SketchFeature,
    output: PathOutput,
    bounds: Option<BoundingBox>,
    constraints: Vec<&'a Constraint>,
}

pub(super) fn write_svg(
    part: &PartFile,
    config: &TranslationConfig,
    convention: &CoordinateConvention,
) -> Result<Translated<String>> {
    let mut warnings = Vec::new();
    let mut drawings = Vec::new();
    for feature in part.body.sketches() {
        drawings.push(draw_sketch(feature, config, convention, &mut warnings)?);
    }

    if !config.side_channel {
        report_losses(part, &drawings, &mut warnings);
    }

    let boxes: Vec<BoundingBox> = drawings.iter().filter_map(|d| d.bounds).collect();
    let bounds = bounds_of(&boxes)
        .unwrap_or_else(|| BoundingBox::from_point(Point2::origin()))
        .expand(config.margin);

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| Error::xml_write(format!("Failed to write XML declaration: {}", e)))?;

    let mut svg = BytesStart::new("svg");
    svg.push_attribute(("xmlns", SVG_NAMESPACE));
    if config.side_channel {
        svg.push_attribute(("xmlns:cad", CAD_NAMESPACE));
    }
    svg.push_attribute(("version", "1.1"));
    svg.push_attribute(("width", format!("{}mm", format_number(bounds.width())).as_str()));
    svg.push_attribute(("height", format!("{}mm", format_number(bounds.height())).as_str()));
    let view_box = [bounds.min.x, bounds.min.y, bounds.width(), bounds.height()]
        .map(format_number)
        .join(" ");
    svg.push_attribute(("viewBox", view_box.as_str()));
    write_start(&mut writer, svg)?;

    write_start(&mut writer, BytesStart::new("title"))?;
    writer
        .write_event(Event::Text(BytesText::new(&part.name)))
        .map_err(|e| Error::xml_write(format!("Failed to write title: {}", e)))?;
    write_end(&mut writer, "title")?;

    if config.side_channel {
        write_metadata(&mut writer, part, &drawings)?;
    }
    for drawing in &drawings {
        write_group(&mut writer, drawing)?;
    }

    write_end(&mut writer, "svg")?;

    debug!(
        "Exported part '{}' to SVG: {} sketch(es), {} warning(s)",
        part.name,
        drawings.len(),
        warnings.len()
    );
    Ok(Translated::new(into_string(writer.into_inner())?, warnings))
}

fn draw_sketch<'a>(
    feature: &'a SketchFeature,
    config: &TranslationConfig,
    convention: &CoordinateConvention,
    warnings: &mut Vec<TranslationWarning>,
) -> Result<SketchDrawing<'a>> {
    let shapes: Vec<Shape> = feature
        .sketch
        .iter_geometry()
        .map(|g| convention.to_document(&g.shape))
        .collect();
    let output = path_from_shapes(&shapes, &config.tolerance, config.circle_segments)?;
    let boxes: Vec<BoundingBox> = shapes.iter().filter_map(Shape::bounds).collect();
    // without the side channel every constraint is reported by report_losses
    let constraints = if config.side_channel {
        exportable_constraints(&feature.sketch, warnings)
    } else {
        Vec::new()
    };
    Ok(SketchDrawing {
        feature,
        output,
        bounds: bounds_of(&boxes),
        constraints,
    })
}

fn report_losses(part: &PartFile, drawings: &[SketchDrawing], warnings: &mut Vec<TranslationWarning>) {
    for drawing in drawings {
        let sketch = &drawing.feature.sketch;
        let geometry: Vec<&Geometry> = sketch.iter_geometry().collect();
        for &index in &drawing.output.unrepresentable {
            warn!("Dropping infinite line in sketch '{}': SVG cannot draw it", sketch.name());
            warnings.push(TranslationWarning::DroppedGeometry {
                sketch: sketch.name().to_string(),
                geometry: geometry.get(index).map(|g| g.id),
                reason: "infinite lines have no path form".to_string(),
            });
        }
        for constraint in sketch.constraints() {
            warn!("Dropping {} constraint {} in sketch '{}'", constraint.kind(), constraint.id(), sketch.name());
            warnings.push(TranslationWarning::DroppedConstraint {
                sketch: sketch.name().to_string(),
                constraint: Some(constraint.id()),
                reason: "SVG has no constraints and the metadata side channel is disabled".to_string(),
            });
        }
    }
    for extrude in part.body.extrudes() {
        warn!("Dropping extrude feature '{}'", extrude.name);
        warnings.push(TranslationWarning::DroppedFeature {
            feature: extrude.name.clone(),
            reason: "SVG has no features and the metadata side channel is disabled".to_string(),
        });
    }
}

fn write_group<W: Write>(writer: &mut Writer<W>, drawing: &SketchDrawing) -> Result<()> {
    let mut group = BytesStart::new("g");
    group.push_attribute(("id", drawing.feature.id.to_string().as_str()));
    group.push_attribute(("data-name", drawing.feature.sketch.name()));
    write_start(writer, group)?;

    for subpath in subpaths(&drawing.output.commands) {
        let mut path = BytesStart::new("path");
        path.push_attribute(("d", generate_path(subpath).as_str()));
        path.push_attribute(("fill", "none"));
        path.push_attribute(("stroke", "black"));
        path.push_attribute(("stroke-width", STROKE_WIDTH));
        write_empty(writer, path)?;
    }

    write_end(writer, "g")
}

/// Split commands at every moveto
fn subpaths(commands: &[PathCommand]) -> impl Iterator<Item = &[PathCommand]> {
    let mut starts: Vec<usize> = commands
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, PathCommand::MoveTo(_)))
        .map(|(i, _)| i)
        .collect();
    starts.push(commands.len());
    let bounds: Vec<(usize, usize)> = starts.windows(2).map(|w| (w[0], w[1])).collect();
    bounds.into_iter().map(move |(from, to)| &commands[from..to])
}

fn write_metadata<W: Write>(writer: &mut Writer<W>, part: &PartFile, drawings: &[SketchDrawing]) -> Result<()> {
    write_start(writer, BytesStart::new("metadata"))?;

    let mut record = BytesStart::new("cad:part");
    record.push_attribute(("name", part.name.as_str()));
    record.push_attribute(("unit", part.unit.as_str()));
    write_start(writer, record)?;

    for entry in &part.metadata {
        let mut meta = BytesStart::new("cad:meta");
        meta.push_attribute(("name", entry.name.as_str()));
        meta.push_attribute(("value", entry.value.as_str()));
        write_empty(writer, meta)?;
    }

    for feature in part.body.iter() {
        match feature {
            Feature::Sketch(sketch) => {
                let drawing = drawings
                    .iter()
                    .find(|d| d.feature.id == sketch.id)
                    .ok_or_else(|| Error::missing_id("sketch drawing", sketch.id))?;
                write_sketch_record(writer, drawing)?;
            }
            Feature::Extrude(extrude) => write_extrude_record(writer, extrude)?,
        }
    }

    write_end(writer, "cad:part")?;
    write_end(writer, "metadata")
}

fn write_sketch_record<W: Write>(writer: &mut Writer<W>, drawing: &SketchDrawing) -> Result<()> {
    let feature = drawing.feature;
    let mut elem = BytesStart::new("cad:sketch");
    elem.push_attribute(("id", feature.id.to_string().as_str()));
    elem.push_attribute(("name", feature.sketch.name()));
    write_start(writer, elem)?;

    let frame = feature.sketch.frame();
    let origin = frame.origin();
    let q = frame.orientation();
    let mut placement = BytesStart::new("cad:placement");
    for (key, value) in [
        ("x", origin.x),
        ("y", origin.y),
        ("z", origin.z),
        ("qw", q.w),
        ("qx", q.i),
        ("qy", q.j),
        ("qz", q.k),
    ] {
        placement.push_attribute((key, format_number(value).as_str()));
    }
    write_empty(writer, placement)?;

    for (geometry, span) in feature.sketch.iter_geometry().zip(&drawing.output.spans) {
        let mut elem = BytesStart::new("cad:geometry");
        elem.push_attribute(("id", geometry.id.to_string().as_str()));
        elem.push_attribute(("kind", geometry.kind().as_str()));
        elem.push_attribute(("first", span.start.to_string().as_str()));
        elem.push_attribute(("count", span.len().to_string().as_str()));
        if geometry.construction {
            elem.push_attribute(("construction", "1"));
        }
        if let Shape::Line(line) = &geometry.shape {
            let (origin, direction) = (line.origin(), line.direction());
            for (key, value) in [("ox", origin.x), ("oy", origin.y), ("dx", direction.x), ("dy", direction.y)] {
                elem.push_attribute((key, format_number(value).as_str()));
            }
        }
        write_empty(writer, elem)?;
    }

    for constraint in &drawing.constraints {
        write_constraint_record(writer, constraint)?;
    }

    write_end(writer, "cad:sketch")
}

fn write_constraint_record<W: Write>(writer: &mut Writer<W>, constraint: &Constraint) -> Result<()> {
    let mut elem = BytesStart::new("cad:constraint");
    elem.push_attribute(("id", constraint.id().to_string().as_str()));
    elem.push_attribute(("kind", constraint.kind().as_str()));
    if let Some(value) = constraint.value() {
        elem.push_attribute(("value", format_number(value.value()).as_str()));
        elem.push_attribute(("unit", value.unit_str()));
    }
    write_start(writer, elem)?;

    for operand in constraint.operands() {
        let mut elem = BytesStart::new("cad:operand");
        elem.push_attribute(("reference", operand.reference().as_str()));
        if let Target::Geometry(id, _) = operand.target() {
            elem.push_attribute(("geometry", id.to_string().as_str()));
        }
        write_empty(writer, elem)?;
    }

    write_end(writer, "cad:constraint")
}

fn write_extrude_record<W: Write>(writer: &mut Writer<W>, extrude: &Extrude) -> Result<()> {
    let mut elem = BytesStart::new("cad:extrude");
    elem.push_attribute(("id", extrude.id.to_string().as_str()));
    elem.push_attribute(("name", extrude.name.as_str()));
    elem.push_attribute(("profile", extrude.profile.to_string().as_str()));
    elem.push_attribute(("length", format_number(extrude.length).as_str()));
    elem.push_attribute(("mode", mode_name(&extrude.mode)));
    if let ExtrudeMode::TwoSided { opposite } = extrude.mode {
        elem.push_attribute(("opposite", format_number(opposite).as_str()));
    }
    write_empty(writer, elem)
}
