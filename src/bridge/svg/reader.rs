use std::ops::Range;

use nalgebra::Quaternion;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, trace};

use super::mode_from_name;
use crate::bridge::xml::{
    Attributes, element_context, element_name, local_name, number_or, parse_attributes, parse_bool, parse_number,
    reject_doctype, required, required_number,
};
use crate::bridge::{CoordinateConvention, TranslationConfig, TranslationWarning, Translated};
use crate::constraint::{
    Constraint, ConstraintKind, ConstraintReference, LengthUnit, Operand, Quantity, make_constraint,
};
use crate::error::{Error, ErrorContext, Result};
use crate::feature::{Extrude, MetadataEntry, PartFile, SketchFeature};
use crate::geometry::{Circle, Ellipse, EllipticalArc, Geometry, Line, LineSegment, Shape, ShapeKind};
use crate::id::{ConstraintId, FeatureId, GeometryId};
use crate::kernel::{CoordinateSystem, Point2, Point3, Vector2};
use crate::path::{merge_arcs, merge_full_turns, parse_path, shapes_from_path};
use crate::sketch::Sketch;
use crate::tolerance::Tolerance;

/// Document name used in error context
const DOCUMENT: &str = "SVG document";

/// Hint attached to errors raised by the side channel
const SIDE_CHANNEL_HINT: &str = "remove the <metadata> block to import the drawing alone";

/// Segments drawn inside one top-level `<g>`, or outside any group
#[derive(Debug, Default)]
struct Group {
    id: Option<String>,
    name: Option<String>,
    shapes: Vec<Shape>,
    radii_adjusted: Vec<usize>,
}

#[derive(Debug)]
struct GeometryRecord {
    id: GeometryId,
    kind: ShapeKind,
    segments: Range<usize>,
    construction: bool,
    line: Option<(Point2, Vector2)>,
}

#[derive(Debug)]
struct OperandRecord {
    geometry: Option<GeometryId>,
    reference: ConstraintReference,
}

#[derive(Debug)]
struct ConstraintRecord {
    id: ConstraintId,
    kind: String,
    value: Option<(f64, String)>,
    operands: Vec<OperandRecord>,
}

#[derive(Debug)]
struct SketchRecord {
    id: FeatureId,
    name: String,
    frame: CoordinateSystem,
    geometry: Vec<GeometryRecord>,
    constraints: Vec<ConstraintRecord>,
}

#[derive(Debug)]
enum FeatureRecord {
    Sketch(SketchRecord),
    Extrude(Extrude),
}

#[derive(Debug)]
struct PartRecord {
    name: String,
    unit: LengthUnit,
    metadata: Vec<MetadataEntry>,
    features: Vec<FeatureRecord>,
}

struct SvgReader<'a> {
    config: &'a TranslationConfig,
    convention: &'a CoordinateConvention,
    warnings: Vec<TranslationWarning>,
    groups: Vec<Group>,
    group_depth: usize,
    loose_group: Option<usize>,
    title: Option<String>,
    in_title: bool,
    in_metadata: bool,
    part: Option<PartRecord>,
    sketch: Option<SketchRecord>,
    constraint: Option<ConstraintRecord>,
}

pub(super) fn read_svg(
    document: &str,
    config: &TranslationConfig,
    convention: &CoordinateConvention,
) -> Result<Translated<PartFile>> {
    reject_doctype(document)?;

    let mut state = SvgReader {
        config,
        convention,
        warnings: Vec::new(),
        groups: Vec::new(),
        group_depth: 0,
        loose_group: None,
        title: None,
        in_title: false,
        in_metadata: false,
        part: None,
        sketch: None,
        constraint: None,
    };

    let mut reader = Reader::from_str(document);
    let mut buf = Vec::new();
    let mut seen_root = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                seen_root = true;
                state.start(e, false).map_err(|err| err.with_context(&state.context(e)))?;
            }
            Event::Empty(ref e) => {
                seen_root = true;
                state.start(e, true).map_err(|err| err.with_context(&state.context(e)))?;
            }
            Event::End(ref e) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?
                    .to_string();
                state.end(local_name(&name));
            }
            Event::Text(ref t) if state.in_title => {
                let text = t.decode().map_err(|e| Error::InvalidXml(e.to_string()))?;
                state.title.get_or_insert_with(String::new).push_str(&text);
            }
            Event::GeneralRef(ref r) if state.in_title => {
                let name = std::str::from_utf8(r).map_err(|e| Error::InvalidXml(e.to_string()))?;
                if let Some(text) = quick_xml::escape::resolve_predefined_entity(name) {
                    state.title.get_or_insert_with(String::new).push_str(text);
                }
            }
            Event::DocType(_) => {
                return Err(Error::InvalidXml(
                    "DTD declarations are not allowed for security reasons".to_string(),
                ));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(Error::InvalidFormat("Document has no root element".to_string()));
    }
    state.finish()
}

impl SvgReader<'_> {
    fn context(&self, e: &BytesStart) -> ErrorContext {
        let context = element_context(DOCUMENT, e);
        if self.in_metadata {
            context.hint(SIDE_CHANNEL_HINT)
        } else {
            context
        }
    }

    fn start(&mut self, e: &BytesStart, empty: bool) -> Result<()> {
        let qualified = element_name(e)?;
        let name = local_name(&qualified);

        if self.in_metadata {
            self.start_record(name, e)?;
            if empty {
                self.end(name);
            }
            return Ok(());
        }

        match name {
            "g" => {
                if self.group_depth == 0 {
                    let attrs = parse_attributes(e)?;
                    self.groups.push(Group {
                        id: attrs.get("id").cloned(),
                        name: attrs.get("data-name").cloned(),
                        ..Default::default()
                    });
                }
                if !empty {
                    self.group_depth += 1;
                }
            }
            "title" if self.title.is_none() => self.in_title = !empty,
            "metadata" => self.in_metadata = !empty,
            "path" => self.read_path(e)?,
            "line" => {
                let attrs = parse_attributes(e)?;
                let start = Point2::new(number_or(&attrs, "x1", 0.0)?, number_or(&attrs, "y1", 0.0)?);
                let end = Point2::new(number_or(&attrs, "x2", 0.0)?, number_or(&attrs, "y2", 0.0)?);
                self.push_shape("line", LineSegment::new(start, end).map(Shape::LineSegment))?;
            }
            "circle" => {
                let attrs = parse_attributes(e)?;
                let center = Point2::new(number_or(&attrs, "cx", 0.0)?, number_or(&attrs, "cy", 0.0)?);
                let radius = required_number(&attrs, "circle", "r")?;
                self.push_shape("circle", Circle::new(center, radius).map(Shape::Circle))?;
            }
            "ellipse" => {
                let attrs = parse_attributes(e)?;
                let center = Point2::new(number_or(&attrs, "cx", 0.0)?, number_or(&attrs, "cy", 0.0)?);
                let rx = required_number(&attrs, "ellipse", "rx")?;
                let ry = required_number(&attrs, "ellipse", "ry")?;
                self.push_shape("ellipse", Ellipse::new(center, rx, ry, 0.0).map(Shape::Ellipse))?;
            }
            other => trace!("ignoring SVG element <{}>", other),
        }
        Ok(())
    }

    fn end(&mut self, name: &str) {
        if self.in_metadata {
            match name {
                "metadata" => self.in_metadata = false,
                "constraint" => {
                    if let (Some(constraint), Some(sketch)) = (self.constraint.take(), self.sketch.as_mut()) {
                        sketch.constraints.push(constraint);
                    }
                }
                "sketch" => {
                    if let (Some(sketch), Some(part)) = (self.sketch.take(), self.part.as_mut()) {
                        part.features.push(FeatureRecord::Sketch(sketch));
                    }
                }
                _ => {}
            }
            return;
        }
        match name {
            "g" => self.group_depth = self.group_depth.saturating_sub(1),
            "title" => self.in_title = false,
            _ => {}
        }
    }

    /// Index of the group new shapes belong to
    fn current_group(&mut self) -> usize {
        if self.group_depth > 0 && !self.groups.is_empty() {
            return self.groups.len() - 1;
        }
        match self.loose_group {
            Some(index) => index,
            None => {
                self.groups.push(Group::default());
                let index = self.groups.len() - 1;
                self.loose_group = Some(index);
                index
            }
        }
    }

    fn push_shape(&mut self, element: &str, shape: Result<Shape>) -> Result<()> {
        let shape = self
            .config
            .recover(shape, || format!("<{}> element", element), &mut self.warnings)?;
        if let Some(shape) = shape {
            let index = self.current_group();
            self.groups[index].shapes.push(self.convention.to_canonical(&shape));
        }
        Ok(())
    }

    fn read_path(&mut self, e: &BytesStart) -> Result<()> {
        let attrs = parse_attributes(e)?;
        let Some(data) = attrs.get("d") else {
            return Ok(());
        };
        let commands = parse_path(data)?;
        let read = self.config.recover(
            shapes_from_path(&commands, &self.config.tolerance),
            || "<path> element".to_string(),
            &mut self.warnings,
        )?;
        let Some(read) = read else {
            return Ok(());
        };

        let index = self.current_group();
        let group = &mut self.groups[index];
        let offset = group.shapes.len();
        group.radii_adjusted.extend(read.radii_adjusted.iter().map(|i| offset + i));
        group
            .shapes
            .extend(read.shapes.iter().map(|s| self.convention.to_canonical(s)));
        Ok(())
    }

    fn start_record(&mut self, name: &str, e: &BytesStart) -> Result<()> {
        let attrs = parse_attributes(e)?;
        match name {
            "part" => {
                let unit = match attrs.get("unit") {
                    Some(unit) => LengthUnit::from_name(unit)?,
                    None => LengthUnit::Millimeter,
                };
                self.part = Some(PartRecord {
                    name: attrs.get("name").cloned().unwrap_or_default(),
                    unit,
                    metadata: Vec::new(),
                    features: Vec::new(),
                });
            }
            "meta" => {
                if let Some(part) = self.part.as_mut() {
                    part.metadata.push(MetadataEntry::new(
                        required(&attrs, "cad:meta", "name")?,
                        attrs.get("value").cloned().unwrap_or_default(),
                    ));
                }
            }
            "sketch" => {
                self.sketch = Some(SketchRecord {
                    id: required(&attrs, "cad:sketch", "id")?.parse()?,
                    name: attrs.get("name").cloned().unwrap_or_default(),
                    frame: CoordinateSystem::world(),
                    geometry: Vec::new(),
                    constraints: Vec::new(),
                });
            }
            "placement" => {
                if let Some(sketch) = self.sketch.as_mut() {
                    sketch.frame = parse_placement(&attrs)?;
                }
            }
            "geometry" => {
                if let Some(sketch) = self.sketch.as_mut() {
                    sketch.geometry.push(parse_geometry_record(&attrs)?);
                }
            }
            "constraint" => {
                let value = match attrs.get("value") {
                    Some(value) => Some((
                        parse_number("value", value)?,
                        required(&attrs, "cad:constraint", "unit")?.to_string(),
                    )),
                    None => None,
                };
                self.constraint = Some(ConstraintRecord {
                    id: required(&attrs, "cad:constraint", "id")?.parse()?,
                    kind: required(&attrs, "cad:constraint", "kind")?.to_string(),
                    value,
                    operands: Vec::new(),
                });
            }
            "operand" => {
                if let Some(constraint) = self.constraint.as_mut() {
                    let geometry = attrs.get("geometry").map(|id| id.parse::<GeometryId>()).transpose()?;
                    constraint.operands.push(OperandRecord {
                        geometry,
                        reference: ConstraintReference::from_name(required(&attrs, "cad:operand", "reference")?)?,
                    });
                }
            }
            "extrude" => {
                if let Some(part) = self.part.as_mut() {
                    part.features.push(FeatureRecord::Extrude(parse_extrude_record(&attrs)?));
                }
            }
            other => trace!("ignoring metadata element <{}>", other),
        }
        Ok(())
    }

    fn finish(self) -> Result<Translated<PartFile>> {
        let SvgReader {
            config,
            mut warnings,
            groups,
            title,
            part: record,
            ..
        } = self;
        let tol = &config.tolerance;
        let mut groups: Vec<Option<Group>> = groups.into_iter().map(Some).collect();

        let mut part = match &record {
            Some(record) => {
                let mut part = PartFile::new(record.name.clone());
                part.unit = record.unit;
                part.metadata = record.metadata.clone();
                part
            }
            None => PartFile::new(title.as_deref().map(str::trim).unwrap_or("Part")),
        };

        for feature in record.map(|r| r.features).unwrap_or_default() {
            match feature {
                FeatureRecord::Sketch(sketch) => {
                    let key = sketch.id.to_string();
                    let group = groups
                        .iter_mut()
                        .find(|g| matches!(g, Some(group) if group.id.as_deref() == Some(key.as_str())))
                        .and_then(Option::take)
                        .unwrap_or_default();
                    let name = sketch.name.clone();
                    let built = build_sketch(sketch, group, config, &mut warnings).map_err(|e| {
                        e.with_context(
                            &ErrorContext::new()
                                .file(DOCUMENT)
                                .element(format!("cad:sketch {}", key))
                                .hint(SIDE_CHANNEL_HINT),
                        )
                    })?;
                    let added = part.body.add_feature(built);
                    config.recover(added, || format!("sketch '{}'", name), &mut warnings)?;
                }
                FeatureRecord::Extrude(extrude) => {
                    let name = extrude.name.clone();
                    let added = part.body.add_feature(extrude);
                    config.recover(added, || format!("extrude '{}'", name), &mut warnings)?;
                }
            }
        }

        let mut plain = 0;
        for group in groups.into_iter().flatten() {
            if group.shapes.is_empty() && group.id.is_none() {
                continue;
            }
            plain += 1;
            let feature = plain_sketch(group, plain, tol, &mut warnings)?;
            let name = feature.sketch.name().to_string();
            let added = part.body.add_feature(feature);
            config.recover(added, || format!("sketch '{}'", name), &mut warnings)?;
        }

        debug!(
            "Imported SVG part '{}': {} feature(s), {} warning(s)",
            part.name,
            part.body.len(),
            warnings.len()
        );
        Ok(Translated::new(part, warnings))
    }
}

fn parse_placement(attrs: &Attributes) -> Result<CoordinateSystem> {
    let origin = Point3::new(
        number_or(attrs, "x", 0.0)?,
        number_or(attrs, "y", 0.0)?,
        number_or(attrs, "z", 0.0)?,
    );
    let quaternion = Quaternion::new(
        number_or(attrs, "qw", 1.0)?,
        number_or(attrs, "qx", 0.0)?,
        number_or(attrs, "qy", 0.0)?,
        number_or(attrs, "qz", 0.0)?,
    );
    CoordinateSystem::new(origin, quaternion)
}

fn parse_geometry_record(attrs: &Attributes) -> Result<GeometryRecord> {
    let kind_name = required(attrs, "cad:geometry", "kind")?;
    let kind = ShapeKind::from_name(kind_name)
        .ok_or_else(|| Error::parse_error_with_context("kind", kind_name, "a geometry kind"))?;
    let first = required(attrs, "cad:geometry", "first")?;
    let first: usize = first
        .parse()
        .map_err(|_| Error::parse_error_with_context("first", first, "segment index"))?;
    let count_text = required(attrs, "cad:geometry", "count")?;
    let count: usize = count_text
        .parse()
        .map_err(|_| Error::parse_error_with_context("count", count_text, "segment count"))?;
    let end = first
        .checked_add(count)
        .ok_or_else(|| Error::parse_error_with_context("count", count_text, "a segment span within range"))?;
    let line = if kind == ShapeKind::Line {
        Some((
            Point2::new(required_number(attrs, "cad:geometry", "ox")?, required_number(attrs, "cad:geometry", "oy")?),
            Vector2::new(required_number(attrs, "cad:geometry", "dx")?, required_number(attrs, "cad:geometry", "dy")?),
        ))
    } else {
        None
    };
    Ok(GeometryRecord {
        id: required(attrs, "cad:geometry", "id")?.parse()?,
        kind,
        segments: first..end,
        construction: attrs
            .get("construction")
            .map(|v| parse_bool("construction", v))
            .transpose()?
            .unwrap_or(false),
        line,
    })
}

fn parse_extrude_record(attrs: &Attributes) -> Result<Extrude> {
    let mode = mode_from_name(
        attrs.get("mode").map(String::as_str).unwrap_or("one-sided"),
        number_or(attrs, "opposite", 0.0)?,
    )?;
    Ok(Extrude {
        id: required(attrs, "cad:extrude", "id")?.parse()?,
        name: attrs.get("name").cloned().unwrap_or_default(),
        profile: required(attrs, "cad:extrude", "profile")?.parse()?,
        length: required_number(attrs, "cad:extrude", "length")?,
        mode,
    })
}

/// Rebuild a sketch from its metadata record and the segments of its group
fn build_sketch(
    record: SketchRecord,
    group: Group,
    config: &TranslationConfig,
    warnings: &mut Vec<TranslationWarning>,
) -> Result<SketchFeature> {
    let tol = &config.tolerance;
    let mut sketch = Sketch::new(record.name, record.frame);
    report_radii(&group, sketch.name(), warnings);
    let mut claimed = vec![false; group.shapes.len()];

    for geometry in &record.geometry {
        let shape = config.recover(
            shape_for(geometry, &group.shapes, tol),
            || format!("geometry {} in sketch '{}'", geometry.id, sketch.name()),
            warnings,
        )?;
        let Some(shape) = shape else { continue };
        let mut built = Geometry::with_id(geometry.id, shape);
        built.construction = geometry.construction;
        let inserted = sketch.insert_geometry(built);
        if config
            .recover(inserted, || format!("geometry {}", geometry.id), warnings)?
            .is_some()
        {
            if let Some(slots) = claimed.get_mut(geometry.segments.clone()) {
                slots.fill(true);
            }
        }
    }

    let unclaimed: Vec<Shape> = group
        .shapes
        .iter()
        .zip(&claimed)
        .filter(|(_, claimed)| !**claimed)
        .map(|(s, _)| *s)
        .collect();
    for shape in merge_full_turns(&unclaimed, tol) {
        sketch.add_geometry(shape);
    }

    for constraint in &record.constraints {
        let added = build_constraint(constraint, &sketch).and_then(|c| sketch.add_constraint(c));
        config.recover(
            added,
            || format!("constraint {} in sketch '{}'", constraint.id, sketch.name()),
            warnings,
        )?;
    }

    Ok(SketchFeature {
        id: record.id,
        sketch,
    })
}

/// Shape of a geometry record, taken from the segments it spans
fn shape_for(record: &GeometryRecord, shapes: &[Shape], tol: &Tolerance) -> Result<Shape> {
    if let Some((origin, direction)) = record.line {
        return Line::new(origin, direction).map(Shape::Line);
    }
    let run = shapes.get(record.segments.clone()).ok_or_else(|| {
        Error::Structural(format!(
            "Geometry {} spans segments {}..{} but its group has {}",
            record.id,
            record.segments.start,
            record.segments.end,
            shapes.len()
        ))
    })?;
    let mismatch = |found: &str| {
        Error::Structural(format!(
            "Geometry {} is recorded as a {} but its segments form {}",
            record.id, record.kind, found
        ))
    };

    match (record.kind, run) {
        (kind, [single]) if single.kind() == kind => Ok(*single),
        (ShapeKind::EllipticalArc, [Shape::CircularArc(arc)]) => {
            EllipticalArc::from_center_arc(&arc.to_center_arc()).map(Shape::EllipticalArc)
        }
        (ShapeKind::Circle | ShapeKind::Ellipse, run) => match merge_arcs(run, tol) {
            Some(shape) if shape.kind() == record.kind => Ok(shape),
            Some(Shape::Circle(circle)) if record.kind == ShapeKind::Ellipse => {
                Ellipse::new(circle.center(), circle.radius(), circle.radius(), 0.0).map(Shape::Ellipse)
            }
            Some(other) => Err(mismatch(other.kind().as_str())),
            None => Err(mismatch("no full turn")),
        },
        (_, []) => Err(mismatch("nothing")),
        (_, [single]) => Err(mismatch(single.kind().as_str())),
        (_, _) => Err(mismatch("several shapes")),
    }
}

fn build_constraint(record: &ConstraintRecord, sketch: &Sketch) -> Result<Constraint> {
    let kind = ConstraintKind::from_name(&record.kind)?;
    let operands = record
        .operands
        .iter()
        .map(|op| match op.geometry {
            Some(id) => {
                let geometry = sketch.geometry(id).ok_or_else(|| Error::missing_id("geometry", id))?;
                Operand::new(id, geometry.kind(), op.reference)
            }
            None => Operand::sketch(op.reference),
        })
        .collect::<Result<Vec<_>>>()?;
    let value = record
        .value
        .as_ref()
        .map(|(value, unit)| Quantity::parse(*value, unit))
        .transpose()?;
    Ok(make_constraint(kind, operands, value)?.with_id(record.id))
}

/// A sketch for a group without metadata
fn plain_sketch(
    group: Group,
    ordinal: usize,
    tol: &Tolerance,
    warnings: &mut Vec<TranslationWarning>,
) -> Result<SketchFeature> {
    let name = group
        .name
        .clone()
        .or_else(|| group.id.clone())
        .unwrap_or_else(|| format!("Sketch{:03}", ordinal));
    let id = group
        .id
        .as_deref()
        .and_then(|id| id.parse::<FeatureId>().ok())
        .unwrap_or_default();

    let mut sketch = Sketch::new(name, CoordinateSystem::world());
    report_radii(&group, sketch.name(), warnings);
    for shape in merge_full_turns(&group.shapes, tol) {
        sketch.add_geometry(shape);
    }
    Ok(SketchFeature { id, sketch })
}

fn report_radii(group: &Group, sketch: &str, warnings: &mut Vec<TranslationWarning>) {
    warnings.extend(group.radii_adjusted.iter().map(|&segment| TranslationWarning::RadiiAdjusted {
        sketch: sketch.to_string(),
        segment,
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::svg::SvgBridge;
    use crate::bridge::FormatBridge;
    use approx::assert_relative_eq;

    fn import(document: &str) -> Result<Translated<PartFile>> {
        SvgBridge::default().import(document)
    }

    #[test]
    fn test_plain_elements() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <title>Drawing &amp; notes</title>
  <line x1="0" y1="0" x2="10" y2="0"/>
  <circle cx="5" cy="-5" r="2"/>
  <ellipse cx="0" cy="0" rx="2" ry="4"/>
  <rect x="0" y="0" width="1" height="1"/>
</svg>"#;
        let part = import(svg).unwrap().output;
        assert_eq!(part.name, "Drawing & notes");
        let sketch = &part.body.sketches().next().unwrap().sketch;
        assert_eq!(sketch.name(), "Sketch001");
        let shapes: Vec<Shape> = sketch.iter_geometry().map(|g| g.shape).collect();
        assert_eq!(shapes.len(), 3);
        match shapes[1] {
            Shape::Circle(c) => assert_relative_eq!(c.center(), Point2::new(5.0, 5.0)),
            other => panic!("expected a circle, got {other:?}"),
        }
        match shapes[2] {
            Shape::Ellipse(e) => {
                assert_relative_eq!(e.semi_major(), 4.0);
                assert_relative_eq!(e.semi_minor(), 2.0);
            }
            other => panic!("expected an ellipse, got {other:?}"),
        }
    }

    #[test]
    fn test_groups_become_sketches() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <g id="left"><path d="M0 0 L1 0"/><g><path d="M5 5 L6 5"/></g></g>
  <g data-name="right"><path d="M0 0 A5 5 0 0 1 10 0 A5 5 0 0 1 0 0 Z"/></g>
</svg>"#;
        let part = import(svg).unwrap().output;
        let sketches: Vec<&SketchFeature> = part.body.sketches().collect();
        assert_eq!(sketches.len(), 2);
        assert_eq!(sketches[0].sketch.name(), "left");
        assert_eq!(sketches[0].sketch.geometry_count(), 2);
        assert_eq!(sketches[1].sketch.name(), "right");
        let circle = sketches[1].sketch.iter_geometry().next().unwrap().shape;
        assert_eq!(circle.kind(), ShapeKind::Circle);
    }

    #[test]
    fn test_small_radii_reported() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><g id="s"><path d="M0 0 A1 1 0 0 1 10 0"/></g></svg>"#;
        let imported = import(svg).unwrap();
        assert_eq!(
            imported.warnings,
            vec![TranslationWarning::RadiiAdjusted {
                sketch: "s".to_string(),
                segment: 0
            }]
        );
    }

    #[test]
    fn test_malformed_documents_fail() {
        assert!(matches!(
            import(r#"<svg><path d="M0 0 Q1 1 2 2"/></svg>"#),
            Err(Error::UnsupportedPathCommand { position: 5, .. })
        ));
        assert!(import("<!DOCTYPE svg><svg/>").is_err());
        assert!(import("<svg><g></svg>").is_err());
        assert!(import("").is_err());
    }

    #[test]
    fn test_degenerate_elements_skipped_in_best_effort() {
        let svg = r#"<svg><circle cx="0" cy="0" r="0"/><line x1="0" y1="0" x2="1" y2="1"/></svg>"#;
        assert!(import(svg).is_err());

        let lenient = SvgBridge::new(TranslationConfig::new().best_effort());
        let imported = lenient.import(svg).unwrap();
        assert_eq!(imported.warnings.len(), 1);
        assert_eq!(imported.output.body.sketches().next().unwrap().sketch.geometry_count(), 1);
    }

    #[test]
    fn test_unknown_constraint_kind_in_metadata() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:cad="urn:cadbridge:sketch:1">
  <metadata>
    <cad:part name="p" unit="mm">
      <cad:sketch id="7f8e1a52-3c1b-4d3e-9a77-0c6a0c0f8e11" name="s">
        <cad:geometry id="0b5f6f3e-8d43-4c2b-a1d4-0b3a4c9e7d21" kind="line-segment" first="0" count="1"/>
        <cad:constraint id="5d7d1d9a-0f1e-4a53-8c7e-2d6f1c3b4a10" kind="tangent">
          <cad:operand reference="core" geometry="0b5f6f3e-8d43-4c2b-a1d4-0b3a4c9e7d21"/>
        </cad:constraint>
      </cad:sketch>
    </cad:part>
  </metadata>
  <g id="7f8e1a52-3c1b-4d3e-9a77-0c6a0c0f8e11"><path d="M0 0 L4 0"/></g>
</svg>"#;
        assert!(matches!(import(svg), Err(Error::UnsupportedConstraint(_))));

        let lenient = SvgBridge::new(TranslationConfig::new().best_effort());
        let imported = lenient.import(svg).unwrap();
        assert_eq!(imported.warnings.len(), 1);
        let sketch = &imported.output.body.sketches().next().unwrap().sketch;
        assert_eq!(sketch.geometry_count(), 1);
        assert!(sketch.constraints().is_empty());
        assert_eq!(
            sketch.iter_geometry().next().unwrap().id.to_string(),
            "0b5f6f3e-8d43-4c2b-a1d4-0b3a4c9e7d21"
        );
    }

    #[test]
    fn test_title_text_beside_foreign_metadata() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <title>Bracket &lt;rev B&gt;</title>
  <metadata>
    <dc:title>Some other name</dc:title>
  </metadata>
  <path d="M0 0 L1 0"/>
</svg>"#;
        let part = import(svg).unwrap().output;
        assert_eq!(part.name, "Bracket <rev B>");
        assert_eq!(part.body.sketches().next().unwrap().sketch.geometry_count(), 1);
    }

    #[test]
    fn test_overflowing_segment_span_rejected() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:cad="urn:cadbridge:sketch:1">
  <metadata>
    <cad:part name="p" unit="mm">
      <cad:sketch id="7f8e1a52-3c1b-4d3e-9a77-0c6a0c0f8e11" name="s">
        <cad:geometry id="0b5f6f3e-8d43-4c2b-a1d4-0b3a4c9e7d21" kind="line-segment" first="18446744073709551615" count="1"/>
      </cad:sketch>
    </cad:part>
  </metadata>
  <g id="7f8e1a52-3c1b-4d3e-9a77-0c6a0c0f8e11"><path d="M0 0 L4 0"/></g>
</svg>"#;
        for bridge in [SvgBridge::default(), SvgBridge::new(TranslationConfig::new().best_effort())] {
            let err = bridge.import(svg).unwrap_err();
            assert!(matches!(err, Error::ParseError(_)));
            let message = err.to_string();
            assert!(message.contains("Element: cad:geometry"));
            assert!(message.contains("Hint: remove the <metadata> block"));
        }
    }

    #[test]
    fn test_span_past_the_path_is_structural() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:cad="urn:cadbridge:sketch:1">
  <metadata>
    <cad:part name="p" unit="mm">
      <cad:sketch id="7f8e1a52-3c1b-4d3e-9a77-0c6a0c0f8e11" name="s">
        <cad:geometry id="0b5f6f3e-8d43-4c2b-a1d4-0b3a4c9e7d21" kind="line-segment" first="3" count="1"/>
      </cad:sketch>
    </cad:part>
  </metadata>
  <g id="7f8e1a52-3c1b-4d3e-9a77-0c6a0c0f8e11"><path d="M0 0 L4 0"/></g>
</svg>"#;
        let err = import(svg).unwrap_err();
        assert!(err.is_structural());
        assert!(err.to_string().contains("Element: cad:sketch 7f8e1a52-3c1b-4d3e-9a77-0c6a0c0f8e11"));
    }

    #[test]
    fn test_missing_geometry_fatal_in_best_effort() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:cad="urn:cadbridge:sketch:1">
  <metadata>
    <cad:part name="p" unit="mm">
      <cad:sketch id="7f8e1a52-3c1b-4d3e-9a77-0c6a0c0f8e11" name="s">
        <cad:geometry id="0b5f6f3e-8d43-4c2b-a1d4-0b3a4c9e7d21" kind="line-segment" first="0" count="1"/>
        <cad:constraint id="5d7d1d9a-0f1e-4a53-8c7e-2d6f1c3b4a10" kind="horizontal">
          <cad:operand reference="core" geometry="9c3a2e41-6b7d-4f80-a5e2-3d1c0b9a8f76"/>
        </cad:constraint>
      </cad:sketch>
    </cad:part>
  </metadata>
  <g id="7f8e1a52-3c1b-4d3e-9a77-0c6a0c0f8e11"><path d="M0 0 L4 0"/></g>
</svg>"#;
        assert!(matches!(import(svg), Err(Error::Structural(_))));
        let lenient = SvgBridge::new(TranslationConfig::new().best_effort());
        assert!(matches!(lenient.import(svg), Err(Error::Structural(_))));
    }
}
