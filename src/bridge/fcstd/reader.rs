use std::collections::{HashMap, HashSet};

use nalgebra::Quaternion;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, trace, warn};

use super::table::{GEO_UNDEF, POS_EDGE, frame_reference, kind_for_geometry_type, kind_for_type, reference_for_position};
use super::{BODY_TYPE, PAD_LENGTH, PAD_TWO_LENGTHS, PAD_TYPE, SKETCH_TYPE};
use crate::archive::DOCUMENT_ENTRY;
use crate::bridge::xml::{
    Attributes, element_context, element_name, local_name, number_or, parse_attributes, parse_bool, reject_doctype,
    required, required_int, required_number,
};
use crate::bridge::{CoordinateConvention, TranslationConfig, TranslationWarning, Translated};
use crate::constraint::{Constraint, ConstraintKind, LengthUnit, Operand, Quantity, make_constraint};
use crate::error::{Error, ErrorContext, Result};
use crate::feature::{Extrude, ExtrudeMode, PartFile, SketchFeature};
use crate::geometry::{
    ArcDirection, Circle, CircularArc, Ellipse, EllipticalArc, Geometry, Line, LineSegment, Point, Shape, ShapeKind,
};
use crate::id::{FeatureId, GeometryId};
use crate::kernel::{CoordinateSystem, Point2, Point3, Vector2};
use crate::sketch::Sketch;

/// Name given to documents without a label
const DEFAULT_NAME: &str = "Unnamed";

/// A `<Property>` with its child elements flattened in document order
#[derive(Debug, Default)]
struct Property {
    name: String,
    elements: Vec<(String, Attributes)>,
}

impl Property {
    /// The `value` attribute of the first child element
    fn value(&self) -> Option<&str> {
        self.elements
            .first()
            .and_then(|(_, attrs)| attrs.get("value"))
            .map(String::as_str)
    }

    fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Attributes> + 'a {
        self.elements
            .iter()
            .filter(move |(element, _)| element == name)
            .map(|(_, attrs)| attrs)
    }
}

#[derive(Debug)]
struct ObjectEntry {
    kind: String,
    name: String,
}

/// Flat view of a document: its own properties, the object list and the
/// properties of each object
#[derive(Debug, Default)]
struct DocumentTree {
    properties: Vec<Property>,
    objects: Vec<ObjectEntry>,
    data: HashMap<String, Vec<Property>>,
}

fn find<'a>(properties: &'a [Property], name: &str) -> Option<&'a Property> {
    properties.iter().find(|p| p.name == name)
}

fn string_value<'a>(properties: &'a [Property], name: &str) -> Option<&'a str> {
    find(properties, name).and_then(Property::value)
}

fn number_value(properties: &[Property], name: &str, default: f64) -> Result<f64> {
    find(properties, name)
        .and_then(|p| p.elements.first())
        .map_or(Ok(default), |(_, attrs)| number_or(attrs, "value", default))
}

fn bool_value(properties: &[Property], name: &str) -> Result<bool> {
    string_value(properties, name).map_or(Ok(false), |v| parse_bool(name, v))
}

fn object_properties<'a>(tree: &'a DocumentTree, name: &str) -> &'a [Property] {
    tree.data.get(name).map_or(&[], Vec::as_slice)
}

fn object_context(name: &str) -> ErrorContext {
    ErrorContext::new()
        .file(DOCUMENT_ENTRY)
        .element(format!("Object '{}'", name))
}

fn int_or(attrs: &Attributes, key: &str, default: i64) -> Result<i64> {
    attrs.get(key).map_or(Ok(default), |v| {
        v.trim()
            .parse()
            .map_err(|_| Error::parse_error_with_context(key, v, "integer"))
    })
}

struct TreeBuilder {
    tree: DocumentTree,
    stack: Vec<String>,
    object: Option<String>,
    property: Option<Property>,
}

impl TreeBuilder {
    fn open(&mut self, e: &BytesStart, empty: bool) -> Result<()> {
        let qualified = element_name(e)?;
        let name = local_name(&qualified).to_string();

        if self.stack.is_empty() && name != "Document" {
            return Err(Error::InvalidFormat(format!(
                "Expected a <Document> root element, found <{}>",
                name
            )));
        }

        if let Some(property) = self.property.as_mut() {
            property.elements.push((name.clone(), parse_attributes(e)?));
        } else {
            let parent = self.stack.last().map(String::as_str);
            match (name.as_str(), parent) {
                ("Property", _) => {
                    let attrs = parse_attributes(e)?;
                    self.property = Some(Property {
                        name: required(&attrs, "Property", "name")?.to_string(),
                        elements: Vec::new(),
                    });
                    if empty {
                        self.close_property();
                    }
                }
                ("Object", Some("Objects")) => {
                    let attrs = parse_attributes(e)?;
                    self.tree.objects.push(ObjectEntry {
                        kind: required(&attrs, "Object", "type")?.to_string(),
                        name: required(&attrs, "Object", "name")?.to_string(),
                    });
                }
                ("Object", Some("ObjectData")) if !empty => {
                    let attrs = parse_attributes(e)?;
                    self.object = Some(required(&attrs, "Object", "name")?.to_string());
                }
                _ => {}
            }
        }

        if !empty {
            self.stack.push(name);
        }
        Ok(())
    }

    fn close(&mut self) {
        let Some(name) = self.stack.pop() else {
            return;
        };
        match name.as_str() {
            "Property" if !self.stack.iter().any(|n| n == "Property") => self.close_property(),
            "Object" if self.stack.last().is_some_and(|n| n == "ObjectData") => self.object = None,
            _ => {}
        }
    }

    fn close_property(&mut self) {
        let Some(property) = self.property.take() else {
            return;
        };
        match &self.object {
            Some(object) => self.tree.data.entry(object.clone()).or_default().push(property),
            None if self.stack.len() <= 2 => self.tree.properties.push(property),
            None => trace!("Ignoring property '{}' outside any object", property.name),
        }
    }
}

fn parse_tree(document: &str) -> Result<DocumentTree> {
    let mut builder = TreeBuilder {
        tree: DocumentTree::default(),
        stack: Vec::new(),
        object: None,
        property: None,
    };
    let mut seen_root = false;

    let mut reader = Reader::from_str(document);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                seen_root = true;
                builder
                    .open(e, false)
                    .map_err(|err| err.with_context(&element_context(DOCUMENT_ENTRY, e)))?;
            }
            Event::Empty(ref e) => {
                seen_root = true;
                builder
                    .open(e, true)
                    .map_err(|err| err.with_context(&element_context(DOCUMENT_ENTRY, e)))?;
            }
            Event::End(_) => builder.close(),
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
    Ok(builder.tree)
}

pub(super) fn read_document(
    document: &str,
    config: &TranslationConfig,
    convention: &CoordinateConvention,
) -> Result<Translated<PartFile>> {
    reject_doctype(document)?;
    let tree = parse_tree(document)?;
    let mut warnings = Vec::new();

    let mut part = PartFile::new(string_value(&tree.properties, "Label").unwrap_or(DEFAULT_NAME));
    if let Some(unit) = string_value(&tree.properties, "Unit") {
        part.unit = LengthUnit::from_name(unit)?;
    }
    if let Some(meta) = find(&tree.properties, "Meta") {
        for item in meta.elements_named("Item") {
            part.add_metadata(required(item, "Item", "key")?, required(item, "Item", "value")?);
        }
    }

    let body = tree.objects.iter().find(|o| o.kind == BODY_TYPE);
    let mut order: Vec<&str> = Vec::with_capacity(tree.objects.len());
    if let Some(body) = body {
        let props = object_properties(&tree, &body.name);
        part.body.name = string_value(props, "Label").unwrap_or(&body.name).to_string();
        if let Some(group) = find(props, "Group") {
            for link in group.elements_named("Link") {
                order.push(required(link, "Link", "value")?);
            }
        }
    }
    let listed: HashSet<&str> = order.iter().copied().collect();
    order.extend(
        tree.objects
            .iter()
            .filter(|o| o.kind != BODY_TYPE && !listed.contains(o.name.as_str()))
            .map(|o| o.name.as_str()),
    );

    let kinds: HashMap<&str, &str> = tree
        .objects
        .iter()
        .map(|o| (o.name.as_str(), o.kind.as_str()))
        .collect();
    let sketch_ids: HashMap<&str, FeatureId> = tree
        .objects
        .iter()
        .filter(|o| o.kind == SKETCH_TYPE)
        .map(|o| (o.name.as_str(), FeatureId::new()))
        .collect();

    for name in order {
        let props = object_properties(&tree, name);
        match kinds.get(name).copied() {
            Some(SKETCH_TYPE) => {
                let id = sketch_ids
                    .get(name)
                    .copied()
                    .ok_or_else(|| Error::missing_id("sketch", name))?;
                let sketch = read_sketch(name, props, config, convention, &mut warnings)
                    .map_err(|e| e.with_context(&object_context(name)))?;
                config.recover(
                    part.body.add_feature(SketchFeature { id, sketch }),
                    || format!("sketch object '{}'", name),
                    &mut warnings,
                )?;
            }
            Some(PAD_TYPE) => {
                let added = read_pad(name, props, &sketch_ids)
                    .and_then(|pad| part.body.add_feature(pad))
                    .map_err(|e| e.with_context(&object_context(name)));
                config.recover(added, || format!("pad object '{}'", name), &mut warnings)?;
            }
            Some(other) => {
                warn!("Dropping object '{}' of type {}", name, other);
                warnings.push(TranslationWarning::DroppedFeature {
                    feature: name.to_string(),
                    reason: format!("object type '{}' has no equivalent", other),
                });
            }
            None => {
                return Err(Error::missing_id("object", name).with_context(&ErrorContext::new().file(DOCUMENT_ENTRY)));
            }
        }
    }

    debug!(
        "Imported FreeCAD document '{}': {} feature(s), {} warning(s)",
        part.name,
        part.body.len(),
        warnings.len()
    );
    Ok(Translated::new(part, warnings))
}

/// One entry of a geometry list
#[derive(Debug, Default)]
struct GeometryEntry<'a> {
    kind: &'a str,
    shape: Option<(&'a str, &'a Attributes)>,
    construction: bool,
}

fn geometry_entries(property: &Property) -> Result<Vec<GeometryEntry<'_>>> {
    let mut entries: Vec<GeometryEntry> = Vec::new();
    for (name, attrs) in &property.elements {
        if name == "Geometry" {
            entries.push(GeometryEntry {
                kind: required(attrs, "Geometry", "type")?,
                ..Default::default()
            });
            continue;
        }
        let Some(entry) = entries.last_mut() else {
            continue;
        };
        match name.as_str() {
            "Construction" => {
                entry.construction = parse_bool("Construction", required(attrs, "Construction", "value")?)?;
            }
            _ if entry.shape.is_none() => entry.shape = Some((name.as_str(), attrs)),
            _ => trace!("Ignoring <{}> in geometry list", name),
        }
    }
    Ok(entries)
}

fn read_sketch(
    object: &str,
    props: &[Property],
    config: &TranslationConfig,
    convention: &CoordinateConvention,
    warnings: &mut Vec<TranslationWarning>,
) -> Result<Sketch> {
    let label = string_value(props, "Label").unwrap_or(object);
    let frame = match find(props, "Placement").and_then(|p| p.elements.first()) {
        Some((_, attrs)) => read_placement(attrs)?,
        None => CoordinateSystem::world(),
    };
    let mut sketch = Sketch::new(label, frame);

    let mut ids: Vec<Option<GeometryId>> = Vec::new();
    if let Some(list) = find(props, "Geometry") {
        for (index, entry) in geometry_entries(list)?.iter().enumerate() {
            let shape = read_shape(entry).map(|shape| convention.to_canonical(&shape));
            let id = match config.recover(shape, || format!("geometry {} of sketch '{}'", index, label), warnings)? {
                Some(shape) => {
                    let mut geometry = Geometry::new(shape);
                    if entry.construction {
                        geometry = geometry.construction();
                    }
                    Some(sketch.insert_geometry(geometry)?)
                }
                None => None,
            };
            ids.push(id);
        }
    }

    if let Some(list) = find(props, "Constraints") {
        for (index, attrs) in list.elements_named("Constrain").enumerate() {
            let added = read_constraint(attrs, &ids, &sketch).and_then(|c| sketch.add_constraint(c));
            config.recover(added, || format!("constraint {} of sketch '{}'", index, label), warnings)?;
        }
    }

    trace!(
        "Read sketch '{}': {} geometry, {} constraint(s)",
        label,
        sketch.geometry_count(),
        sketch.constraints().len()
    );
    Ok(sketch)
}

fn read_placement(attrs: &Attributes) -> Result<CoordinateSystem> {
    let origin = Point3::new(
        number_or(attrs, "Px", 0.0)?,
        number_or(attrs, "Py", 0.0)?,
        number_or(attrs, "Pz", 0.0)?,
    );
    let quaternion = Quaternion::new(
        number_or(attrs, "Q3", 1.0)?,
        number_or(attrs, "Q0", 0.0)?,
        number_or(attrs, "Q1", 0.0)?,
        number_or(attrs, "Q2", 0.0)?,
    );
    CoordinateSystem::new(origin, quaternion)
}

fn point(attrs: &Attributes, element: &str, x: &str, y: &str) -> Result<Point2> {
    Ok(Point2::new(
        required_number(attrs, element, x)?,
        required_number(attrs, element, y)?,
    ))
}

fn read_shape(entry: &GeometryEntry) -> Result<Shape> {
    let kind = kind_for_geometry_type(entry.kind)
        .ok_or_else(|| Error::InvalidGeometry(format!("unsupported geometry type '{}'", entry.kind)))?;
    let (element, attrs) = entry
        .shape
        .ok_or_else(|| Error::InvalidGeometry(format!("{} entry has no curve data", entry.kind)))?;

    let shape: Shape = match kind {
        ShapeKind::Point => Point::at(point(attrs, element, "X", "Y")?)?.into(),
        ShapeKind::Line => {
            let origin = point(attrs, element, "PosX", "PosY")?;
            let direction = Vector2::new(
                required_number(attrs, element, "DirX")?,
                required_number(attrs, element, "DirY")?,
            );
            Line::new(origin, direction)?.into()
        }
        ShapeKind::LineSegment => LineSegment::new(
            point(attrs, element, "StartX", "StartY")?,
            point(attrs, element, "EndX", "EndY")?,
        )?
        .into(),
        ShapeKind::Circle => Circle::new(
            point(attrs, element, "CenterX", "CenterY")?,
            required_number(attrs, element, "Radius")?,
        )?
        .into(),
        ShapeKind::CircularArc => {
            let offset = number_or(attrs, "AngleXU", 0.0)?;
            CircularArc::new(
                point(attrs, element, "CenterX", "CenterY")?,
                required_number(attrs, element, "Radius")?,
                required_number(attrs, element, "StartAngle")? + offset,
                required_number(attrs, element, "EndAngle")? + offset,
                ArcDirection::CounterClockwise,
            )?
            .into()
        }
        ShapeKind::Ellipse => read_ellipse(attrs, element)?.into(),
        ShapeKind::EllipticalArc => EllipticalArc::new(
            read_ellipse(attrs, element)?,
            required_number(attrs, element, "StartAngle")?,
            required_number(attrs, element, "EndAngle")?,
            ArcDirection::CounterClockwise,
        )?
        .into(),
    };
    Ok(shape)
}

fn read_ellipse(attrs: &Attributes, element: &str) -> Result<Ellipse> {
    Ellipse::new(
        point(attrs, element, "CenterX", "CenterY")?,
        required_number(attrs, element, "MajorRadius")?,
        required_number(attrs, element, "MinorRadius")?,
        number_or(attrs, "AngleXU", 0.0)?,
    )
}

fn read_constraint(attrs: &Attributes, ids: &[Option<GeometryId>], sketch: &Sketch) -> Result<Constraint> {
    let kind = kind_for_type(required_int(attrs, "Constrain", "Type")?)?;

    let mut operands = Vec::with_capacity(3);
    for (geo_key, pos_key) in [("First", "FirstPos"), ("Second", "SecondPos"), ("Third", "ThirdPos")] {
        let geo = int_or(attrs, geo_key, GEO_UNDEF)?;
        let pos = int_or(attrs, pos_key, POS_EDGE)?;
        if geo == GEO_UNDEF {
            continue;
        }
        let operand = if geo >= 0 {
            let id = usize::try_from(geo)
                .ok()
                .and_then(|index| ids.get(index).copied().flatten())
                .ok_or_else(|| Error::Structural(format!("Constraint refers to missing geometry index {}", geo)))?;
            let geometry = sketch.geometry(id).ok_or_else(|| Error::missing_id("geometry", id))?;
            Operand::new(id, geometry.kind(), reference_for_position(pos)?)?
        } else {
            Operand::sketch(frame_reference(geo, pos)?)?
        };
        operands.push(operand);
    }

    let value = if kind.is_dimensional() {
        let value = number_or(attrs, "Value", 0.0)?;
        Some(match kind {
            ConstraintKind::Angle => Quantity::radians(value),
            _ => Quantity::mm(value),
        })
    } else {
        None
    };
    make_constraint(kind, operands, value)
}

fn read_pad(object: &str, props: &[Property], sketch_ids: &HashMap<&str, FeatureId>) -> Result<Extrude> {
    let label = string_value(props, "Label").unwrap_or(object);
    let profile_name = string_value(props, "Profile")
        .ok_or_else(|| Error::Structural(format!("Pad '{}' has no profile", label)))?;
    let profile = sketch_ids
        .get(profile_name)
        .copied()
        .ok_or_else(|| Error::missing_id("profile sketch", profile_name))?;

    let length = number_value(props, "Length", 0.0)?;
    let pad_type = find(props, "Type")
        .and_then(|p| p.elements.first())
        .map_or(Ok(PAD_LENGTH), |(_, attrs)| int_or(attrs, "value", PAD_LENGTH))?;
    let mode = match pad_type {
        PAD_LENGTH if bool_value(props, "Midplane")? => ExtrudeMode::Symmetric,
        PAD_LENGTH => ExtrudeMode::OneSided,
        PAD_TWO_LENGTHS => ExtrudeMode::TwoSided {
            opposite: number_value(props, "Length2", 0.0)?,
        },
        other => {
            return Err(Error::Structural(format!(
                "Pad '{}' uses type {}, which has no equivalent",
                label, other
            )));
        }
    };
    let length = if bool_value(props, "Reversed")? { -length } else { length };
    Extrude::new(label, profile, length)?.with_mode(mode)
}
