use std::collections::HashMap;
use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesStart, Event};
use tracing::{debug, warn};

use super::table::{GEO_UNDEF, POS_EDGE, frame_slot, geometry_type, native_type, position_code};
use super::{BODY_TYPE, PAD_LENGTH, PAD_TWO_LENGTHS, PAD_TYPE, SKETCH_TYPE, object_name};
use crate::bridge::xml::{into_string, write_empty, write_end, write_start};
use crate::bridge::{CoordinateConvention, TranslationConfig, TranslationWarning, Translated, exportable_constraints};
use crate::constraint::{Constraint, Target};
use crate::error::{Error, Result};
use crate::feature::{Extrude, ExtrudeMode, Feature, PartFile, SketchFeature};
use crate::geometry::{ArcDirection, Shape};
use crate::id::FeatureId;
use crate::kernel::{CoordinateSystem, Vector3};
use crate::path::format_number;
use crate::sketch::Sketch;

/// A constraint in native form
struct NativeConstraint {
    code: i64,
    value: f64,
    slots: [(i64, i64); 3],
}

/// A feature with the object name it is written under
struct NamedFeature<'a> {
    name: String,
    feature: &'a Feature,
}

pub(super) fn write_document(
    part: &PartFile,
    config: &TranslationConfig,
    convention: &CoordinateConvention,
) -> Result<Translated<String>> {
    let mut warnings = Vec::new();

    let mut names: HashMap<FeatureId, String> = HashMap::new();
    let mut objects = Vec::with_capacity(part.body.len());
    let (mut sketches, mut pads) = (0, 0);
    for feature in part.body.iter() {
        let name = match feature {
            Feature::Sketch(_) => {
                sketches += 1;
                object_name("Sketch", sketches - 1)
            }
            Feature::Extrude(_) => {
                pads += 1;
                object_name("Pad", pads - 1)
            }
        };
        names.insert(feature.id(), name.clone());
        objects.push(NamedFeature { name, feature });
    }

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| Error::xml_write(format!("Failed to write XML declaration: {}", e)))?;

    let mut document = BytesStart::new("Document");
    document.push_attribute(("SchemaVersion", "4"));
    document.push_attribute(("ProgramVersion", "0.21"));
    document.push_attribute(("FileVersion", "1"));
    write_start(&mut writer, document)?;

    write_start(&mut writer, counted("Properties", 3))?;
    write_string_property(&mut writer, "Label", &part.name)?;
    write_property(&mut writer, "Meta", "App::PropertyMap", |w| {
        write_start(w, counted("Map", part.metadata.len()))?;
        for entry in &part.metadata {
            let mut item = BytesStart::new("Item");
            item.push_attribute(("key", entry.name.as_str()));
            item.push_attribute(("value", entry.value.as_str()));
            write_empty(w, item)?;
        }
        write_end(w, "Map")
    })?;
    write_string_property(&mut writer, "Unit", part.unit.as_str())?;
    write_end(&mut writer, "Properties")?;

    write_start(&mut writer, counted("Objects", objects.len() + 1))?;
    write_object_entry(&mut writer, BODY_TYPE, "Body", 1)?;
    for (index, object) in objects.iter().enumerate() {
        let kind = match object.feature {
            Feature::Sketch(_) => SKETCH_TYPE,
            Feature::Extrude(_) => PAD_TYPE,
        };
        write_object_entry(&mut writer, kind, &object.name, index + 2)?;
    }
    write_end(&mut writer, "Objects")?;

    write_start(&mut writer, counted("ObjectData", objects.len() + 1))?;
    write_body(&mut writer, part, &objects)?;
    for object in &objects {
        let mut elem = BytesStart::new("Object");
        elem.push_attribute(("name", object.name.as_str()));
        write_start(&mut writer, elem)?;
        match object.feature {
            Feature::Sketch(sketch) => write_sketch(&mut writer, sketch, config, convention, &mut warnings)?,
            Feature::Extrude(extrude) => write_pad(&mut writer, extrude, &names)?,
        }
        write_end(&mut writer, "Object")?;
    }
    write_end(&mut writer, "ObjectData")?;

    write_end(&mut writer, "Document")?;

    debug!(
        "Exported part '{}' to FreeCAD document: {} object(s), {} warning(s)",
        part.name,
        objects.len() + 1,
        warnings.len()
    );
    Ok(Translated::new(into_string(writer.into_inner())?, warnings))
}

fn counted(name: &str, count: usize) -> BytesStart<'_> {
    let mut elem = BytesStart::new(name);
    let key = if name == "Properties" || name == "Objects" || name == "ObjectData" {
        "Count"
    } else {
        "count"
    };
    elem.push_attribute((key, count.to_string().as_str()));
    elem
}

fn write_object_entry<W: Write>(writer: &mut Writer<W>, kind: &str, name: &str, id: usize) -> Result<()> {
    let mut elem = BytesStart::new("Object");
    elem.push_attribute(("type", kind));
    elem.push_attribute(("name", name));
    elem.push_attribute(("id", id.to_string().as_str()));
    write_empty(writer, elem)
}

fn write_property<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    kind: &str,
    body: impl FnOnce(&mut Writer<W>) -> Result<()>,
) -> Result<()> {
    let mut elem = BytesStart::new("Property");
    elem.push_attribute(("name", name));
    elem.push_attribute(("type", kind));
    write_start(writer, elem)?;
    body(writer)?;
    write_end(writer, "Property")
}

fn write_value_property<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    kind: &str,
    element: &str,
    value: &str,
) -> Result<()> {
    write_property(writer, name, kind, |w| {
        let mut elem = BytesStart::new(element);
        elem.push_attribute(("value", value));
        write_empty(w, elem)
    })
}

fn write_string_property<W: Write>(writer: &mut Writer<W>, name: &str, value: &str) -> Result<()> {
    write_value_property(writer, name, "App::PropertyString", "String", value)
}

fn write_bool_property<W: Write>(writer: &mut Writer<W>, name: &str, value: bool) -> Result<()> {
    write_value_property(writer, name, "App::PropertyBool", "Bool", if value { "true" } else { "false" })
}

fn write_length_property<W: Write>(writer: &mut Writer<W>, name: &str, value: f64) -> Result<()> {
    write_value_property(writer, name, "App::PropertyLength", "Float", &format_number(value))
}

fn write_body<W: Write>(writer: &mut Writer<W>, part: &PartFile, objects: &[NamedFeature]) -> Result<()> {
    let mut elem = BytesStart::new("Object");
    elem.push_attribute(("name", "Body"));
    write_start(writer, elem)?;
    write_start(writer, counted("Properties", 2))?;

    let label = if part.body.name.is_empty() { "Body" } else { part.body.name.as_str() };
    write_string_property(writer, "Label", label)?;
    write_property(writer, "Group", "App::PropertyLinkList", |w| {
        write_start(w, counted("LinkList", objects.len()))?;
        for object in objects {
            let mut link = BytesStart::new("Link");
            link.push_attribute(("value", object.name.as_str()));
            write_empty(w, link)?;
        }
        write_end(w, "LinkList")
    })?;

    write_end(writer, "Properties")?;
    write_end(writer, "Object")
}

fn write_sketch<W: Write>(
    writer: &mut Writer<W>,
    feature: &SketchFeature,
    config: &TranslationConfig,
    convention: &CoordinateConvention,
    warnings: &mut Vec<TranslationWarning>,
) -> Result<()> {
    let sketch = &feature.sketch;

    // native arcs only run counter-clockwise
    let mut reversed = Vec::with_capacity(sketch.geometry_count());
    let mut shapes = Vec::with_capacity(sketch.geometry_count());
    for geometry in sketch.iter_geometry() {
        let (shape, flipped) = match convention.to_document(&geometry.shape) {
            Shape::CircularArc(a) if a.direction() == ArcDirection::Clockwise => {
                (Shape::CircularArc(a.to_counter_clockwise()), true)
            }
            Shape::EllipticalArc(a) if a.direction() == ArcDirection::Clockwise => {
                (Shape::EllipticalArc(a.to_counter_clockwise()), true)
            }
            other => (other, false),
        };
        reversed.push(flipped);
        shapes.push((shape, geometry.construction));
    }

    let constraints = exportable_constraints(sketch, warnings);
    let mut natives = Vec::with_capacity(constraints.len());
    for constraint in constraints {
        match native_constraint(constraint, sketch, &reversed) {
            Ok(native) => natives.push(native),
            Err(e) if config.best_effort => {
                warn!("Dropping constraint {} in sketch '{}': {}", constraint.id(), sketch.name(), e);
                warnings.push(TranslationWarning::DroppedConstraint {
                    sketch: sketch.name().to_string(),
                    constraint: Some(constraint.id()),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    write_start(writer, counted("Properties", 4))?;
    write_string_property(writer, "Label", sketch.name())?;
    write_property(writer, "Placement", "App::PropertyPlacement", |w| {
        write_placement(w, sketch.frame())
    })?;
    write_property(writer, "Geometry", "Part::PropertyGeometryList", |w| {
        write_start(w, counted("GeometryList", shapes.len()))?;
        for (shape, construction) in &shapes {
            write_geometry(w, shape, *construction)?;
        }
        write_end(w, "GeometryList")
    })?;
    write_property(writer, "Constraints", "Sketcher::PropertyConstraintList", |w| {
        write_start(w, counted("ConstraintList", natives.len()))?;
        for native in &natives {
            write_constraint(w, native)?;
        }
        write_end(w, "ConstraintList")
    })?;
    write_end(writer, "Properties")
}

fn write_placement<W: Write>(writer: &mut Writer<W>, frame: &CoordinateSystem) -> Result<()> {
    let origin = frame.origin();
    let q = frame.orientation();
    let axis = q.axis().map_or(Vector3::z(), |a| a.into_inner());
    let mut elem = BytesStart::new("PropertyPlacement");
    push_numbers(
        &mut elem,
        &[
            ("Px", origin.x),
            ("Py", origin.y),
            ("Pz", origin.z),
            ("Q0", q.i),
            ("Q1", q.j),
            ("Q2", q.k),
            ("Q3", q.w),
            ("A", q.angle()),
            ("Ox", axis.x),
            ("Oy", axis.y),
            ("Oz", axis.z),
        ],
    );
    write_empty(writer, elem)
}

fn push_numbers(elem: &mut BytesStart, values: &[(&str, f64)]) {
    for (key, value) in values {
        elem.push_attribute((*key, format_number(*value).as_str()));
    }
}

/// Center and normal attributes shared by all conics
fn conic_frame(x: f64, y: f64) -> [(&'static str, f64); 6] {
    [
        ("CenterX", x),
        ("CenterY", y),
        ("CenterZ", 0.0),
        ("NormalX", 0.0),
        ("NormalY", 0.0),
        ("NormalZ", 1.0),
    ]
}

fn write_geometry<W: Write>(writer: &mut Writer<W>, shape: &Shape, construction: bool) -> Result<()> {
    let mut outer = BytesStart::new("Geometry");
    outer.push_attribute(("type", geometry_type(shape.kind())));
    write_start(writer, outer)?;

    let inner = match shape {
        Shape::Point(p) => {
            let position = p.position();
            let mut elem = BytesStart::new("GeomPoint");
            push_numbers(&mut elem, &[("X", position.x), ("Y", position.y), ("Z", 0.0)]);
            elem
        }
        Shape::Line(l) => {
            let (origin, direction) = (l.origin(), l.direction());
            let mut elem = BytesStart::new("GeomLine");
            push_numbers(
                &mut elem,
                &[
                    ("PosX", origin.x),
                    ("PosY", origin.y),
                    ("PosZ", 0.0),
                    ("DirX", direction.x),
                    ("DirY", direction.y),
                    ("DirZ", 0.0),
                ],
            );
            elem
        }
        Shape::LineSegment(s) => {
            let (start, end) = (s.start(), s.end());
            let mut elem = BytesStart::new("LineSegment");
            push_numbers(
                &mut elem,
                &[
                    ("StartX", start.x),
                    ("StartY", start.y),
                    ("StartZ", 0.0),
                    ("EndX", end.x),
                    ("EndY", end.y),
                    ("EndZ", 0.0),
                ],
            );
            elem
        }
        Shape::Circle(c) => {
            let mut elem = BytesStart::new("Circle");
            push_numbers(&mut elem, &conic_frame(c.center().x, c.center().y));
            push_numbers(&mut elem, &[("AngleXU", 0.0), ("Radius", c.radius())]);
            elem
        }
        Shape::CircularArc(a) => {
            let mut elem = BytesStart::new("ArcOfCircle");
            push_numbers(&mut elem, &conic_frame(a.center().x, a.center().y));
            push_numbers(
                &mut elem,
                &[
                    ("AngleXU", 0.0),
                    ("Radius", a.radius()),
                    ("StartAngle", a.start_angle()),
                    ("EndAngle", a.end_angle()),
                ],
            );
            elem
        }
        Shape::Ellipse(e) => {
            let mut elem = BytesStart::new("Ellipse");
            push_numbers(&mut elem, &conic_frame(e.center().x, e.center().y));
            push_numbers(
                &mut elem,
                &[
                    ("MajorRadius", e.semi_major()),
                    ("MinorRadius", e.semi_minor()),
                    ("AngleXU", e.rotation()),
                ],
            );
            elem
        }
        Shape::EllipticalArc(a) => {
            let e = a.ellipse();
            let mut elem = BytesStart::new("ArcOfEllipse");
            push_numbers(&mut elem, &conic_frame(e.center().x, e.center().y));
            push_numbers(
                &mut elem,
                &[
                    ("MajorRadius", e.semi_major()),
                    ("MinorRadius", e.semi_minor()),
                    ("AngleXU", e.rotation()),
                    ("StartAngle", a.start_angle()),
                    ("EndAngle", a.end_angle()),
                ],
            );
            elem
        }
    };
    write_empty(writer, inner)?;

    let mut flag = BytesStart::new("Construction");
    flag.push_attribute(("value", if construction { "1" } else { "0" }));
    write_empty(writer, flag)?;

    write_end(writer, "Geometry")
}

fn native_constraint(constraint: &Constraint, sketch: &Sketch, reversed: &[bool]) -> Result<NativeConstraint> {
    let code = native_type(constraint.kind())?;
    let mut slots = [(GEO_UNDEF, POS_EDGE); 3];
    for (slot, operand) in slots.iter_mut().zip(constraint.operands()) {
        *slot = match operand.target() {
            Target::Sketch => frame_slot(operand.reference())?,
            Target::Geometry(id, _) => {
                let index = sketch
                    .position_of(id)
                    .ok_or_else(|| Error::missing_id("geometry", id))?;
                let flipped = reversed.get(index).copied().unwrap_or(false);
                (index as i64, position_code(operand.reference(), flipped))
            }
        };
    }
    Ok(NativeConstraint {
        code,
        value: constraint.value().map_or(0.0, |q| q.canonical()),
        slots,
    })
}

fn write_constraint<W: Write>(writer: &mut Writer<W>, native: &NativeConstraint) -> Result<()> {
    let mut elem = BytesStart::new("Constrain");
    elem.push_attribute(("Name", ""));
    elem.push_attribute(("Type", native.code.to_string().as_str()));
    elem.push_attribute(("Value", format_number(native.value).as_str()));
    let keys = [("First", "FirstPos"), ("Second", "SecondPos"), ("Third", "ThirdPos")];
    for ((geo_key, pos_key), (geo, pos)) in keys.iter().zip(native.slots) {
        elem.push_attribute((*geo_key, geo.to_string().as_str()));
        elem.push_attribute((*pos_key, pos.to_string().as_str()));
    }
    write_empty(writer, elem)
}

fn write_pad<W: Write>(writer: &mut Writer<W>, extrude: &Extrude, names: &HashMap<FeatureId, String>) -> Result<()> {
    let profile = names
        .get(&extrude.profile)
        .ok_or_else(|| Error::missing_id("profile sketch", extrude.profile))?;
    let (kind, length2, midplane) = match extrude.mode {
        ExtrudeMode::OneSided => (PAD_LENGTH, 0.0, false),
        ExtrudeMode::Symmetric => (PAD_LENGTH, 0.0, true),
        ExtrudeMode::TwoSided { opposite } => (PAD_TWO_LENGTHS, opposite, false),
    };

    write_start(writer, counted("Properties", 7))?;
    write_string_property(writer, "Label", &extrude.name)?;
    write_property(writer, "Profile", "App::PropertyLinkSub", |w| {
        let mut link = BytesStart::new("LinkSub");
        link.push_attribute(("value", profile.as_str()));
        link.push_attribute(("count", "0"));
        write_empty(w, link)
    })?;
    write_length_property(writer, "Length", extrude.length.abs())?;
    write_length_property(writer, "Length2", length2)?;
    write_value_property(writer, "Type", "App::PropertyEnumeration", "Integer", &kind.to_string())?;
    write_bool_property(writer, "Reversed", extrude.is_reversed())?;
    write_bool_property(writer, "Midplane", midplane)?;
    write_end(writer, "Properties")
}
