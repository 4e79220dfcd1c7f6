//! Native codes of the FreeCAD sketcher
//!
//! Constraints are stored with an integer type and refer to geometry by
//! index (`GeoId`) plus a point position (`PosId`). Negative GeoIds address
//! the sketch frame: `-1` is the horizontal axis, whose start point is the
//! origin, and `-2` the vertical axis.

use crate::constraint::{ConstraintKind, ConstraintReference};
use crate::error::{Error, Result};
use crate::geometry::ShapeKind;

/// GeoId of an unused constraint slot
pub const GEO_UNDEF: i64 = -2000;
/// GeoId of the sketch's horizontal axis
pub const H_AXIS: i64 = -1;
/// GeoId of the sketch's vertical axis
pub const V_AXIS: i64 = -2;

/// Position code of a whole edge
pub const POS_EDGE: i64 = 0;
/// Position code of a start point
pub const POS_START: i64 = 1;
/// Position code of an end point
pub const POS_END: i64 = 2;
/// Position code of a center point
pub const POS_MID: i64 = 3;

/// Canonical constraint kinds and their native type codes
pub const CONSTRAINT_TYPES: [(ConstraintKind, i64); 12] = [
    (ConstraintKind::Coincident, 1),
    (ConstraintKind::Horizontal, 2),
    (ConstraintKind::Vertical, 3),
    (ConstraintKind::Parallel, 4),
    (ConstraintKind::Distance, 6),
    (ConstraintKind::HorizontalDistance, 7),
    (ConstraintKind::VerticalDistance, 8),
    (ConstraintKind::Angle, 9),
    (ConstraintKind::Perpendicular, 10),
    (ConstraintKind::Radius, 11),
    (ConstraintKind::Equal, 12),
    (ConstraintKind::Diameter, 18),
];

/// Native types with no canonical counterpart, for error messages
const FOREIGN_TYPES: [(i64, &str); 8] = [
    (0, "None"),
    (5, "Tangent"),
    (13, "PointOnObject"),
    (14, "Symmetric"),
    (15, "InternalAlignment"),
    (16, "SnellsLaw"),
    (17, "Block"),
    (19, "Weight"),
];

/// Native type code of a constraint kind
///
/// Fails with [`Error::UnsupportedConstraint`] for kinds missing from
/// [`CONSTRAINT_TYPES`].
pub fn native_type(kind: ConstraintKind) -> Result<i64> {
    CONSTRAINT_TYPES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, code)| *code)
        .ok_or_else(|| Error::UnsupportedConstraint(format!("no native constraint type for '{}'", kind)))
}

/// Canonical kind of a native type code
pub fn kind_for_type(code: i64) -> Result<ConstraintKind> {
    if let Some((kind, _)) = CONSTRAINT_TYPES.iter().find(|(_, c)| *c == code) {
        return Ok(*kind);
    }
    let name = FOREIGN_TYPES
        .iter()
        .find(|(c, _)| *c == code)
        .map_or("unknown", |(_, name)| *name);
    Err(Error::UnsupportedConstraint(format!(
        "native constraint type {} ({}) has no equivalent",
        code, name
    )))
}

/// Position code for a reference on geometry
///
/// `reversed` swaps start and end, for arcs whose direction was flipped on
/// the way out.
pub fn position_code(reference: ConstraintReference, reversed: bool) -> i64 {
    match reference {
        ConstraintReference::Start if reversed => POS_END,
        ConstraintReference::End if reversed => POS_START,
        ConstraintReference::Start | ConstraintReference::Origin => POS_START,
        ConstraintReference::End => POS_END,
        ConstraintReference::Center => POS_MID,
        ConstraintReference::Core | ConstraintReference::XAxis | ConstraintReference::YAxis => POS_EDGE,
    }
}

/// Reference on geometry for a position code
pub fn reference_for_position(code: i64) -> Result<ConstraintReference> {
    match code {
        POS_EDGE => Ok(ConstraintReference::Core),
        POS_START => Ok(ConstraintReference::Start),
        POS_END => Ok(ConstraintReference::End),
        POS_MID => Ok(ConstraintReference::Center),
        other => Err(Error::parse_error_with_context("PosId", &other.to_string(), "0, 1, 2 or 3")),
    }
}

/// GeoId and position code addressing a part of the sketch frame
pub fn frame_slot(reference: ConstraintReference) -> Result<(i64, i64)> {
    match reference {
        ConstraintReference::Origin => Ok((H_AXIS, POS_START)),
        ConstraintReference::XAxis => Ok((H_AXIS, POS_EDGE)),
        ConstraintReference::YAxis => Ok((V_AXIS, POS_EDGE)),
        other => Err(Error::Structural(format!(
            "Reference '{}' does not address the sketch frame",
            other
        ))),
    }
}

/// Part of the sketch frame addressed by a negative GeoId
pub fn frame_reference(geo: i64, pos: i64) -> Result<ConstraintReference> {
    match (geo, pos) {
        (H_AXIS, POS_START) => Ok(ConstraintReference::Origin),
        (H_AXIS, POS_EDGE) => Ok(ConstraintReference::XAxis),
        (V_AXIS, POS_EDGE) => Ok(ConstraintReference::YAxis),
        _ => Err(Error::UnsupportedConstraint(format!(
            "constraint refers to external geometry {} at position {}",
            geo, pos
        ))),
    }
}

/// Native geometry type of a shape kind
pub fn geometry_type(kind: ShapeKind) -> &'static str {
    match kind {
        ShapeKind::Point => "Part::GeomPoint",
        ShapeKind::Line => "Part::GeomLine",
        ShapeKind::LineSegment => "Part::GeomLineSegment",
        ShapeKind::Circle => "Part::GeomCircle",
        ShapeKind::CircularArc => "Part::GeomArcOfCircle",
        ShapeKind::Ellipse => "Part::GeomEllipse",
        ShapeKind::EllipticalArc => "Part::GeomArcOfEllipse",
    }
}

/// Shape kind of a native geometry type
pub fn kind_for_geometry_type(name: &str) -> Option<ShapeKind> {
    ShapeKind::ALL.into_iter().find(|kind| geometry_type(*kind) == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_native_type() {
        for kind in ConstraintKind::ALL {
            let code = native_type(kind).unwrap();
            assert_eq!(kind_for_type(code).unwrap(), kind);
        }
    }

    #[test]
    fn test_foreign_types_rejected() {
        let err = kind_for_type(5).unwrap_err();
        assert!(matches!(err, Error::UnsupportedConstraint(_)));
        assert!(err.to_string().contains("Tangent"));
        assert!(kind_for_type(99).is_err());
    }

    #[test]
    fn test_positions() {
        assert_eq!(position_code(ConstraintReference::Start, false), POS_START);
        assert_eq!(position_code(ConstraintReference::Start, true), POS_END);
        assert_eq!(position_code(ConstraintReference::Center, true), POS_MID);
        for reference in [ConstraintReference::Origin, ConstraintReference::XAxis, ConstraintReference::YAxis] {
            let (geo, pos) = frame_slot(reference).unwrap();
            assert_eq!(frame_reference(geo, pos).unwrap(), reference);
        }
        assert!(frame_reference(-3, 0).is_err());
        assert!(reference_for_position(4).is_err());
    }

    #[test]
    fn test_geometry_types() {
        for kind in ShapeKind::ALL {
            assert_eq!(kind_for_geometry_type(geometry_type(kind)), Some(kind));
        }
        assert_eq!(kind_for_geometry_type("Part::GeomBSplineCurve"), None);
    }
}
