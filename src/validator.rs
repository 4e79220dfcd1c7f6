//! Validation of whole parts
//!
//! The authoring API keeps a part valid as it is built. Importers assemble
//! parts from external documents, so this module re-checks a finished part:
//! - Feature ids are unique
//! - Every feature references only earlier sketch features
//! - Geometry and constraint ids are unique within each sketch
//! - Every constraint operand names existing geometry of the expected kind
//! - Metadata entries have names

use std::collections::HashSet;

use tracing::warn;

use crate::error::{Error, Result};
use crate::feature::{Feature, PartFile};
use crate::sketch::Sketch;
use crate::tolerance::Tolerance;

/// Validate a part
///
/// Structural problems are errors. Constraints that are well-formed but not
/// satisfied by the current geometry are only logged, since constraints are
/// declarative.
pub fn validate_part(part: &PartFile, tol: &Tolerance) -> Result<()> {
    validate_feature_ids(part)?;
    validate_feature_order(part)?;
    for sketch in part.body.sketches() {
        validate_sketch(&sketch.sketch, tol)?;
    }
    validate_metadata(part)?;
    Ok(())
}

fn validate_feature_ids(part: &PartFile) -> Result<()> {
    let mut seen = HashSet::new();
    for feature in part.body.iter() {
        if !seen.insert(feature.id()) {
            return Err(Error::duplicate_id("feature", feature.id()));
        }
    }
    Ok(())
}

fn validate_feature_order(part: &PartFile) -> Result<()> {
    let mut earlier_sketches = HashSet::new();
    for feature in part.body.iter() {
        for dependency in feature.dependencies() {
            if !earlier_sketches.contains(&dependency) {
                return Err(Error::DependencyOrder {
                    feature: feature.name().to_string(),
                    missing: dependency.to_string(),
                });
            }
        }
        if let Feature::Sketch(sketch) = feature {
            earlier_sketches.insert(sketch.id);
        }
    }
    Ok(())
}

/// Check ids and references inside one sketch
pub fn validate_sketch(sketch: &Sketch, tol: &Tolerance) -> Result<()> {
    let mut geometry_ids = HashSet::new();
    for geometry in sketch.iter_geometry() {
        if !geometry_ids.insert(geometry.id) {
            return Err(Error::duplicate_id("geometry", geometry.id));
        }
    }

    let mut constraint_ids = HashSet::new();
    for constraint in sketch.constraints() {
        if !constraint_ids.insert(constraint.id()) {
            return Err(Error::duplicate_id("constraint", constraint.id()));
        }
        for operand in constraint.operands() {
            let (Some(id), Some(kind)) = (operand.geometry_id(), operand.kind()) else {
                continue;
            };
            match sketch.geometry(id) {
                None => {
                    return Err(Error::Structural(format!(
                        "Constraint {} in sketch '{}' references missing geometry {}",
                        constraint.id(),
                        sketch.name(),
                        id
                    )));
                }
                Some(geometry) if geometry.kind() != kind => {
                    return Err(Error::Structural(format!(
                        "Constraint {} in sketch '{}' expects geometry {} to be a {}, found {}",
                        constraint.id(),
                        sketch.name(),
                        id,
                        kind,
                        geometry.kind()
                    )));
                }
                Some(_) => {}
            }
        }
    }

    let report = sketch.check_consistency(tol);
    if !report.unsatisfied.is_empty() {
        warn!(
            "Sketch '{}' has {} constraint(s) not satisfied by its geometry",
            sketch.name(),
            report.unsatisfied.len()
        );
    }
    Ok(())
}

fn validate_metadata(part: &PartFile) -> Result<()> {
    for (index, entry) in part.metadata.iter().enumerate() {
        if entry.name.trim().is_empty() {
            return Err(Error::Structural(format!(
                "Metadata entry {} has an empty name (value '{}')",
                index, entry.value
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintKind, ConstraintReference, Operand, make_constraint};
    use crate::feature::{Extrude, SketchFeature};
    use crate::geometry::{LineSegment, ShapeKind};
    use crate::kernel::{CoordinateSystem, Point2};

    #[test]
    fn test_valid_part_passes() {
        let mut part = PartFile::new("part");
        let mut sketch = Sketch::new("s", CoordinateSystem::world());
        let id = sketch.add_geometry(LineSegment::new(Point2::origin(), Point2::new(1.0, 0.0)).unwrap());
        let core = Operand::new(id, ShapeKind::LineSegment, ConstraintReference::Core).unwrap();
        sketch
            .add_constraint(make_constraint(ConstraintKind::Horizontal, vec![core], None).unwrap())
            .unwrap();
        let sketch_id = part.body.add_feature(sketch).unwrap();
        part.body.add_feature(Extrude::new("pad", sketch_id, 2.0).unwrap()).unwrap();
        part.add_metadata("Author", "someone");
        assert!(validate_part(&part, &Tolerance::default()).is_ok());
    }

    #[test]
    fn test_dangling_constraint_is_structural() {
        let mut sketch = Sketch::new("s", CoordinateSystem::world());
        let id = sketch.add_geometry(LineSegment::new(Point2::origin(), Point2::new(1.0, 0.0)).unwrap());
        let core = Operand::new(id, ShapeKind::LineSegment, ConstraintReference::Core).unwrap();
        sketch
            .add_constraint(make_constraint(ConstraintKind::Horizontal, vec![core], None).unwrap())
            .unwrap();
        sketch.remove_geometry(id).unwrap();
        let err = validate_sketch(&sketch, &Tolerance::default()).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_empty_metadata_name() {
        let mut part = PartFile::new("part");
        part.body
            .add_feature(SketchFeature::new(Sketch::new("s", CoordinateSystem::world())))
            .unwrap();
        part.add_metadata(" ", "x");
        assert!(validate_part(&part, &Tolerance::default()).is_err());
    }
}
