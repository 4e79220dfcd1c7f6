//! Sketches: geometry plus constraints on one plane

use tracing::debug;

use crate::arc::{BoundingBox, bounds_of};
use crate::constraint::Constraint;
use crate::error::{Error, Result};
use crate::geometry::{Geometry, Placed, Shape};
use crate::id::{ConstraintId, GeometryId};
use crate::kernel::CoordinateSystem;
use crate::tolerance::Tolerance;

/// An ordered set of geometry and constraints drawn on one plane
///
/// Insertion order is kept for deterministic serialization. Constraints refer
/// to geometry by id only; removing geometry leaves its constraints in place
/// so [`Sketch::check_consistency`] can report them.
#[derive(Debug, Clone, PartialEq)]
pub struct Sketch {
    name: String,
    frame: CoordinateSystem,
    geometry: Vec<Geometry>,
    constraints: Vec<Constraint>,
}

/// Outcome of [`Sketch::check_consistency`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Constraints referring to geometry that is no longer in the sketch
    pub dangling: Vec<ConstraintId>,
    /// Constraints the current geometry does not satisfy
    pub unsatisfied: Vec<ConstraintId>,
}

impl ConsistencyReport {
    /// Whether nothing was reported
    pub fn is_consistent(&self) -> bool {
        self.dangling.is_empty() && self.unsatisfied.is_empty()
    }
}

impl Sketch {
    /// Create an empty sketch on `frame`
    pub fn new(name: impl Into<String>, frame: CoordinateSystem) -> Self {
        Self {
            name: name.into(),
            frame,
            geometry: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Name of the sketch
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Coordinate system of the sketch plane
    pub fn frame(&self) -> &CoordinateSystem {
        &self.frame
    }

    /// Move the sketch to another plane
    pub fn set_frame(&mut self, frame: CoordinateSystem) {
        self.frame = frame;
    }

    /// Add a shape under a fresh id
    pub fn add_geometry(&mut self, shape: impl Into<Shape>) -> GeometryId {
        let geometry = Geometry::new(shape);
        let id = geometry.id;
        self.geometry.push(geometry);
        id
    }

    /// Add a geometry record keeping its id
    ///
    /// Fails with [`Error::Structural`] if the id is already present.
    pub fn insert_geometry(&mut self, geometry: Geometry) -> Result<GeometryId> {
        if self.geometry(geometry.id).is_some() {
            return Err(Error::duplicate_id("geometry", geometry.id));
        }
        let id = geometry.id;
        self.geometry.push(geometry);
        Ok(id)
    }

    /// Remove geometry, returning it
    ///
    /// Constraints that reference it are kept and show up as dangling.
    pub fn remove_geometry(&mut self, id: GeometryId) -> Result<Geometry> {
        let index = self.position_of(id).ok_or_else(|| Error::missing_id("geometry", id))?;
        Ok(self.geometry.remove(index))
    }

    /// Look up geometry by id
    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometry.iter().find(|g| g.id == id)
    }

    /// Replace the shape of existing geometry
    ///
    /// The kind may not change, since constraints were validated against it.
    pub fn set_shape(&mut self, id: GeometryId, shape: impl Into<Shape>) -> Result<()> {
        let shape = shape.into();
        let geometry = self
            .geometry
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| Error::missing_id("geometry", id))?;
        if geometry.kind() != shape.kind() {
            return Err(Error::Structural(format!(
                "Cannot replace {} geometry {} with a {}",
                geometry.kind(),
                id,
                shape.kind()
            )));
        }
        geometry.shape = shape;
        Ok(())
    }

    /// Index of geometry in insertion order
    pub fn position_of(&self, id: GeometryId) -> Option<usize> {
        self.geometry.iter().position(|g| g.id == id)
    }

    /// Geometry in insertion order
    pub fn iter_geometry(&self) -> impl Iterator<Item = &Geometry> {
        self.geometry.iter()
    }

    /// Number of geometry entities
    pub fn geometry_count(&self) -> usize {
        self.geometry.len()
    }

    /// Geometry placed on the sketch frame, for use with the relation functions
    pub fn placed(&self, id: GeometryId) -> Option<Placed<'_>> {
        self.geometry(id).map(|g| g.shape.on(&self.frame))
    }

    /// Add a constraint
    ///
    /// Every referenced geometry must exist with the kind the operand was
    /// built for; otherwise fails with [`Error::Structural`].
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<ConstraintId> {
        if self.constraint(constraint.id()).is_some() {
            return Err(Error::duplicate_id("constraint", constraint.id()));
        }
        for operand in constraint.operands() {
            let (Some(id), Some(kind)) = (operand.geometry_id(), operand.kind()) else {
                continue;
            };
            let geometry = self.geometry(id).ok_or_else(|| Error::missing_id("geometry", id))?;
            if geometry.kind() != kind {
                return Err(Error::Structural(format!(
                    "Constraint {} expects geometry {} to be a {}, found {}",
                    constraint.id(),
                    id,
                    kind,
                    geometry.kind()
                )));
            }
        }
        let id = constraint.id();
        self.constraints.push(constraint);
        Ok(id)
    }

    /// Remove a constraint, returning it
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<Constraint> {
        let index = self
            .constraints
            .iter()
            .position(|c| c.id() == id)
            .ok_or_else(|| Error::missing_id("constraint", id))?;
        Ok(self.constraints.remove(index))
    }

    /// Look up a constraint by id
    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.id() == id)
    }

    /// Constraints in insertion order
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Bounds of all geometry except infinite lines
    pub fn bounds(&self) -> Option<BoundingBox> {
        let boxes: Vec<BoundingBox> = self.geometry.iter().filter_map(|g| g.shape.bounds()).collect();
        bounds_of(&boxes)
    }

    /// Whether `constraint` refers to geometry this sketch no longer holds
    ///
    /// Geometry that is present but of another kind also counts.
    pub fn is_dangling(&self, constraint: &Constraint) -> bool {
        constraint
            .operands()
            .iter()
            .any(|op| match (op.geometry_id(), op.kind()) {
                (Some(id), Some(kind)) => self.geometry(id).is_none_or(|g| g.kind() != kind),
                _ => false,
            })
    }

    /// Report dangling and unsatisfied constraints
    ///
    /// Nothing is corrected; a constraint that does not hold is only listed.
    pub fn check_consistency(&self, tol: &Tolerance) -> ConsistencyReport {
        let mut report = ConsistencyReport::default();
        for constraint in &self.constraints {
            if self.is_dangling(constraint) {
                report.dangling.push(constraint.id());
                continue;
            }
            match constraint.is_satisfied(self, tol) {
                Ok(true) => {}
                Ok(false) => report.unsatisfied.push(constraint.id()),
                Err(e) => {
                    debug!("Constraint {} could not be evaluated: {}", constraint.id(), e);
                    report.unsatisfied.push(constraint.id());
                }
            }
        }
        report
    }
}
