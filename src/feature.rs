//! Features and the part container
//!
//! A part is an ordered list of features. Sketch features own a [`Sketch`];
//! an [`Extrude`] references an earlier sketch feature by id. The container
//! enforces that references only point backwards.

use std::fmt;

use tracing::debug;

use crate::constraint::LengthUnit;
use crate::error::{Error, Result};
use crate::id::FeatureId;
use crate::kernel::ensure_finite;
use crate::sketch::Sketch;

/// Discriminant of [`Feature`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureType {
    /// [`SketchFeature`]
    Sketch,
    /// [`Extrude`]
    Extrude,
}

impl FeatureType {
    /// Stable name used in documents
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::Sketch => "sketch",
            FeatureType::Extrude => "extrude",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sketch as a step of the part history
#[derive(Debug, Clone, PartialEq)]
pub struct SketchFeature {
    /// Identifier, unique within the container
    pub id: FeatureId,
    /// The sketch
    pub sketch: Sketch,
}

impl SketchFeature {
    /// Wrap a sketch under a fresh id
    pub fn new(sketch: Sketch) -> Self {
        Self {
            id: FeatureId::new(),
            sketch,
        }
    }
}

/// How an extrusion extends from its sketch plane
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ExtrudeMode {
    /// Only along the signed length
    #[default]
    OneSided,
    /// Half the length to each side of the plane
    Symmetric,
    /// Along the length, and `opposite` the other way
    TwoSided {
        /// Non-negative length on the reverse side
        opposite: f64,
    },
}

/// Linear extrusion of a sketch profile
#[derive(Debug, Clone, PartialEq)]
pub struct Extrude {
    /// Identifier, unique within the container
    pub id: FeatureId,
    /// Display name
    pub name: String,
    /// The sketch feature being extruded
    pub profile: FeatureId,
    /// Signed length in millimeters; negative extrudes against the plane normal
    pub length: f64,
    /// Side handling
    pub mode: ExtrudeMode,
}

impl Extrude {
    /// Create a one-sided extrusion
    pub fn new(name: impl Into<String>, profile: FeatureId, length: f64) -> Result<Self> {
        let extrude = Self {
            id: FeatureId::new(),
            name: name.into(),
            profile,
            length,
            mode: ExtrudeMode::OneSided,
        };
        extrude.validate()?;
        Ok(extrude)
    }

    /// Change the side handling
    pub fn with_mode(mut self, mode: ExtrudeMode) -> Result<Self> {
        self.mode = mode;
        self.validate()?;
        Ok(self)
    }

    /// Whether the extrusion runs against the plane normal
    pub fn is_reversed(&self) -> bool {
        self.length < 0.0
    }

    /// Check length and mode
    pub fn validate(&self) -> Result<()> {
        ensure_finite("extrude length", &[self.length])?;
        if self.length == 0.0 {
            return Err(Error::InvalidGeometry(format!("Extrude '{}' has zero length", self.name)));
        }
        if let ExtrudeMode::TwoSided { opposite } = self.mode {
            ensure_finite("extrude opposite length", &[opposite])?;
            if opposite < 0.0 {
                return Err(Error::InvalidGeometry(format!(
                    "Extrude '{}' has negative opposite length {}",
                    self.name, opposite
                )));
            }
        }
        Ok(())
    }
}

/// A step of the part history
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    /// A sketch
    Sketch(SketchFeature),
    /// An extrusion of an earlier sketch
    Extrude(Extrude),
}

impl Feature {
    /// Identifier of the feature
    pub fn id(&self) -> FeatureId {
        match self {
            Feature::Sketch(s) => s.id,
            Feature::Extrude(e) => e.id,
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        match self {
            Feature::Sketch(s) => s.sketch.name(),
            Feature::Extrude(e) => &e.name,
        }
    }

    /// Type of the feature
    pub fn feature_type(&self) -> FeatureType {
        match self {
            Feature::Sketch(_) => FeatureType::Sketch,
            Feature::Extrude(_) => FeatureType::Extrude,
        }
    }

    /// Features this one depends on
    pub fn dependencies(&self) -> Vec<FeatureId> {
        match self {
            Feature::Sketch(_) => Vec::new(),
            Feature::Extrude(e) => vec![e.profile],
        }
    }
}

impl From<SketchFeature> for Feature {
    fn from(value: SketchFeature) -> Self {
        Feature::Sketch(value)
    }
}

impl From<Sketch> for Feature {
    fn from(value: Sketch) -> Self {
        Feature::Sketch(SketchFeature::new(value))
    }
}

impl From<Extrude> for Feature {
    fn from(value: Extrude) -> Self {
        Feature::Extrude(value)
    }
}

/// Ordered feature history of a part
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureContainer {
    /// Name of the body
    pub name: String,
    features: Vec<Feature>,
}

impl FeatureContainer {
    /// Create an empty container
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            features: Vec::new(),
        }
    }

    /// Append a feature
    ///
    /// Fails with [`Error::Structural`] on a duplicate id and with
    /// [`Error::DependencyOrder`] when the feature references something not
    /// already in the container. An extrusion whose profile is not a sketch
    /// feature is a [`Error::Structural`] error.
    pub fn add_feature(&mut self, feature: impl Into<Feature>) -> Result<FeatureId> {
        let feature = feature.into();
        let id = feature.id();
        if self.get(id).is_some() {
            return Err(Error::duplicate_id("feature", id));
        }
        if let Feature::Extrude(extrude) = &feature {
            extrude.validate()?;
        }
        for dependency in feature.dependencies() {
            match self.get(dependency) {
                None => {
                    return Err(Error::DependencyOrder {
                        feature: feature.name().to_string(),
                        missing: dependency.to_string(),
                    });
                }
                Some(Feature::Sketch(_)) => {}
                Some(other) => {
                    return Err(Error::Structural(format!(
                        "Feature '{}' extrudes '{}', which is a {} feature, not a sketch",
                        feature.name(),
                        other.name(),
                        other.feature_type()
                    )));
                }
            }
        }
        debug!("Added {} feature '{}' ({})", feature.feature_type(), feature.name(), id);
        self.features.push(feature);
        Ok(id)
    }

    /// Look up a feature by id
    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.iter().find(|f| f.id() == id)
    }

    /// Mutable access to a sketch feature's sketch
    pub fn sketch_mut(&mut self, id: FeatureId) -> Option<&mut Sketch> {
        self.features.iter_mut().find_map(|f| match f {
            Feature::Sketch(s) if s.id == id => Some(&mut s.sketch),
            _ => None,
        })
    }

    /// Features in history order
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Sketch features in history order
    pub fn sketches(&self) -> impl Iterator<Item = &SketchFeature> {
        self.features.iter().filter_map(|f| match f {
            Feature::Sketch(s) => Some(s),
            Feature::Extrude(_) => None,
        })
    }

    /// Extrude features in history order
    pub fn extrudes(&self) -> impl Iterator<Item = &Extrude> {
        self.features.iter().filter_map(|f| match f {
            Feature::Extrude(e) => Some(e),
            Feature::Sketch(_) => None,
        })
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the container has no features
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// A free-form name/value pair stored with a part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    /// Name of the entry
    pub name: String,
    /// Value of the entry
    pub value: String,
}

impl MetadataEntry {
    /// Create a metadata entry
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The unit translated to and from external documents
#[derive(Debug, Clone, PartialEq)]
pub struct PartFile {
    /// Name of the part
    pub name: String,
    /// Preferred display unit; geometry is always stored in millimeters
    pub unit: LengthUnit,
    /// File-level metadata in document order
    pub metadata: Vec<MetadataEntry>,
    /// The feature history
    pub body: FeatureContainer,
}

impl PartFile {
    /// Create an empty part
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            body: FeatureContainer::new(name.clone()),
            name,
            unit: LengthUnit::Millimeter,
            metadata: Vec::new(),
        }
    }

    /// Value of the first metadata entry named `name`
    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        self.metadata.iter().find(|m| m.name == name).map(|m| m.value.as_str())
    }

    /// Append a metadata entry
    pub fn add_metadata(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.metadata.push(MetadataEntry::new(name, value));
    }
}
