//! Units and quantities carried by dimensional constraints

use std::fmt;

use crate::error::{Error, Result};
use crate::kernel::PI;

/// Unit of a length value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LengthUnit {
    /// Millimeters, the canonical model unit
    #[default]
    Millimeter,
    /// Centimeters
    Centimeter,
    /// Meters
    Meter,
    /// Micrometers
    Micrometer,
    /// Inches
    Inch,
    /// Feet
    Foot,
}

impl LengthUnit {
    /// All units, in declaration order
    pub const ALL: [LengthUnit; 6] = [
        LengthUnit::Millimeter,
        LengthUnit::Centimeter,
        LengthUnit::Meter,
        LengthUnit::Micrometer,
        LengthUnit::Inch,
        LengthUnit::Foot,
    ];

    /// Number of millimeters in one of this unit
    pub fn to_millimeters(&self) -> f64 {
        match self {
            LengthUnit::Millimeter => 1.0,
            LengthUnit::Centimeter => 10.0,
            LengthUnit::Meter => 1000.0,
            LengthUnit::Micrometer => 0.001,
            LengthUnit::Inch => 25.4,
            LengthUnit::Foot => 304.8,
        }
    }

    /// Short symbol used in documents
    pub fn as_str(&self) -> &'static str {
        match self {
            LengthUnit::Millimeter => "mm",
            LengthUnit::Centimeter => "cm",
            LengthUnit::Meter => "m",
            LengthUnit::Micrometer => "um",
            LengthUnit::Inch => "in",
            LengthUnit::Foot => "ft",
        }
    }

    /// Parse a symbol produced by [`LengthUnit::as_str`]
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|unit| unit.as_str() == name)
            .ok_or_else(|| Error::parse_error_with_context("length unit", name, "mm, cm, m, um, in or ft"))
    }
}

/// Unit of an angle value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AngleUnit {
    /// Radians, the canonical model unit
    #[default]
    Radian,
    /// Degrees
    Degree,
}

impl AngleUnit {
    /// Number of radians in one of this unit
    pub fn to_radians(&self) -> f64 {
        match self {
            AngleUnit::Radian => 1.0,
            AngleUnit::Degree => PI / 180.0,
        }
    }

    /// Short symbol used in documents
    pub fn as_str(&self) -> &'static str {
        match self {
            AngleUnit::Radian => "rad",
            AngleUnit::Degree => "deg",
        }
    }

    /// Parse a symbol produced by [`AngleUnit::as_str`]
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "rad" => Ok(AngleUnit::Radian),
            "deg" => Ok(AngleUnit::Degree),
            _ => Err(Error::parse_error_with_context("angle unit", name, "rad or deg")),
        }
    }
}

/// A length with its unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    /// Magnitude in `unit`
    pub value: f64,
    /// Unit of `value`
    pub unit: LengthUnit,
}

impl Length {
    /// Create a length
    pub fn new(value: f64, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    /// The length in millimeters
    pub fn millimeters(&self) -> f64 {
        self.value * self.unit.to_millimeters()
    }
}

/// An angle with its unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angle {
    /// Magnitude in `unit`
    pub value: f64,
    /// Unit of `value`
    pub unit: AngleUnit,
}

impl Angle {
    /// Create an angle
    pub fn new(value: f64, unit: AngleUnit) -> Self {
        Self { value, unit }
    }

    /// The angle in radians
    pub fn radians(&self) -> f64 {
        self.value * self.unit.to_radians()
    }
}

/// Value of a dimensional constraint
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quantity {
    /// A distance, radius or diameter
    Length(Length),
    /// An angle
    Angle(Angle),
}

impl Quantity {
    /// A length in millimeters
    pub fn mm(value: f64) -> Self {
        Quantity::Length(Length::new(value, LengthUnit::Millimeter))
    }

    /// An angle in degrees
    pub fn degrees(value: f64) -> Self {
        Quantity::Angle(Angle::new(value, AngleUnit::Degree))
    }

    /// An angle in radians
    pub fn radians(value: f64) -> Self {
        Quantity::Angle(Angle::new(value, AngleUnit::Radian))
    }

    /// Magnitude as written, in its own unit
    pub fn value(&self) -> f64 {
        match self {
            Quantity::Length(l) => l.value,
            Quantity::Angle(a) => a.value,
        }
    }

    /// Magnitude in canonical units (millimeters or radians)
    pub fn canonical(&self) -> f64 {
        match self {
            Quantity::Length(l) => l.millimeters(),
            Quantity::Angle(a) => a.radians(),
        }
    }

    /// Symbol of the unit
    pub fn unit_str(&self) -> &'static str {
        match self {
            Quantity::Length(l) => l.unit.as_str(),
            Quantity::Angle(a) => a.unit.as_str(),
        }
    }

    /// Rebuild a quantity from a value and a unit symbol
    pub fn parse(value: f64, unit: &str) -> Result<Self> {
        if let Ok(length) = LengthUnit::from_name(unit) {
            return Ok(Quantity::Length(Length::new(value, length)));
        }
        AngleUnit::from_name(unit)
            .map(|angle| Quantity::Angle(Angle::new(value, angle)))
            .map_err(|_| Error::parse_error_with_context("unit", unit, "a length or angle unit"))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value(), self.unit_str())
    }
}
