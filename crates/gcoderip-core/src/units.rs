//! Program units
//!
//! A pipeline run works in one linear unit. G20/G21 words in the input are
//! converted into that unit, and the linearization step and coincidence
//! tolerance travel with it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimetres per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Linear unit of a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinearUnit {
    /// Inches (G20)
    Inch,
    /// Millimetres (G21)
    Millimetre,
}

impl Default for LinearUnit {
    fn default() -> Self {
        Self::Inch
    }
}

impl LinearUnit {
    /// Factor that converts a length in `self` into `target`
    pub fn factor_to(self, target: LinearUnit) -> f64 {
        match (self, target) {
            (Self::Inch, Self::Millimetre) => MM_PER_INCH,
            (Self::Millimetre, Self::Inch) => 1.0 / MM_PER_INCH,
            _ => 1.0,
        }
    }

    /// The G-code word selecting this unit
    pub fn gcode(self) -> &'static str {
        match self {
            Self::Inch => "G20",
            Self::Millimetre => "G21",
        }
    }

    /// Default coincident-point tolerance for this unit
    pub fn default_accuracy(self) -> f64 {
        match self {
            Self::Inch => 0.001,
            Self::Millimetre => 0.025,
        }
    }
}

impl fmt::Display for LinearUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inch => write!(f, "in"),
            Self::Millimetre => write!(f, "mm"),
        }
    }
}

impl FromStr for LinearUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in" | "inch" | "inches" | "g20" => Ok(Self::Inch),
            "mm" | "millimetre" | "millimeter" | "g21" => Ok(Self::Millimetre),
            _ => Err(format!("Unknown linear unit: {}", s)),
        }
    }
}

/// Units and tolerances shared by every stage of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramUnits {
    /// Working linear unit
    pub linear_unit: LinearUnit,
    /// Arc linearization step in degrees
    pub arc_angle_step: f64,
    /// Length below which two points are considered coincident
    pub accuracy: f64,
}

impl ProgramUnits {
    /// Units with the default step and the unit's default accuracy
    pub fn new(linear_unit: LinearUnit) -> Self {
        Self {
            linear_unit,
            arc_angle_step: 10.0,
            accuracy: linear_unit.default_accuracy(),
        }
    }

    /// Override the linearization step
    pub fn with_arc_angle_step(mut self, degrees: f64) -> Self {
        self.arc_angle_step = degrees;
        self
    }

    /// Override the coincidence tolerance
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }
}

impl Default for ProgramUnits {
    fn default() -> Self {
        Self::new(LinearUnit::Inch)
    }
}
