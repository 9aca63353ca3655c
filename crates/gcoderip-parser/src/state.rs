//! Modal state
//!
//! Tracks the modal groups that change how motion words are read. Codes are
//! stored as their G number (`17` for G17, `91` for G91.1 in the arc
//! distance group) so the state reads like the program that set it.

use gcoderip_core::{ArcDirection, LinearUnit, Plane};
use serde::{Deserialize, Serialize};

/// Interpreter state that persists between lines
///
/// Tracks the modal groups the parser needs to turn words into geometry:
/// - Motion group (G00, G01, G02, G03)
/// - Plane selection group (G17, G18, G19)
/// - Distance mode group (G90, G91)
/// - Arc center distance mode (G90.1, G91.1)
/// - Units group (G20, G21)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModalState {
    /// Motion mode - Group 1 (G00, G01, G02, G03)
    pub motion_mode: u8,

    /// Plane selection - Group 2 (G17=XY, G18=ZX, G19=YZ)
    pub plane_mode: u8,

    /// Distance mode - Group 3 (G90=absolute, G91=incremental)
    pub distance_mode: u8,

    /// Arc center distance mode (90 for G90.1, 91 for G91.1)
    pub arc_distance_mode: u8,

    /// Units mode - Group 6 (G20=inches, G21=millimeters)
    pub units_mode: u8,

    /// Current feed rate, in the working unit
    pub feed_rate: f64,
}

impl Default for ModalState {
    fn default() -> Self {
        Self {
            motion_mode: 0,        // G00 (rapid)
            plane_mode: 17,        // G17 (XY plane)
            distance_mode: 90,     // G90 (absolute)
            arc_distance_mode: 91, // G91.1 (centers relative to start)
            units_mode: 20,        // G20 (inches)
            feed_rate: 0.0,
        }
    }
}

impl ModalState {
    /// State for a program read in `unit` until it says otherwise
    pub fn new(unit: LinearUnit) -> Self {
        Self {
            units_mode: units_code(unit),
            ..Self::default()
        }
    }

    /// Set motion mode (G00, G01, G02, G03)
    pub fn set_motion_mode(&mut self, mode: u8) -> Result<(), String> {
        match mode {
            0..=3 => {
                self.motion_mode = mode;
                Ok(())
            }
            _ => Err(format!("Invalid motion mode: {}", mode)),
        }
    }

    /// Set plane mode (G17, G18, G19)
    pub fn set_plane_mode(&mut self, mode: u8) -> Result<(), String> {
        match mode {
            17..=19 => {
                self.plane_mode = mode;
                Ok(())
            }
            _ => Err(format!("Invalid plane mode: {}", mode)),
        }
    }

    /// Set distance mode (G90, G91)
    pub fn set_distance_mode(&mut self, mode: u8) -> Result<(), String> {
        match mode {
            90 | 91 => {
                self.distance_mode = mode;
                Ok(())
            }
            _ => Err(format!("Invalid distance mode: {}", mode)),
        }
    }

    /// Set arc center distance mode (90 for G90.1, 91 for G91.1)
    pub fn set_arc_distance_mode(&mut self, mode: u8) -> Result<(), String> {
        match mode {
            90 | 91 => {
                self.arc_distance_mode = mode;
                Ok(())
            }
            _ => Err(format!("Invalid arc distance mode: {}", mode)),
        }
    }

    /// Set units mode (G20 for inches, G21 for mm)
    pub fn set_units_mode(&mut self, mode: u8) -> Result<(), String> {
        match mode {
            20 | 21 => {
                self.units_mode = mode;
                Ok(())
            }
            _ => Err(format!("Invalid units mode: {}", mode)),
        }
    }

    /// Set feed rate value
    pub fn set_feed_rate(&mut self, rate: f64) -> Result<(), String> {
        if rate < 0.0 {
            return Err("Feed rate cannot be negative".to_string());
        }
        self.feed_rate = rate;
        Ok(())
    }

    pub fn plane(&self) -> Plane {
        match self.plane_mode {
            18 => Plane::Zx,
            19 => Plane::Yz,
            _ => Plane::Xy,
        }
    }

    pub fn units(&self) -> LinearUnit {
        if self.units_mode == 21 {
            LinearUnit::Millimetre
        } else {
            LinearUnit::Inch
        }
    }

    pub fn is_incremental(&self) -> bool {
        self.distance_mode == 91
    }

    pub fn arc_centers_incremental(&self) -> bool {
        self.arc_distance_mode == 91
    }

    /// Arc direction of the motion mode, `None` for G0/G1
    pub fn arc_direction(&self) -> Option<ArcDirection> {
        match self.motion_mode {
            2 => Some(ArcDirection::Cw),
            3 => Some(ArcDirection::Ccw),
            _ => None,
        }
    }

    /// Get a human-readable description of the current motion mode
    pub fn motion_mode_description(&self) -> &'static str {
        match self.motion_mode {
            0 => "Rapid positioning (G00)",
            1 => "Linear interpolation (G01)",
            2 => "Clockwise arc (G02)",
            3 => "Counter-clockwise arc (G03)",
            _ => "Unknown motion mode",
        }
    }
}

fn units_code(unit: LinearUnit) -> u8 {
    match unit {
        LinearUnit::Inch => 20,
        LinearUnit::Millimetre => 21,
    }
}
