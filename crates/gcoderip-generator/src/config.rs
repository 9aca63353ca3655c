//! Generator configuration

use gcoderip_core::LinearUnit;
use serde::{Deserialize, Serialize};

/// How segments are written back out as G-code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    /// Retract height for generated rapids
    pub z_safe: f64,
    /// Feed used when plunging back to a cut after a generated rapid
    pub plunge_feed: f64,
    /// Decimal places for linear axis words and arc centers
    pub decimals_linear: usize,
    /// Decimal places for rotary axis words (A, B, C)
    pub decimals_rotary: usize,
    /// Decimal places for feed words
    pub decimals_feed: usize,
    /// Write every word on every line instead of only changed ones
    pub write_all_words: bool,
    /// Letters written for the logical X, Y and Z axes
    pub axis_map: [char; 3],
    /// Lines written before the program body
    pub preamble: Vec<String>,
    /// Lines written at the end of the program
    pub postamble: Vec<String>,
    /// Drop comment segments
    pub strip_comments: bool,
    /// Unit selected in the header
    pub units: LinearUnit,
    /// Gap between a cut and the previous position that needs a rapid
    pub accuracy: f64,
    /// Replace parsed rapids with retract, rapid and plunge moves wherever
    /// the cut path is discontinuous
    pub generate_rapids: bool,
    /// Write `#<z_safe>` and `#<plunge_feed>` once and refer to them
    pub use_variables: bool,
    /// Write the modal setup header and axis mapping comments
    pub header: bool,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            z_safe: 0.5,
            plunge_feed: 10.0,
            decimals_linear: 4,
            decimals_rotary: 3,
            decimals_feed: 1,
            write_all_words: false,
            axis_map: ['X', 'Y', 'Z'],
            preamble: Vec::new(),
            postamble: vec!["M2".to_string()],
            strip_comments: false,
            units: LinearUnit::Inch,
            accuracy: 0.001,
            generate_rapids: false,
            use_variables: false,
            header: false,
        }
    }
}

impl GenConfig {
    /// Configuration for a unit with that unit's default accuracy
    pub fn for_units(units: LinearUnit) -> Self {
        Self {
            units,
            accuracy: units.default_accuracy(),
            ..Self::default()
        }
    }

    /// Decimal places for a word letter
    pub fn decimals_for(&self, letter: char) -> usize {
        match letter {
            'A' | 'B' | 'C' => self.decimals_rotary,
            'F' => self.decimals_feed,
            _ => self.decimals_linear,
        }
    }

    /// Whether the logical axes are written under other letters
    pub fn is_remapped(&self) -> bool {
        self.axis_map != ['X', 'Y', 'Z']
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = GenConfig::default();
        assert_eq!(cfg.decimals_for('X'), 4);
        assert_eq!(cfg.decimals_for('A'), 3);
        assert_eq!(cfg.decimals_for('F'), 1);
        assert!(!cfg.is_remapped());
        assert_eq!(cfg.postamble, vec!["M2".to_string()]);
    }

    #[test]
    fn test_for_units() {
        let cfg = GenConfig::for_units(LinearUnit::Millimetre);
        assert_eq!(cfg.accuracy, 0.025);
        assert_eq!(cfg.units, LinearUnit::Millimetre);
    }

    #[test]
    fn test_partial_json() {
        let cfg: GenConfig =
            serde_json::from_str(r#"{"axis_map": ["X", "A", "Z"], "decimals_rotary": 2}"#).unwrap();
        assert!(cfg.is_remapped());
        assert_eq!(cfg.decimals_for('A'), 2);
        assert_eq!(cfg.z_safe, 0.5);
    }
}
