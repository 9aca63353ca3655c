//! Job configuration
//!
//! A [`Config`] describes one run of the pipeline: the working units, how
//! the input is parsed, the transform applied to it, which operation
//! follows and how the result is written. Every section has defaults so a
//! file only needs the values it changes.

use crate::error::{SettingsError, SettingsResult};
use gcoderip_camtools::{
    CompensationOptions, Origin, ProbeOptions, StockRoundingParameters, WrapOptions,
};
use gcoderip_core::ProgramUnits;
use gcoderip_generator::GenConfig;
use gcoderip_parser::ParseOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Largest number of decimal places a word may be written with
pub const MAX_DECIMALS: usize = 10;

/// Operation applied after scaling, rotation and origin placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Write the transformed program
    #[default]
    None,
    /// Cut the program in two along a line
    Split,
    /// Wrap a linear axis around the rotary axis
    Wrap,
    /// Build a probing program, and compensate when probe data is given
    Probe,
    /// Generate a stock rounding program; the input is not used
    Round,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Split => write!(f, "split"),
            Self::Wrap => write!(f, "wrap"),
            Self::Probe => write!(f, "probe"),
            Self::Round => write!(f, "round"),
        }
    }
}

/// Scale, rotation, origin placement and split line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSettings {
    /// Scale factors in percent
    pub scale_x: f64,
    pub scale_y: f64,
    pub scale_z: f64,
    pub scale_feed: f64,
    /// Rotation about the origin in degrees, counter-clockwise
    pub rotation: f64,
    pub origin: Origin,
    /// Point the split line passes through
    pub split_pivot: [f64; 2],
    /// Direction of the split line in degrees from +X
    pub split_angle: f64,
    /// Turn the left half by 180 degrees after splitting
    pub rotate_left: bool,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            scale_x: 100.0,
            scale_y: 100.0,
            scale_z: 100.0,
            scale_feed: 100.0,
            rotation: 0.0,
            origin: Origin::Default,
            split_pivot: [0.0, 0.0],
            split_angle: 90.0,
            rotate_left: false,
        }
    }
}

impl TransformSettings {
    /// Scale factors as fractions: `(x, y, z, feed)`
    pub fn scale_factors(&self) -> (f64, f64, f64, f64) {
        (
            self.scale_x / 100.0,
            self.scale_y / 100.0,
            self.scale_z / 100.0,
            self.scale_feed / 100.0,
        )
    }

    /// Whether any scale or rotation changes the geometry
    pub fn is_identity(&self) -> bool {
        self.scale_factors() == (1.0, 1.0, 1.0, 1.0) && self.rotation == 0.0
    }
}

/// Probe grid size, probing program options and compensation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Grid nodes along X
    pub nx: usize,
    /// Grid nodes along Y
    pub ny: usize,
    #[serde(flatten)]
    pub options: ProbeOptions,
    #[serde(flatten)]
    pub compensation: CompensationOptions,
    /// Probe data to compensate against; without it only the probing
    /// program is written
    pub data_file: Option<PathBuf>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            nx: 5,
            ny: 5,
            options: ProbeOptions::default(),
            compensation: CompensationOptions::default(),
            data_file: None,
        }
    }
}

/// Everything one pipeline run needs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub operation: Operation,
    pub units: ProgramUnits,
    pub parse: ParseOptions,
    pub transform: TransformSettings,
    pub wrap: WrapOptions,
    pub probe: ProbeSettings,
    pub round: StockRoundingParameters,
    pub output: GenConfig,
}

impl Config {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a configuration file
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let config = match extension.as_deref() {
            Some("toml") => Self::from_toml_str(&content)?,
            Some("json") => Self::from_json_str(&content)?,
            _ => {
                return Err(SettingsError::LoadError(format!(
                    "unsupported config format: {}",
                    path.display()
                )))
            }
        };

        tracing::debug!(
            path = %path.display(),
            operation = %config.operation,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate a TOML configuration
    pub fn from_toml_str(text: &str) -> SettingsResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(text: &str) -> SettingsResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the operations cannot work with
    ///
    /// Sections belonging to an operation that is not selected are only
    /// checked where the pipeline still reads them.
    pub fn validate(&self) -> SettingsResult<()> {
        if self.units.arc_angle_step <= 0.0 {
            return Err(SettingsError::invalid(
                "units.arc_angle_step",
                "must be greater than zero",
            ));
        }
        if self.units.accuracy <= 0.0 {
            return Err(SettingsError::invalid(
                "units.accuracy",
                "must be greater than zero",
            ));
        }

        let t = &self.transform;
        for (key, value) in [
            ("transform.scale_x", t.scale_x),
            ("transform.scale_y", t.scale_y),
            ("transform.scale_z", t.scale_z),
            ("transform.scale_feed", t.scale_feed),
        ] {
            if value == 0.0 || !value.is_finite() {
                return Err(SettingsError::invalid(key, "must be a non-zero number"));
            }
        }
        if !t.rotation.is_finite() || !t.split_angle.is_finite() {
            return Err(SettingsError::invalid(
                "transform.rotation",
                "angles must be finite",
            ));
        }

        match self.operation {
            Operation::Wrap => {
                if self.wrap.stock_radius <= 0.0 {
                    return Err(SettingsError::invalid(
                        "wrap.stock_radius",
                        "must be greater than zero",
                    ));
                }
                if self.wrap.arc_angle_step <= 0.0 {
                    return Err(SettingsError::invalid(
                        "wrap.arc_angle_step",
                        "must be greater than zero",
                    ));
                }
            }
            Operation::Probe => {
                if self.probe.nx < 2 || self.probe.ny < 2 {
                    return Err(SettingsError::invalid(
                        "probe.nx",
                        format!(
                            "grid needs at least 2x2 nodes, got {}x{}",
                            self.probe.nx, self.probe.ny
                        ),
                    ));
                }
                if self.probe.compensation.interp_step <= 0.0 {
                    return Err(SettingsError::invalid(
                        "probe.interp_step",
                        "must be greater than zero",
                    ));
                }
            }
            Operation::Round => {
                if self.round.stock_radius <= 0.0 {
                    return Err(SettingsError::invalid(
                        "round.stock_radius",
                        "must be greater than zero",
                    ));
                }
            }
            Operation::None | Operation::Split => {}
        }

        let out = &self.output;
        for (key, value) in [
            ("output.decimals_linear", out.decimals_linear),
            ("output.decimals_rotary", out.decimals_rotary),
            ("output.decimals_feed", out.decimals_feed),
        ] {
            if value > MAX_DECIMALS {
                return Err(SettingsError::invalid(
                    key,
                    format!("at most {} decimal places", MAX_DECIMALS),
                ));
            }
        }
        if out.accuracy <= 0.0 {
            return Err(SettingsError::invalid(
                "output.accuracy",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Generator settings with the working units applied
    pub fn gen_config(&self) -> GenConfig {
        GenConfig {
            units: self.units.linear_unit,
            ..self.output.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcoderip_camtools::ProbeDialect;
    use gcoderip_core::LinearUnit;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.operation, Operation::None);
        assert_eq!(config.units.linear_unit, LinearUnit::Inch);
        assert_eq!(config.output.z_safe, 0.5);
        assert!(config.transform.is_identity());
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml_str(
            r#"
            operation = "wrap"

            [transform]
            scale_x = 50
            origin = "bot-left"

            [wrap]
            stock_radius = 0.75
            axis = "y"
            "#,
        )
        .unwrap();
        assert_eq!(config.operation, Operation::Wrap);
        assert_eq!(config.transform.scale_factors(), (0.5, 1.0, 1.0, 1.0));
        assert_eq!(config.transform.origin, Origin::BotLeft);
        assert_eq!(config.wrap.stock_radius, 0.75);
        assert_eq!(config.wrap.arc_angle_step, 10.0);
    }

    #[test]
    fn test_probe_section_is_flat() {
        let config = Config::from_toml_str(
            r#"
            operation = "probe"

            [probe]
            nx = 3
            ny = 4
            dialect = "mach3"
            probe_feed = 2.5
            interp_step = 0.05
            rapid_clearance = 0.1
            "#,
        )
        .unwrap();
        assert_eq!((config.probe.nx, config.probe.ny), (3, 4));
        assert_eq!(config.probe.options.dialect, ProbeDialect::Mach3);
        assert_eq!(config.probe.options.probe_feed, 2.5);
        assert_eq!(config.probe.compensation.interp_step, 0.05);
        assert_eq!(config.probe.compensation.rapid_clearance, Some(0.1));
        assert!(config.probe.data_file.is_none());
    }

    #[test]
    fn test_json_config() {
        let config = Config::from_json_str(
            r#"{"units": {"linear_unit": "millimetre"}, "output": {"decimals_linear": 3}}"#,
        );
        let config = config.unwrap();
        assert_eq!(config.units.linear_unit, LinearUnit::Millimetre);
        assert_eq!(config.output.decimals_linear, 3);
        assert_eq!(config.gen_config().units, LinearUnit::Millimetre);
    }

    #[test]
    fn test_zero_scale_rejected() {
        let err = Config::from_toml_str("[transform]\nscale_y = 0").unwrap_err();
        match err {
            SettingsError::InvalidSetting { key, .. } => assert_eq!(key, "transform.scale_y"),
            other => panic!("expected InvalidSetting, got {:?}", other),
        }
    }

    #[test]
    fn test_wrap_radius_checked_only_for_wrap() {
        let mut config = Config::new();
        config.wrap.stock_radius = 0.0;
        assert!(config.validate().is_ok());
        config.operation = Operation::Wrap;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_probe_grid_too_small() {
        let mut config = Config::new();
        config.operation = Operation::Probe;
        config.probe.nx = 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("2x2"));
    }

    #[test]
    fn test_too_many_decimals() {
        let mut config = Config::new();
        config.output.decimals_rotary = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_arc_step() {
        let mut config = Config::new();
        config.units.arc_angle_step = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Split.to_string(), "split");
        assert_eq!(Operation::default().to_string(), "none");
    }
}
