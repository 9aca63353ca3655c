//! # GCodeRip Settings
//!
//! Job configuration: which operation runs, its parameters and how the
//! result is written. Loaded from TOML or JSON and validated before use.

pub mod config;
pub mod error;

pub use config::{Config, Operation, ProbeSettings, TransformSettings, MAX_DECIMALS};
pub use error::{SettingsError, SettingsResult};
