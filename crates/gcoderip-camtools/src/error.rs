//! Error types for the CAM tools crate.
//!
//! Geometry over well-formed segments never fails; these errors cover
//! parameter validation and probe data input.

use std::io;
use thiserror::Error;

/// Errors that can occur during CAM tool operations.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// Invalid parameters were provided to a CAM tool.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// A parameter validation error occurred.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// A probing error occurred.
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),
}

/// Errors related to CAM tool parameter validation.
#[derive(Error, Debug)]
pub enum ParameterError {
    /// A parameter value is out of the valid range.
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A parameter value is invalid.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Errors related to probe grids and probe data files.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// A probe data row could not be read.
    #[error("Malformed probe data at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    /// The probe data file held no points.
    #[error("No probe data points found")]
    NoProbeData,

    /// The grid dimensions or spacing are unusable.
    #[error("Invalid probe grid: {0}")]
    InvalidGrid(String),
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;

/// Result type alias for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cam_tool_error_display() {
        let err = CamToolError::InvalidParameters("stock radius must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid parameters: stock radius must be positive"
        );
    }

    #[test]
    fn test_parameter_error_display() {
        let err = ParameterError::OutOfRange {
            name: "nx".to_string(),
            value: 1.0,
            min: 2.0,
            max: 1000.0,
        };
        assert_eq!(
            err.to_string(),
            "Parameter 'nx' out of range: 1 (valid: 2..1000)"
        );
    }

    #[test]
    fn test_probe_error_display() {
        let err = ProbeError::MalformedRow {
            line: 7,
            reason: "expected 3 values".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed probe data at line 7: expected 3 values"
        );
        assert_eq!(ProbeError::NoProbeData.to_string(), "No probe data points found");
    }

    #[test]
    fn test_error_conversion() {
        let cam_err: CamToolError = ProbeError::NoProbeData.into();
        assert!(matches!(cam_err, CamToolError::Probe(_)));

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let cam_err: CamToolError = io_err.into();
        assert!(matches!(cam_err, CamToolError::IoError(_)));
    }
}
