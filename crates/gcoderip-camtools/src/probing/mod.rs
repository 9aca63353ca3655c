//! Surface probing
//!
//! Builds probing programs for a cut path, reads probe data back and
//! applies bilinear height compensation from the measured grid.

pub mod compensation;
pub mod data_file;
pub mod grid;
pub mod program;

pub use compensation::{apply_compensation, CompensationOptions};
pub use data_file::{read_probe_data, read_probe_file};
pub use grid::{CellLocation, ProbeGrid};
pub use program::{
    build_probe_program, ProbeDialect, ProbeOptions, ProbePoint, ProbeProgram,
    PROBE_VARIABLE_BASE,
};
