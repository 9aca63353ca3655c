//! # GCodeRip
//!
//! G-code geometry transforms for CNC programs:
//! - Scale, rotate and move the origin of existing programs
//! - Split a program in two along any line
//! - Wrap a linear axis onto a rotary axis
//! - Build probing programs and compensate cuts for a probed surface
//! - Generate stock rounding programs
//!
//! ## Architecture
//!
//! GCodeRip is organized as a workspace with multiple crates:
//!
//! 1. **gcoderip-core** - Coordinates, segments, bounds, units and progress
//! 2. **gcoderip-parser** - Expressions, modal state and the program parser
//! 3. **gcoderip-camtools** - Transforms, split, wrap, probing and stock rounding
//! 4. **gcoderip-generator** - Writing segments back out as G-code
//! 5. **gcoderip-settings** - Job configuration
//! 6. **gcoderip** - Pipeline and binary that integrate all crates

pub mod pipeline;

pub use pipeline::{load_grid, Job, JobOutput, Program, ProgramKind};

pub use gcoderip_camtools::{
    apply_compensation, build_probe_program, cut_bounds, round_stock, scale_rotate,
    split_by_line, translate, wrap_to_rotary, CamToolError, Origin, ProbeGrid, ProbeOptions,
    SplitResult, StockRoundingParameters, WrapOptions,
};
pub use gcoderip_core::{
    BoundingBox, Coord, LinearUnit, Point3, ProgramUnits, ProgressCallback, Segment,
};
pub use gcoderip_generator::{generate, GenConfig};
pub use gcoderip_parser::{parse, ParseError, ParseOptions, ParseOutput, ParseWarning};
pub use gcoderip_settings::{Config, Operation, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
///
/// Logs go to stderr so generated programs can be piped from stdout.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
