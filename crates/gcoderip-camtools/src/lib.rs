//! # GCodeRip CAM Tools
//!
//! Operations over parsed segment sequences. Every operation takes a slice
//! of segments and returns a new sequence; nothing is modified in place.
//!
//! ## Transforms
//!
//! - **Arc Expander**: Arc linearization in any plane
//! - **Transform**: Scale, rotate, translate and origin placement
//! - **Split**: Cut a program in two along an arbitrary line
//! - **Wrap**: Map a linear axis onto a rotary axis
//!
//! ## Generators
//!
//! - **Stock Rounding**: Turn stock round on the rotary axis
//! - **Probing**: Probe programs, probe data files and height compensation

pub mod arc_expander;
pub mod error;
pub mod probing;
pub mod split;
pub mod stock_rounding;
pub mod transform;
pub mod wrap;

pub use arc_expander::{linearize_all, linearize_arc, ArcExpander, ArcExpanderConfig};
pub use error::{CamToolError, CamToolResult, ParameterError, ProbeError, ProbeResult};
pub use probing::{
    apply_compensation, build_probe_program, read_probe_data, read_probe_file,
    CompensationOptions, ProbeDialect, ProbeGrid, ProbeOptions, ProbePoint, ProbeProgram,
};
pub use split::{split_by_line, Side, SplitResult};
pub use stock_rounding::{round_stock, StockRoundingGenerator, StockRoundingParameters};
pub use transform::{cut_bounds, scale_rotate, translate, Origin};
pub use wrap::{wrap_to_rotary, FeedMode, RotaryAxis, WrapAxis, WrapOptions};
