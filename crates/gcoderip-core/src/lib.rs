//! # GCodeRip Core
//!
//! Shared types for the GCodeRip crates: coordinates that may be
//! unresolved, program segments, bounding boxes, program units and
//! progress reporting.

pub mod geometry;
pub mod progress;
pub mod segment;
pub mod units;

pub use geometry::{
    angle_deg, arc_sweep, lerp, rotate_xy, BoundingBox, Coord, Plane, Point3, ZERO,
};
pub use progress::{ProgressCallback, ProgressReporter};
pub use segment::{ArcDirection, Segment};
pub use units::{LinearUnit, ProgramUnits, MM_PER_INCH};
