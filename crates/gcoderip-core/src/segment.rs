//! Parsed program segments
//!
//! A program is an ordered `Vec<Segment>`. Motion segments carry both
//! endpoints so transforms can work on them independently.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::Point3;

/// Arc travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArcDirection {
    /// Clockwise (G2)
    Cw,
    /// Counter-clockwise (G3)
    Ccw,
}

impl ArcDirection {
    /// The motion word for this direction
    pub fn gcode(self) -> &'static str {
        match self {
            Self::Cw => "G2",
            Self::Ccw => "G3",
        }
    }

    /// The opposite direction
    pub fn reversed(self) -> Self {
        match self {
            Self::Cw => Self::Ccw,
            Self::Ccw => Self::Cw,
        }
    }
}

impl fmt::Display for ArcDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cw => write!(f, "CW"),
            Self::Ccw => write!(f, "CCW"),
        }
    }
}

/// One element of a parsed program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    /// G0 move
    Rapid { from: Point3, to: Point3 },
    /// G1 move
    Linear { from: Point3, to: Point3, feed: f64 },
    /// G2/G3 move in the XY plane; `center` is absolute
    Arc {
        from: Point3,
        to: Point3,
        center: Point3,
        feed: f64,
        dir: ArcDirection,
    },
    /// Comment text without delimiters
    Comment(String),
    /// Any other code, emitted verbatim
    Passthrough(String),
    /// M2 or M30
    EndOfProgram,
}

impl Segment {
    /// Check if this segment moves the tool
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            Segment::Rapid { .. } | Segment::Linear { .. } | Segment::Arc { .. }
        )
    }

    /// Check if this segment removes material
    pub fn is_cut(&self) -> bool {
        matches!(self, Segment::Linear { .. } | Segment::Arc { .. })
    }

    /// Start point of a motion segment
    pub fn start(&self) -> Option<&Point3> {
        match self {
            Segment::Rapid { from, .. }
            | Segment::Linear { from, .. }
            | Segment::Arc { from, .. } => Some(from),
            _ => None,
        }
    }

    /// End point of a motion segment
    pub fn end(&self) -> Option<&Point3> {
        match self {
            Segment::Rapid { to, .. } | Segment::Linear { to, .. } | Segment::Arc { to, .. } => {
                Some(to)
            }
            _ => None,
        }
    }

    /// Feed rate of a cutting segment
    pub fn feed(&self) -> Option<f64> {
        match self {
            Segment::Linear { feed, .. } | Segment::Arc { feed, .. } => Some(*feed),
            _ => None,
        }
    }

    /// Apply `f` to every point the segment carries
    pub fn map_points(&self, f: impl Fn(&Point3) -> Point3) -> Segment {
        match self {
            Segment::Rapid { from, to } => Segment::Rapid {
                from: f(from),
                to: f(to),
            },
            Segment::Linear { from, to, feed } => Segment::Linear {
                from: f(from),
                to: f(to),
                feed: *feed,
            },
            Segment::Arc {
                from,
                to,
                center,
                feed,
                dir,
            } => Segment::Arc {
                from: f(from),
                to: f(to),
                center: f(center),
                feed: *feed,
                dir: *dir,
            },
            other => other.clone(),
        }
    }
}
