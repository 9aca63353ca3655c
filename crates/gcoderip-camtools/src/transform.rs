//! Scale, rotate and translate
//!
//! Both operations return a new program. The bounding box returned by
//! [`scale_rotate`] is built from cutting moves only; rapids to and from
//! clearance positions do not describe the workpiece.

use serde::{Deserialize, Serialize};

use crate::arc_expander::ArcExpander;
use gcoderip_core::{BoundingBox, Point3, Segment, ZERO};

/// Where the program origin is placed relative to its bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// Keep the program's own origin
    Default,
    /// Keep the origin; used when arcs are centered on it
    ArcCenter,
    TopLeft,
    TopCenter,
    TopRight,
    MidLeft,
    MidCenter,
    MidRight,
    BotLeft,
    BotCenter,
    BotRight,
}

impl Default for Origin {
    fn default() -> Self {
        Self::Default
    }
}

impl Origin {
    /// The `(dx, dy)` to pass to [`translate`] so this anchor becomes `(0, 0)`
    pub fn offset(self, bbox: &BoundingBox) -> (f64, f64) {
        if bbox.is_empty() {
            return (0.0, 0.0);
        }
        let mid_x = (bbox.min_x + bbox.max_x) / 2.0;
        let mid_y = (bbox.min_y + bbox.max_y) / 2.0;
        match self {
            Self::Default | Self::ArcCenter => (0.0, 0.0),
            Self::TopLeft => (bbox.min_x, bbox.max_y),
            Self::TopCenter => (mid_x, bbox.max_y),
            Self::TopRight => (bbox.max_x, bbox.max_y),
            Self::MidLeft => (bbox.min_x, mid_y),
            Self::MidCenter => (mid_x, mid_y),
            Self::MidRight => (bbox.max_x, mid_y),
            Self::BotLeft => (bbox.min_x, bbox.min_y),
            Self::BotCenter => (mid_x, bbox.min_y),
            Self::BotRight => (bbox.max_x, bbox.min_y),
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Default => "Default",
            Self::ArcCenter => "Arc-Center",
            Self::TopLeft => "Top-Left",
            Self::TopCenter => "Top-Center",
            Self::TopRight => "Top-Right",
            Self::MidLeft => "Mid-Left",
            Self::MidCenter => "Mid-Center",
            Self::MidRight => "Mid-Right",
            Self::BotLeft => "Bot-Left",
            Self::BotCenter => "Bot-Center",
            Self::BotRight => "Bot-Right",
        };
        write!(f, "{}", name)
    }
}

/// Bounding box of the cutting moves of a program
pub fn cut_bounds(segments: &[Segment]) -> BoundingBox {
    let mut bbox = BoundingBox::new();
    for segment in segments {
        match segment {
            Segment::Linear { from, to, .. } => {
                bbox.include(from);
                bbox.include(to);
            }
            Segment::Arc {
                from,
                to,
                center,
                dir,
                ..
            } => bbox.include_arc(from, to, center, *dir),
            _ => {}
        }
    }
    bbox
}

/// Scale each axis and the feed, then rotate X/Y about the origin
///
/// A mirroring scale (`sx * sy < 0`) reverses arc direction. Unequal X and
/// Y scales turn circles into ellipses, so arcs are linearized first.
pub fn scale_rotate(
    segments: &[Segment],
    sx: f64,
    sy: f64,
    sz: f64,
    sf: f64,
    angle_deg: f64,
) -> (Vec<Segment>, BoundingBox) {
    let scale = [sx, sy, sz];
    let point = |p: &Point3| p.map(|axis, v| v * scale[axis]).rotated_xy(angle_deg);
    let mirrored = sx * sy < 0.0;
    let uniform = (sx.abs() - sy.abs()).abs() < ZERO;
    let expander = ArcExpander::default();

    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            Segment::Rapid { .. } => out.push(segment.map_points(point)),
            Segment::Linear { from, to, feed } => out.push(Segment::Linear {
                from: point(from),
                to: point(to),
                feed: feed * sf,
            }),
            Segment::Arc {
                from,
                to,
                center,
                feed,
                dir,
            } if uniform => out.push(Segment::Arc {
                from: point(from),
                to: point(to),
                center: point(center),
                feed: feed * sf,
                dir: if mirrored { dir.reversed() } else { *dir },
            }),
            Segment::Arc { .. } => {
                for line in expander.expand(segment) {
                    if let Segment::Linear { from, to, feed } = line {
                        out.push(Segment::Linear {
                            from: point(&from),
                            to: point(&to),
                            feed: feed * sf,
                        });
                    }
                }
            }
            other => out.push(other.clone()),
        }
    }

    let bbox = cut_bounds(&out);
    tracing::debug!(
        segments = out.len(),
        min_x = bbox.min_x,
        max_x = bbox.max_x,
        min_y = bbox.min_y,
        max_y = bbox.max_y,
        "Scaled and rotated program"
    );
    (out, bbox)
}

/// Subtract an offset from every coordinate
pub fn translate(segments: &[Segment], dx: f64, dy: f64, dz: f64) -> Vec<Segment> {
    if dx == 0.0 && dy == 0.0 && dz == 0.0 {
        return segments.to_vec();
    }
    let offset = [dx, dy, dz];
    segments
        .iter()
        .map(|s| s.map_points(|p| p.map(|axis, v| v - offset[axis])))
        .collect()
}
