//! Height compensation from a probe grid

use serde::{Deserialize, Serialize};

use super::grid::ProbeGrid;
use gcoderip_core::{
    angle_deg, arc_sweep, rotate_xy, ArcDirection, Coord, Point3, Segment, ZERO,
};

/// Parameters for [`apply_compensation`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompensationOptions {
    /// Longest move emitted after subdivision
    pub interp_step: f64,
    /// Height kept above the highest probed point by rapids; `None` keeps
    /// each rapid's own height above it
    pub rapid_clearance: Option<f64>,
}

impl Default for CompensationOptions {
    fn default() -> Self {
        Self {
            interp_step: 0.1,
            rapid_clearance: None,
        }
    }
}

/// Re-walk a program adding the interpolated surface height to every cut
pub fn apply_compensation(
    segments: &[Segment],
    grid: &ProbeGrid,
    options: &CompensationOptions,
) -> Vec<Segment> {
    let step = if options.interp_step > ZERO {
        options.interp_step
    } else {
        CompensationOptions::default().interp_step
    };
    let grid_max = grid.max_height().unwrap_or(0.0);
    let adjust = |p: &Point3| match p.xy() {
        Some((x, y)) => Point3 {
            z: p.z.map(|z| z + grid.interpolate(x, y)),
            ..*p
        },
        None => *p,
    };

    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            Segment::Rapid { from, to } => {
                let raise = |p: &Point3| Point3 {
                    z: p.z.map(|z| z.max(grid_max + options.rapid_clearance.unwrap_or(z))),
                    ..*p
                };
                out.push(Segment::Rapid {
                    from: raise(from),
                    to: raise(to),
                });
            }
            Segment::Linear { from, to, feed } => {
                let length = from.distance(to);
                let pieces = ((length / step).ceil() as usize).max(1);
                let mut start = *from;
                for i in 1..=pieces {
                    let end = if i == pieces {
                        *to
                    } else {
                        from.lerp(to, i as f64 / pieces as f64)
                    };
                    out.push(Segment::Linear {
                        from: adjust(&start),
                        to: adjust(&end),
                        feed: *feed,
                    });
                    start = end;
                }
            }
            Segment::Arc {
                from,
                to,
                center,
                feed,
                dir,
            } => {
                for (a, b) in split_arc(from, to, center, *dir, step) {
                    out.push(Segment::Arc {
                        from: adjust(&a),
                        to: adjust(&b),
                        center: *center,
                        feed: *feed,
                        dir: *dir,
                    });
                }
            }
            other => out.push(other.clone()),
        }
    }
    tracing::debug!(
        input = segments.len(),
        output = out.len(),
        grid_max,
        "Applied probe compensation"
    );
    out
}

/// Endpoints of sub-arcs no longer than `step` along the arc
fn split_arc(
    from: &Point3,
    to: &Point3,
    center: &Point3,
    dir: ArcDirection,
    step: f64,
) -> Vec<(Point3, Point3)> {
    let (Some(s), Some(e), Some(c)) = (from.xy(), to.xy(), center.xy()) else {
        return vec![(*from, *to)];
    };
    let radius = (s.0 - c.0).hypot(s.1 - c.1);
    let sweep = arc_sweep(s, e, c, dir);
    let length = radius * sweep.to_radians();
    let pieces = ((length / step).ceil() as usize).max(1);
    let start_angle = angle_deg(s.0 - c.0, s.1 - c.1);
    let sign = match dir {
        ArcDirection::Ccw => 1.0,
        ArcDirection::Cw => -1.0,
    };

    let mut out = Vec::with_capacity(pieces);
    let mut last = *from;
    for i in 1..=pieces {
        let next = if i == pieces {
            *to
        } else {
            let t = i as f64 / pieces as f64;
            let (dx, dy) = rotate_xy(radius, 0.0, start_angle + sign * sweep * t);
            Point3 {
                x: Coord::Resolved(c.0 + dx),
                y: Coord::Resolved(c.1 + dy),
                z: from.z.lerp(to.z, t),
            }
        };
        out.push((last, next));
        last = next;
    }
    out
}
