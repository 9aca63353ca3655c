//! Arc Expander
//!
//! Converts arcs into chains of linear segments. Used by the parser for
//! arcs outside the XY plane and by the wrap and split-free paths that
//! cannot carry arcs through.

use gcoderip_core::{
    angle_deg, arc_sweep, lerp, rotate_xy, ArcDirection, Coord, Plane, Point3, Segment, ZERO,
};

/// Arc expansion configuration
#[derive(Debug, Clone)]
pub struct ArcExpanderConfig {
    /// Angular step in degrees
    pub angle_step: f64,
    /// Radius mismatch tolerated before a warning is logged
    pub accuracy: f64,
}

impl Default for ArcExpanderConfig {
    fn default() -> Self {
        Self {
            angle_step: 10.0,
            accuracy: 0.001,
        }
    }
}

/// Converts arc segments to line segments
#[derive(Debug)]
pub struct ArcExpander {
    config: ArcExpanderConfig,
}

impl ArcExpander {
    /// Create a new arc expander
    pub fn new(config: ArcExpanderConfig) -> Self {
        Self { config }
    }

    /// Expand an XY arc segment; other segments are returned unchanged
    pub fn expand(&self, segment: &Segment) -> Vec<Segment> {
        match segment {
            Segment::Arc {
                from,
                to,
                center,
                feed,
                dir,
            } => self.expand_in_plane(from, to, center, *feed, *dir, Plane::Xy),
            other => vec![other.clone()],
        }
    }

    /// Expand an arc lying in `plane`
    ///
    /// `dir` is interpreted in the plane's own orientation: for G18 the
    /// first axis is Z and the second X, for G19 Y then Z.
    pub fn expand_in_plane(
        &self,
        from: &Point3,
        to: &Point3,
        center: &Point3,
        feed: f64,
        dir: ArcDirection,
        plane: Plane,
    ) -> Vec<Segment> {
        let (u, v, w) = plane.axes();
        let planar = |p: &Point3| Some((p.axis(u).value()?, p.axis(v).value()?));
        let (Some(s), Some(e), Some(c)) = (planar(from), planar(to), planar(center)) else {
            // Nothing to walk around; keep the move as a chord
            return vec![Segment::Linear {
                from: *from,
                to: *to,
                feed,
            }];
        };

        let radius = (s.0 - c.0).hypot(s.1 - c.1);
        let end_radius = (e.0 - c.0).hypot(e.1 - c.1);
        if (radius - end_radius).abs() > self.config.accuracy {
            tracing::warn!(
                start_radius = radius,
                end_radius,
                "Arc radius mismatch while linearizing"
            );
        }

        let sweep = arc_sweep(s, e, c, dir);
        let start_angle = angle_deg(s.0 - c.0, s.1 - c.1);
        let sign = match dir {
            ArcDirection::Ccw => 1.0,
            ArcDirection::Cw => -1.0,
        };
        let step = if self.config.angle_step > ZERO {
            self.config.angle_step
        } else {
            ArcExpanderConfig::default().angle_step
        };

        let mut lines = Vec::with_capacity((sweep / step).ceil() as usize + 1);
        let mut last = *from;
        let mut swept = step;
        while swept < sweep - ZERO {
            let (du, dv) = rotate_xy(radius, 0.0, start_angle + sign * swept);
            let mut next = *from;
            *next.axis_mut(u) = Coord::Resolved(c.0 + du);
            *next.axis_mut(v) = Coord::Resolved(c.1 + dv);
            *next.axis_mut(w) = match (from.axis(w), to.axis(w)) {
                (Coord::Resolved(a), Coord::Resolved(b)) => Coord::Resolved(lerp(a, b, swept / sweep)),
                (_, other) => other,
            };
            lines.push(Segment::Linear {
                from: last,
                to: next,
                feed,
            });
            last = next;
            swept += step;
        }
        lines.push(Segment::Linear {
            from: last,
            to: *to,
            feed,
        });
        lines
    }
}

impl Default for ArcExpander {
    fn default() -> Self {
        Self::new(ArcExpanderConfig::default())
    }
}

/// Linearize an XY arc at `angle_step_deg`
///
/// Non-arc segments are returned unchanged.
pub fn linearize_arc(arc: &Segment, angle_step_deg: f64) -> Vec<Segment> {
    ArcExpander::new(ArcExpanderConfig {
        angle_step: angle_step_deg,
        accuracy: f64::INFINITY,
    })
    .expand(arc)
}

/// Linearize every arc in a program
pub fn linearize_all(segments: &[Segment], config: &ArcExpanderConfig) -> Vec<Segment> {
    let expander = ArcExpander::new(config.clone());
    segments.iter().flat_map(|s| expander.expand(s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_circle() -> Segment {
        Segment::Arc {
            from: Point3::new(0.0, 0.0, 0.0),
            to: Point3::new(10.0, 0.0, -1.0),
            center: Point3::new(5.0, 0.0, 0.0),
            feed: 50.0,
            dir: ArcDirection::Cw,
        }
    }

    fn max_deviation(lines: &[Segment], cx: f64, cy: f64, r: f64) -> f64 {
        lines
            .iter()
            .filter_map(|s| match s {
                Segment::Linear { from, to, .. } => {
                    let (x0, y0) = from.xy()?;
                    let (x1, y1) = to.xy()?;
                    let (mx, my) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
                    Some(r - (mx - cx).hypot(my - cy))
                }
                _ => None,
            })
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_half_circle_at_ten_degrees() {
        let lines = linearize_arc(&half_circle(), 10.0);
        assert_eq!(lines.len(), 18);
        for line in &lines {
            let Segment::Linear { to, feed, .. } = line else {
                panic!("expected linear segment");
            };
            assert_eq!(*feed, 50.0);
            let (x, y) = to.xy().unwrap();
            assert!(((x - 5.0).hypot(y) - 5.0).abs() < 1e-9);
            // CW from (0,0) about (5,0) passes over the top
            assert!(y >= -1e-9);
        }
        assert_eq!(lines.last().and_then(|s| s.end()), Some(&Point3::new(10.0, 0.0, -1.0)));
    }

    #[test]
    fn test_z_interpolates_by_swept_fraction() {
        let lines = linearize_arc(&half_circle(), 90.0);
        assert_eq!(lines.len(), 2);
        let mid = lines[0].end().unwrap();
        assert!((mid.z.value().unwrap() + 0.5).abs() < 1e-12);
        assert!((mid.x.value().unwrap() - 5.0).abs() < 1e-9);
        assert!((mid.y.value().unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_last_step_clipped() {
        let lines = linearize_arc(&half_circle(), 40.0);
        // 40, 80, 120, 160 then the clipped 20 degree remainder
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_full_circle() {
        let arc = Segment::Arc {
            from: Point3::new(1.0, 0.0, 0.0),
            to: Point3::new(1.0, 0.0, 0.0),
            center: Point3::new(0.0, 0.0, 0.0),
            feed: 1.0,
            dir: ArcDirection::Ccw,
        };
        assert_eq!(linearize_arc(&arc, 30.0).len(), 12);
    }

    #[test]
    fn test_zx_plane() {
        let expander = ArcExpander::default();
        // G18 quarter arc from Z=1 to X=1 around the origin
        let lines = expander.expand_in_plane(
            &Point3::new(0.0, 2.0, 1.0),
            &Point3::new(1.0, 2.0, 0.0),
            &Point3::new(0.0, 2.0, 0.0),
            10.0,
            ArcDirection::Ccw,
            Plane::Zx,
        );
        assert_eq!(lines.len(), 9);
        for line in &lines {
            let to = line.end().unwrap();
            assert_eq!(to.y, Coord::Resolved(2.0));
            let r = to.x.value().unwrap().hypot(to.z.value().unwrap());
            assert!((r - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_passthrough_of_non_arcs() {
        let seg = Segment::Comment("keep".to_string());
        assert_eq!(linearize_arc(&seg, 5.0), vec![seg]);
    }

    #[test]
    fn test_convergence() {
        let arc = half_circle();
        let mut last_count = 0;
        let mut last_dev = f64::INFINITY;
        for step in [45.0, 20.0, 10.0, 5.0, 1.0] {
            let lines = linearize_arc(&arc, step);
            let dev = max_deviation(&lines, 5.0, 0.0, 5.0);
            assert!(lines.len() > last_count);
            assert!(dev < last_dev);
            last_count = lines.len();
            last_dev = dev;
        }
    }
}
