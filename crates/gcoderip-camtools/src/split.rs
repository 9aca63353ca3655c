//! Split a program along an infinite line
//!
//! The line passes through `pivot` with direction `angle_deg` measured from
//! +X. Work happens in a frame where the line is the Y axis pointing up, so
//! "right" is `x' > 0`. Cutting moves are assigned by the side their start
//! point lies on and cut at every crossing; rapids and non-motion segments
//! go to both sides.

use gcoderip_core::{
    arc_sweep, rotate_xy, ArcDirection, Coord, Point3, Segment, ZERO,
};

/// Side of the splitting line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Output of [`split_by_line`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitResult {
    pub left: Vec<Segment>,
    pub right: Vec<Segment>,
}

impl SplitResult {
    fn push(&mut self, side: Side, segment: Segment) {
        match side {
            Side::Left => self.left.push(segment),
            Side::Right => self.right.push(segment),
        }
    }

    fn push_both(&mut self, segment: &Segment) {
        self.left.push(segment.clone());
        self.right.push(segment.clone());
    }
}

/// Frame where the splitting line is the Y axis
struct SplitFrame {
    pivot: (f64, f64),
    rotation: f64,
}

impl SplitFrame {
    fn new(pivot: (f64, f64), angle_deg: f64) -> Self {
        Self {
            pivot,
            rotation: 90.0 - angle_deg,
        }
    }

    fn to_frame(&self, (x, y): (f64, f64)) -> (f64, f64) {
        rotate_xy(x - self.pivot.0, y - self.pivot.1, self.rotation)
    }

    fn from_frame(&self, (x, y): (f64, f64)) -> (f64, f64) {
        let (rx, ry) = rotate_xy(x, y, -self.rotation);
        (rx + self.pivot.0, ry + self.pivot.1)
    }
}

/// Split `segments` into the parts left and right of the line
///
/// Pieces whose XY chord is no longer than `accuracy` are dropped.
pub fn split_by_line(
    segments: &[Segment],
    pivot: (f64, f64),
    angle_deg: f64,
    accuracy: f64,
) -> SplitResult {
    let frame = SplitFrame::new(pivot, angle_deg);
    let mut result = SplitResult::default();

    for segment in segments {
        match segment {
            Segment::Linear { from, to, feed } => {
                let (Some(a), Some(c)) = (from.xy(), to.xy()) else {
                    result.push_both(segment);
                    continue;
                };
                let a = frame.to_frame(a);
                let c = frame.to_frame(c);
                let side = line_start_side(a.0, c.0);
                match line_crossing(a.0, c.0) {
                    Some(t) => {
                        let b = from.lerp(to, t);
                        push_piece(&mut result, side, from, &b, None, *feed, accuracy);
                        push_piece(&mut result, side.other(), &b, to, None, *feed, accuracy);
                    }
                    None => result.push(side, segment.clone()),
                }
            }
            Segment::Arc {
                from,
                to,
                center,
                feed,
                dir,
            } => {
                let (Some(a), Some(c), Some(d)) = (from.xy(), to.xy(), center.xy()) else {
                    result.push_both(segment);
                    continue;
                };
                let a = frame.to_frame(a);
                let c = frame.to_frame(c);
                let d = frame.to_frame(d);
                let side = arc_start_side(a, d, *dir);
                let crossings = arc_crossings(a, c, d, *dir, from.z, to.z);
                let points: Vec<Point3> = crossings
                    .iter()
                    .map(|(p, z)| {
                        let (x, y) = frame.from_frame(*p);
                        Point3 {
                            x: Coord::Resolved(x),
                            y: Coord::Resolved(y),
                            z: *z,
                        }
                    })
                    .collect();
                let arc = Some((center, *dir));
                match points.as_slice() {
                    [] => result.push(side, segment.clone()),
                    [b] => {
                        push_piece(&mut result, side, from, b, arc, *feed, accuracy);
                        push_piece(&mut result, side.other(), b, to, arc, *feed, accuracy);
                    }
                    [b, e, ..] => {
                        push_piece(&mut result, side, from, b, arc, *feed, accuracy);
                        push_piece(&mut result, side.other(), b, e, arc, *feed, accuracy);
                        push_piece(&mut result, side, e, to, arc, *feed, accuracy);
                    }
                }
            }
            other => result.push_both(other),
        }
    }

    tracing::debug!(
        left = result.left.len(),
        right = result.right.len(),
        "Split program"
    );
    result
}

fn push_piece(
    result: &mut SplitResult,
    side: Side,
    from: &Point3,
    to: &Point3,
    arc: Option<(&Point3, ArcDirection)>,
    feed: f64,
    accuracy: f64,
) {
    if from.distance_xy(to).is_some_and(|d| d <= accuracy) {
        return;
    }
    let segment = match arc {
        Some((center, dir)) => Segment::Arc {
            from: *from,
            to: *to,
            center: *center,
            feed,
            dir,
        },
        None => Segment::Linear {
            from: *from,
            to: *to,
            feed,
        },
    };
    result.push(side, segment);
}

/// Side of a line move; a start on the line takes the end's side
fn line_start_side(start_x: f64, end_x: f64) -> Side {
    if start_x > ZERO {
        Side::Right
    } else if start_x < -ZERO {
        Side::Left
    } else if end_x >= 0.0 {
        Side::Right
    } else {
        Side::Left
    }
}

/// Side of an arc move in the split frame
///
/// A start on the line is resolved by which way the arc leaves it: level
/// with the center, the center's side wins; otherwise a CW arc starting
/// above its center heads right and a CCW arc heads left.
fn arc_start_side(start: (f64, f64), center: (f64, f64), dir: ArcDirection) -> Side {
    if start.0 > ZERO {
        return Side::Right;
    }
    if start.0 < -ZERO {
        return Side::Left;
    }
    if (start.1 - center.1).abs() < ZERO {
        return if center.0 > 0.0 { Side::Right } else { Side::Left };
    }
    let above = start.1 >= center.1;
    match (dir, above) {
        (ArcDirection::Cw, true) | (ArcDirection::Ccw, false) => Side::Right,
        _ => Side::Left,
    }
}

/// Parameter along a line move where it strictly crosses `x' = 0`
fn line_crossing(start_x: f64, end_x: f64) -> Option<f64> {
    let (lo, hi) = if start_x < end_x {
        (start_x, end_x)
    } else {
        (end_x, start_x)
    };
    if 0.0 > lo + ZERO && 0.0 < hi - ZERO {
        Some(-start_x / (end_x - start_x))
    } else {
        None
    }
}

/// Crossings of an arc with `x' = 0` in travel order
fn arc_crossings(
    start: (f64, f64),
    end: (f64, f64),
    center: (f64, f64),
    dir: ArcDirection,
    z_start: Coord,
    z_end: Coord,
) -> Vec<((f64, f64), Coord)> {
    let radius = (start.0 - center.0).hypot(start.1 - center.1);
    let val = radius * radius - center.0 * center.0;
    if val < 0.0 {
        return Vec::new();
    }
    let root = val.sqrt();
    let beta = arc_sweep(start, end, center, dir);

    let mut hits: Vec<(f64, (f64, f64))> = [(0.0, center.1 - root), (0.0, center.1 + root)]
        .into_iter()
        .map(|p| (arc_sweep(start, p, center, dir), p))
        .filter(|(gamma, _)| *gamma > ZERO && *gamma < beta - ZERO)
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0));

    hits.into_iter()
        .map(|(gamma, p)| (p, z_start.lerp(z_end, gamma / beta)))
        .collect()
}
