//! Wrap a flat program onto a rotary axis
//!
//! The chosen linear axis is replaced by an angle in degrees,
//! `θ = ±L / stock_radius`. Z is left as is: Z zero is the surface of the
//! round stock, so depths keep their meaning. Arcs are linearized and
//! long moves subdivided so the helix follows the stock.

use serde::{Deserialize, Serialize};

use crate::arc_expander::{ArcExpander, ArcExpanderConfig};
use crate::error::{CamToolResult, ParameterError};
use gcoderip_core::{Point3, Segment, ZERO};

/// Linear axis that gets wrapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapAxis {
    X,
    Y,
}

impl WrapAxis {
    pub(crate) fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
        }
    }

    pub(crate) fn other_index(self) -> usize {
        match self {
            Self::X => 1,
            Self::Y => 0,
        }
    }
}

/// Rotary axis letter the wrapped axis is emitted as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotaryAxis {
    A,
    B,
}

impl RotaryAxis {
    pub fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
        }
    }
}

/// Feed handling for wrapped moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedMode {
    /// Rescale so the surface speed matches the flat program
    ScaleRotary,
    /// Keep the programmed feed
    None,
}

/// Parameters for [`wrap_to_rotary`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapOptions {
    /// Radius of the stock the program is wrapped around
    pub stock_radius: f64,
    /// Linear axis mapped to rotation
    pub axis: WrapAxis,
    /// Rotary letter used in the output
    pub target: RotaryAxis,
    /// Rotate the other way
    pub reverse: bool,
    pub feed_mode: FeedMode,
    /// Largest angular step per emitted move, in degrees
    pub arc_angle_step: f64,
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self {
            stock_radius: 1.0,
            axis: WrapAxis::Y,
            target: RotaryAxis::A,
            reverse: false,
            feed_mode: FeedMode::ScaleRotary,
            arc_angle_step: 10.0,
        }
    }
}

impl WrapOptions {
    /// Output letters for logical X, Y and Z
    pub fn axis_map(&self) -> [char; 3] {
        let mut map = ['X', 'Y', 'Z'];
        map[self.axis.index()] = self.target.letter();
        map
    }

    fn validate(&self) -> CamToolResult<()> {
        if !(self.stock_radius > 0.0) {
            return Err(ParameterError::InvalidValue {
                name: "stock_radius".to_string(),
                reason: format!("must be positive, got {}", self.stock_radius),
            }
            .into());
        }
        if !(self.arc_angle_step > 0.0) {
            return Err(ParameterError::InvalidValue {
                name: "arc_angle_step".to_string(),
                reason: format!("must be positive, got {}", self.arc_angle_step),
            }
            .into());
        }
        Ok(())
    }
}

/// Map the chosen axis of every point onto the rotary axis
pub fn wrap_to_rotary(segments: &[Segment], options: &WrapOptions) -> CamToolResult<Vec<Segment>> {
    options.validate()?;
    let axis = options.axis.index();
    let other = options.axis.other_index();
    let sign = if options.reverse { -1.0 } else { 1.0 };
    let radius = options.stock_radius;
    let max_step = options.arc_angle_step.to_radians() * radius;

    let wrap_point = |p: &Point3| {
        let mut out = *p;
        *out.axis_mut(axis) = p.axis(axis).map(|l| sign * (l / radius).to_degrees());
        out
    };

    let expander = ArcExpander::new(ArcExpanderConfig {
        angle_step: options.arc_angle_step,
        accuracy: f64::INFINITY,
    });
    let flat: Vec<Segment> = segments.iter().flat_map(|s| expander.expand(s)).collect();

    let mut out = Vec::with_capacity(flat.len());
    for segment in &flat {
        match segment {
            Segment::Rapid { .. } => out.push(segment.map_points(wrap_point)),
            Segment::Linear { from, to, feed } => {
                let span = match (from.axis(axis).value(), to.axis(axis).value()) {
                    (Some(a), Some(b)) => (b - a).abs(),
                    _ => 0.0,
                };
                let pieces = ((span / max_step).ceil() as usize).max(1);
                let mut start = *from;
                for i in 1..=pieces {
                    let end = if i == pieces {
                        *to
                    } else {
                        from.lerp(to, i as f64 / pieces as f64)
                    };
                    let wrapped_from = wrap_point(&start);
                    let wrapped_to = wrap_point(&end);
                    let feed = match options.feed_mode {
                        FeedMode::ScaleRotary => rotary_feed(
                            &start,
                            &end,
                            &wrapped_from,
                            &wrapped_to,
                            *feed,
                            axis,
                            other,
                        ),
                        FeedMode::None => *feed,
                    };
                    out.push(Segment::Linear {
                        from: wrapped_from,
                        to: wrapped_to,
                        feed,
                    });
                    start = end;
                }
            }
            other => out.push(other.clone()),
        }
    }

    tracing::debug!(
        input = segments.len(),
        output = out.len(),
        stock_radius = radius,
        "Wrapped program onto rotary axis"
    );
    Ok(out)
}

/// Feed for one wrapped move
///
/// The time the flat move would take at `feed` is kept; the distance
/// covered is the remaining linear motion or, for a pure rotation, the
/// angle itself.
fn rotary_feed(
    flat_from: &Point3,
    flat_to: &Point3,
    from: &Point3,
    to: &Point3,
    feed: f64,
    axis: usize,
    other: usize,
) -> f64 {
    let length = flat_from.distance(flat_to);
    let delta = |p: &Point3, q: &Point3, i: usize| match (p.axis(i).value(), q.axis(i).value()) {
        (Some(a), Some(b)) => b - a,
        _ => 0.0,
    };
    let d_angle = delta(from, to, axis);
    if length <= ZERO || feed <= 0.0 || d_angle.abs() <= ZERO {
        return feed;
    }
    let linear = delta(from, to, other).hypot(delta(from, to, 2));
    let distance = if linear > ZERO { linear } else { d_angle.abs() };
    (distance / (length / feed)).abs()
}
