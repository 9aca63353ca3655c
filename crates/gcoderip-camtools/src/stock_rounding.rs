//! Stock rounding toolpath
//!
//! Turns square or uneven stock round on the rotary axis. The path is laid
//! out flat (surface distance along the wrapped axis) and then wrapped, so
//! feeds follow the same rotary rule as wrapped programs.

use serde::{Deserialize, Serialize};

use crate::error::{CamToolResult, ParameterError};
use crate::wrap::{wrap_to_rotary, FeedMode, RotaryAxis, WrapAxis, WrapOptions};
use gcoderip_core::{Coord, Point3, Segment};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StockRoundingParameters {
    /// Start of the region along the stock
    pub l_min: f64,
    /// End of the region along the stock
    pub l_max: f64,
    /// Material removed from the radius
    pub cut_depth: f64,
    pub tool_diameter: f64,
    /// Advance per revolution as a percentage of the tool diameter
    pub step_over: f64,
    pub feed: f64,
    pub plunge_feed: f64,
    pub z_safe: f64,
    pub stock_radius: f64,
    /// Axis mapped onto the rotary axis
    pub axis: WrapAxis,
    pub target: RotaryAxis,
    /// Rotate against the cut direction
    pub climb: bool,
    pub feed_mode: FeedMode,
    /// Largest angular step per emitted move, in degrees
    pub arc_angle_step: f64,
}

impl Default for StockRoundingParameters {
    fn default() -> Self {
        Self {
            l_min: 0.0,
            l_max: 1.0,
            cut_depth: 0.05,
            tool_diameter: 0.25,
            step_over: 25.0,
            feed: 20.0,
            plunge_feed: 10.0,
            z_safe: 0.5,
            stock_radius: 1.0,
            axis: WrapAxis::Y,
            target: RotaryAxis::A,
            climb: false,
            feed_mode: FeedMode::ScaleRotary,
            arc_angle_step: 10.0,
        }
    }
}

pub struct StockRoundingGenerator {
    params: StockRoundingParameters,
}

impl StockRoundingGenerator {
    pub fn new(params: StockRoundingParameters) -> Self {
        Self { params }
    }

    fn validate(&self) -> CamToolResult<()> {
        let p = &self.params;
        let positive = [
            ("tool_diameter", p.tool_diameter),
            ("feed", p.feed),
            ("plunge_feed", p.plunge_feed),
            ("stock_radius", p.stock_radius),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ParameterError::InvalidValue {
                    name: name.to_string(),
                    reason: format!("must be positive, got {}", value),
                }
                .into());
            }
        }
        if !(p.step_over > 0.0 && p.step_over <= 100.0) {
            return Err(ParameterError::OutOfRange {
                name: "step_over".to_string(),
                value: p.step_over,
                min: 0.0,
                max: 100.0,
            }
            .into());
        }
        Ok(())
    }

    /// Generate the rounding program in wrapped coordinates
    ///
    /// A tool wider than the region yields a single explanatory comment.
    pub fn generate(&self) -> CamToolResult<Vec<Segment>> {
        self.validate()?;
        let p = &self.params;
        let width = p.l_max - p.l_min;
        if p.tool_diameter > width {
            tracing::warn!(
                tool_diameter = p.tool_diameter,
                width,
                "Tool is wider than the stock rounding region"
            );
            return Ok(vec![Segment::Comment(format!(
                "Tool diameter {} is larger than the cleanup width {}",
                p.tool_diameter, width
            ))]);
        }

        let options = WrapOptions {
            stock_radius: p.stock_radius,
            axis: p.axis,
            target: p.target,
            reverse: p.climb,
            feed_mode: p.feed_mode,
            arc_angle_step: p.arc_angle_step,
        };
        let (axis, other) = (options.axis.index(), options.axis.other_index());
        let point = |along: f64, surface: f64, z: f64| {
            let mut pt = Point3::new(0.0, 0.0, z);
            *pt.axis_mut(other) = Coord::Resolved(along);
            *pt.axis_mut(axis) = Coord::Resolved(surface);
            pt
        };

        let circumference = 2.0 * std::f64::consts::PI * p.stock_radius;
        let depth = -p.cut_depth.abs();
        let start = p.l_min + p.tool_diameter / 2.0;
        let end = p.l_max - p.tool_diameter / 2.0;
        let step = p.tool_diameter * p.step_over / 100.0;
        let turns = ((end - start) / step).ceil().max(0.0);

        let mut flat = Vec::new();
        let mut pos = Point3::UNRESOLVED;
        let mut push = |segment: Segment, pos: &mut Point3| {
            if let Some(to) = segment.end() {
                *pos = *to;
            }
            flat.push(segment);
        };

        let retract = Point3 {
            z: Coord::Resolved(p.z_safe),
            ..pos
        };
        push(Segment::Rapid { from: pos, to: retract }, &mut pos);
        push(
            Segment::Rapid {
                from: pos,
                to: point(start, 0.0, p.z_safe),
            },
            &mut pos,
        );
        push(
            Segment::Linear {
                from: pos,
                to: point(start, 0.0, depth),
                feed: p.plunge_feed,
            },
            &mut pos,
        );
        let mut surface = circumference;
        push(
            Segment::Linear {
                from: pos,
                to: point(start, surface, depth),
                feed: p.feed,
            },
            &mut pos,
        );
        if turns > 0.0 {
            surface += turns * circumference;
            push(
                Segment::Linear {
                    from: pos,
                    to: point(end, surface, depth),
                    feed: p.feed,
                },
                &mut pos,
            );
        }
        surface += circumference;
        push(
            Segment::Linear {
                from: pos,
                to: point(end, surface, depth),
                feed: p.feed,
            },
            &mut pos,
        );
        push(
            Segment::Rapid {
                from: pos,
                to: point(end, surface, p.z_safe),
            },
            &mut pos,
        );

        let mut out = wrap_to_rotary(&flat, &options)?;
        out.push(Segment::Passthrough("M5".to_string()));
        out.push(Segment::EndOfProgram);
        tracing::debug!(
            turns = turns + 2.0,
            segments = out.len(),
            "Generated stock rounding path"
        );
        Ok(out)
    }
}

/// Generate a stock rounding program
pub fn round_stock(params: &StockRoundingParameters) -> CamToolResult<Vec<Segment>> {
    StockRoundingGenerator::new(params.clone()).generate()
}
