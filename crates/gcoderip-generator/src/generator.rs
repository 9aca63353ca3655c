//! Segment to G-code conversion
//!
//! Words are modal: a word is only written when its formatted value differs
//! from the last one written for that letter. Arc center offsets are the
//! exception and appear on every arc line.

use std::collections::HashMap;

use gcoderip_core::{Coord, Point3, Segment};

use crate::config::GenConfig;
use crate::format::{format_feed, format_number};

const CENTER_LETTERS: [char; 2] = ['I', 'J'];

/// Generate G-code lines for a segment sequence
///
/// Output stops at the first [`Segment::EndOfProgram`], where the
/// postamble is written. A sequence without one still gets the postamble.
pub fn generate(segments: &[Segment], cfg: &GenConfig) -> Vec<String> {
    let mut generator = CodeGenerator::new(cfg);
    generator.header();
    for segment in segments {
        if generator.finished {
            break;
        }
        generator.segment(segment);
    }
    generator.finish();
    tracing::debug!(
        segments = segments.len(),
        lines = generator.lines.len(),
        "Generated G-code"
    );
    generator.lines
}

struct CodeGenerator<'a> {
    cfg: &'a GenConfig,
    lines: Vec<String>,
    last: HashMap<char, String>,
    position: Option<Point3>,
    finished: bool,
}

impl<'a> CodeGenerator<'a> {
    fn new(cfg: &'a GenConfig) -> Self {
        Self {
            cfg,
            lines: Vec::new(),
            last: HashMap::new(),
            position: None,
            finished: false,
        }
    }

    fn header(&mut self) {
        if self.cfg.header {
            self.lines.push(format!(
                "(Generated by gcoderip {})",
                env!("CARGO_PKG_VERSION")
            ));
            for (axis, letter) in ['X', 'Y', 'Z'].into_iter().zip(self.cfg.axis_map) {
                if axis != letter {
                    self.lines
                        .push(format!("({} axis is written as {})", axis, letter));
                }
            }
            self.lines
                .push(format!("G90 G91.1 G17 {}", self.cfg.units.gcode()));
        }
        if self.cfg.use_variables {
            self.lines.push(format!(
                "#<z_safe> = {}",
                format_number(self.cfg.z_safe, self.cfg.decimals_linear)
            ));
            self.lines.push(format!(
                "#<plunge_feed> = {}",
                format_feed(self.cfg.plunge_feed, self.cfg.decimals_feed)
            ));
        }
        self.lines.extend(self.cfg.preamble.iter().cloned());
    }

    fn segment(&mut self, segment: &Segment) {
        match segment {
            Segment::Comment(text) => {
                if !self.cfg.strip_comments {
                    self.lines.push(format!("({})", text.replace(['(', ')'], "")));
                }
            }
            Segment::Passthrough(code) => self.lines.push(code.clone()),
            Segment::Rapid { to, .. } => {
                if self.cfg.generate_rapids {
                    return;
                }
                let words = self.axis_words(to);
                self.emit("G0", words);
                self.position = Some(*to);
            }
            Segment::Linear { from, to, feed } => {
                self.reposition(from);
                let mut words = self.axis_words(to);
                words.push(('F', format_feed(*feed, self.cfg.decimals_feed)));
                self.emit("G1", words);
                self.position = Some(*to);
            }
            Segment::Arc {
                from,
                to,
                center,
                feed,
                dir,
            } => {
                self.reposition(from);
                let mut words = self.axis_words(to);
                if let (Some((fx, fy)), Some((cx, cy))) = (from.xy(), center.xy()) {
                    let places = self.cfg.decimals_linear;
                    words.push((CENTER_LETTERS[0], format_number(cx - fx, places)));
                    words.push((CENTER_LETTERS[1], format_number(cy - fy, places)));
                }
                words.push(('F', format_feed(*feed, self.cfg.decimals_feed)));
                self.emit(dir.gcode(), words);
                self.position = Some(*to);
            }
            Segment::EndOfProgram => self.finish(),
        }
    }

    /// Words for the resolved axes of a point, under their mapped letters
    fn axis_words(&self, p: &Point3) -> Vec<(char, String)> {
        (0..3)
            .filter_map(|axis| {
                let value = p.axis(axis).value()?;
                let letter = self.cfg.axis_map[axis];
                Some((letter, format_number(value, self.cfg.decimals_for(letter))))
            })
            .collect()
    }

    fn z_safe_word(&self) -> String {
        if self.cfg.use_variables {
            "#<z_safe>".to_string()
        } else {
            let letter = self.cfg.axis_map[2];
            format_number(self.cfg.z_safe, self.cfg.decimals_for(letter))
        }
    }

    fn plunge_feed_word(&self) -> String {
        if self.cfg.use_variables {
            "#<plunge_feed>".to_string()
        } else {
            format_feed(self.cfg.plunge_feed, self.cfg.decimals_feed)
        }
    }

    /// Write a motion line; returns `false` when no position word changed
    fn emit(&mut self, code: &str, words: Vec<(char, String)>) -> bool {
        let changed: Vec<(char, String)> = words
            .into_iter()
            .filter(|(letter, value)| {
                CENTER_LETTERS.contains(letter)
                    || self.cfg.write_all_words
                    || self.last.get(letter) != Some(value)
            })
            .collect();
        if !changed.iter().any(|(letter, _)| *letter != 'F') {
            return false;
        }
        let mut line = code.to_string();
        for (letter, value) in changed {
            line.push(' ');
            line.push(letter);
            line.push_str(&value);
            self.last.insert(letter, value);
        }
        self.lines.push(line);
        true
    }

    /// Retract, rapid over and plunge when a cut does not start where the
    /// previous one ended
    fn reposition(&mut self, from: &Point3) {
        if !self.cfg.generate_rapids {
            return;
        }
        if self
            .position
            .is_some_and(|p| same_point(&p, from, self.cfg.accuracy))
        {
            return;
        }
        let z_letter = self.cfg.axis_map[2];
        let retract = self.z_safe_word();
        self.emit("G0", vec![(z_letter, retract)]);

        let above = Point3 {
            z: Coord::Unresolved,
            ..*from
        };
        let words = self.axis_words(&above);
        self.emit("G0", words);

        if let Some(z) = from.z.value() {
            let depth = format_number(z, self.cfg.decimals_for(z_letter));
            let feed = self.plunge_feed_word();
            self.emit("G1", vec![(z_letter, depth), ('F', feed)]);
        }
        self.position = Some(*from);
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if self.cfg.generate_rapids && self.position.is_some() {
            let z_letter = self.cfg.axis_map[2];
            let retract = self.z_safe_word();
            self.emit("G0", vec![(z_letter, retract)]);
        }
        self.lines.extend(self.cfg.postamble.iter().cloned());
    }
}

/// Points match on every axis within `accuracy`; unresolved only matches
/// unresolved
fn same_point(a: &Point3, b: &Point3, accuracy: f64) -> bool {
    (0..3).all(|axis| match (a.axis(axis), b.axis(axis)) {
        (Coord::Resolved(p), Coord::Resolved(q)) => (p - q).abs() <= accuracy,
        (Coord::Unresolved, Coord::Unresolved) => true,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcoderip_core::{ArcDirection, LinearUnit};

    fn cut(from: (f64, f64, f64), to: (f64, f64, f64), feed: f64) -> Segment {
        Segment::Linear {
            from: Point3::new(from.0, from.1, from.2),
            to: Point3::new(to.0, to.1, to.2),
            feed,
        }
    }

    #[test]
    fn test_rapid_line_and_end() {
        let open = Point3 {
            z: Coord::Unresolved,
            ..Point3::new(0.0, 0.0, 0.0)
        };
        let segments = vec![
            Segment::Rapid {
                from: Point3::UNRESOLVED,
                to: open,
            },
            Segment::Linear {
                from: open,
                to: Point3 {
                    z: Coord::Unresolved,
                    ..Point3::new(10.0, 0.0, 0.0)
                },
                feed: 100.0,
            },
            Segment::EndOfProgram,
        ];
        let lines = generate(&segments, &GenConfig::default());
        assert_eq!(lines, vec!["G0 X0 Y0", "G1 X10. F100.", "M2"]);
    }

    #[test]
    fn test_write_all_words() {
        let segments = vec![
            cut((0.0, 0.0, 0.0), (1.0, 0.0, 0.0), 5.0),
            cut((1.0, 0.0, 0.0), (1.0, 1.0, 0.0), 5.0),
        ];
        let lines = generate(&segments, &GenConfig::default());
        assert_eq!(lines[..2], ["G1 X1. Y0 Z0 F5.", "G1 Y1."]);

        let cfg = GenConfig {
            write_all_words: true,
            ..GenConfig::default()
        };
        let lines = generate(&segments, &cfg);
        assert_eq!(lines[1], "G1 X1. Y1. Z0 F5.");
    }

    #[test]
    fn test_repeated_position_writes_nothing() {
        let segments = vec![
            cut((0.0, 0.0, 0.0), (1.0, 0.0, 0.0), 5.0),
            cut((1.0, 0.0, 0.0), (1.0, 0.0, 0.0), 8.0),
            cut((1.0, 0.0, 0.0), (2.0, 0.0, 0.0), 8.0),
        ];
        let lines = generate(&segments, &GenConfig::default());
        assert_eq!(lines, vec!["G1 X1. Y0 Z0 F5.", "G1 X2. F8.", "M2"]);
    }

    #[test]
    fn test_arc_centers_always_written() {
        let arc = |from: (f64, f64), to: (f64, f64), center: (f64, f64)| Segment::Arc {
            from: Point3::new(from.0, from.1, 0.0),
            to: Point3::new(to.0, to.1, 0.0),
            center: Point3::new(center.0, center.1, 0.0),
            feed: 20.0,
            dir: ArcDirection::Ccw,
        };
        let segments = vec![
            arc((1.0, 0.0), (0.0, 1.0), (0.0, 0.0)),
            arc((0.0, 1.0), (-1.0, 0.0), (0.0, 0.0)),
        ];
        let lines = generate(&segments, &GenConfig::default());
        assert_eq!(lines[0], "G3 X0 Y1. Z0 I-1. J0 F20.");
        assert_eq!(lines[1], "G3 X-1. Y0 I0 J-1.");
    }

    #[test]
    fn test_axis_mapping_uses_rotary_decimals() {
        let cfg = GenConfig {
            axis_map: ['X', 'A', 'Z'],
            header: true,
            ..GenConfig::default()
        };
        let segments = vec![cut((0.0, 0.0, 0.0), (1.0, 286.478_897_6, -0.1), 10.0)];
        let lines = generate(&segments, &cfg);
        assert!(lines[0].starts_with("(Generated by gcoderip"));
        assert_eq!(lines[1], "(Y axis is written as A)");
        assert_eq!(lines[2], "G90 G91.1 G17 G20");
        assert_eq!(lines[3], "G1 X1. A286.479 Z-0.1 F10.");
    }

    #[test]
    fn test_generated_rapids() {
        let cfg = GenConfig {
            generate_rapids: true,
            ..GenConfig::default()
        };
        let segments = vec![
            Segment::Rapid {
                from: Point3::UNRESOLVED,
                to: Point3::new(0.0, 0.0, 1.0),
            },
            cut((0.0, 0.0, -0.1), (1.0, 0.0, -0.1), 10.0),
            cut((5.0, 0.0, -0.1), (6.0, 0.0, -0.1), 10.0),
            Segment::EndOfProgram,
        ];
        let lines = generate(&segments, &cfg);
        assert_eq!(
            lines,
            vec![
                "G0 Z0.5",
                "G0 X0 Y0",
                "G1 Z-0.1 F10.",
                "G1 X1.",
                "G0 Z0.5",
                "G0 X5.",
                "G1 Z-0.1",
                "G1 X6.",
                "G0 Z0.5",
                "M2",
            ]
        );
    }

    #[test]
    fn test_variables_for_rapids() {
        let cfg = GenConfig {
            generate_rapids: true,
            use_variables: true,
            ..GenConfig::default()
        };
        let lines = generate(&[cut((0.0, 0.0, -0.1), (1.0, 0.0, -0.1), 10.0)], &cfg);
        assert_eq!(lines[0], "#<z_safe> = 0.5");
        assert_eq!(lines[1], "#<plunge_feed> = 10.");
        assert_eq!(lines[2], "G0 Z#<z_safe>");
        assert_eq!(lines[4], "G1 Z-0.1 F#<plunge_feed>");
        assert_eq!(lines[5], "G1 X1. F10.");
    }

    #[test]
    fn test_comments_passthrough_and_units() {
        let cfg = GenConfig {
            header: true,
            preamble: vec!["M3 S10000".to_string()],
            postamble: vec!["M5".to_string(), "M30".to_string()],
            ..GenConfig::for_units(LinearUnit::Millimetre)
        };
        let segments = vec![
            Segment::Comment("outline (pass 1)".to_string()),
            Segment::Passthrough("T2 M6".to_string()),
        ];
        let lines = generate(&segments, &cfg);
        assert_eq!(lines[1], "G90 G91.1 G17 G21");
        assert_eq!(&lines[2..], ["M3 S10000", "(outline pass 1)", "T2 M6", "M5", "M30"]);

        let stripped = GenConfig {
            strip_comments: true,
            ..GenConfig::default()
        };
        assert_eq!(generate(&segments, &stripped), vec!["T2 M6", "M2"]);
    }

    #[test]
    fn test_zero_feed_is_raised() {
        let lines = generate(
            &[cut((0.0, 0.0, 0.0), (1.0, 0.0, 0.0), 0.0)],
            &GenConfig::default(),
        );
        assert_eq!(lines[0], "G1 X1. Y0 Z0 F0.1");
    }

    #[test]
    fn test_stops_at_end_of_program() {
        let segments = vec![
            Segment::EndOfProgram,
            cut((0.0, 0.0, 0.0), (1.0, 0.0, 0.0), 1.0),
        ];
        assert_eq!(generate(&segments, &GenConfig::default()), vec!["M2"]);
    }
}
