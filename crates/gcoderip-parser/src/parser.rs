//! Program parser
//!
//! Walks a G-code program line by line, keeping modal state and parameter
//! values, and turns each accepted line into [`Segment`]s. Recoverable
//! problems become [`ParseWarning`]s; a fatal problem stops the parse
//! unless [`ParseOptions::skip_errors`] is set.

use gcoderip_camtools::{ArcExpander, ArcExpanderConfig};
use gcoderip_core::{
    ArcDirection, Coord, Plane, Point3, ProgramUnits, ProgressCallback, ProgressReporter, Segment,
};
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, ParseError, ParseResult, ParseWarning};
use crate::expression::{check_brackets, VarTable};
use crate::state::ModalState;
use crate::words::{read_words, split_comments, LineWords};

/// Word letters that cannot be interpreted; a line using one is skipped
pub const UNSUPPORTED_LETTERS: [char; 11] =
    ['A', 'B', 'C', 'D', 'E', 'L', 'O', 'Q', 'U', 'V', 'W'];

const AXIS_LETTERS: [char; 3] = ['X', 'Y', 'Z'];
const CENTER_LETTERS: [char; 3] = ['I', 'J', 'K'];

/// Parser switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Linearize every arc, not only arcs outside the XY plane
    pub arc_to_line: bool,
    /// Report fatal line errors as [`ParseWarning::SkippedLine`] and continue
    pub skip_errors: bool,
}

/// Segments of a parsed program and the warnings raised on the way
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutput {
    pub segments: Vec<Segment>,
    pub warnings: Vec<ParseWarning>,
}

enum LineOutcome {
    Continue,
    End,
}

/// Parse a G-code program
///
/// Positions and feeds are converted to `units.linear_unit` whatever G20/G21
/// the program selects. `progress` is called with `(lines, total_lines)`.
pub fn parse(
    text: &str,
    units: ProgramUnits,
    options: &ParseOptions,
    progress: Option<&ProgressCallback>,
) -> ParseResult<ParseOutput> {
    let total = text.lines().count() as u64;
    let mut reporter = ProgressReporter::new(progress, total);
    let mut parser = ProgramParser::new(units, *options);

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        match parser.parse_line(line, line_number) {
            Ok(LineOutcome::Continue) => {}
            Ok(LineOutcome::End) => break,
            Err(err) if options.skip_errors => {
                tracing::warn!(line = line_number, error = %err, "Skipping line");
                parser.warnings.push(ParseWarning::SkippedLine {
                    line: line_number,
                    message: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
        reporter.tick(line_number as u64);
    }
    reporter.finish();

    let output = parser.finish();
    tracing::debug!(
        segments = output.segments.len(),
        warnings = output.warnings.len(),
        "Parsed G-code program"
    );
    Ok(output)
}

/// G-code value times ten, so G91.1 and G91 stay distinct
fn code10(value: f64) -> i64 {
    (value * 10.0).round() as i64
}

/// Codes that move or re-reference the machine in ways the segment model
/// cannot follow: G38.x probing, G53, G73/G81-G89 canned cycles, G92.x
fn is_unsupported_gcode(value: f64) -> bool {
    matches!(code10(value), 382..=385 | 530 | 730 | 810..=890 | 920..=923)
}

struct ProgramParser {
    units: ProgramUnits,
    options: ParseOptions,
    state: ModalState,
    vars: VarTable,
    position: Point3,
    expander: ArcExpander,
    segments: Vec<Segment>,
    warnings: Vec<ParseWarning>,
}

impl ProgramParser {
    fn new(units: ProgramUnits, options: ParseOptions) -> Self {
        Self {
            units,
            options,
            state: ModalState::new(units.linear_unit),
            vars: VarTable::new(),
            position: Point3::UNRESOLVED,
            expander: ArcExpander::new(ArcExpanderConfig {
                angle_step: units.arc_angle_step,
                accuracy: units.accuracy,
            }),
            segments: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Factor from the program's current unit to the working unit
    fn scale(&self) -> f64 {
        self.state.units().factor_to(self.units.linear_unit)
    }

    fn parse_line(&mut self, line: &str, line_number: usize) -> ParseResult<LineOutcome> {
        let split = split_comments(line);
        if !split.balanced {
            self.warnings.push(ParseWarning::BadComment(line_number));
        }
        let code = split.code.trim().trim_start_matches('/');
        if code.contains('%') {
            return Ok(LineOutcome::Continue);
        }

        check_brackets(code).map_err(|err| ParseError::from_eval(err, line_number))?;
        let words = match read_words(code, &self.vars) {
            Ok(words) => words,
            Err(EvalError::UndefinedVariable { name }) => {
                tracing::debug!(line = line_number, %name, "Undefined variable");
                self.warnings.push(ParseWarning::UndefinedVariable {
                    name,
                    line: line_number,
                });
                return Ok(LineOutcome::Continue);
            }
            Err(err) => return Err(ParseError::from_eval(err, line_number)),
        };

        let unsupported: Vec<char> = words
            .words
            .iter()
            .map(|w| w.letter)
            .filter(|letter| UNSUPPORTED_LETTERS.contains(letter))
            .collect();
        if !unsupported.is_empty() {
            for letter in unsupported {
                self.warnings
                    .push(ParseWarning::UnsupportedCode(letter, line_number));
            }
            return Ok(LineOutcome::Continue);
        }
        if let Some(word) = words
            .words
            .iter()
            .find(|w| w.letter == 'G' && is_unsupported_gcode(w.value))
        {
            self.warnings.push(ParseWarning::UnsupportedGCode {
                code: word.to_gcode(),
                line: line_number,
            });
            return Ok(LineOutcome::Continue);
        }

        // Modal codes first so units and modes apply to the whole line
        let mut consumed = Vec::with_capacity(words.words.len());
        for word in &words.words {
            let is_modal = word.letter == 'G' && self.apply_gcode(word.value, line_number)?;
            consumed.push(is_modal);
        }

        let has_axes = AXIS_LETTERS.iter().any(|l| words.has(*l));
        let arc_move = self.state.arc_direction().is_some()
            && (has_axes || CENTER_LETTERS.iter().any(|l| words.has(*l)) || words.has('R'));

        let mut passthrough = Vec::new();
        let mut end = false;
        for (word, consumed) in words.words.iter().zip(consumed) {
            match word.letter {
                _ if consumed => {}
                'F' => {
                    let feed = word.value * self.scale();
                    self.state
                        .set_feed_rate(feed)
                        .map_err(|message| ParseError::ModalState {
                            line_number,
                            message,
                        })?;
                }
                'M' if matches!(code10(word.value), 20 | 300) => end = true,
                'P' | 'R' if arc_move => {}
                'N' | 'X' | 'Y' | 'Z' | 'I' | 'J' | 'K' => {}
                _ => passthrough.push(word.to_gcode()),
            }
        }

        let motion = if has_axes || arc_move {
            self.motion(&words, line_number)?
        } else {
            Vec::new()
        };

        for assignment in &words.assignments {
            self.vars.set(assignment.target.clone(), assignment.value);
        }
        self.segments
            .extend(split.comments.into_iter().map(Segment::Comment));
        if !passthrough.is_empty() {
            self.segments.push(Segment::Passthrough(passthrough.join(" ")));
        }
        self.segments.extend(motion);

        if end {
            self.segments.push(Segment::EndOfProgram);
            tracing::debug!(line = line_number, "End of program");
            return Ok(LineOutcome::End);
        }
        Ok(LineOutcome::Continue)
    }

    /// Apply a modal G-code; `false` when the code is passed through
    fn apply_gcode(&mut self, value: f64, line_number: usize) -> ParseResult<bool> {
        let code = code10(value);
        let result = match code {
            0 | 10 | 20 | 30 => {
                let previous = self.state.motion_mode;
                let result = self.state.set_motion_mode((code / 10) as u8);
                if result.is_ok() && self.state.motion_mode != previous {
                    tracing::trace!(
                        line = line_number,
                        mode = self.state.motion_mode_description(),
                        "Motion mode changed"
                    );
                }
                result
            }
            170 | 180 | 190 => self.state.set_plane_mode((code / 10) as u8),
            200 | 210 => self.state.set_units_mode((code / 10) as u8),
            900 | 910 => self.state.set_distance_mode((code / 10) as u8),
            901 | 911 => self.state.set_arc_distance_mode((code / 10) as u8),
            _ => return Ok(false),
        };
        result.map_err(|message| ParseError::ModalState {
            line_number,
            message,
        })?;
        Ok(true)
    }

    fn motion(&mut self, words: &LineWords, line_number: usize) -> ParseResult<Vec<Segment>> {
        let scale = self.scale();
        let from = self.position;
        let mut to = from;
        for (axis, letter) in AXIS_LETTERS.iter().enumerate() {
            if let Some(value) = words.get(*letter) {
                let value = value * scale;
                *to.axis_mut(axis) = if self.state.is_incremental() {
                    from.axis(axis).map(|current| current + value)
                } else {
                    Coord::Resolved(value)
                };
            }
        }

        let feed = self.state.feed_rate;
        let segments = match self.state.arc_direction() {
            Some(dir) => self.arc(words, line_number, from, to, dir)?,
            None if self.state.motion_mode == 0 => vec![Segment::Rapid { from, to }],
            None => vec![Segment::Linear { from, to, feed }],
        };
        self.position = to;
        Ok(segments)
    }

    fn arc(
        &mut self,
        words: &LineWords,
        line_number: usize,
        from: Point3,
        to: Point3,
        dir: ArcDirection,
    ) -> ParseResult<Vec<Segment>> {
        if let Some(turns) = words.get('P') {
            if turns > 1.0 {
                return Err(ParseError::MultiTurnArc { line_number, turns });
            }
        }

        let plane = self.state.plane();
        let (u, v, _) = plane.axes();
        let planar = |p: &Point3| Some((p.axis(u).value()?, p.axis(v).value()?));
        let (Some(start), Some(end)) = (planar(&from), planar(&to)) else {
            return Err(ParseError::InvalidArc {
                line_number,
                message: "arc starts or ends at an unknown position".to_string(),
            });
        };

        let scale = self.scale();
        let center_uv = match words.get('R') {
            Some(radius) => self.radius_center(start, end, radius * scale, dir, line_number)?,
            None => {
                let offset = |axis: usize| words.get(CENTER_LETTERS[axis]).map(|v| v * scale);
                if self.state.arc_centers_incremental() {
                    (
                        start.0 + offset(u).unwrap_or(0.0),
                        start.1 + offset(v).unwrap_or(0.0),
                    )
                } else {
                    (offset(u).unwrap_or(start.0), offset(v).unwrap_or(start.1))
                }
            }
        };

        let start_radius = (start.0 - center_uv.0).hypot(start.1 - center_uv.1);
        let end_radius = (end.0 - center_uv.0).hypot(end.1 - center_uv.1);
        let deviation = (start_radius - end_radius).abs();
        if deviation > self.units.accuracy {
            tracing::debug!(line = line_number, deviation, "Arc radius mismatch");
            self.warnings.push(ParseWarning::RadiusMismatch {
                line: line_number,
                deviation,
            });
        }

        let mut center = from;
        *center.axis_mut(u) = Coord::Resolved(center_uv.0);
        *center.axis_mut(v) = Coord::Resolved(center_uv.1);
        let feed = self.state.feed_rate;

        if plane != Plane::Xy || self.options.arc_to_line {
            return Ok(self
                .expander
                .expand_in_plane(&from, &to, &center, feed, dir, plane));
        }
        Ok(vec![Segment::Arc {
            from,
            to,
            center,
            feed,
            dir,
        }])
    }

    /// Center of an `R` arc
    ///
    /// G3 with positive R puts the center left of the chord, G2 right of it,
    /// so the arc is at most a half circle; a negative R picks the other side.
    fn radius_center(
        &mut self,
        start: (f64, f64),
        end: (f64, f64),
        radius: f64,
        dir: ArcDirection,
        line_number: usize,
    ) -> ParseResult<(f64, f64)> {
        let (dx, dy) = (end.0 - start.0, end.1 - start.1);
        let chord = dx.hypot(dy);
        if chord < self.units.accuracy {
            return Err(ParseError::InvalidArc {
                line_number,
                message: "R arc with coincident endpoints".to_string(),
            });
        }
        let half = chord / 2.0;
        if half - radius.abs() > self.units.accuracy {
            self.warnings.push(ParseWarning::RadiusMismatch {
                line: line_number,
                deviation: half - radius.abs(),
            });
        }
        let offset = (radius * radius - half * half).max(0.0).sqrt();
        let side = match dir {
            ArcDirection::Ccw => 1.0,
            ArcDirection::Cw => -1.0,
        } * radius.signum();
        let (nx, ny) = (-dy / chord, dx / chord);
        Ok((
            start.0 + dx / 2.0 + side * offset * nx,
            start.1 + dy / 2.0 + side * offset * ny,
        ))
    }

    /// Forward-fill axes that cutting moves used before any position was set
    ///
    /// Every such axis is reported. It is filled from its first resolved
    /// value; an axis the program never sets stays unresolved.
    fn finish(mut self) -> ParseOutput {
        let mut ambiguous = Vec::new();
        for (axis, letter) in AXIS_LETTERS.iter().enumerate() {
            let read_before_set = self
                .segments
                .iter()
                .filter(|s| s.is_cut())
                .flat_map(|s| [s.start(), s.end()])
                .flatten()
                .any(|p| !p.axis(axis).is_resolved());
            if !read_before_set {
                continue;
            }
            ambiguous.push(*letter);
            let first = self
                .segments
                .iter()
                .flat_map(|s| [s.start(), s.end()])
                .flatten()
                .find_map(|p| p.axis(axis).value());
            match first {
                Some(value) => fill_axis(&mut self.segments, axis, value),
                None => tracing::debug!(axis = %letter, "Axis never set by the program"),
            }
        }
        if !ambiguous.is_empty() {
            tracing::warn!(axes = ?ambiguous, "Ambiguous start position");
            self.warnings.push(ParseWarning::AmbiguousStart(ambiguous));
        }
        ParseOutput {
            segments: self.segments,
            warnings: self.warnings,
        }
    }
}

fn fill_axis(segments: &mut [Segment], axis: usize, value: f64) {
    for segment in segments.iter_mut() {
        *segment = segment.map_points(|p| {
            let mut p = *p;
            if !p.axis(axis).is_resolved() {
                *p.axis_mut(axis) = Coord::Resolved(value);
            }
            p
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcoderip_core::LinearUnit;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn parse_in(text: &str) -> ParseOutput {
        parse(text, ProgramUnits::default(), &ParseOptions::default(), None).unwrap()
    }

    fn motion(output: &ParseOutput) -> Vec<&Segment> {
        output.segments.iter().filter(|s| s.is_motion()).collect()
    }

    fn approx(a: Coord, b: f64) -> bool {
        a.value().is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_rapid_line_and_end() {
        let units = ProgramUnits::new(LinearUnit::Inch).with_arc_angle_step(5.0);
        let output = parse(
            "G0 X0 Y0\nG1 X10 Y0 F100\nM2",
            units,
            &ParseOptions::default(),
            None,
        )
        .unwrap();
        assert_eq!(output.warnings, vec![ParseWarning::AmbiguousStart(vec!['Z'])]);
        assert_eq!(output.segments.len(), 3);
        let origin = Point3 {
            z: Coord::Unresolved,
            ..Point3::new(0.0, 0.0, 0.0)
        };
        assert_eq!(
            output.segments[0],
            Segment::Rapid {
                from: Point3::UNRESOLVED,
                to: origin,
            }
        );
        assert_eq!(
            output.segments[1],
            Segment::Linear {
                from: origin,
                to: Point3 {
                    z: Coord::Unresolved,
                    ..Point3::new(10.0, 0.0, 0.0)
                },
                feed: 100.0,
            }
        );
        assert_eq!(output.segments[2], Segment::EndOfProgram);
    }

    #[test]
    fn test_ij_arc_center() {
        let output = parse_in("G0 X0 Y0 Z0\nG2 X10 Y0 I5 J0 F50");
        assert_eq!(
            output.segments[1],
            Segment::Arc {
                from: Point3::new(0.0, 0.0, 0.0),
                to: Point3::new(10.0, 0.0, 0.0),
                center: Point3::new(5.0, 0.0, 0.0),
                feed: 50.0,
                dir: ArcDirection::Cw,
            }
        );
    }

    #[test]
    fn test_arc_to_line() {
        let units = ProgramUnits::default().with_arc_angle_step(10.0);
        let options = ParseOptions {
            arc_to_line: true,
            ..ParseOptions::default()
        };
        let output = parse("G0 X0 Y0 Z0\nG2 X10 Y0 I5 J0 F50", units, &options, None).unwrap();
        let lines = &output.segments[1..];
        assert_eq!(lines.len(), 18);
        assert!(lines.iter().all(|s| matches!(s, Segment::Linear { feed, .. } if *feed == 50.0)));
        assert_eq!(lines[17].end(), Some(&Point3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_radius_arc_sides() {
        let output = parse_in("G0 X0 Y0 Z0\nG3 X10 Y0 R13 F10\nG0 X0 Y0\nG2 X10 Y0 R13");
        let centers: Vec<Point3> = output
            .segments
            .iter()
            .filter_map(|s| match s {
                Segment::Arc { center, .. } => Some(*center),
                _ => None,
            })
            .collect();
        assert_eq!(centers.len(), 2);
        assert!(approx(centers[0].x, 5.0) && approx(centers[0].y, 12.0));
        assert!(approx(centers[1].x, 5.0) && approx(centers[1].y, -12.0));

        let output = parse_in("G0 X0 Y0 Z0\nG3 X10 Y0 R-13 F10");
        match &output.segments[1] {
            Segment::Arc { center, .. } => assert!(approx(center.y, -12.0)),
            other => panic!("expected arc, got {:?}", other),
        }
    }

    #[test]
    fn test_radius_arc_coincident_endpoints() {
        let err = parse(
            "G0 X1 Y1\nG2 X1 Y1 R2",
            ProgramUnits::default(),
            &ParseOptions::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::InvalidArc { line_number: 2, .. }));
    }

    #[test]
    fn test_radius_mismatch_warning() {
        let output = parse_in("G0 X0 Y0 Z0\nG2 X10 Y0 I4 J0 F10");
        assert!(matches!(
            output.warnings[..],
            [ParseWarning::RadiusMismatch { line: 2, .. }]
        ));
        assert_eq!(motion(&output).len(), 2);
    }

    #[test]
    fn test_zx_plane_arc_is_linearized() {
        let output = parse_in("G0 X0 Y0 Z0\nG18\nG2 X10 Z0 I5 K0 F10");
        let cuts: Vec<_> = output.segments.iter().filter(|s| s.is_cut()).collect();
        assert_eq!(cuts.len(), 18);
        assert!(cuts.iter().all(|s| matches!(s, Segment::Linear { .. })));
        for cut in &cuts {
            assert_eq!(cut.end().unwrap().y, Coord::Resolved(0.0));
        }
        assert_eq!(cuts[17].end(), Some(&Point3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_unsupported_letter_skips_line() {
        let output = parse_in("G0 X1 A5\nG0 X2");
        assert_eq!(output.warnings, vec![ParseWarning::UnsupportedCode('A', 1)]);
        let moves = motion(&output);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].end().unwrap().x, Coord::Resolved(2.0));
    }

    #[test]
    fn test_unsupported_gcode_skips_line() {
        let output = parse_in("G92 X0 Y0\nG38.2 Z-1 F5\nG0 X1");
        assert_eq!(
            output.warnings,
            vec![
                ParseWarning::UnsupportedGCode {
                    code: "G92".to_string(),
                    line: 1
                },
                ParseWarning::UnsupportedGCode {
                    code: "G38.2".to_string(),
                    line: 2
                },
            ]
        );
        assert_eq!(motion(&output).len(), 1);
    }

    #[test]
    fn test_units_convert_to_working_unit() {
        let units = ProgramUnits::new(LinearUnit::Millimetre);
        let output = parse("G20\nG1 X1 F10", units, &ParseOptions::default(), None).unwrap();
        let cut = &output.segments[0];
        assert!(approx(cut.end().unwrap().x, 25.4));
        assert!((cut.feed().unwrap() - 254.0).abs() < 1e-9);
    }

    #[test]
    fn test_incremental_moves() {
        let output = parse_in("G0 X0 Y0 Z0\nG91\nG1 X1 Y2 F10\nG1 X1\nG90\nG1 X0");
        let ends: Vec<Point3> = motion(&output).iter().map(|s| *s.end().unwrap()).collect();
        assert_eq!(ends[1], Point3::new(1.0, 2.0, 0.0));
        assert_eq!(ends[2], Point3::new(2.0, 2.0, 0.0));
        assert_eq!(ends[3], Point3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_absolute_arc_centers() {
        let output = parse_in("G0 X2 Y2 Z0\nG90.1\nG3 X2 Y6 I2 J4 F10");
        match &output.segments[1] {
            Segment::Arc { center, .. } => assert_eq!(*center, Point3::new(2.0, 4.0, 0.0)),
            other => panic!("expected arc, got {:?}", other),
        }
    }

    #[test]
    fn test_variables_and_expressions() {
        let output = parse_in("#1 = 5\n#<depth> = -0.1\nG0 X#1 Y[#1 * 2] Z#<depth>");
        assert_eq!(
            motion(&output)[0].end(),
            Some(&Point3::new(5.0, 10.0, -0.1))
        );
    }

    #[test]
    fn test_assignment_applies_after_line() {
        let output = parse_in("#1 = 1\n#1 = 2 G0 X#1\nG0 X#1");
        let ends: Vec<Coord> = motion(&output)
            .iter()
            .map(|s| s.end().unwrap().x)
            .collect();
        assert_eq!(ends, vec![Coord::Resolved(1.0), Coord::Resolved(2.0)]);
    }

    #[test]
    fn test_undefined_variable_skips_line() {
        let output = parse_in("G0 X#7\nG0 X1");
        assert_eq!(
            output.warnings,
            vec![ParseWarning::UndefinedVariable {
                name: "7".to_string(),
                line: 1
            }]
        );
        assert_eq!(motion(&output).len(), 1);
    }

    #[test]
    fn test_unbalanced_brackets_are_fatal() {
        let err = parse(
            "G0 X0\nG0 X[1 + 2",
            ProgramUnits::default(),
            &ParseOptions::default(),
            None,
        )
        .unwrap_err();
        assert_eq!(err, ParseError::UnbalancedBrackets { line_number: 2 });

        let options = ParseOptions {
            skip_errors: true,
            ..ParseOptions::default()
        };
        let output = parse("G0 X0\nG0 X[1 + 2\nG0 X3", ProgramUnits::default(), &options, None)
            .unwrap();
        assert!(matches!(
            output.warnings[..],
            [ParseWarning::SkippedLine { line: 2, .. }]
        ));
        assert_eq!(motion(&output).len(), 2);
    }

    #[test]
    fn test_multi_turn_arc_is_fatal() {
        let err = parse(
            "G0 X0 Y0\nG2 X0 Y0 I1 P2",
            ProgramUnits::default(),
            &ParseOptions::default(),
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ParseError::MultiTurnArc {
                line_number: 2,
                turns: 2.0
            }
        );
    }

    #[test]
    fn test_end_of_program_stops_parsing() {
        let output = parse_in("G0 X0\nM5 M30\nG0 X5");
        assert_eq!(
            output.segments.last(),
            Some(&Segment::EndOfProgram)
        );
        assert_eq!(output.segments[1], Segment::Passthrough("M5".to_string()));
        assert_eq!(motion(&output).len(), 1);
    }

    #[test]
    fn test_comments_and_passthrough() {
        let output = parse_in("G0 X0 (start) ; rapid\nM3 S12000\nT1 M6\nG4 P1.5\n(broken");
        assert_eq!(
            output.segments,
            vec![
                Segment::Comment("start".to_string()),
                Segment::Comment("rapid".to_string()),
                Segment::Rapid {
                    from: Point3::UNRESOLVED,
                    to: Point3 {
                        x: Coord::Resolved(0.0),
                        ..Point3::UNRESOLVED
                    },
                },
                Segment::Passthrough("M3 S12000".to_string()),
                Segment::Passthrough("T1 M6".to_string()),
                Segment::Passthrough("G4 P1.5".to_string()),
            ]
        );
        assert_eq!(output.warnings, vec![ParseWarning::BadComment(5)]);
    }

    #[test]
    fn test_percent_lines_are_ignored() {
        let output = parse_in("%\nG0 X1\n%");
        assert_eq!(output.segments.len(), 1);
    }

    #[test]
    fn test_ambiguous_start_is_filled() {
        let output = parse_in("G0 X0 Y0\nG1 Z-0.1 F5\nG1 X1\nG0 Z0.5");
        assert_eq!(output.warnings, vec![ParseWarning::AmbiguousStart(vec!['Z'])]);
        let plunge = &output.segments[1];
        assert_eq!(plunge.start(), Some(&Point3::new(0.0, 0.0, -0.1)));
        assert_eq!(plunge.end(), Some(&Point3::new(0.0, 0.0, -0.1)));
        // the opening rapid is filled too
        assert_eq!(output.segments[0].end().unwrap().z, Coord::Resolved(-0.1));
    }

    #[test]
    fn test_axis_set_after_first_cut_is_filled() {
        let output = parse_in("G0 X0 Y0\nG1 X1 F5\nG0 Z1\nM2");
        assert_eq!(output.warnings, vec![ParseWarning::AmbiguousStart(vec!['Z'])]);
        let cut = &output.segments[1];
        assert_eq!(cut.start(), Some(&Point3::new(0.0, 0.0, 1.0)));
        assert_eq!(cut.end(), Some(&Point3::new(1.0, 0.0, 1.0)));
    }

    #[test]
    fn test_resolved_program_has_no_ambiguity() {
        let output = parse_in("G0 X0 Y0 Z0\nG1 X1 F5\nG0 Z1\nM2");
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_progress_reports_completion() {
        let seen = Arc::new(AtomicU64::new(0));
        let sink = seen.clone();
        let callback: ProgressCallback = Box::new(move |done, total| {
            assert!(done <= total);
            sink.store(done, Ordering::SeqCst);
        });
        let text = "G0 X0\n".repeat(50);
        parse(&text, ProgramUnits::default(), &ParseOptions::default(), Some(&callback)).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 50);
    }
}
