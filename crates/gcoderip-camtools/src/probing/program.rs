//! Probing program generation

use serde::{Deserialize, Serialize};

use super::grid::ProbeGrid;
use crate::error::ProbeResult;
use gcoderip_core::{BoundingBox, Coord, Point3, Segment};

/// First variable number used to store probe results
pub const PROBE_VARIABLE_BASE: usize = 500;

/// Variable holding the highest probed Z
const MAX_HEIGHT_VARIABLE: usize = 499;

/// Controller the probing program is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeDialect {
    LinuxCnc,
    Mach3,
    Mach4,
    Ddcs,
}

impl Default for ProbeDialect {
    fn default() -> Self {
        Self::LinuxCnc
    }
}

impl ProbeDialect {
    /// Straight probe command
    pub fn probe_word(self) -> &'static str {
        match self {
            Self::LinuxCnc => "G38.2",
            Self::Mach3 | Self::Mach4 => "G31",
            Self::Ddcs => "G01",
        }
    }

    /// Variable the controller leaves the probed Z in
    pub fn result_variable(self) -> &'static str {
        match self {
            Self::LinuxCnc => "#5422",
            Self::Mach3 => "#2002",
            Self::Mach4 => "#5063",
            Self::Ddcs => "#701",
        }
    }

    /// Lines that start recording probe points to a file
    fn open_record(self) -> Vec<Segment> {
        match self {
            Self::LinuxCnc => vec![Segment::Comment("PROBEOPEN probe_points.txt".to_string())],
            Self::Mach3 | Self::Mach4 => vec![Segment::Passthrough("M40".to_string())],
            Self::Ddcs => vec![Segment::Passthrough("ClearCoords[0]".to_string())],
        }
    }

    fn close_record(self) -> Vec<Segment> {
        match self {
            Self::LinuxCnc => vec![Segment::Comment("PROBECLOSE".to_string())],
            Self::Mach3 | Self::Mach4 => vec![Segment::Passthrough("M41".to_string())],
            Self::Ddcs => Vec::new(),
        }
    }

    /// Lines around one probe move
    fn probe_move(self, z: f64, feed: f64, record: bool) -> Vec<Segment> {
        let probe = Segment::Passthrough(format!(
            "{} Z{} F{}",
            self.probe_word(),
            format_value(z),
            format_value(feed)
        ));
        match self {
            Self::Ddcs => {
                let mut lines = vec![Segment::Passthrough("M101".to_string()), probe];
                lines.push(Segment::Passthrough("M102".to_string()));
                lines.push(Segment::Passthrough("G04P0".to_string()));
                if record {
                    lines.push(Segment::Passthrough(
                        "RecordCoords[0,#699,#700,#701,#702]".to_string(),
                    ));
                }
                lines
            }
            _ => vec![probe],
        }
    }
}

/// Parameters for [`build_probe_program`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeOptions {
    /// Height for moves between probe points
    pub safe_z: f64,
    pub probe_feed: f64,
    /// Lowest Z a probe move may reach
    pub probe_depth: f64,
    /// Probe tip position relative to the spindle
    pub offset: (f64, f64, f64),
    pub dialect: ProbeDialect,
    /// Probe every node instead of only those near the path
    pub all_points: bool,
    /// End after probing instead of pausing for the cut
    pub probe_only: bool,
    /// Ask the controller to write the probed points to a file
    pub record_points: bool,
    /// Lines emitted before probing starts
    pub preamble: Vec<String>,
    /// Lines emitted after probing, before the pause
    pub pause_codes: Vec<String>,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            safe_z: 0.04,
            probe_feed: 5.0,
            probe_depth: -0.25,
            offset: (0.0, 0.0, 0.0),
            dialect: ProbeDialect::LinuxCnc,
            all_points: false,
            probe_only: false,
            record_points: false,
            preamble: Vec::new(),
            pause_codes: vec!["M5".to_string()],
        }
    }
}

/// One grid node and whether it gets probed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbePoint {
    /// Row-major node index
    pub index: usize,
    pub x: f64,
    pub y: f64,
    /// Touched by the path, or forced by `all_points`
    pub needed: bool,
    /// Variable the probed height is stored in
    pub variable: usize,
}

/// A probing program and the grid it measures
#[derive(Debug, Clone)]
pub struct ProbeProgram {
    pub grid: ProbeGrid,
    pub points: Vec<ProbePoint>,
    pub segments: Vec<Segment>,
}

impl ProbeProgram {
    /// Number of points the program probes
    pub fn probe_count(&self) -> usize {
        self.points.iter().filter(|p| p.needed).count()
    }
}

/// Build a probing program over `bbox` for the given cut path
///
/// A node is probed when it is a corner of a cell any point of the path
/// falls in. Paths are sampled at the grid spacing so long moves mark every
/// cell they cross.
pub fn build_probe_program(
    segments: &[Segment],
    bbox: &BoundingBox,
    nx: usize,
    ny: usize,
    options: &ProbeOptions,
) -> ProbeResult<ProbeProgram> {
    let grid = ProbeGrid::over_bbox(bbox, nx, ny)?;
    let needed = touched_nodes(segments, &grid, options.all_points);
    let points: Vec<ProbePoint> = (0..grid.len())
        .map(|index| {
            let (x, y) = grid.node(index);
            ProbePoint {
                index,
                x,
                y,
                needed: needed[index],
                variable: PROBE_VARIABLE_BASE + index,
            }
        })
        .collect();

    let (ox, oy, oz) = options.offset;
    let dialect = options.dialect;
    let travel_z = options.safe_z.max(options.safe_z + oz);
    let mut out = vec![Segment::Passthrough("G90".to_string())];
    out.extend(options.preamble.iter().cloned().map(Segment::Passthrough));
    if options.record_points {
        out.extend(dialect.open_record());
    }

    let mut pos = Point3::UNRESOLVED;
    let up = Point3 { z: Coord::Resolved(travel_z), ..pos };
    rapid(&mut out, &mut pos, up);

    let initial = match dialect {
        ProbeDialect::LinuxCnc => options.probe_depth,
        _ => options.safe_z,
    };
    out.push(Segment::Passthrough(format!(
        "#{} = {}",
        MAX_HEIGHT_VARIABLE,
        format_value(initial)
    )));

    let mut last_xy = None;
    for point in points.iter().filter(|p| p.needed) {
        rapid(&mut out, &mut pos, Point3::new(point.x + ox, point.y + oy, travel_z));
        out.extend(dialect.probe_move(
            options.probe_depth + oz,
            options.probe_feed,
            options.record_points,
        ));
        if !options.probe_only {
            let result = dialect.result_variable();
            let value = if oz == 0.0 {
                result.to_string()
            } else {
                format!("[{}-{}]", result, format_value(oz))
            };
            out.push(Segment::Passthrough(format!("#{} = {}", point.variable, value)));
            if dialect == ProbeDialect::LinuxCnc {
                out.push(Segment::Passthrough(format!(
                    "#{m}= [ [[#{v} GE #{m}]*#{v}] + [[#{v} LT #{m}]*#{m}] ]",
                    m = MAX_HEIGHT_VARIABLE,
                    v = point.variable
                )));
            }
        }
        rapid(
            &mut out,
            &mut pos,
            Point3::new(point.x + ox, point.y + oy, options.safe_z + oz),
        );
        last_xy = Some((point.x + ox, point.y + oy));
    }

    let up = Point3 { z: Coord::Resolved(travel_z), ..pos };
    rapid(&mut out, &mut pos, up);
    if let Some((x, y)) = last_xy {
        rapid(&mut out, &mut pos, Point3::new(x, y, travel_z));
    }
    if options.record_points {
        out.extend(dialect.close_record());
    }
    out.extend(options.pause_codes.iter().cloned().map(Segment::Passthrough));
    if options.probe_only {
        out.push(Segment::EndOfProgram);
    } else {
        out.push(Segment::Passthrough("M0 (PAUSE PROGRAM)".to_string()));
    }

    let program = ProbeProgram {
        grid,
        points,
        segments: out,
    };
    tracing::debug!(
        nodes = program.points.len(),
        probed = program.probe_count(),
        dialect = ?dialect,
        "Built probe program"
    );
    Ok(program)
}

fn rapid(out: &mut Vec<Segment>, pos: &mut Point3, to: Point3) {
    out.push(Segment::Rapid { from: *pos, to });
    *pos = to;
}

/// Mark the corners of every cell the path passes through
fn touched_nodes(segments: &[Segment], grid: &ProbeGrid, all: bool) -> Vec<bool> {
    let mut needed = vec![all; grid.len()];
    if all {
        return needed;
    }
    let step = grid.dx.min(grid.dy);
    let mut mark = |p: &Point3| {
        if let Some((x, y)) = p.xy() {
            let cell = grid.locate(x, y);
            for corner in grid.cell_corners(cell.ix, cell.iy) {
                needed[corner] = true;
            }
        }
    };
    for segment in segments.iter().filter(|s| s.is_motion()) {
        let (Some(from), Some(to)) = (segment.start(), segment.end()) else {
            continue;
        };
        mark(from);
        let span = from.distance_xy(to).unwrap_or(0.0);
        let pieces = (span / step).ceil() as usize;
        for i in 1..pieces {
            mark(&from.lerp(to, i as f64 / pieces as f64));
        }
        mark(to);
    }
    needed
}

/// Four decimals with trailing zeros removed
fn format_value(value: f64) -> String {
    let text = format!("{:.4}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "" | "-" | "-0" => "0".to_string(),
        t => t.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::from_xy(0.0, 0.0, 10.0, 10.0)
    }

    fn corner_path() -> Vec<Segment> {
        vec![Segment::Linear {
            from: Point3::new(1.0, 1.0, -0.1),
            to: Point3::new(2.0, 2.0, -0.1),
            feed: 10.0,
        }]
    }

    fn passthrough(segments: &[Segment]) -> Vec<&str> {
        segments
            .iter()
            .filter_map(|s| match s {
                Segment::Passthrough(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_untouched_cells_are_skipped() {
        let program =
            build_probe_program(&corner_path(), &bbox(), 3, 3, &ProbeOptions::default()).unwrap();
        assert_eq!(program.probe_count(), 4);
        let probed: Vec<usize> = program
            .points
            .iter()
            .filter(|p| p.needed)
            .map(|p| p.index)
            .collect();
        assert_eq!(probed, vec![0, 1, 3, 4]);
        let lines = passthrough(&program.segments);
        assert_eq!(lines.iter().filter(|l| l.starts_with("G38.2")).count(), 4);
        assert!(lines.contains(&"#503 = #5422"));
        assert!(lines.contains(&"G38.2 Z-0.25 F5"));
        assert_eq!(lines.last(), Some(&"M0 (PAUSE PROGRAM)"));
    }

    #[test]
    fn test_long_moves_mark_crossed_cells() {
        let path = vec![Segment::Linear {
            from: Point3::new(1.0, 1.0, 0.0),
            to: Point3::new(9.0, 1.0, 0.0),
            feed: 1.0,
        }];
        let program = build_probe_program(&path, &bbox(), 5, 5, &ProbeOptions::default()).unwrap();
        // the bottom row of cells: 5 nodes on each of the first two rows
        assert_eq!(program.probe_count(), 10);
    }

    #[test]
    fn test_all_points_and_probe_only() {
        let options = ProbeOptions {
            all_points: true,
            probe_only: true,
            ..ProbeOptions::default()
        };
        let program = build_probe_program(&corner_path(), &bbox(), 3, 3, &options).unwrap();
        assert_eq!(program.probe_count(), 9);
        let lines = passthrough(&program.segments);
        assert!(!lines.iter().any(|l| l.starts_with("#5")));
        assert_eq!(program.segments.last(), Some(&Segment::EndOfProgram));
        assert_eq!(lines.last(), Some(&"M5"));
    }

    #[test]
    fn test_offset_and_mach_dialect() {
        let options = ProbeOptions {
            offset: (1.0, -1.0, 0.5),
            dialect: ProbeDialect::Mach3,
            record_points: true,
            ..ProbeOptions::default()
        };
        let program = build_probe_program(&corner_path(), &bbox(), 3, 3, &options).unwrap();
        let lines = passthrough(&program.segments);
        assert!(lines.contains(&"M40"));
        assert!(lines.contains(&"M41"));
        assert!(lines.contains(&"#500 = [#2002-0.5]"));
        assert!(lines.contains(&"G31 Z0.25 F5"));
        assert!(!lines.iter().any(|l| l.contains("GE")));
        let first_probe = program.segments.iter().find_map(|s| match s {
            Segment::Rapid { to, .. } if to.x.is_resolved() => Some(*to),
            _ => None,
        });
        let first_probe = first_probe.unwrap();
        assert_eq!((first_probe.x, first_probe.y), (Coord::Resolved(1.0), Coord::Resolved(-1.0)));
        assert!((first_probe.z.value().unwrap() - 0.54).abs() < 1e-12);
    }

    #[test]
    fn test_return_move_keeps_offset() {
        let options = ProbeOptions {
            offset: (1.0, -1.0, 0.5),
            ..ProbeOptions::default()
        };
        let program = build_probe_program(&corner_path(), &bbox(), 3, 3, &options).unwrap();
        let last_point = program.points.iter().rev().find(|p| p.needed).unwrap();
        let last_rapid = program.segments.iter().rev().find_map(|s| match s {
            Segment::Rapid { to, .. } => Some(*to),
            _ => None,
        });
        let last_rapid = last_rapid.unwrap();
        assert_eq!(last_rapid.x, Coord::Resolved(last_point.x + 1.0));
        assert_eq!(last_rapid.y, Coord::Resolved(last_point.y - 1.0));
    }

    #[test]
    fn test_ddcs_records_coordinates() {
        let options = ProbeOptions {
            dialect: ProbeDialect::Ddcs,
            record_points: true,
            probe_only: true,
            ..ProbeOptions::default()
        };
        let program = build_probe_program(&corner_path(), &bbox(), 3, 3, &options).unwrap();
        let lines = passthrough(&program.segments);
        assert_eq!(lines.iter().filter(|l| **l == "M101").count(), 4);
        assert_eq!(
            lines
                .iter()
                .filter(|l| l.starts_with("RecordCoords"))
                .count(),
            4
        );
        assert!(lines.contains(&"ClearCoords[0]"));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(5.0), "5");
        assert_eq!(format_value(-0.25), "-0.25");
        assert_eq!(format_value(-0.00001), "0");
        assert_eq!(format_value(0.04), "0.04");
    }
}
