//! Job pipeline
//!
//! One run reads a program, scales and rotates it, moves its origin and then
//! applies the configured operation. Each operation yields one or more
//! programs, written with the generator settings that fit them.

use anyhow::{Context, Result};
use std::path::Path;

use gcoderip_camtools::{
    apply_compensation, build_probe_program, cut_bounds, read_probe_file, round_stock,
    scale_rotate, split_by_line, translate, wrap_to_rotary, ProbeGrid, WrapOptions,
};
use gcoderip_core::{BoundingBox, ProgressCallback, Segment};
use gcoderip_generator::{generate, GenConfig};
use gcoderip_parser::{parse, ParseWarning};
use gcoderip_settings::{Config, Operation};

/// Which program of a job an output holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramKind {
    /// The transformed input
    Base,
    /// Part of the input left of the split line
    Left,
    /// Part of the input right of the split line
    Right,
    /// The input with an axis wrapped onto the rotary axis
    Wrapped,
    /// The probing program
    Probe,
    /// The input adjusted to probed heights
    Compensated,
    /// A stock rounding program
    Rounding,
}

impl ProgramKind {
    /// File name suffix for this program, appended to the input's stem
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Base => "_out",
            Self::Left => "_left",
            Self::Right => "_right",
            Self::Wrapped => "_wrapped",
            Self::Probe => "_probe",
            Self::Compensated => "_compensated",
            Self::Rounding => "_round",
        }
    }
}

/// A generated program
#[derive(Debug, Clone)]
pub struct Program {
    pub kind: ProgramKind,
    pub lines: Vec<String>,
}

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct JobOutput {
    pub operation: Operation,
    /// Cut bounds after scaling, rotation and origin placement
    pub bbox: BoundingBox,
    pub warnings: Vec<ParseWarning>,
    pub programs: Vec<Program>,
}

impl JobOutput {
    /// Lines of the program of the given kind, if the run produced one
    pub fn program(&self, kind: ProgramKind) -> Option<&[String]> {
        self.programs
            .iter()
            .find(|p| p.kind == kind)
            .map(|p| p.lines.as_slice())
    }

    fn push(&mut self, kind: ProgramKind, lines: Vec<String>) {
        tracing::debug!(?kind, lines = lines.len(), "Generated program");
        self.programs.push(Program { kind, lines });
    }
}

/// A configured pipeline run
pub struct Job {
    config: Config,
}

impl Job {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the job over the text of one program
    ///
    /// `progress` receives parser progress in lines. Stock rounding does not
    /// read the input.
    pub fn run(&self, text: &str, progress: Option<&ProgressCallback>) -> Result<JobOutput> {
        let config = &self.config;
        let mut output = JobOutput {
            operation: config.operation,
            bbox: BoundingBox::new(),
            warnings: Vec::new(),
            programs: Vec::new(),
        };

        if config.operation == Operation::Round {
            let segments =
                round_stock(&config.round).context("Failed to generate stock rounding program")?;
            let wrap = WrapOptions {
                stock_radius: config.round.stock_radius,
                axis: config.round.axis,
                target: config.round.target,
                ..WrapOptions::default()
            };
            let gen = GenConfig {
                axis_map: wrap.axis_map(),
                ..config.gen_config()
            };
            output.bbox = cut_bounds(&segments);
            output.push(ProgramKind::Rounding, generate(&segments, &gen));
            tracing::info!("Stock rounding program generated");
            return Ok(output);
        }

        let parsed =
            parse(text, config.units, &config.parse, progress).context("Failed to parse program")?;
        for warning in &parsed.warnings {
            tracing::warn!("{}", warning);
        }
        output.warnings = parsed.warnings;
        tracing::info!(segments = parsed.segments.len(), "Program parsed");

        let (segments, bbox) = self.place(&parsed.segments);
        output.bbox = bbox;
        tracing::debug!(
            min_x = bbox.min_x,
            min_y = bbox.min_y,
            max_x = bbox.max_x,
            max_y = bbox.max_y,
            "Transformed bounds"
        );

        let gen = config.gen_config();
        match config.operation {
            Operation::None | Operation::Round => {
                output.push(ProgramKind::Base, generate(&segments, &gen));
            }
            Operation::Split => self.split(&segments, &gen, &mut output),
            Operation::Wrap => {
                let wrapped = wrap_to_rotary(&segments, &config.wrap)
                    .context("Failed to wrap program onto the rotary axis")?;
                let gen = GenConfig {
                    axis_map: config.wrap.axis_map(),
                    ..gen
                };
                output.push(ProgramKind::Wrapped, generate(&wrapped, &gen));
            }
            Operation::Probe => self.probe(&segments, &bbox, &gen, &mut output)?,
        }

        tracing::info!(
            operation = %config.operation,
            programs = output.programs.len(),
            "Job finished"
        );
        Ok(output)
    }

    /// Scale, rotate and move the origin to the configured anchor
    fn place(&self, segments: &[Segment]) -> (Vec<Segment>, BoundingBox) {
        let t = &self.config.transform;
        let (segments, bbox) = if t.is_identity() {
            (segments.to_vec(), cut_bounds(segments))
        } else {
            let (sx, sy, sz, sf) = t.scale_factors();
            scale_rotate(segments, sx, sy, sz, sf, t.rotation)
        };

        let (dx, dy) = t.origin.offset(&bbox);
        if dx == 0.0 && dy == 0.0 {
            return (segments, bbox);
        }
        (translate(&segments, dx, dy, 0.0), bbox.translated(dx, dy, 0.0))
    }

    fn split(&self, segments: &[Segment], gen: &GenConfig, output: &mut JobOutput) {
        let t = &self.config.transform;
        let pivot = (t.split_pivot[0], t.split_pivot[1]);
        let mut halves = split_by_line(segments, pivot, t.split_angle, self.config.units.accuracy);
        if t.rotate_left {
            halves.left = scale_rotate(&halves.left, 1.0, 1.0, 1.0, 1.0, 180.0).0;
            let mut bbox = cut_bounds(&halves.left);
            bbox.merge(&cut_bounds(&halves.right));
            output.bbox = bbox;
        }
        // each half has gaps where the other half was cut out
        let gen = GenConfig {
            generate_rapids: true,
            ..gen.clone()
        };
        output.push(ProgramKind::Left, generate(&halves.left, &gen));
        output.push(ProgramKind::Right, generate(&halves.right, &gen));
    }

    fn probe(
        &self,
        segments: &[Segment],
        bbox: &BoundingBox,
        gen: &GenConfig,
        output: &mut JobOutput,
    ) -> Result<()> {
        let settings = &self.config.probe;
        let program = build_probe_program(segments, bbox, settings.nx, settings.ny, &settings.options)
            .context("Failed to build probing program")?;
        tracing::info!(
            probes = program.probe_count(),
            nodes = program.grid.len(),
            "Probing program built"
        );
        let probe_gen = GenConfig {
            generate_rapids: false,
            use_variables: false,
            ..gen.clone()
        };
        output.push(ProgramKind::Probe, generate(&program.segments, &probe_gen));

        if let Some(path) = &settings.data_file {
            let grid = load_grid(path, settings.options.offset)?;
            let compensated = apply_compensation(segments, &grid, &settings.compensation);
            output.push(ProgramKind::Compensated, generate(&compensated, gen));
        }
        Ok(())
    }
}

/// Read probe data and fit a grid to it, corrected by the probe offset
pub fn load_grid(path: &Path, offset: (f64, f64, f64)) -> Result<ProbeGrid> {
    let points = read_probe_file(path)
        .with_context(|| format!("Failed to read probe data from {}", path.display()))?;
    let grid = ProbeGrid::from_points(&points)
        .with_context(|| format!("Unusable probe data in {}", path.display()))?;
    let (dx, dy, dz) = offset;
    Ok(grid.with_offset(dx, dy, dz))
}
