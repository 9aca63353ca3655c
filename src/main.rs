use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use gcoderip::{init_logging, Config, Job, ProgressCallback, BUILD_DATE, VERSION};

const USAGE: &str = "usage: gcoderip <config.toml|config.json> <input.nc> [output-dir]";

fn main() -> Result<()> {
    init_logging()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("gcoderip {} ({})\n{}", VERSION, BUILD_DATE, USAGE);
        return Ok(());
    }
    let (config_path, input_path, out_dir) = match args.as_slice() {
        [config, input] => (PathBuf::from(config), PathBuf::from(input), None),
        [config, input, dir] => (
            PathBuf::from(config),
            PathBuf::from(input),
            Some(PathBuf::from(dir)),
        ),
        _ => bail!(USAGE),
    };

    tracing::info!("gcoderip {} ({})", VERSION, BUILD_DATE);
    let config = Config::load_from_file(&config_path)
        .with_context(|| format!("Failed to load configuration {}", config_path.display()))?;
    let text = std::fs::read_to_string(&input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))?;

    let progress: ProgressCallback = Box::new(|done, total| {
        tracing::debug!(done, total, "Parsing");
    });
    let output = Job::new(config).run(&text, Some(&progress))?;
    for warning in &output.warnings {
        eprintln!("warning: {}", warning);
    }

    let out_dir = match out_dir {
        Some(dir) => dir,
        None => input_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("program");
    let extension = input_path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("ngc");

    for program in &output.programs {
        let path = out_dir.join(format!("{}{}.{}", stem, program.kind.suffix(), extension));
        let mut body = program.lines.join("\n");
        body.push('\n');
        std::fs::write(&path, body)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), lines = program.lines.len(), "Wrote program");
    }

    Ok(())
}
