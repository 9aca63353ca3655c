//! Probe data file reader
//!
//! One `X Y Z` triple per line, separated by commas or whitespace. Axis
//! letters are ignored so controller dumps like `X1.0 Y2.0 Z-0.01` read
//! as well. `#` and `//` start comments.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{CamToolResult, ProbeError, ProbeResult};

fn axis_letters() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[XYZABCxyzabc]").expect("invalid regex pattern"))
}

/// Parse probe points from the text of a data file
pub fn read_probe_data(text: &str) -> ProbeResult<Vec<(f64, f64, f64)>> {
    let mut points = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = strip_comment(raw);
        let line = axis_letters().replace_all(line, " ");
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = if line.contains(',') {
            line.split(',').map(str::trim).collect()
        } else {
            line.split_whitespace().collect()
        };
        if fields.len() < 3 {
            return Err(ProbeError::MalformedRow {
                line: line_number,
                reason: format!("expected 3 values, found {}", fields.len()),
            });
        }

        let mut values = [0.0; 3];
        for (slot, field) in values.iter_mut().zip(&fields) {
            *slot = field.parse::<f64>().map_err(|_| ProbeError::MalformedRow {
                line: line_number,
                reason: format!("'{}' is not a number", field),
            })?;
        }
        points.push((values[0], values[1], values[2]));
    }

    if points.is_empty() {
        return Err(ProbeError::NoProbeData);
    }
    tracing::debug!(points = points.len(), "Read probe data");
    Ok(points)
}

/// Read and parse a probe data file
pub fn read_probe_file(path: impl AsRef<Path>) -> CamToolResult<Vec<(f64, f64, f64)>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    Ok(read_probe_data(&text)?)
}

fn strip_comment(line: &str) -> &str {
    let end = [line.find('#'), line.find("//")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..end]
}
