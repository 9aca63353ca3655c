//! Rectangular probe grid
//!
//! Heights are stored row-major (`iy * nx + ix`) and stay `None` until a
//! probe result arrives. Missing heights interpolate as zero.

use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, ProbeResult};
use gcoderip_core::{lerp, BoundingBox, ZERO};

/// Fractions this close to a cell edge snap onto it
const EDGE_SNAP: f64 = 1e-9;

/// Smallest spacing used when the probed area collapses on one axis
const MIN_SPACING: f64 = 0.001;

/// Grid of probe nodes and their measured heights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeGrid {
    /// Position of node (0, 0)
    pub origin: (f64, f64),
    pub nx: usize,
    pub ny: usize,
    pub dx: f64,
    pub dy: f64,
    /// Measured heights, row-major
    pub heights: Vec<Option<f64>>,
}

/// Cell containing a point plus the point's fractional position in it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellLocation {
    pub ix: usize,
    pub iy: usize,
    pub fx: f64,
    pub fy: f64,
}

impl ProbeGrid {
    /// Create an unprobed grid
    pub fn new(origin: (f64, f64), nx: usize, ny: usize, dx: f64, dy: f64) -> ProbeResult<Self> {
        if nx < 2 || ny < 2 {
            return Err(ProbeError::InvalidGrid(format!(
                "need at least 2x2 nodes, got {}x{}",
                nx, ny
            )));
        }
        if !(dx > 0.0 && dy > 0.0) {
            return Err(ProbeError::InvalidGrid(format!(
                "spacing must be positive, got {} x {}",
                dx, dy
            )));
        }
        Ok(Self {
            origin,
            nx,
            ny,
            dx,
            dy,
            heights: vec![None; nx * ny],
        })
    }

    /// Grid spanning a bounding box with `nx` by `ny` nodes
    pub fn over_bbox(bbox: &BoundingBox, nx: usize, ny: usize) -> ProbeResult<Self> {
        if bbox.is_empty() {
            return Err(ProbeError::InvalidGrid("bounding box is empty".to_string()));
        }
        let spacing = |extent: f64, n: usize| {
            let d = extent / (n.max(2) - 1) as f64;
            if d < ZERO {
                MIN_SPACING
            } else {
                d
            }
        };
        Self::new(
            (bbox.min_x, bbox.min_y),
            nx,
            ny,
            spacing(bbox.width(), nx),
            spacing(bbox.height(), ny),
        )
    }

    /// Flat index of node `(ix, iy)`
    pub fn index(&self, ix: usize, iy: usize) -> usize {
        iy * self.nx + ix
    }

    /// Position of the node with flat index `index`
    pub fn node(&self, index: usize) -> (f64, f64) {
        let ix = index % self.nx;
        let iy = index / self.nx;
        (
            self.origin.0 + ix as f64 * self.dx,
            self.origin.1 + iy as f64 * self.dy,
        )
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Record a probe result
    pub fn set_height(&mut self, index: usize, z: f64) -> ProbeResult<()> {
        let len = self.heights.len();
        let slot = self.heights.get_mut(index).ok_or_else(|| {
            ProbeError::InvalidGrid(format!("node {} outside grid of {} nodes", index, len))
        })?;
        *slot = Some(z);
        Ok(())
    }

    pub fn height(&self, ix: usize, iy: usize) -> Option<f64> {
        self.heights.get(self.index(ix, iy)).copied().flatten()
    }

    /// Highest measured node
    pub fn max_height(&self) -> Option<f64> {
        self.heights.iter().flatten().copied().reduce(f64::max)
    }

    /// Locate the cell for `(x, y)`; points outside clamp to the edge cells
    pub fn locate(&self, x: f64, y: f64) -> CellLocation {
        let axis = |v: f64, origin: f64, d: f64, n: usize| {
            let rel = (v - origin) / d;
            let i = (rel.floor().max(0.0) as usize).min(n - 2);
            let mut f = (rel - i as f64).clamp(0.0, 1.0);
            if f < EDGE_SNAP {
                f = 0.0;
            } else if f > 1.0 - EDGE_SNAP {
                f = 1.0;
            }
            (i, f)
        };
        let (ix, fx) = axis(x, self.origin.0, self.dx, self.nx);
        let (iy, fy) = axis(y, self.origin.1, self.dy, self.ny);
        CellLocation { ix, iy, fx, fy }
    }

    /// Flat indices of the four corners of cell `(ix, iy)`
    pub fn cell_corners(&self, ix: usize, iy: usize) -> [usize; 4] {
        [
            self.index(ix, iy),
            self.index(ix + 1, iy),
            self.index(ix, iy + 1),
            self.index(ix + 1, iy + 1),
        ]
    }

    /// Bilinear height correction at `(x, y)`
    pub fn interpolate(&self, x: f64, y: f64) -> f64 {
        let cell = self.locate(x, y);
        let z = |ix, iy| self.height(ix, iy).unwrap_or(0.0);
        let z00 = z(cell.ix, cell.iy);
        let z10 = z(cell.ix + 1, cell.iy);
        let z01 = z(cell.ix, cell.iy + 1);
        let z11 = z(cell.ix + 1, cell.iy + 1);
        lerp(lerp(z00, z10, cell.fx), lerp(z01, z11, cell.fx), cell.fy)
    }

    /// Shift the grid by a probe offset: nodes move by `-(dx, dy)`, heights by `-dz`
    pub fn with_offset(mut self, dx: f64, dy: f64, dz: f64) -> Self {
        self.origin = (self.origin.0 - dx, self.origin.1 - dy);
        for h in self.heights.iter_mut().flatten() {
            *h -= dz;
        }
        self
    }

    /// Fit a uniform grid to scattered probe points
    ///
    /// The spacing on each axis is the smallest gap between sorted
    /// coordinates that exceeds 1/100 of the extent. Each node takes the
    /// height of the nearest point.
    pub fn from_points(points: &[(f64, f64, f64)]) -> ProbeResult<Self> {
        if points.is_empty() {
            return Err(ProbeError::NoProbeData);
        }
        let (min_x, max_x, step_x) = axis_spacing(points.iter().map(|p| p.0).collect())?;
        let (min_y, max_y, step_y) = axis_spacing(points.iter().map(|p| p.1).collect())?;
        let nx = 1 + ((max_x - min_x) / step_x).round() as usize;
        let ny = 1 + ((max_y - min_y) / step_y).round() as usize;

        let mut grid = Self::new((min_x, min_y), nx, ny, step_x, step_y)?;
        for index in 0..grid.len() {
            let (x, y) = grid.node(index);
            let nearest = points
                .iter()
                .min_by(|a, b| {
                    let da = (a.0 - x).powi(2) + (a.1 - y).powi(2);
                    let db = (b.0 - x).powi(2) + (b.1 - y).powi(2);
                    da.total_cmp(&db)
                })
                .map(|p| p.2);
            grid.heights[index] = nearest;
        }
        tracing::debug!(nx, ny, dx = step_x, dy = step_y, "Regularized probe data");
        Ok(grid)
    }
}

fn axis_spacing(mut values: Vec<f64>) -> ProbeResult<(f64, f64, f64)> {
    values.sort_by(f64::total_cmp);
    let (min, max) = match (values.first(), values.last()) {
        (Some(&min), Some(&max)) => (min, max),
        _ => return Err(ProbeError::NoProbeData),
    };
    let extent = max - min;
    if extent < ZERO {
        return Err(ProbeError::InvalidGrid(
            "probe points do not span both X and Y".to_string(),
        ));
    }
    let threshold = extent / 100.0;
    let step = values
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > threshold)
        .fold(extent, f64::min);
    Ok((min, max, step))
}
