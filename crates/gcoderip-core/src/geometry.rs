//! Geometry primitives
//!
//! Coordinates may be [`Coord::Unresolved`] when the program never
//! established that axis before using it. Helpers here only ever combine
//! resolved values; an unresolved input produces an unresolved output.

use serde::{Deserialize, Serialize};

use crate::segment::ArcDirection;

/// Values closer than this are treated as equal
pub const ZERO: f64 = 1e-7;

/// A single axis value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Coord {
    /// A known position
    Resolved(f64),
    /// Never set by the program
    Unresolved,
}

impl Default for Coord {
    fn default() -> Self {
        Self::Unresolved
    }
}

impl From<f64> for Coord {
    fn from(value: f64) -> Self {
        Self::Resolved(value)
    }
}

impl Coord {
    /// The value if resolved
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Resolved(v) => Some(v),
            Self::Unresolved => None,
        }
    }

    /// Check if this coordinate holds a value
    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// The value, or `default` if unresolved
    pub fn unwrap_or(self, default: f64) -> f64 {
        self.value().unwrap_or(default)
    }

    /// Apply `f` to a resolved value
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Self::Resolved(v) => Self::Resolved(f(v)),
            Self::Unresolved => Self::Unresolved,
        }
    }

    /// Interpolate towards `other`; unresolved if either end is
    pub fn lerp(self, other: Self, t: f64) -> Self {
        match (self, other) {
            (Self::Resolved(a), Self::Resolved(b)) => Self::Resolved(lerp(a, b, t)),
            _ => Self::Unresolved,
        }
    }
}

/// A point in machine space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: Coord,
    pub y: Coord,
    pub z: Coord,
}

impl Point3 {
    /// A point with every axis unresolved
    pub const UNRESOLVED: Point3 = Point3 {
        x: Coord::Unresolved,
        y: Coord::Unresolved,
        z: Coord::Unresolved,
    };

    /// Create a fully resolved point
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Coord::Resolved(x),
            y: Coord::Resolved(y),
            z: Coord::Resolved(z),
        }
    }

    /// Axis accessor by index (0 = X, 1 = Y, 2 = Z)
    pub fn axis(&self, index: usize) -> Coord {
        match index {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Mutable axis accessor by index (0 = X, 1 = Y, 2 = Z)
    pub fn axis_mut(&mut self, index: usize) -> &mut Coord {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => &mut self.z,
        }
    }

    /// X and Y if both are resolved
    pub fn xy(&self) -> Option<(f64, f64)> {
        Some((self.x.value()?, self.y.value()?))
    }

    /// Check if every axis is resolved
    pub fn is_resolved(&self) -> bool {
        self.x.is_resolved() && self.y.is_resolved() && self.z.is_resolved()
    }

    /// Planar distance, if both points have X and Y
    pub fn distance_xy(&self, other: &Point3) -> Option<f64> {
        let (x0, y0) = self.xy()?;
        let (x1, y1) = other.xy()?;
        Some((x1 - x0).hypot(y1 - y0))
    }

    /// Distance over the axes resolved in both points
    pub fn distance(&self, other: &Point3) -> f64 {
        (0..3)
            .filter_map(|i| Some(other.axis(i).value()? - self.axis(i).value()?))
            .map(|d| d * d)
            .sum::<f64>()
            .sqrt()
    }

    /// Point at fraction `t` of the way to `other`
    pub fn lerp(&self, other: &Point3, t: f64) -> Point3 {
        Point3 {
            x: self.x.lerp(other.x, t),
            y: self.y.lerp(other.y, t),
            z: self.z.lerp(other.z, t),
        }
    }

    /// Apply `f` to every resolved axis value
    pub fn map(&self, f: impl Fn(usize, f64) -> f64) -> Point3 {
        Point3 {
            x: self.x.map(|v| f(0, v)),
            y: self.y.map(|v| f(1, v)),
            z: self.z.map(|v| f(2, v)),
        }
    }

    /// Rotate X/Y about the origin by `angle_deg`
    ///
    /// A point missing X or Y cannot be rotated; both become unresolved
    /// unless the angle is zero.
    pub fn rotated_xy(&self, angle_deg: f64) -> Point3 {
        if angle_deg.abs() < ZERO {
            return *self;
        }
        match self.xy() {
            Some((x, y)) => {
                let (rx, ry) = rotate_xy(x, y, angle_deg);
                Point3 {
                    x: Coord::Resolved(rx),
                    y: Coord::Resolved(ry),
                    z: self.z,
                }
            }
            None => Point3 {
                x: Coord::Unresolved,
                y: Coord::Unresolved,
                z: self.z,
            },
        }
    }
}

/// Active arc plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plane {
    /// G17
    Xy,
    /// G18
    Zx,
    /// G19
    Yz,
}

impl Default for Plane {
    fn default() -> Self {
        Self::Xy
    }
}

impl Plane {
    /// Axis indices `(first, second, normal)` of the plane
    pub fn axes(self) -> (usize, usize, usize) {
        match self {
            Self::Xy => (0, 1, 2),
            Self::Zx => (2, 0, 1),
            Self::Yz => (1, 2, 0),
        }
    }
}

/// Linear interpolation that is exact at both ends
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    if a == b {
        return a;
    }
    a * (1.0 - t) + b * t
}

/// Rotate `(x, y)` about the origin by `angle_deg` counter-clockwise
pub fn rotate_xy(x: f64, y: f64, angle_deg: f64) -> (f64, f64) {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Polar angle of `(x, y)` in degrees, normalized to `[0, 360)`
pub fn angle_deg(x: f64, y: f64) -> f64 {
    let a = y.atan2(x).to_degrees();
    if a < 0.0 {
        a + 360.0
    } else if a >= 360.0 {
        a - 360.0
    } else {
        a
    }
}

/// Angle swept by an arc travelling in `dir`, in degrees within `(0, 360]`
///
/// Coincident start and end describe a full circle.
pub fn arc_sweep(from: (f64, f64), to: (f64, f64), center: (f64, f64), dir: ArcDirection) -> f64 {
    let a0 = angle_deg(from.0 - center.0, from.1 - center.1);
    let a1 = angle_deg(to.0 - center.0, to.1 - center.1);
    let raw = match dir {
        ArcDirection::Ccw => a1 - a0,
        ArcDirection::Cw => a0 - a1,
    };
    let sweep = raw.rem_euclid(360.0);
    if sweep < ZERO || 360.0 - sweep < ZERO {
        360.0
    } else {
        sweep
    }
}

/// Axis-aligned extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub max_z: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBox {
    /// An empty box
    pub fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            min_z: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
            max_z: f64::NEG_INFINITY,
        }
    }

    /// A planar box with zero Z extent
    pub fn from_xy(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            min_z: 0.0,
            max_x,
            max_y,
            max_z: 0.0,
        }
    }

    /// Check if no X/Y extent has been recorded
    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    pub fn include_x(&mut self, x: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
    }

    pub fn include_y(&mut self, y: f64) {
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    pub fn include_z(&mut self, z: f64) {
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    /// Extend by the resolved axes of a point
    pub fn include(&mut self, p: &Point3) {
        if let Some(x) = p.x.value() {
            self.include_x(x);
        }
        if let Some(y) = p.y.value() {
            self.include_y(y);
        }
        if let Some(z) = p.z.value() {
            self.include_z(z);
        }
    }

    /// Extend by an XY arc, including the quadrant points it passes through
    pub fn include_arc(&mut self, from: &Point3, to: &Point3, center: &Point3, dir: ArcDirection) {
        self.include(from);
        self.include(to);
        let (Some(s), Some(e), Some(c)) = (from.xy(), to.xy(), center.xy()) else {
            return;
        };
        let radius = (s.0 - c.0).hypot(s.1 - c.1);
        let start = angle_deg(s.0 - c.0, s.1 - c.1);
        let sweep = arc_sweep(s, e, c, dir);
        for quadrant in [0.0_f64, 90.0, 180.0, 270.0] {
            let offset = match dir {
                ArcDirection::Ccw => (quadrant - start).rem_euclid(360.0),
                ArcDirection::Cw => (start - quadrant).rem_euclid(360.0),
            };
            if offset <= sweep {
                let (qx, qy) = rotate_xy(radius, 0.0, quadrant);
                self.include_x(c.0 + qx);
                self.include_y(c.1 + qy);
            }
        }
    }

    /// Union with another box
    pub fn merge(&mut self, other: &BoundingBox) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.min_z = self.min_z.min(other.min_z);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
        self.max_z = self.max_z.max(other.max_z);
    }

    /// The box shifted by subtracting an offset
    pub fn translated(&self, dx: f64, dy: f64, dz: f64) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x - dx,
            min_y: self.min_y - dy,
            min_z: self.min_z - dz,
            max_x: self.max_x - dx,
            max_y: self.max_y - dy,
            max_z: self.max_z - dz,
        }
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_x - self.min_x
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_y - self.min_y
        }
    }
}
