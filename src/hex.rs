//! Hex grid geometry - axial coordinates, pixel conversion and toroidal wrap

use std::fmt;

use serde::{Deserialize, Serialize};

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Default radius of a hex in pixels.
pub const DEFAULT_HEX_SIZE: f64 = 30.0;

/// Axial hex coordinate. The cube component `s` is always derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Cube triple `(q, r, s)`; always sums to zero.
    pub const fn to_cube(&self) -> (i32, i32, i32) {
        (self.q, self.r, self.s())
    }

    /// Offset column of this hex in the rectangular map layout.
    pub fn column(&self) -> i32 {
        self.q + self.r.div_euclid(2)
    }

    pub fn neighbors(&self) -> [HexCoord; 6] {
        [
            HexCoord::new(self.q + 1, self.r),
            HexCoord::new(self.q + 1, self.r - 1),
            HexCoord::new(self.q, self.r - 1),
            HexCoord::new(self.q - 1, self.r),
            HexCoord::new(self.q - 1, self.r + 1),
            HexCoord::new(self.q, self.r + 1),
        ]
    }

    /// Distance in hex steps, ignoring wrap.
    pub fn distance(&self, other: &HexCoord) -> i32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        (dq + dr + ds) / 2
    }

    /// Textual key in the `"q,r"` form used by persisted snapshots.
    pub fn key(&self) -> String {
        format!("{},{}", self.q, self.r)
    }

    pub fn parse_key(key: &str) -> Option<Self> {
        let (q, r) = key.split_once(',')?;
        Some(Self::new(q.trim().parse().ok()?, r.trim().parse().ok()?))
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.q, self.r, self.s())
    }
}

/// Continuous position in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Pointy-top hex layout with a fixed radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub size: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(DEFAULT_HEX_SIZE)
    }
}

impl Layout {
    pub const fn new(size: f64) -> Self {
        Self { size }
    }

    /// Horizontal distance between neighbouring hex centres in a row.
    pub fn horizontal_pitch(&self) -> f64 {
        SQRT_3 * self.size
    }

    /// Vertical distance between rows.
    pub fn vertical_pitch(&self) -> f64 {
        1.5 * self.size
    }

    pub fn axial_to_pixel(&self, coord: HexCoord) -> Point {
        let q = f64::from(coord.q);
        let r = f64::from(coord.r);
        Point {
            x: self.size * (SQRT_3 * q + SQRT_3 / 2.0 * r),
            y: self.size * (1.5 * r),
        }
    }

    pub fn pixel_to_axial(&self, point: Point) -> HexCoord {
        let q = (SQRT_3 / 3.0 * point.x - point.y / 3.0) / self.size;
        let r = (2.0 / 3.0 * point.y) / self.size;
        hex_round(q, r)
    }
}

/// Rounds fractional axial coordinates to the nearest hex.
///
/// Rounding q, r and s independently can break `q + r + s = 0`, so the
/// component with the largest rounding error is rebuilt from the other two.
pub fn hex_round(q: f64, r: f64) -> HexCoord {
    let s = -q - r;
    let mut rq = q.round();
    let mut rr = r.round();
    let rs = s.round();

    let q_diff = (rq - q).abs();
    let r_diff = (rr - r).abs();
    let s_diff = (rs - s).abs();

    if q_diff > r_diff && q_diff > s_diff {
        rq = -rr - rs;
    } else if r_diff > s_diff {
        rr = -rq - rs;
    }
    HexCoord::new(rq as i32, rr as i32)
}

/// Folds `value` into `[-period/2, period/2)`.
pub fn wrap_fold(value: f64, period: f64) -> f64 {
    if period <= 0.0 {
        return value;
    }
    let half = period / 2.0;
    let folded = (value + half).rem_euclid(period) - half;
    // rem_euclid can round up to exactly `period` for tiny negative inputs
    if folded >= half {
        folded - period
    } else {
        folded
    }
}

/// The periodic extent of a generated map.
///
/// Wrap is exact in pixel space when `height` is even; odd heights shift the
/// row parity across the seam.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Torus {
    layout: Layout,
    width: u32,
    height: u32,
}

impl Torus {
    pub fn new(layout: Layout, width: u32, height: u32) -> Self {
        Self {
            layout,
            width,
            height,
        }
    }

    pub fn period_x(&self) -> f64 {
        f64::from(self.width) * self.layout.horizontal_pitch()
    }

    pub fn period_y(&self) -> f64 {
        f64::from(self.height) * self.layout.vertical_pitch()
    }

    /// The image of `point` closest to `reference`.
    pub fn nearest_image(&self, point: Point, reference: Point) -> Point {
        Point {
            x: reference.x + wrap_fold(point.x - reference.x, self.period_x()),
            y: reference.y + wrap_fold(point.y - reference.y, self.period_y()),
        }
    }

    /// Straight-line distance between the closest images of two points.
    pub fn distance(&self, a: Point, b: Point) -> f64 {
        a.distance(self.nearest_image(b, a))
    }

    /// Shift that moves `point` into the canonical pixel window of the map.
    ///
    /// The window starts a little before the first hex centre on each axis
    /// so every tile centre, odd rows included, lies inside it.
    pub fn normalizing_shift(&self, point: Point) -> Point {
        let origin_x = -self.layout.horizontal_pitch() / 4.0;
        let origin_y = -self.layout.vertical_pitch() / 2.0;
        Point {
            x: shift_into(point.x, origin_x, self.period_x()),
            y: shift_into(point.y, origin_y, self.period_y()),
        }
    }

    pub fn normalize(&self, point: Point) -> Point {
        let shift = self.normalizing_shift(point);
        Point::new(point.x + shift.x, point.y + shift.y)
    }

    /// Folds an axial coordinate back into the generated offset region.
    pub fn wrap_coord(&self, coord: HexCoord) -> HexCoord {
        if self.width == 0 || self.height == 0 {
            return coord;
        }
        let height = self.height as i32;
        let width = self.width as i32;
        let row = coord.r.rem_euclid(height);
        let column = coord.column().rem_euclid(width);
        HexCoord::new(column - row.div_euclid(2), row)
    }
}

fn shift_into(value: f64, origin: f64, period: f64) -> f64 {
    if period <= 0.0 {
        return 0.0;
    }
    let wrapped = origin + (value - origin).rem_euclid(period);
    wrapped - value
}
