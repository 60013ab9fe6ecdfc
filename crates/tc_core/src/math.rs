//! Fixed-point helpers for deterministic hex line sampling.
//!
//! Line of sight walks a straight line through cube space and snaps each
//! sample to the nearest hex. Doing this with floats makes tie cases depend
//! on the platform, so samples are computed in fixed point where every
//! half-way point is represented exactly.

use fixed::types::I32F32;

use crate::hex::{CubicCoordinate, HexCoordinate};

/// Fixed-point number type for all fractional engine math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Exactly one half.
const HALF: Fixed = Fixed::from_bits(1 << 31);

/// A point in cube space that has not been snapped to a hex yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FractionalCube {
    /// X component.
    pub x: Fixed,
    /// Y component.
    pub y: Fixed,
    /// Z component.
    pub z: Fixed,
}

impl FractionalCube {
    /// Sample the point `step / steps` of the way from `from` to `to`.
    ///
    /// The product is formed before the division so samples that land on a
    /// half step are exact.
    #[must_use]
    pub fn lerp(from: CubicCoordinate, to: CubicCoordinate, step: u32, steps: u32) -> Self {
        if steps == 0 {
            return Self::from(from);
        }
        Self {
            x: lerp_axis(from.x(), to.x(), step, steps),
            y: lerp_axis(from.y(), to.y(), step, steps),
            z: lerp_axis(from.z(), to.z(), step, steps),
        }
    }

    /// Snap to the nearest valid cube coordinate.
    ///
    /// Each axis is rounded on its own; the axis with the largest rounding
    /// error is then recomputed from the other two.
    #[must_use]
    pub fn round(self) -> CubicCoordinate {
        let rx = round_ties_even(self.x);
        let ry = round_ties_even(self.y);
        let rz = round_ties_even(self.z);

        let x_diff = (rx - self.x).abs();
        let y_diff = (ry - self.y).abs();
        let z_diff = (rz - self.z).abs();

        let (mut x, mut y, mut z) = (rx.to_num::<i32>(), ry.to_num::<i32>(), rz.to_num::<i32>());
        if x_diff > y_diff && x_diff > z_diff {
            x = -y - z;
        } else if y_diff > z_diff {
            y = -x - z;
        } else {
            z = -x - y;
        }

        CubicCoordinate::new_unchecked(x, y, z)
    }
}

impl From<CubicCoordinate> for FractionalCube {
    fn from(cubic: CubicCoordinate) -> Self {
        Self {
            x: Fixed::from_num(cubic.x()),
            y: Fixed::from_num(cubic.y()),
            z: Fixed::from_num(cubic.z()),
        }
    }
}

fn lerp_axis(a: i32, b: i32, step: u32, steps: u32) -> Fixed {
    Fixed::from_num(a) + Fixed::from_num((b - a) * step as i32) / Fixed::from_num(steps)
}

/// Round to the nearest integer, sending exact halves to the even neighbour.
fn round_ties_even(value: Fixed) -> Fixed {
    let floor = value.floor();
    let frac = value - floor;
    if frac > HALF {
        floor + Fixed::ONE
    } else if frac < HALF {
        floor
    } else if floor.to_num::<i32>() % 2 == 0 {
        floor
    } else {
        floor + Fixed::ONE
    }
}

/// Hexes crossed by the straight line from `from` to `to`.
///
/// Samples `distance + 1` evenly spaced points, both endpoints included, and
/// drops consecutive duplicates.
#[must_use]
pub fn hex_line(from: HexCoordinate, to: HexCoordinate) -> Vec<HexCoordinate> {
    let distance = from.distance_to(to);
    if distance == 0 {
        return vec![from];
    }

    let (a, b) = (from.to_cubic(), to.to_cubic());
    let mut line: Vec<HexCoordinate> = (0..=distance)
        .map(|step| FractionalCube::lerp(a, b, step, distance).round().to_offset())
        .collect();
    line.dedup();
    line
}
