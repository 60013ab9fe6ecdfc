//! Hex grid coordinate algebra.
//!
//! Tiles are addressed with "odd-r" offset coordinates: `(col, row)` where
//! every odd row is shifted half a hex to the right. Distance and line math
//! goes through cube coordinates, where `x + y + z == 0`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Neighbor deltas for even rows, in order E, NE, NW, W, SW, SE.
const EVEN_ROW_DIRECTIONS: [(i32, i32); 6] = [(1, 0), (0, -1), (-1, -1), (-1, 0), (-1, 1), (0, 1)];

/// Neighbor deltas for odd rows, in order E, NE, NW, W, SW, SE.
const ODD_ROW_DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (0, 1), (1, 1)];

/// Offset coordinate of a hex tile.
///
/// Ordering is row-major so sorted collections iterate the map top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HexCoordinate {
    /// Column index.
    pub col: i32,
    /// Row index.
    pub row: i32,
}

impl PartialOrd for HexCoordinate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HexCoordinate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.row, self.col).cmp(&(other.row, other.col))
    }
}

impl fmt::Display for HexCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

impl HexCoordinate {
    /// Create a new offset coordinate.
    #[inline]
    #[must_use]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Convert to cube coordinates.
    #[must_use]
    pub const fn to_cubic(self) -> CubicCoordinate {
        let x = self.col - (self.row - (self.row & 1)) / 2;
        let z = self.row;
        CubicCoordinate::new_unchecked(x, -x - z, z)
    }

    /// The six adjacent hexes, in order E, NE, NW, W, SW, SE.
    ///
    /// No bounds filtering is applied; see [`crate::map::HexMap::neighbors`].
    #[must_use]
    pub fn neighbors(self) -> [HexCoordinate; 6] {
        let directions = if self.row & 1 == 0 {
            EVEN_ROW_DIRECTIONS
        } else {
            ODD_ROW_DIRECTIONS
        };
        directions.map(|(dc, dr)| HexCoordinate::new(self.col + dc, self.row + dr))
    }

    /// Number of hex steps between two coordinates.
    #[must_use]
    pub fn distance_to(self, other: HexCoordinate) -> u32 {
        self.to_cubic().distance_to(other.to_cubic())
    }

    /// Check whether the coordinate lies inside a `width` x `height` map.
    #[must_use]
    pub fn is_in_bounds(self, width: u32, height: u32) -> bool {
        self.col >= 0 && self.row >= 0 && (self.col as u32) < width && (self.row as u32) < height
    }

    /// Every coordinate within `radius` steps, the center included.
    ///
    /// Results are unfiltered and may fall outside any particular map.
    #[must_use]
    pub fn hexes_in_radius(self, radius: u32) -> Vec<HexCoordinate> {
        let center = self.to_cubic();
        let r = radius as i32;
        let mut results = Vec::with_capacity((3 * r * (r + 1) + 1) as usize);

        for dx in -r..=r {
            for dy in (-r).max(-dx - r)..=r.min(-dx + r) {
                let dz = -dx - dy;
                let cubic =
                    CubicCoordinate::new_unchecked(center.x + dx, center.y + dy, center.z + dz);
                results.push(cubic.to_offset());
            }
        }

        results
    }
}

/// Three-axis hex coordinate with `x + y + z == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubicCoordinate {
    x: i32,
    y: i32,
    z: i32,
}

impl CubicCoordinate {
    /// Create a cube coordinate, rejecting components that do not sum to zero.
    pub fn new(x: i32, y: i32, z: i32) -> Result<Self> {
        if x + y + z != 0 {
            return Err(GameError::InvalidCubicCoordinate { x, y, z });
        }
        Ok(Self { x, y, z })
    }

    /// Create a cube coordinate from components already known to be valid.
    ///
    /// Used by internal coordinate math; a bad sum here is an engine bug.
    #[inline]
    pub(crate) const fn new_unchecked(x: i32, y: i32, z: i32) -> Self {
        debug_assert!(x + y + z == 0, "cubic coordinate invariant violated");
        Self { x, y, z }
    }

    /// X component.
    #[must_use]
    pub const fn x(self) -> i32 {
        self.x
    }

    /// Y component.
    #[must_use]
    pub const fn y(self) -> i32 {
        self.y
    }

    /// Z component.
    #[must_use]
    pub const fn z(self) -> i32 {
        self.z
    }

    /// Convert back to odd-r offset coordinates.
    #[must_use]
    pub const fn to_offset(self) -> HexCoordinate {
        let col = self.x + (self.z - (self.z & 1)) / 2;
        HexCoordinate::new(col, self.z)
    }

    /// Number of hex steps between two cube coordinates.
    #[must_use]
    pub fn distance_to(self, other: CubicCoordinate) -> u32 {
        (self.x.abs_diff(other.x) + self.y.abs_diff(other.y) + self.z.abs_diff(other.z)) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_row_neighbors() {
        let hex = HexCoordinate::new(2, 2);
        assert_eq!(
            hex.neighbors(),
            [
                HexCoordinate::new(3, 2),
                HexCoordinate::new(2, 1),
                HexCoordinate::new(1, 1),
                HexCoordinate::new(1, 2),
                HexCoordinate::new(1, 3),
                HexCoordinate::new(2, 3),
            ]
        );
    }

    #[test]
    fn test_odd_row_neighbors() {
        let hex = HexCoordinate::new(2, 3);
        assert_eq!(
            hex.neighbors(),
            [
                HexCoordinate::new(3, 3),
                HexCoordinate::new(3, 2),
                HexCoordinate::new(2, 2),
                HexCoordinate::new(1, 3),
                HexCoordinate::new(2, 4),
                HexCoordinate::new(3, 4),
            ]
        );
    }

    #[test]
    fn test_neighbors_are_one_step_away() {
        for hex in [HexCoordinate::new(0, 0), HexCoordinate::new(5, 7), HexCoordinate::new(-3, -1)] {
            for neighbor in hex.neighbors() {
                assert_eq!(hex.distance_to(neighbor), 1, "{hex} -> {neighbor}");
            }
        }
    }

    #[test]
    fn test_cubic_conversion() {
        let cubic = HexCoordinate::new(3, 5).to_cubic();
        assert_eq!((cubic.x(), cubic.y(), cubic.z()), (1, -6, 5));
        assert_eq!(cubic.to_offset(), HexCoordinate::new(3, 5));
    }

    #[test]
    fn test_invalid_cubic_rejected() {
        assert!(CubicCoordinate::new(1, 1, 1).is_err());
        assert!(CubicCoordinate::new(1, -2, 1).is_ok());
    }

    #[test]
    fn test_distance() {
        let a = HexCoordinate::new(0, 0);
        assert_eq!(a.distance_to(a), 0);
        assert_eq!(a.distance_to(HexCoordinate::new(3, 0)), 3);
        assert_eq!(a.distance_to(HexCoordinate::new(0, 4)), 4);
        assert_eq!(HexCoordinate::new(1, 2).distance_to(HexCoordinate::new(6, 2)), 5);
    }

    #[test]
    fn test_bounds() {
        assert!(HexCoordinate::new(0, 0).is_in_bounds(5, 5));
        assert!(HexCoordinate::new(4, 4).is_in_bounds(5, 5));
        assert!(!HexCoordinate::new(5, 0).is_in_bounds(5, 5));
        assert!(!HexCoordinate::new(-1, 2).is_in_bounds(5, 5));
    }

    #[test]
    fn test_hexes_in_radius() {
        let center = HexCoordinate::new(4, 4);
        assert_eq!(center.hexes_in_radius(0), vec![center]);

        let ring = center.hexes_in_radius(2);
        assert_eq!(ring.len(), 19);
        assert!(ring.contains(&center));
        assert!(ring.iter().all(|h| center.distance_to(*h) <= 2));
    }

    #[test]
    fn test_row_major_ordering() {
        let mut hexes = vec![
            HexCoordinate::new(0, 1),
            HexCoordinate::new(2, 0),
            HexCoordinate::new(1, 0),
        ];
        hexes.sort();
        assert_eq!(
            hexes,
            vec![
                HexCoordinate::new(1, 0),
                HexCoordinate::new(2, 0),
                HexCoordinate::new(0, 1),
            ]
        );
    }
}
