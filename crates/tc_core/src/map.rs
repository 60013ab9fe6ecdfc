//! Terrain and ownership grid.
//!
//! The map is fixed in size once built. Terrain is written while a level is
//! loaded; ownership changes as units capture tiles. Every accessor is
//! bounds-tolerant: reads outside the grid return `None` and writes outside
//! it do nothing.

use serde::{Deserialize, Serialize};

use crate::hex::HexCoordinate;
use crate::math::hex_line;
use crate::pathfinding;
use crate::unit::Player;

/// Terrain kind of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    /// Open ground.
    #[default]
    Plains,
    /// High ground. Blocks sight.
    Hills,
    /// Woodland. Blocks sight.
    Forest,
    /// Slow crossing.
    River,
    /// Settlement that generates population for its owner.
    City,
}

impl Terrain {
    /// Movement points spent to enter a tile of this terrain.
    #[must_use]
    pub const fn movement_cost(self) -> u32 {
        match self {
            Self::Plains => 1,
            Self::Hills => 2,
            Self::Forest => 2,
            Self::River => 3,
            Self::City => 1,
        }
    }

    /// Defense bonus granted to a unit standing here when attacked.
    #[must_use]
    pub const fn defense_bonus(self) -> u32 {
        match self {
            Self::Plains => 0,
            Self::Hills => 20,
            Self::Forest => 10,
            Self::River => 0,
            Self::City => 15,
        }
    }

    /// Whether the terrain blocks sight through it.
    #[must_use]
    pub const fn blocks_sight(self) -> bool {
        matches!(self, Self::Hills | Self::Forest)
    }
}

/// A single map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Tile {
    /// Terrain of the tile.
    pub terrain: Terrain,
    /// Side that controls the tile.
    pub owner: Player,
}

/// Fixed-size hex map of terrain and ownership.
///
/// Decoding checks that the tile list covers exactly `width * height` cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MapData")]
pub struct HexMap {
    width: u32,
    height: u32,
    /// Tiles stored in row-major order.
    tiles: Vec<Tile>,
}

/// Unchecked wire shape of [`HexMap`].
#[derive(Deserialize)]
#[serde(rename = "HexMap")]
struct MapData {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TryFrom<MapData> for HexMap {
    type Error = String;

    fn try_from(data: MapData) -> Result<Self, Self::Error> {
        let expected = (data.width as usize).checked_mul(data.height as usize);
        if expected != Some(data.tiles.len()) {
            return Err(format!(
                "map is {}x{} but has {} tiles",
                data.width,
                data.height,
                data.tiles.len()
            ));
        }
        Ok(Self {
            width: data.width,
            height: data.height,
            tiles: data.tiles,
        })
    }
}

impl HexMap {
    /// Create a map of neutral plains.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let cell_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            tiles: vec![Tile::default(); cell_count],
        }
    }

    /// Map width in columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Map height in rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Check if a hex lies on the map.
    #[must_use]
    pub fn in_bounds(&self, hex: HexCoordinate) -> bool {
        hex.is_in_bounds(self.width, self.height)
    }

    #[inline]
    fn index(&self, hex: HexCoordinate) -> Option<usize> {
        self.in_bounds(hex)
            .then(|| (hex.row as usize) * (self.width as usize) + (hex.col as usize))
    }

    /// Tile at a hex, if on the map.
    #[must_use]
    pub fn tile(&self, hex: HexCoordinate) -> Option<Tile> {
        self.index(hex).map(|i| self.tiles[i])
    }

    /// Terrain at a hex, if on the map.
    #[must_use]
    pub fn terrain(&self, hex: HexCoordinate) -> Option<Terrain> {
        self.tile(hex).map(|t| t.terrain)
    }

    /// Set terrain at a hex. Returns `false` if out of bounds.
    pub fn set_terrain(&mut self, hex: HexCoordinate, terrain: Terrain) -> bool {
        match self.index(hex) {
            Some(i) => {
                self.tiles[i].terrain = terrain;
                true
            }
            None => false,
        }
    }

    /// Owner of a hex, if on the map.
    #[must_use]
    pub fn owner(&self, hex: HexCoordinate) -> Option<Player> {
        self.tile(hex).map(|t| t.owner)
    }

    /// Set the owner of a hex. Returns `false` if out of bounds.
    pub fn set_owner(&mut self, hex: HexCoordinate, owner: Player) -> bool {
        match self.index(hex) {
            Some(i) => {
                self.tiles[i].owner = owner;
                true
            }
            None => false,
        }
    }

    /// Adjacent hexes that lie on the map.
    #[must_use]
    pub fn neighbors(&self, hex: HexCoordinate) -> Vec<HexCoordinate> {
        hex.neighbors()
            .into_iter()
            .filter(|n| self.in_bounds(*n))
            .collect()
    }

    /// Hex distance between two coordinates.
    #[must_use]
    pub fn distance(&self, from: HexCoordinate, to: HexCoordinate) -> u32 {
        from.distance_to(to)
    }

    /// Cost to enter a hex, if on the map.
    #[must_use]
    pub fn entry_cost(&self, hex: HexCoordinate) -> Option<u32> {
        self.terrain(hex).map(Terrain::movement_cost)
    }

    /// Cheapest route from `from` to `to`, both endpoints included.
    ///
    /// Empty when either endpoint is off the map or no route exists.
    #[must_use]
    pub fn find_path(&self, from: HexCoordinate, to: HexCoordinate) -> Vec<HexCoordinate> {
        pathfinding::find_path(self, from, to)
    }

    /// Movement points needed to travel from `from` to `to`.
    ///
    /// Sums the entry cost of every hex on the cheapest path except the
    /// starting one. `None` when no path exists.
    #[must_use]
    pub fn movement_cost(&self, from: HexCoordinate, to: HexCoordinate) -> Option<u32> {
        let path = self.find_path(from, to);
        if path.is_empty() {
            return None;
        }
        Some(self.path_cost(&path))
    }

    /// Entry cost of every hex on `path` after the first.
    #[must_use]
    pub fn path_cost(&self, path: &[HexCoordinate]) -> u32 {
        path.iter()
            .skip(1)
            .filter_map(|hex| self.entry_cost(*hex))
            .sum()
    }

    /// Every hex reachable from `from` within `budget` movement points.
    ///
    /// See [`pathfinding::reachable`].
    #[must_use]
    pub fn reachable(&self, from: HexCoordinate, budget: u32) -> Vec<(HexCoordinate, u32)> {
        pathfinding::reachable(self, from, budget)
    }

    /// Defense bonus of the terrain at a hex; zero off the map.
    #[must_use]
    pub fn terrain_defense_bonus(&self, hex: HexCoordinate) -> u32 {
        self.terrain(hex).map_or(0, Terrain::defense_bonus)
    }

    /// City hexes owned by `player`, in row-major order.
    #[must_use]
    pub fn cities_owned_by(&self, player: Player) -> Vec<HexCoordinate> {
        self.hexes()
            .filter(|hex| {
                self.tile(*hex)
                    .is_some_and(|t| t.terrain == Terrain::City && t.owner == player)
            })
            .collect()
    }

    /// Hexes owned by `player`, in row-major order.
    #[must_use]
    pub fn territories_owned_by(&self, player: Player) -> Vec<HexCoordinate> {
        self.hexes()
            .filter(|hex| self.owner(*hex) == Some(player))
            .collect()
    }

    /// Number of hexes owned by `player`.
    #[must_use]
    pub fn territory_count(&self, player: Player) -> u32 {
        self.tiles.iter().filter(|t| t.owner == player).count() as u32
    }

    /// Every hex on the map in row-major order.
    pub fn hexes(&self) -> impl Iterator<Item = HexCoordinate> + '_ {
        (0..self.height as i32)
            .flat_map(move |row| (0..self.width as i32).map(move |col| HexCoordinate::new(col, row)))
    }

    /// Whether sight is clear between two hexes.
    ///
    /// Hills and forest block sight through them, but never the endpoints
    /// themselves.
    #[must_use]
    pub fn has_line_of_sight(&self, from: HexCoordinate, to: HexCoordinate) -> bool {
        hex_line(from, to)
            .into_iter()
            .filter(|hex| *hex != from && *hex != to)
            .all(|hex| !self.terrain(hex).is_some_and(Terrain::blocks_sight))
    }

    /// On-map hexes within `range` of `from` that `from` can see.
    #[must_use]
    pub fn visible_hexes(&self, from: HexCoordinate, range: u32) -> Vec<HexCoordinate> {
        from.hexes_in_radius(range)
            .into_iter()
            .filter(|hex| self.in_bounds(*hex) && self.has_line_of_sight(from, *hex))
            .collect()
    }
}
