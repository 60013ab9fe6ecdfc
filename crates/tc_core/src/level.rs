//! Level definitions.
//!
//! A [`Level`] is produced by an external level repository and handed to the
//! engine as-is. This module only defines the data shape, RON loading and
//! structural validation; it never decides which level to play.
//!
//! # Example RON
//!
//! ```ron
//! Level(
//!     id: 1,
//!     name: "River Crossing",
//!     description: "Hold the ford.",
//!     map_width: 8,
//!     map_height: 6,
//!     tiles: [
//!         (x: 0, y: 2, terrain: City, owner: Human),
//!         (x: 7, y: 3, terrain: City, owner: Ai),
//!     ],
//!     player_start_position: (x: 0, y: 2),
//!     player_start_units: [(unit_type: Infantry, count: 2)],
//!     enemy_start_position: (x: 7, y: 3),
//!     enemy_start_units: [(unit_type: Archers, count: 1)],
//!     victory_conditions: (),
//!     rewards: (base_glory_points: 50),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::hex::HexCoordinate;
use crate::map::{HexMap, Terrain};
use crate::unit::{Player, UnitType};

/// Smallest map edge a shipped level should use.
pub const MIN_MAP_SIZE: u32 = 6;

/// Largest map edge a shipped level should use.
pub const MAX_MAP_SIZE: u32 = 30;

/// Largest map edge the engine accepts at all.
pub const MAX_MAP_EDGE: u32 = 256;

/// A tile override. Tiles not listed are neutral plains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileData {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Terrain of the tile.
    pub terrain: Terrain,
    /// Initial owner.
    #[serde(default)]
    pub owner: Player,
}

/// A map position in level data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl From<Position> for HexCoordinate {
    fn from(p: Position) -> Self {
        HexCoordinate::new(p.x, p.y)
    }
}

/// A batch of identical starting units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartUnit {
    /// Archetype.
    pub unit_type: UnitType,
    /// How many to place.
    pub count: u32,
}

/// Win conditions advertised by a level.
///
/// The engine applies its fixed elimination rule; these flags are carried
/// for presentation layers and future rule variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryConditions {
    /// Win by owning every territory.
    #[serde(default = "default_true")]
    pub capture_all_territories: bool,
    /// Win by destroying every enemy unit.
    #[serde(default)]
    pub destroy_all_enemies: bool,
    /// Specific hexes that must be held.
    #[serde(default)]
    pub capture_specific_hexes: Vec<Position>,
    /// Win by surviving this many turns.
    #[serde(default)]
    pub survive_for_turns: Option<u32>,
}

impl Default for VictoryConditions {
    fn default() -> Self {
        Self {
            capture_all_territories: true,
            destroy_all_enemies: false,
            capture_specific_hexes: Vec::new(),
            survive_for_turns: None,
        }
    }
}

const fn default_true() -> bool {
    true
}

/// Rewards granted by the meta-progression layer on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRewards {
    /// Base reward before bonuses.
    pub base_glory_points: u32,
    /// Bonus for a fast win.
    #[serde(default = "default_speed_bonus")]
    pub speed_bonus: u32,
    /// Bonus for a win without losses.
    #[serde(default = "default_flawless_bonus")]
    pub flawless_bonus: u32,
    /// Level unlocked by completing this one.
    #[serde(default)]
    pub unlock_level: Option<u32>,
}

const fn default_speed_bonus() -> u32 {
    25
}

const fn default_flawless_bonus() -> u32 {
    30
}

impl Default for LevelRewards {
    fn default() -> Self {
        Self {
            base_glory_points: 0,
            speed_bonus: default_speed_bonus(),
            flawless_bonus: default_flawless_bonus(),
            unlock_level: None,
        }
    }
}

/// Complete level definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Level identifier.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Map width in columns.
    pub map_width: u32,
    /// Map height in rows.
    pub map_height: u32,
    /// Tile overrides.
    #[serde(default)]
    pub tiles: Vec<TileData>,
    /// Where the human side's units are placed.
    pub player_start_position: Position,
    /// Human starting units.
    #[serde(default)]
    pub player_start_units: Vec<StartUnit>,
    /// Where the AI side's units are placed.
    pub enemy_start_position: Position,
    /// AI starting units.
    #[serde(default)]
    pub enemy_start_units: Vec<StartUnit>,
    /// Advertised win conditions.
    #[serde(default)]
    pub victory_conditions: VictoryConditions,
    /// Completion rewards.
    #[serde(default)]
    pub rewards: LevelRewards,
}

impl Level {
    /// Parse a level from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::DataParseError {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }

    /// Load a level from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        ron::from_str(&text).map_err(|e| GameError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::Encode(e.to_string()))
    }

    fn invalid(&self, reason: impl Into<String>) -> GameError {
        GameError::InvalidLevel {
            level_id: self.id,
            reason: reason.into(),
        }
    }

    /// Check the structural rules the engine depends on.
    ///
    /// Does not check the placement of start units; that needs the built map
    /// and is done by the engine.
    pub fn validate(&self) -> Result<()> {
        if self.map_width == 0 || self.map_height == 0 {
            return Err(self.invalid(format!(
                "map is {}x{}",
                self.map_width, self.map_height
            )));
        }
        if self.map_width > MAX_MAP_EDGE || self.map_height > MAX_MAP_EDGE {
            return Err(self.invalid(format!(
                "map is {}x{}, edges are limited to {MAX_MAP_EDGE}",
                self.map_width, self.map_height
            )));
        }

        for tile in &self.tiles {
            let hex = HexCoordinate::new(tile.x, tile.y);
            if !hex.is_in_bounds(self.map_width, self.map_height) {
                return Err(self.invalid(format!("tile {hex} is out of bounds")));
            }
        }

        for (label, position) in [
            ("player start", self.player_start_position),
            ("enemy start", self.enemy_start_position),
        ] {
            let hex = HexCoordinate::from(position);
            if !hex.is_in_bounds(self.map_width, self.map_height) {
                return Err(self.invalid(format!("{label} {hex} is out of bounds")));
            }
        }

        let capacity = (self.map_width as u64) * (self.map_height as u64);
        let units: u64 = self
            .player_start_units
            .iter()
            .chain(&self.enemy_start_units)
            .map(|s| s.count as u64)
            .sum();
        if units > capacity {
            return Err(self.invalid(format!("{units} start units do not fit on {capacity} hexes")));
        }

        Ok(())
    }

    /// Soft checks for shipped content. Returns human-readable warnings.
    #[must_use]
    pub fn lint(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for (label, size) in [("width", self.map_width), ("height", self.map_height)] {
            if !(MIN_MAP_SIZE..=MAX_MAP_SIZE).contains(&size) {
                warnings.push(format!(
                    "map {label} {size} outside recommended {MIN_MAP_SIZE}..={MAX_MAP_SIZE}"
                ));
            }
        }
        if self.player_start_units.iter().all(|s| s.count == 0) {
            warnings.push("player has no starting units".into());
        }
        if self.enemy_start_units.iter().all(|s| s.count == 0) {
            warnings.push("enemy has no starting units".into());
        }
        let mut seen = std::collections::HashSet::new();
        for tile in &self.tiles {
            if !seen.insert((tile.x, tile.y)) {
                warnings.push(format!("tile ({}, {}) listed more than once", tile.x, tile.y));
            }
        }
        warnings
    }

    /// Build the map described by this level.
    pub fn build_map(&self) -> Result<HexMap> {
        self.validate()?;
        let mut map = HexMap::new(self.map_width, self.map_height);
        for tile in &self.tiles {
            let hex = HexCoordinate::new(tile.x, tile.y);
            map.set_terrain(hex, tile.terrain);
            map.set_owner(hex, tile.owner);
        }
        Ok(map)
    }
}
