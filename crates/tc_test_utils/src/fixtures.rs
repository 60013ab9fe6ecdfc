//! Test fixtures and helpers.
//!
//! Level builders, canned scenarios and scripted random sources for
//! consistent testing.

use std::collections::VecDeque;

use tc_core::dice::RandomSource;
use tc_core::engine::{Difficulty, GameEngine};
use tc_core::hex::HexCoordinate;
use tc_core::level::{Level, LevelRewards, Position, StartUnit, TileData, VictoryConditions};
use tc_core::map::Terrain;
use tc_core::unit::{Player, UnitId, UnitType};

/// Shorthand for an offset coordinate.
#[must_use]
pub const fn hex(col: i32, row: i32) -> HexCoordinate {
    HexCoordinate::new(col, row)
}

/// Fluent builder for [`Level`] values.
///
/// Starts as an all-plains map with the player in the top-left corner and
/// the enemy in the bottom-right, and no units.
#[derive(Debug, Clone)]
pub struct LevelBuilder {
    level: Level,
}

impl LevelBuilder {
    /// Empty level of the given size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            level: Level {
                id: 1,
                name: "fixture".into(),
                description: String::new(),
                map_width: width,
                map_height: height,
                tiles: Vec::new(),
                player_start_position: Position { x: 0, y: 0 },
                player_start_units: Vec::new(),
                enemy_start_position: Position {
                    x: width as i32 - 1,
                    y: height as i32 - 1,
                },
                enemy_start_units: Vec::new(),
                victory_conditions: VictoryConditions::default(),
                rewards: LevelRewards::default(),
            },
        }
    }

    /// Set the level id.
    #[must_use]
    pub fn id(mut self, id: u32) -> Self {
        self.level.id = id;
        self
    }

    /// Override one tile. A later call for the same hex replaces the earlier.
    #[must_use]
    pub fn tile(mut self, col: i32, row: i32, terrain: Terrain, owner: Player) -> Self {
        self.level.tiles.retain(|t| (t.x, t.y) != (col, row));
        self.level.tiles.push(TileData {
            x: col,
            y: row,
            terrain,
            owner,
        });
        self
    }

    /// Neutral tile of the given terrain.
    #[must_use]
    pub fn terrain(self, col: i32, row: i32, terrain: Terrain) -> Self {
        self.tile(col, row, terrain, Player::Neutral)
    }

    /// City owned by `owner`.
    #[must_use]
    pub fn city(self, col: i32, row: i32, owner: Player) -> Self {
        self.tile(col, row, Terrain::City, owner)
    }

    /// Plains owned by `owner`.
    #[must_use]
    pub fn owned(self, col: i32, row: i32, owner: Player) -> Self {
        self.tile(col, row, Terrain::Plains, owner)
    }

    /// Where the human units are placed.
    #[must_use]
    pub fn player_start(mut self, col: i32, row: i32) -> Self {
        self.level.player_start_position = Position { x: col, y: row };
        self
    }

    /// Where the AI units are placed.
    #[must_use]
    pub fn enemy_start(mut self, col: i32, row: i32) -> Self {
        self.level.enemy_start_position = Position { x: col, y: row };
        self
    }

    /// Add human starting units.
    #[must_use]
    pub fn player_units(mut self, unit_type: UnitType, count: u32) -> Self {
        self.level
            .player_start_units
            .push(StartUnit { unit_type, count });
        self
    }

    /// Add AI starting units.
    #[must_use]
    pub fn enemy_units(mut self, unit_type: UnitType, count: u32) -> Self {
        self.level
            .enemy_start_units
            .push(StartUnit { unit_type, count });
        self
    }

    /// Finish the level.
    #[must_use]
    pub fn build(self) -> Level {
        self.level
    }
}

/// One human infantry at (1, 2) against one AI infantry far away.
///
/// Each side owns a city next to its unit.
#[must_use]
pub fn duel_level() -> Level {
    LevelBuilder::new(8, 6)
        .city(0, 2, Player::Human)
        .city(7, 3, Player::Ai)
        .player_start(1, 2)
        .player_units(UnitType::Infantry, 1)
        .enemy_start(6, 3)
        .enemy_units(UnitType::Infantry, 1)
        .build()
}

/// A human attacker at (2, 2) right next to an AI unit at (3, 2).
#[must_use]
pub fn adjacent_level(attacker: UnitType, defender: UnitType) -> Level {
    LevelBuilder::new(8, 6)
        .city(0, 0, Player::Human)
        .city(7, 5, Player::Ai)
        .player_start(2, 2)
        .player_units(attacker, 1)
        .enemy_start(3, 2)
        .enemy_units(defender, 1)
        .build()
}

/// A mid-sized level with every terrain type and mixed armies.
#[must_use]
pub fn skirmish_level() -> Level {
    let mut builder = LevelBuilder::new(12, 10)
        .id(5)
        .city(1, 1, Player::Human)
        .city(2, 8, Player::Human)
        .city(10, 8, Player::Ai)
        .city(9, 1, Player::Ai)
        .city(6, 5, Player::Neutral)
        .player_start(2, 4)
        .player_units(UnitType::Infantry, 3)
        .player_units(UnitType::Archers, 2)
        .player_units(UnitType::Cavalry, 1)
        .enemy_start(9, 5)
        .enemy_units(UnitType::Infantry, 2)
        .enemy_units(UnitType::Archers, 2)
        .enemy_units(UnitType::Cavalry, 2);
    for row in 0..10 {
        if row != 5 {
            builder = builder.terrain(6, row, Terrain::River);
        }
    }
    builder
        .terrain(4, 2, Terrain::Forest)
        .terrain(4, 3, Terrain::Forest)
        .terrain(8, 6, Terrain::Hills)
        .terrain(8, 7, Terrain::Hills)
        .build()
}

/// Random source that replays scripted values.
///
/// Rolls are clamped into the requested range and picks are taken modulo
/// the requested length. Once a script runs dry the defaults apply: roll
/// `0`, pick `0`, coin `false`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<i32>,
    picks: VecDeque<usize>,
    coins: VecDeque<bool>,
    default_roll: i32,
}

impl ScriptedDice {
    /// Source that always rolls zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Source that always rolls `roll`.
    #[must_use]
    pub fn constant(roll: i32) -> Self {
        Self {
            default_roll: roll,
            ..Self::default()
        }
    }

    /// Queue damage rolls.
    #[must_use]
    pub fn with_rolls(mut self, rolls: impl IntoIterator<Item = i32>) -> Self {
        self.rolls.extend(rolls);
        self
    }

    /// Queue index picks.
    #[must_use]
    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks.extend(picks);
        self
    }

    /// Queue coin flips.
    #[must_use]
    pub fn with_coins(mut self, coins: impl IntoIterator<Item = bool>) -> Self {
        self.coins.extend(coins);
        self
    }

    /// Boxed for engine constructors.
    #[must_use]
    pub fn boxed(self) -> Box<dyn RandomSource> {
        Box::new(self)
    }
}

impl RandomSource for ScriptedDice {
    fn roll(&mut self, low: i32, high: i32) -> i32 {
        self.rolls
            .pop_front()
            .unwrap_or(self.default_roll)
            .clamp(low, high)
    }

    fn pick(&mut self, len: usize) -> usize {
        self.picks.pop_front().unwrap_or(0) % len.max(1)
    }

    fn chance_half(&mut self) -> bool {
        self.coins.pop_front().unwrap_or(false)
    }
}

/// Build an engine on `level` and start the game.
///
/// # Panics
///
/// Panics if the level is invalid.
#[must_use]
pub fn started_engine(level: &Level, difficulty: Difficulty, dice: ScriptedDice) -> GameEngine {
    let mut engine = GameEngine::with_random_source(level, difficulty, dice.boxed())
        .expect("fixture level should build");
    engine.start_game().expect("fresh engine should start");
    engine
}

/// Id of the unit standing on `(col, row)`.
///
/// # Panics
///
/// Panics if the hex is empty.
#[must_use]
pub fn unit_at(engine: &GameEngine, col: i32, row: i32) -> UnitId {
    engine
        .get_unit_at(hex(col, row))
        .unwrap_or_else(|| panic!("no unit at ({col}, {row})"))
        .id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_replaces_tiles() {
        let level = LevelBuilder::new(6, 6)
            .terrain(1, 1, Terrain::Hills)
            .city(1, 1, Player::Ai)
            .build();
        assert_eq!(level.tiles.len(), 1);
        assert_eq!(level.tiles[0].terrain, Terrain::City);
    }

    #[test]
    fn test_canned_levels_are_valid() {
        for level in [
            duel_level(),
            adjacent_level(UnitType::Cavalry, UnitType::Archers),
            skirmish_level(),
        ] {
            level.validate().unwrap();
            assert!(level.lint().is_empty(), "{:?}", level.lint());
        }
    }

    #[test]
    fn test_scripted_dice() {
        let mut dice = ScriptedDice::constant(2)
            .with_rolls([9, -1])
            .with_picks([4])
            .with_coins([true]);
        assert_eq!(dice.roll(-5, 5), 5);
        assert_eq!(dice.roll(-5, 5), -1);
        assert_eq!(dice.roll(-5, 5), 2);
        assert_eq!(dice.pick(3), 1);
        assert_eq!(dice.pick(3), 0);
        assert!(dice.chance_half());
        assert!(!dice.chance_half());
    }
}
