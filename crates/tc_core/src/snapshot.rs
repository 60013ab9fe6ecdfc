//! Read-only state snapshots and save files.
//!
//! [`GameStateData`] is the only view of engine state handed to callers. It is
//! an owned copy, so nothing done to it can reach back into the engine.
//! [`SavedGame`] wraps a snapshot with the bookkeeping needed to rebuild an
//! equivalent engine.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::economy::Resources;
use crate::engine::{Difficulty, GameState};
use crate::error::{GameError, Result};
use crate::hex::HexCoordinate;
use crate::map::HexMap;
use crate::unit::{Player, Unit};

/// Current save format version.
pub const SAVE_VERSION: u32 = 1;

/// Owned snapshot of a match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameStateData {
    /// Turn number, starting at 1.
    pub current_turn: u32,
    /// Phase of the turn cycle.
    pub phase: GameState,
    /// Live human units, in creation order.
    pub player_units: Vec<Unit>,
    /// Live AI units, in creation order.
    pub ai_units: Vec<Unit>,
    /// Human resource pool.
    pub player_resources: Resources,
    /// AI resource pool.
    pub ai_resources: Resources,
    /// Terrain and ownership.
    pub map: HexMap,
}

impl GameStateData {
    /// Live units of one side.
    #[must_use]
    pub fn units_of(&self, side: Player) -> &[Unit] {
        match side {
            Player::Human => &self.player_units,
            Player::Ai => &self.ai_units,
            Player::Neutral => &[],
        }
    }

    /// Resource pool of one side. Neutral has none.
    #[must_use]
    pub fn resources_of(&self, side: Player) -> Option<&Resources> {
        match side {
            Player::Human => Some(&self.player_resources),
            Player::Ai => Some(&self.ai_resources),
            Player::Neutral => None,
        }
    }

    /// Unit standing on `hex`, if any.
    #[must_use]
    pub fn unit_at(&self, hex: HexCoordinate) -> Option<&Unit> {
        self.player_units
            .iter()
            .chain(&self.ai_units)
            .find(|u| u.position() == hex)
    }

    /// Stable hash of the snapshot.
    ///
    /// Two engines fed the same inputs and random source produce the same
    /// hash after every step.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Everything needed to rebuild an engine mid-match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGame {
    /// Save format version.
    pub version: u32,
    /// Level the match was played on.
    pub level_id: u32,
    /// AI difficulty.
    pub difficulty: Difficulty,
    /// Board and unit state.
    pub state: GameStateData,
    /// Whether `start_game` had been called.
    pub started: bool,
    /// Human units destroyed so far.
    pub player_losses: u32,
    /// AI units destroyed so far.
    pub ai_losses: u32,
    /// Next unit id to hand out.
    pub next_unit_id: u32,
}

impl SavedGame {
    fn check_version(self) -> Result<Self> {
        if self.version != SAVE_VERSION {
            return Err(GameError::SaveVersionMismatch {
                expected: SAVE_VERSION,
                found: self.version,
            });
        }
        Ok(self)
    }

    /// Encode to compact binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GameError::Encode(e.to_string()))
    }

    /// Decode from binary produced by [`SavedGame::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let saved: Self =
            bincode::deserialize(bytes).map_err(|e| GameError::Decode(e.to_string()))?;
        saved.check_version()
    }

    /// Encode to human-readable RON.
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::Encode(e.to_string()))
    }

    /// Decode from RON produced by [`SavedGame::to_ron`].
    pub fn from_ron(text: &str) -> Result<Self> {
        let saved: Self = ron::from_str(text).map_err(|e| GameError::Decode(e.to_string()))?;
        saved.check_version()
    }

    /// Write the binary form to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Read the binary form from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}
