//! Damage resolution.
//!
//! ```text
//! damage = max(1, attack - (defense + terrain_bonus) / 2 + jitter + matchup)
//! ```
//!
//! `jitter` is drawn uniformly from `[-DAMAGE_JITTER, DAMAGE_JITTER]` through
//! a [`RandomSource`] so tests can pin it.

use serde::{Deserialize, Serialize};

use crate::dice::RandomSource;
use crate::unit::UnitType;

/// Half-width of the random damage term.
pub const DAMAGE_JITTER: i32 = 5;

/// Minimum damage floor - every successful attack deals at least this much.
pub const MIN_DAMAGE: u32 = 1;

/// Flat bonus an attacker type gets against a defender type.
///
/// Cavalry ride down archers, archers thin out infantry, and infantry brace
/// against cavalry.
#[must_use]
pub const fn matchup_bonus(attacker: UnitType, defender: UnitType) -> i32 {
    match (attacker, defender) {
        (UnitType::Cavalry, UnitType::Archers) => 10,
        (UnitType::Archers, UnitType::Infantry) => 5,
        (UnitType::Infantry, UnitType::Cavalry) => 5,
        _ => 0,
    }
}

/// Inputs to a single damage roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackProfile {
    /// Attacking archetype.
    pub attacker: UnitType,
    /// Defending archetype.
    pub defender: UnitType,
    /// Terrain defense bonus of the defender's hex.
    pub terrain_bonus: u32,
}

impl AttackProfile {
    /// Damage for a given jitter value, before any randomness is involved.
    #[must_use]
    pub fn damage_with_jitter(&self, jitter: i32) -> u32 {
        let attack = self.attacker.stats().attack as i32;
        let mitigation = ((self.defender.stats().defense + self.terrain_bonus) / 2) as i32;
        let raw = attack - mitigation + jitter + matchup_bonus(self.attacker, self.defender);
        raw.max(MIN_DAMAGE as i32) as u32
    }

    /// Roll damage, drawing the jitter from `dice`.
    pub fn roll_damage(&self, dice: &mut dyn RandomSource) -> u32 {
        let jitter = dice.roll(-DAMAGE_JITTER, DAMAGE_JITTER);
        self.damage_with_jitter(jitter)
    }

    /// Lowest and highest damage this profile can produce.
    #[must_use]
    pub fn damage_range(&self) -> (u32, u32) {
        (
            self.damage_with_jitter(-DAMAGE_JITTER),
            self.damage_with_jitter(DAMAGE_JITTER),
        )
    }
}
