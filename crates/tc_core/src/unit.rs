//! Unit archetypes, sides and per-unit combat state.
//!
//! Archetypes are a closed set with a fixed stat table; there is no
//! per-type behaviour beyond what [`UnitType::stats`] returns.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hex::HexCoordinate;

/// A side in the match. Used for both unit and tile ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Player {
    /// The human-controlled side.
    Human,
    /// The scripted opponent.
    Ai,
    /// Nobody. Only tiles can be neutral.
    #[default]
    Neutral,
}

impl Player {
    /// The side this one is fighting. Neutral has no opponent.
    #[must_use]
    pub const fn opponent(self) -> Option<Player> {
        match self {
            Self::Human => Some(Self::Ai),
            Self::Ai => Some(Self::Human),
            Self::Neutral => None,
        }
    }
}

/// Unit archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    /// Sturdy line troops.
    Infantry,
    /// Fragile ranged attackers.
    Archers,
    /// Fast, hard-hitting shock troops.
    Cavalry,
}

/// Fixed stat block for an archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Health at full strength.
    pub max_health: u32,
    /// Base attack value.
    pub attack: u32,
    /// Base defense value.
    pub defense: u32,
    /// Movement points per turn.
    pub max_movement: u32,
    /// Maximum attack distance in hexes.
    pub attack_range: u32,
}

impl UnitType {
    /// Every archetype, in declaration order.
    pub const ALL: [UnitType; 3] = [Self::Infantry, Self::Archers, Self::Cavalry];

    /// Stat block for this archetype.
    #[must_use]
    pub const fn stats(self) -> UnitStats {
        match self {
            Self::Infantry => UnitStats {
                max_health: 100,
                attack: 20,
                defense: 15,
                max_movement: 2,
                attack_range: 1,
            },
            Self::Archers => UnitStats {
                max_health: 70,
                attack: 30,
                defense: 5,
                max_movement: 2,
                attack_range: 3,
            },
            Self::Cavalry => UnitStats {
                max_health: 120,
                attack: 35,
                defense: 10,
                max_movement: 4,
                attack_range: 1,
            },
        }
    }

    /// Population needed to raise one unit of this type.
    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Self::Infantry => 1,
            Self::Archers => 2,
            Self::Cavalry => 3,
        }
    }
}

/// Unique, monotonically assigned unit identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unit on the board.
///
/// Health and movement are kept inside `0..=max` by every mutator; fields are
/// private so callers cannot break that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    unit_type: UnitType,
    owner: Player,
    position: HexCoordinate,
    current_health: u32,
    remaining_movement: u32,
    has_attacked: bool,
}

impl Unit {
    /// Create a unit at full health and full movement.
    #[must_use]
    pub fn new(id: UnitId, unit_type: UnitType, owner: Player, position: HexCoordinate) -> Self {
        let stats = unit_type.stats();
        Self {
            id,
            unit_type,
            owner,
            position,
            current_health: stats.max_health,
            remaining_movement: stats.max_movement,
            has_attacked: false,
        }
    }

    /// Unit identifier.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Archetype.
    #[must_use]
    pub const fn unit_type(&self) -> UnitType {
        self.unit_type
    }

    /// Controlling side.
    #[must_use]
    pub const fn owner(&self) -> Player {
        self.owner
    }

    /// Current hex.
    #[must_use]
    pub const fn position(&self) -> HexCoordinate {
        self.position
    }

    /// Stat block of the archetype.
    #[must_use]
    pub const fn stats(&self) -> UnitStats {
        self.unit_type.stats()
    }

    /// Current health.
    #[must_use]
    pub const fn current_health(&self) -> u32 {
        self.current_health
    }

    /// Movement points left this turn.
    #[must_use]
    pub const fn remaining_movement(&self) -> u32 {
        self.remaining_movement
    }

    /// Whether the unit has attacked since its last reset.
    #[must_use]
    pub const fn has_attacked(&self) -> bool {
        self.has_attacked
    }

    /// Health as a whole percentage of maximum, rounded down.
    #[must_use]
    pub const fn health_percent(&self) -> u32 {
        self.current_health * 100 / self.stats().max_health
    }

    /// Reduce health, stopping at zero.
    pub fn take_damage(&mut self, amount: u32) {
        self.current_health = self.current_health.saturating_sub(amount);
    }

    /// Restore health, stopping at maximum.
    pub fn heal(&mut self, amount: u32) {
        self.current_health = self
            .current_health
            .saturating_add(amount)
            .min(self.stats().max_health);
    }

    /// Spend movement points, stopping at zero.
    pub fn use_movement(&mut self, cost: u32) {
        self.remaining_movement = self.remaining_movement.saturating_sub(cost);
    }

    /// Record that the unit attacked. Cleared only by [`Unit::reset_movement`].
    pub fn mark_attacked(&mut self) {
        self.has_attacked = true;
    }

    /// Restore full movement and clear the attacked flag.
    pub fn reset_movement(&mut self) {
        self.remaining_movement = self.stats().max_movement;
        self.has_attacked = false;
    }

    /// Whether the unit still has health.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.current_health > 0
    }

    /// Whether the unit can still do anything this turn.
    #[must_use]
    pub const fn can_act(&self) -> bool {
        self.is_alive() && (self.remaining_movement > 0 || !self.has_attacked)
    }

    pub(crate) fn set_position(&mut self, position: HexCoordinate) {
        self.position = position;
    }

    /// Rebuild a unit from saved fields, clamping them into range.
    pub(crate) fn restored(
        id: UnitId,
        unit_type: UnitType,
        owner: Player,
        position: HexCoordinate,
        current_health: u32,
        remaining_movement: u32,
        has_attacked: bool,
    ) -> Self {
        let stats = unit_type.stats();
        Self {
            id,
            unit_type,
            owner,
            position,
            current_health: current_health.min(stats.max_health),
            remaining_movement: remaining_movement.min(stats.max_movement),
            has_attacked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infantry() -> Unit {
        Unit::new(UnitId(1), UnitType::Infantry, Player::Human, HexCoordinate::new(0, 0))
    }

    #[test]
    fn test_stat_table() {
        let cavalry = UnitType::Cavalry.stats();
        assert_eq!(cavalry.max_health, 120);
        assert_eq!(cavalry.attack, 35);
        assert_eq!(cavalry.max_movement, 4);
        assert_eq!(UnitType::Archers.stats().attack_range, 3);
        assert_eq!(UnitType::Infantry.stats().defense, 15);
    }

    #[test]
    fn test_costs() {
        assert_eq!(UnitType::Infantry.cost(), 1);
        assert_eq!(UnitType::Archers.cost(), 2);
        assert_eq!(UnitType::Cavalry.cost(), 3);
    }

    #[test]
    fn test_new_unit_is_fresh() {
        let unit = infantry();
        assert_eq!(unit.current_health(), 100);
        assert_eq!(unit.remaining_movement(), 2);
        assert!(!unit.has_attacked());
        assert!(unit.can_act());
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut unit = infantry();
        unit.take_damage(250);
        assert_eq!(unit.current_health(), 0);
        assert!(!unit.is_alive());
        assert!(!unit.can_act());
    }

    #[test]
    fn test_heal_clamps_at_max() {
        let mut unit = infantry();
        unit.take_damage(30);
        unit.heal(10);
        assert_eq!(unit.current_health(), 80);
        unit.heal(500);
        assert_eq!(unit.current_health(), 100);
    }

    #[test]
    fn test_movement_and_reset() {
        let mut unit = infantry();
        unit.use_movement(5);
        assert_eq!(unit.remaining_movement(), 0);
        assert!(unit.can_act());

        unit.mark_attacked();
        assert!(!unit.can_act());

        unit.reset_movement();
        assert_eq!(unit.remaining_movement(), 2);
        assert!(!unit.has_attacked());
    }

    #[test]
    fn test_health_percent() {
        let mut unit = Unit::new(UnitId(2), UnitType::Archers, Player::Ai, HexCoordinate::new(1, 1));
        unit.take_damage(35);
        assert_eq!(unit.health_percent(), 50);
    }

    #[test]
    fn test_opponent() {
        assert_eq!(Player::Human.opponent(), Some(Player::Ai));
        assert_eq!(Player::Ai.opponent(), Some(Player::Human));
        assert_eq!(Player::Neutral.opponent(), None);
    }
}
