//! End-of-battle summary and star rating.

use serde::{Deserialize, Serialize};

use crate::engine::{GameEngine, GameState};
use crate::unit::Player;

/// Turn count a victory must come in under to earn the speed star.
pub const FAST_VICTORY_TURNS: u32 = 10;

/// Stars awarded at most.
pub const MAX_STARS: u32 = 3;

/// Result of a battle, for the meta-progression layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSummary {
    /// Level played.
    pub level_id: u32,
    /// Final phase. Only `Victory` and `Defeat` are finished battles.
    pub outcome: GameState,
    /// Turn the battle ended on.
    pub turns: u32,
    /// Human units lost.
    pub player_losses: u32,
    /// AI units destroyed.
    pub ai_losses: u32,
    /// Human units still alive.
    pub surviving_units: u32,
    /// Rating from 0 to [`MAX_STARS`].
    pub stars: u32,
}

impl BattleSummary {
    /// Summarise the engine's current match.
    #[must_use]
    pub fn from_engine(engine: &GameEngine) -> Self {
        let surviving_units = engine.units_of(Player::Human).count() as u32;
        let outcome = engine.state();
        let turns = engine.current_turn();
        let player_losses = engine.player_losses();
        Self {
            level_id: engine.level_id(),
            outcome,
            turns,
            player_losses,
            ai_losses: engine.ai_losses(),
            surviving_units,
            stars: star_rating(outcome, turns, player_losses, surviving_units),
        }
    }

    /// Whether the human side won.
    #[must_use]
    pub fn is_victory(&self) -> bool {
        self.outcome == GameState::Victory
    }
}

/// Stars for a finished battle.
///
/// A win earns one star, one more for finishing before turn
/// [`FAST_VICTORY_TURNS`], and one more when losses stay under a quarter of
/// the surviving army. Anything but a win earns none.
#[must_use]
pub fn star_rating(outcome: GameState, turns: u32, player_losses: u32, surviving_units: u32) -> u32 {
    if outcome != GameState::Victory {
        return 0;
    }
    let mut stars = 1;
    if turns < FAST_VICTORY_TURNS {
        stars += 1;
    }
    if player_losses < surviving_units / 4 {
        stars += 1;
    }
    stars.clamp(1, MAX_STARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_stars_unless_won() {
        assert_eq!(star_rating(GameState::Defeat, 2, 0, 8), 0);
        assert_eq!(star_rating(GameState::PlayerTurn, 2, 0, 8), 0);
    }

    #[test]
    fn test_full_marks() {
        assert_eq!(star_rating(GameState::Victory, 5, 0, 4), 3);
    }

    #[test]
    fn test_slow_win() {
        assert_eq!(star_rating(GameState::Victory, 10, 0, 4), 2);
    }

    #[test]
    fn test_costly_win() {
        // 1 loss is not under 7 / 4 = 1.
        assert_eq!(star_rating(GameState::Victory, 3, 1, 7), 2);
        assert_eq!(star_rating(GameState::Victory, 12, 3, 3), 1);
    }
}
