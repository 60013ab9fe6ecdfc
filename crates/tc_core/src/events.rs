//! Engine notifications.
//!
//! The engine calls a single registered [`GameListener`] synchronously at the
//! point each change happens. Listeners receive copies of the affected units,
//! never a handle to the engine, so they cannot re-enter it mid-mutation.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::engine::GameState;
use crate::hex::HexCoordinate;
use crate::unit::{Player, Unit};

/// Receiver of engine notifications. Every method defaults to a no-op.
pub trait GameListener {
    /// The turn state changed.
    fn on_state_changed(&mut self, _state: GameState) {}

    /// A unit moved between two hexes.
    fn on_unit_moved(&mut self, _unit: &Unit, _from: HexCoordinate, _to: HexCoordinate) {}

    /// A unit attacked another. `defender` reflects health after the hit.
    fn on_unit_attacked(&mut self, _attacker: &Unit, _defender: &Unit, _damage: u32) {}

    /// A hex changed owner.
    fn on_territory_changed(&mut self, _hex: HexCoordinate, _owner: Player) {}

    /// A unit was raised.
    fn on_unit_created(&mut self, _unit: &Unit) {}

    /// A unit was destroyed and removed from play.
    fn on_unit_destroyed(&mut self, _unit: &Unit) {}
}

/// A recorded notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// See [`GameListener::on_state_changed`].
    StateChanged(GameState),
    /// See [`GameListener::on_unit_moved`].
    UnitMoved {
        /// Unit after the move.
        unit: Unit,
        /// Origin hex.
        from: HexCoordinate,
        /// Destination hex.
        to: HexCoordinate,
    },
    /// See [`GameListener::on_unit_attacked`].
    UnitAttacked {
        /// Attacker after the attack.
        attacker: Unit,
        /// Defender after taking damage.
        defender: Unit,
        /// Damage dealt.
        damage: u32,
    },
    /// See [`GameListener::on_territory_changed`].
    TerritoryChanged {
        /// Captured hex.
        hex: HexCoordinate,
        /// New owner.
        owner: Player,
    },
    /// See [`GameListener::on_unit_created`].
    UnitCreated(Unit),
    /// See [`GameListener::on_unit_destroyed`].
    UnitDestroyed(Unit),
}

/// Listener that records every notification in order.
///
/// Clones share one buffer, so a test can hand one clone to the engine and
/// inspect another.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<GameEvent>>>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<GameEvent> {
        self.events.borrow().clone()
    }

    /// Remove and return every recorded event.
    pub fn drain(&self) -> Vec<GameEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    fn push(&self, event: GameEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl GameListener for EventLog {
    fn on_state_changed(&mut self, state: GameState) {
        self.push(GameEvent::StateChanged(state));
    }

    fn on_unit_moved(&mut self, unit: &Unit, from: HexCoordinate, to: HexCoordinate) {
        self.push(GameEvent::UnitMoved {
            unit: unit.clone(),
            from,
            to,
        });
    }

    fn on_unit_attacked(&mut self, attacker: &Unit, defender: &Unit, damage: u32) {
        self.push(GameEvent::UnitAttacked {
            attacker: attacker.clone(),
            defender: defender.clone(),
            damage,
        });
    }

    fn on_territory_changed(&mut self, hex: HexCoordinate, owner: Player) {
        self.push(GameEvent::TerritoryChanged { hex, owner });
    }

    fn on_unit_created(&mut self, unit: &Unit) {
        self.push(GameEvent::UnitCreated(unit.clone()));
    }

    fn on_unit_destroyed(&mut self, unit: &Unit) {
        self.push(GameEvent::UnitDestroyed(unit.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{UnitId, UnitType};

    #[test]
    fn test_clones_share_buffer() {
        let log = EventLog::new();
        let mut handle = log.clone();
        handle.on_state_changed(GameState::AiTurn);
        handle.on_territory_changed(HexCoordinate::new(1, 1), Player::Human);

        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[0], GameEvent::StateChanged(GameState::AiTurn));

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn test_default_methods_are_noops() {
        struct Silent;
        impl GameListener for Silent {}

        let unit = Unit::new(UnitId(0), UnitType::Archers, Player::Ai, HexCoordinate::new(0, 0));
        let mut silent = Silent;
        silent.on_unit_created(&unit);
        silent.on_unit_destroyed(&unit);
    }
}
