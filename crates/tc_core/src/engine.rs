//! Turn state machine and action rules.
//!
//! A [`GameEngine`] owns one match: the map, every live unit, both resource
//! pools and the turn cycle
//!
//! ```text
//! start_game ──► PlayerTurn ──end_player_turn──► AiTurn ──process_ai_turn──┐
//!                    ▲                                                     │
//!                    └─────────────────────────────────────────────────────┘
//!                 (either transition may instead end in Victory or Defeat)
//! ```
//!
//! Every action has a non-mutating `can_*` twin. Actions return an
//! [`ActionError`] for illegal requests and leave the engine untouched when
//! they do.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::ai;
use crate::combat::AttackProfile;
use crate::dice::{RandomSource, SeededDice};
use crate::economy::{self, Resources, POPULATION_CAP};
use crate::error::{ActionError, ActionResult, GameError, Result};
use crate::events::GameListener;
use crate::hex::HexCoordinate;
use crate::level::{Level, StartUnit};
use crate::map::HexMap;
use crate::snapshot::{GameStateData, SavedGame, SAVE_VERSION};
use crate::unit::{Player, Unit, UnitId, UnitType};

/// Phase of the turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// The human side may act.
    PlayerTurn,
    /// Waiting for [`GameEngine::process_ai_turn`].
    AiTurn,
    /// The AI side was eliminated. Terminal.
    Victory,
    /// The human side was eliminated. Terminal.
    Defeat,
}

impl GameState {
    /// Whether the match has ended.
    #[must_use]
    pub const fn is_over(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat)
    }

    /// Side allowed to act in this phase.
    #[must_use]
    pub const fn active_side(self) -> Option<Player> {
        match self {
            Self::PlayerTurn => Some(Player::Human),
            Self::AiTurn => Some(Player::Ai),
            Self::Victory | Self::Defeat => None,
        }
    }
}

/// AI strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// Random legal moves and attacks.
    Easy,
    /// Focused attacks, advance on the nearest enemy, planned production.
    #[default]
    Medium,
    /// Currently plays like [`Difficulty::Medium`].
    Hard,
}

impl Difficulty {
    /// Difficulty used for a level in the campaign: four levels per tier.
    #[must_use]
    pub const fn for_level(level_id: u32) -> Self {
        match level_id / 4 {
            0 => Self::Easy,
            1 => Self::Medium,
            _ => Self::Hard,
        }
    }
}

/// What a resolved attack did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackOutcome {
    /// Damage dealt to the defender.
    pub damage: u32,
    /// Whether the defender was destroyed.
    pub defender_destroyed: bool,
    /// Whether the attacker moved into the vacated hex.
    pub attacker_advanced: bool,
}

/// One match of the tactics game.
pub struct GameEngine {
    level_id: u32,
    difficulty: Difficulty,
    map: HexMap,
    /// Live units of both sides in creation order.
    units: Vec<Unit>,
    player_resources: Resources,
    ai_resources: Resources,
    current_turn: u32,
    state: GameState,
    started: bool,
    player_losses: u32,
    ai_losses: u32,
    next_unit_id: u32,
    dice: Box<dyn RandomSource>,
    listener: Option<Box<dyn GameListener>>,
}

impl fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameEngine")
            .field("level_id", &self.level_id)
            .field("difficulty", &self.difficulty)
            .field("current_turn", &self.current_turn)
            .field("state", &self.state)
            .field("started", &self.started)
            .field("units", &self.units.len())
            .finish_non_exhaustive()
    }
}

impl GameEngine {
    /// Build an engine with an entropy-seeded random source.
    pub fn new(level: &Level, difficulty: Difficulty) -> Result<Self> {
        let dice = SeededDice::from_entropy();
        tracing::debug!(seed = dice.seed(), "engine seeded from entropy");
        Self::with_random_source(level, difficulty, Box::new(dice))
    }

    /// Build an engine whose randomness is fixed by `seed`.
    pub fn with_seed(level: &Level, difficulty: Difficulty, seed: u64) -> Result<Self> {
        Self::with_random_source(level, difficulty, Box::new(SeededDice::new(seed)))
    }

    /// Build an engine drawing every random decision from `dice`.
    ///
    /// Fails with [`GameError::InvalidLevel`] when the level is structurally
    /// broken or its start units cannot all be placed.
    pub fn with_random_source(
        level: &Level,
        difficulty: Difficulty,
        dice: Box<dyn RandomSource>,
    ) -> Result<Self> {
        let mut map = level.build_map()?;

        // Each side holds at least its start hex.
        for (side, position) in [
            (Player::Human, level.player_start_position),
            (Player::Ai, level.enemy_start_position),
        ] {
            let hex = HexCoordinate::from(position);
            if map.owner(hex) == Some(Player::Neutral) {
                map.set_owner(hex, side);
            }
        }

        let mut engine = Self {
            level_id: level.id,
            difficulty,
            map,
            units: Vec::new(),
            player_resources: Resources::default(),
            ai_resources: Resources::default(),
            current_turn: 1,
            state: GameState::PlayerTurn,
            started: false,
            player_losses: 0,
            ai_losses: 0,
            next_unit_id: 0,
            dice,
            listener: None,
        };

        engine.place_start_units(
            level.id,
            Player::Human,
            level.player_start_position.into(),
            &level.player_start_units,
        )?;
        engine.place_start_units(
            level.id,
            Player::Ai,
            level.enemy_start_position.into(),
            &level.enemy_start_units,
        )?;
        engine.refresh_territories();

        tracing::info!(
            level = level.id,
            ?difficulty,
            width = level.map_width,
            height = level.map_height,
            units = engine.units.len(),
            "engine ready"
        );
        Ok(engine)
    }

    fn place_start_units(
        &mut self,
        level_id: u32,
        side: Player,
        origin: HexCoordinate,
        batches: &[StartUnit],
    ) -> Result<()> {
        for batch in batches {
            for _ in 0..batch.count {
                let hex = self
                    .nearest_free_hex(origin)
                    .ok_or_else(|| GameError::InvalidLevel {
                        level_id,
                        reason: format!("no free hex near {origin} for {:?}", batch.unit_type),
                    })?;
                self.spawn(batch.unit_type, side, hex);
            }
        }
        Ok(())
    }

    /// Closest unoccupied hex to `origin`, ties broken row-major.
    fn nearest_free_hex(&self, origin: HexCoordinate) -> Option<HexCoordinate> {
        self.map
            .hexes()
            .filter(|hex| self.unit_index_at(*hex).is_none())
            .min_by_key(|hex| (origin.distance_to(*hex), hex.row, hex.col))
    }

    fn spawn(&mut self, unit_type: UnitType, owner: Player, hex: HexCoordinate) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        self.units.push(Unit::new(id, unit_type, owner, hex));
        id
    }

    // ---------------------------------------------------------------------
    // Listener
    // ---------------------------------------------------------------------

    /// Register the listener, replacing any previous one.
    pub fn set_listener(&mut self, listener: Box<dyn GameListener>) {
        self.listener = Some(listener);
    }

    /// Remove and return the current listener.
    pub fn clear_listener(&mut self) -> Option<Box<dyn GameListener>> {
        self.listener.take()
    }

    fn notify(&mut self, f: impl FnOnce(&mut dyn GameListener)) {
        if let Some(listener) = self.listener.as_deref_mut() {
            f(listener);
        }
    }

    // ---------------------------------------------------------------------
    // Turn cycle
    // ---------------------------------------------------------------------

    /// Begin the match and grant the human side its opening income.
    pub fn start_game(&mut self) -> ActionResult<()> {
        if self.started {
            return Err(ActionError::AlreadyStarted);
        }
        self.started = true;
        self.current_turn = 1;
        economy::begin_turn(&mut self.player_resources, &self.map, Player::Human);
        self.ai_resources.refresh_territories(&self.map, Player::Ai);
        tracing::info!(level = self.level_id, difficulty = ?self.difficulty, "game started");
        self.transition(GameState::PlayerTurn);
        Ok(())
    }

    /// Finish the human half-turn.
    ///
    /// Refreshes human units, then checks victory before defeat. Returns the
    /// new state.
    pub fn end_player_turn(&mut self) -> ActionResult<GameState> {
        self.check_turn(Player::Human)?;
        self.reset_units(Player::Human);
        let next = self.evaluate_outcome().unwrap_or(GameState::AiTurn);
        self.transition(next);
        Ok(next)
    }

    /// Play the whole AI half-turn.
    ///
    /// Grants AI income, runs the difficulty's policy, refreshes AI units
    /// and checks victory before defeat. If the match goes on, the turn
    /// counter advances and the human side collects income. Returns the new
    /// state.
    pub fn process_ai_turn(&mut self) -> ActionResult<GameState> {
        self.check_turn(Player::Ai)?;
        economy::begin_turn(&mut self.ai_resources, &self.map, Player::Ai);

        let difficulty = self.difficulty;
        ai::take_turn(self, difficulty, Player::Ai);

        self.reset_units(Player::Ai);
        let next = match self.evaluate_outcome() {
            Some(outcome) => outcome,
            None => {
                self.current_turn += 1;
                economy::begin_turn(&mut self.player_resources, &self.map, Player::Human);
                GameState::PlayerTurn
            }
        };
        self.transition(next);
        Ok(next)
    }

    /// Let an AI policy play the human side's current turn.
    ///
    /// Does not end the turn.
    pub fn auto_play_player_turn(&mut self, difficulty: Difficulty) -> ActionResult<()> {
        self.check_turn(Player::Human)?;
        ai::take_turn(self, difficulty, Player::Human);
        Ok(())
    }

    fn transition(&mut self, next: GameState) {
        let previous = self.state;
        self.state = next;
        tracing::info!(turn = self.current_turn, from = ?previous, to = ?next, "state changed");
        if next.is_over() {
            tracing::info!(
                outcome = ?next,
                turn = self.current_turn,
                player_losses = self.player_losses,
                ai_losses = self.ai_losses,
                "game over"
            );
        }
        self.notify(|l| l.on_state_changed(next));
        self.after_mutation();
    }

    /// Victory is checked first, so a mutual wipeout counts as a win.
    fn evaluate_outcome(&self) -> Option<GameState> {
        if self.is_eliminated(Player::Ai) {
            Some(GameState::Victory)
        } else if self.is_eliminated(Player::Human) {
            Some(GameState::Defeat)
        } else {
            None
        }
    }

    fn is_eliminated(&self, side: Player) -> bool {
        !self.units.iter().any(|u| u.owner() == side) || self.map.territory_count(side) == 0
    }

    fn reset_units(&mut self, side: Player) {
        for unit in self.units.iter_mut().filter(|u| u.owner() == side) {
            unit.reset_movement();
        }
    }

    fn check_turn(&self, side: Player) -> ActionResult<()> {
        if !self.started {
            return Err(ActionError::NotStarted);
        }
        if self.state.is_over() {
            return Err(ActionError::GameOver);
        }
        if self.state.active_side() != Some(side) {
            return Err(ActionError::WrongTurn);
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Unit creation
    // ---------------------------------------------------------------------

    /// Whether the human side may raise `unit_type` on `hex`.
    #[must_use]
    pub fn can_create_unit(&self, unit_type: UnitType, hex: HexCoordinate) -> bool {
        self.check_create(Player::Human, unit_type, hex).is_ok()
    }

    /// Raise a human unit on an owned, empty hex, paying its population cost.
    pub fn create_unit(&mut self, unit_type: UnitType, hex: HexCoordinate) -> ActionResult<UnitId> {
        self.create_unit_as(Player::Human, unit_type, hex)
    }

    pub(crate) fn check_create(
        &self,
        side: Player,
        unit_type: UnitType,
        hex: HexCoordinate,
    ) -> ActionResult<()> {
        self.check_turn(side)?;
        if !self.map.in_bounds(hex) {
            return Err(ActionError::OutOfBounds(hex));
        }
        if self.map.owner(hex) != Some(side) {
            return Err(ActionError::NotOwnedHex(hex));
        }
        if self.unit_index_at(hex).is_some() {
            return Err(ActionError::Occupied(hex));
        }
        let required = unit_type.cost();
        let available = self.resources(side).map_or(0, |r| r.population);
        if available < required {
            return Err(ActionError::InsufficientPopulation {
                required,
                available,
            });
        }
        Ok(())
    }

    pub(crate) fn create_unit_as(
        &mut self,
        side: Player,
        unit_type: UnitType,
        hex: HexCoordinate,
    ) -> ActionResult<UnitId> {
        self.check_create(side, unit_type, hex)?;
        if let Some(resources) = self.resources_mut(side) {
            resources.spend(unit_type.cost());
        }
        let id = self.spawn(unit_type, side, hex);
        tracing::debug!(unit = %id, ?unit_type, ?side, %hex, "unit created");
        if let Some(unit) = self.units.last().cloned() {
            self.notify(|l| l.on_unit_created(&unit));
        }
        self.after_mutation();
        Ok(id)
    }

    // ---------------------------------------------------------------------
    // Movement
    // ---------------------------------------------------------------------

    /// Whether the human unit `id` may move to `target` now.
    #[must_use]
    pub fn can_move_unit(&self, id: UnitId, target: HexCoordinate) -> bool {
        self.check_move(Player::Human, id, target).is_ok()
    }

    /// Move a human unit, capturing the destination if it belongs to
    /// someone else.
    pub fn move_unit(&mut self, id: UnitId, target: HexCoordinate) -> ActionResult<()> {
        self.move_unit_as(Player::Human, id, target)
    }

    /// Validate a move and return its movement cost.
    ///
    /// The straight-line distance is a cheap pre-filter; the path cost is
    /// authoritative.
    pub(crate) fn check_move(
        &self,
        side: Player,
        id: UnitId,
        target: HexCoordinate,
    ) -> ActionResult<u32> {
        self.check_turn(side)?;
        let unit = self.unit(id).ok_or(ActionError::UnknownUnit(id))?;
        if unit.owner() != side {
            return Err(ActionError::NotOwner(id));
        }
        if !self.map.in_bounds(target) {
            return Err(ActionError::OutOfBounds(target));
        }
        let budget = unit.remaining_movement();
        if budget == 0 {
            return Err(ActionError::NoMovement(id));
        }
        if self.unit_index_at(target).is_some() {
            return Err(ActionError::Occupied(target));
        }
        if unit.position().distance_to(target) > budget {
            return Err(ActionError::TooFar(target));
        }
        let cost = self
            .map
            .movement_cost(unit.position(), target)
            .ok_or(ActionError::Unreachable(target))?;
        if cost > budget {
            return Err(ActionError::TooFar(target));
        }
        Ok(cost)
    }

    pub(crate) fn move_unit_as(
        &mut self,
        side: Player,
        id: UnitId,
        target: HexCoordinate,
    ) -> ActionResult<()> {
        let cost = self.check_move(side, id, target)?;
        self.relocate(id, target, cost);
        self.after_mutation();
        Ok(())
    }

    /// Move a unit without any legality checks and capture the destination.
    fn relocate(&mut self, id: UnitId, to: HexCoordinate, cost: u32) {
        let Some(index) = self.unit_index(id) else {
            return;
        };
        let unit = &mut self.units[index];
        let from = unit.position();
        let owner = unit.owner();
        unit.use_movement(cost);
        unit.set_position(to);
        let moved = unit.clone();

        if self.map.owner(to).is_some_and(|current| current != owner) {
            self.map.set_owner(to, owner);
            self.refresh_territories();
            tracing::debug!(hex = %to, ?owner, "territory captured");
            self.notify(|l| l.on_territory_changed(to, owner));
        }

        tracing::debug!(unit = %id, %from, %to, cost, "unit moved");
        self.notify(|l| l.on_unit_moved(&moved, from, to));
    }

    // ---------------------------------------------------------------------
    // Combat
    // ---------------------------------------------------------------------

    /// Whether the human unit `id` may attack `target` now.
    #[must_use]
    pub fn can_attack(&self, id: UnitId, target: HexCoordinate) -> bool {
        self.check_attack(Player::Human, id, target).is_ok()
    }

    /// Attack the unit on `target` with the human unit `id`.
    ///
    /// A destroyed defender is removed at once. A non-archer that destroys
    /// an adjacent defender moves into its hex.
    pub fn attack_unit(&mut self, id: UnitId, target: HexCoordinate) -> ActionResult<AttackOutcome> {
        self.attack_unit_as(Player::Human, id, target)
    }

    /// Validate an attack and return the defender's index.
    pub(crate) fn check_attack(
        &self,
        side: Player,
        id: UnitId,
        target: HexCoordinate,
    ) -> ActionResult<usize> {
        self.check_turn(side)?;
        let attacker = self.unit(id).ok_or(ActionError::UnknownUnit(id))?;
        if attacker.owner() != side {
            return Err(ActionError::NotOwner(id));
        }
        if attacker.has_attacked() {
            return Err(ActionError::AlreadyAttacked(id));
        }
        if !self.map.in_bounds(target) {
            return Err(ActionError::OutOfBounds(target));
        }
        let defender = self
            .unit_index_at(target)
            .ok_or(ActionError::NoDefender(target))?;
        if self.units[defender].owner() == attacker.owner() {
            return Err(ActionError::FriendlyTarget(target));
        }
        if attacker.position().distance_to(target) > attacker.stats().attack_range {
            return Err(ActionError::OutOfRange(target));
        }
        Ok(defender)
    }

    pub(crate) fn attack_unit_as(
        &mut self,
        side: Player,
        id: UnitId,
        target: HexCoordinate,
    ) -> ActionResult<AttackOutcome> {
        let defender_index = self.check_attack(side, id, target)?;
        let attacker_index = self.unit_index(id).ok_or(ActionError::UnknownUnit(id))?;

        let profile = AttackProfile {
            attacker: self.units[attacker_index].unit_type(),
            defender: self.units[defender_index].unit_type(),
            terrain_bonus: self.map.terrain_defense_bonus(target),
        };
        let damage = profile.roll_damage(self.dice.as_mut());

        self.units[defender_index].take_damage(damage);
        self.units[attacker_index].mark_attacked();
        let attacker = self.units[attacker_index].clone();
        let defender = self.units[defender_index].clone();

        tracing::debug!(
            attacker = %attacker.id(),
            defender = %defender.id(),
            damage,
            remaining = defender.current_health(),
            "attack resolved"
        );
        self.notify(|l| l.on_unit_attacked(&attacker, &defender, damage));

        let mut outcome = AttackOutcome {
            damage,
            defender_destroyed: false,
            attacker_advanced: false,
        };

        if !defender.is_alive() {
            self.units.remove(defender_index);
            self.record_loss(defender.owner());
            outcome.defender_destroyed = true;
            tracing::debug!(unit = %defender.id(), owner = ?defender.owner(), "unit destroyed");
            self.notify(|l| l.on_unit_destroyed(&defender));

            let melee = attacker.unit_type() != UnitType::Archers
                && attacker.position().distance_to(target) == 1;
            if melee {
                let cost = self.map.entry_cost(target).unwrap_or(0);
                self.relocate(id, target, cost);
                outcome.attacker_advanced = true;
            }
        }

        self.after_mutation();
        Ok(outcome)
    }

    fn record_loss(&mut self, side: Player) {
        match side {
            Player::Human => self.player_losses += 1,
            Player::Ai => self.ai_losses += 1,
            Player::Neutral => {}
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Owned snapshot of the whole match.
    #[must_use]
    pub fn get_game_state(&self) -> GameStateData {
        GameStateData {
            current_turn: self.current_turn,
            phase: self.state,
            player_units: self.units_of(Player::Human).cloned().collect(),
            ai_units: self.units_of(Player::Ai).cloned().collect(),
            player_resources: self.player_resources,
            ai_resources: self.ai_resources,
            map: self.map.clone(),
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn state(&self) -> GameState {
        self.state
    }

    /// Turn number, starting at 1.
    #[must_use]
    pub const fn current_turn(&self) -> u32 {
        self.current_turn
    }

    /// Whether `start_game` has been called.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Level this match was built from.
    #[must_use]
    pub const fn level_id(&self) -> u32 {
        self.level_id
    }

    /// AI strength.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Read-only view of the map.
    #[must_use]
    pub const fn map(&self) -> &HexMap {
        &self.map
    }

    /// Resource pool of a side. Neutral has none.
    #[must_use]
    pub const fn resources(&self, side: Player) -> Option<Resources> {
        match side {
            Player::Human => Some(self.player_resources),
            Player::Ai => Some(self.ai_resources),
            Player::Neutral => None,
        }
    }

    fn resources_mut(&mut self, side: Player) -> Option<&mut Resources> {
        match side {
            Player::Human => Some(&mut self.player_resources),
            Player::Ai => Some(&mut self.ai_resources),
            Player::Neutral => None,
        }
    }

    fn refresh_territories(&mut self) {
        self.player_resources
            .refresh_territories(&self.map, Player::Human);
        self.ai_resources.refresh_territories(&self.map, Player::Ai);
    }

    /// Unit standing on `hex`.
    #[must_use]
    pub fn get_unit_at(&self, hex: HexCoordinate) -> Option<&Unit> {
        self.units.iter().find(|u| u.position() == hex)
    }

    /// Live unit with id `id`.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id() == id)
    }

    /// Live units of one side in creation order.
    pub fn units_of(&self, side: Player) -> impl Iterator<Item = &Unit> + '_ {
        self.units.iter().filter(move |u| u.owner() == side)
    }

    pub(crate) fn unit_ids(&self, side: Player) -> Vec<UnitId> {
        self.units_of(side).map(Unit::id).collect()
    }

    fn unit_index(&self, id: UnitId) -> Option<usize> {
        self.units.iter().position(|u| u.id() == id)
    }

    fn unit_index_at(&self, hex: HexCoordinate) -> Option<usize> {
        self.units.iter().position(|u| u.position() == hex)
    }

    /// Population cost of every unit type.
    #[must_use]
    pub fn unit_costs(&self) -> [(UnitType, u32); 3] {
        UnitType::ALL.map(|t| (t, t.cost()))
    }

    /// Human units destroyed so far.
    #[must_use]
    pub const fn player_losses(&self) -> u32 {
        self.player_losses
    }

    /// AI units destroyed so far.
    #[must_use]
    pub const fn ai_losses(&self) -> u32 {
        self.ai_losses
    }

    /// Every hex the unit may legally move to right now, row-major.
    ///
    /// Empty when it is not the owner's turn.
    #[must_use]
    pub fn movement_targets(&self, id: UnitId) -> Vec<HexCoordinate> {
        let Some(unit) = self.unit(id) else {
            return Vec::new();
        };
        let side = unit.owner();
        self.map
            .reachable(unit.position(), unit.remaining_movement())
            .into_iter()
            .map(|(hex, _)| hex)
            .filter(|hex| self.check_move(side, id, *hex).is_ok())
            .collect()
    }

    /// Every hex the unit may legally attack right now, row-major.
    #[must_use]
    pub fn attack_targets(&self, id: UnitId) -> Vec<HexCoordinate> {
        let Some(unit) = self.unit(id) else {
            return Vec::new();
        };
        let side = unit.owner();
        let mut targets: Vec<_> = unit
            .position()
            .hexes_in_radius(unit.stats().attack_range)
            .into_iter()
            .filter(|hex| self.check_attack(side, id, *hex).is_ok())
            .collect();
        targets.sort_unstable();
        targets
    }

    /// First empty city owned by `side`, row-major.
    pub(crate) fn free_city(&self, side: Player) -> Option<HexCoordinate> {
        self.map
            .cities_owned_by(side)
            .into_iter()
            .find(|hex| self.unit_index_at(*hex).is_none())
    }

    pub(crate) fn dice(&mut self) -> &mut dyn RandomSource {
        self.dice.as_mut()
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Capture everything needed to rebuild this match.
    #[must_use]
    pub fn save(&self) -> SavedGame {
        SavedGame {
            version: SAVE_VERSION,
            level_id: self.level_id,
            difficulty: self.difficulty,
            state: self.get_game_state(),
            started: self.started,
            player_losses: self.player_losses,
            ai_losses: self.ai_losses,
            next_unit_id: self.next_unit_id,
        }
    }

    /// Rebuild a match from a save made on `level`.
    ///
    /// The random stream is not part of a save; pass a source seeded however
    /// the caller needs.
    pub fn restore(level: &Level, saved: &SavedGame, dice: Box<dyn RandomSource>) -> Result<Self> {
        if saved.version != SAVE_VERSION {
            return Err(GameError::SaveVersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }
        let mismatch = |reason: String| GameError::SaveLevelMismatch {
            level_id: level.id,
            reason,
        };
        if saved.level_id != level.id {
            return Err(mismatch(format!("save is for level {}", saved.level_id)));
        }
        let map = saved.state.map.clone();
        if map.width() != level.map_width || map.height() != level.map_height {
            return Err(mismatch(format!(
                "map is {}x{}, level is {}x{}",
                map.width(),
                map.height(),
                level.map_width,
                level.map_height
            )));
        }

        let mut units: Vec<Unit> = Vec::new();
        for (side, list) in [
            (Player::Human, &saved.state.player_units),
            (Player::Ai, &saved.state.ai_units),
        ] {
            for unit in list {
                let invalid = |what: &str| {
                    GameError::InvalidState(format!("unit {} {what}", unit.id()))
                };
                if unit.owner() != side {
                    return Err(invalid("is listed under the wrong side"));
                }
                if !unit.is_alive() {
                    return Err(invalid("has no health"));
                }
                if !map.in_bounds(unit.position()) {
                    return Err(invalid("is off the map"));
                }
                if unit.id().0 >= saved.next_unit_id {
                    return Err(invalid("has an id that was never handed out"));
                }
                if units
                    .iter()
                    .any(|u| u.id() == unit.id() || u.position() == unit.position())
                {
                    return Err(invalid("collides with another unit"));
                }
                units.push(Unit::restored(
                    unit.id(),
                    unit.unit_type(),
                    unit.owner(),
                    unit.position(),
                    unit.current_health(),
                    unit.remaining_movement(),
                    unit.has_attacked(),
                ));
            }
        }
        units.sort_by_key(Unit::id);

        for resources in [&saved.state.player_resources, &saved.state.ai_resources] {
            if resources.population > POPULATION_CAP {
                return Err(GameError::InvalidState(format!(
                    "population {} exceeds cap {POPULATION_CAP}",
                    resources.population
                )));
            }
        }

        let mut engine = Self {
            level_id: saved.level_id,
            difficulty: saved.difficulty,
            map,
            units,
            player_resources: saved.state.player_resources,
            ai_resources: saved.state.ai_resources,
            current_turn: saved.state.current_turn.max(1),
            state: saved.state.phase,
            started: saved.started,
            player_losses: saved.player_losses,
            ai_losses: saved.ai_losses,
            next_unit_id: saved.next_unit_id,
            dice,
            listener: None,
        };
        engine.refresh_territories();
        tracing::info!(
            level = engine.level_id,
            turn = engine.current_turn,
            state = ?engine.state,
            "game restored"
        );
        Ok(engine)
    }

    /// Stable hash of the observable match state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.get_game_state().hash(&mut hasher);
        self.started.hash(&mut hasher);
        self.player_losses.hash(&mut hasher);
        self.ai_losses.hash(&mut hasher);
        self.next_unit_id.hash(&mut hasher);
        hasher.finish()
    }

    // ---------------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------------

    /// Check every engine invariant.
    #[cfg(feature = "debug-validation")]
    pub fn validate_invariants(&self) -> Result<()> {
        let fail = |msg: String| -> Result<()> { Err(GameError::InvalidState(msg)) };
        for (i, unit) in self.units.iter().enumerate() {
            let stats = unit.stats();
            if !unit.is_alive() {
                return fail(format!("dead unit {} still in play", unit.id()));
            }
            if unit.current_health() > stats.max_health {
                return fail(format!("unit {} health above max", unit.id()));
            }
            if unit.remaining_movement() > stats.max_movement {
                return fail(format!("unit {} movement above max", unit.id()));
            }
            if unit.owner() == Player::Neutral {
                return fail(format!("unit {} has no side", unit.id()));
            }
            if !self.map.in_bounds(unit.position()) {
                return fail(format!("unit {} is off the map", unit.id()));
            }
            if unit.id().0 >= self.next_unit_id {
                return fail(format!("unit {} id was never handed out", unit.id()));
            }
            if self.units[..i]
                .iter()
                .any(|other| other.position() == unit.position() || other.id() >= unit.id())
            {
                return fail(format!("unit {} collides or is out of order", unit.id()));
            }
        }
        for side in [Player::Human, Player::Ai] {
            if let Some(res) = self.resources(side) {
                if res.population > POPULATION_CAP {
                    return fail(format!("{side:?} population above cap"));
                }
                if res.territories != self.map.territory_count(side) {
                    return fail(format!("{side:?} territory count is stale"));
                }
            }
        }
        Ok(())
    }

    #[cfg(feature = "debug-validation")]
    fn after_mutation(&self) {
        if let Err(error) = self.validate_invariants() {
            tracing::error!(%error, "engine invariant violated");
            debug_assert!(false, "engine invariant violated: {error}");
        }
    }

    #[cfg(not(feature = "debug-validation"))]
    #[inline]
    fn after_mutation(&self) {}
}
