//! Scripted opponents.
//!
//! Policies act for a given side through the same validated action paths
//! the human side uses, so an AI can never make an illegal move. They are
//! written against the acting side rather than hard-wired to the AI, which
//! lets the human side be auto-played too.
//!
//! - **Easy**: each unit steps to a random legal neighbor, then attacks a
//!   random enemy in range. Half the time one random unit is raised.
//! - **Medium**: strongest attackers first. Every unit hits the weakest enemy
//!   in range, then units with movement left march toward the nearest enemy.
//!   Production fills out two cavalry and three archers, then infantry.
//! - **Hard**: plays Medium for now.

use std::cmp::Reverse;

use crate::engine::{Difficulty, GameEngine};
use crate::hex::HexCoordinate;
use crate::unit::{Player, Unit, UnitId, UnitType};

/// Cavalry the Medium policy wants before it buys anything else.
const CAVALRY_TARGET: usize = 2;

/// Archers the Medium policy wants before falling back to infantry.
const ARCHER_TARGET: usize = 3;

/// Play `side`'s units for one turn using `difficulty`'s policy.
pub(crate) fn take_turn(engine: &mut GameEngine, difficulty: Difficulty, side: Player) {
    tracing::debug!(?side, ?difficulty, units = engine.unit_ids(side).len(), "ai turn");
    match difficulty {
        Difficulty::Easy => easy_turn(engine, side),
        // TODO: give Hard its own lookahead once Medium's weaknesses are mapped.
        Difficulty::Medium | Difficulty::Hard => medium_turn(engine, side),
    }
}

fn easy_turn(engine: &mut GameEngine, side: Player) {
    for id in engine.unit_ids(side) {
        let Some(position) = engine.unit(id).map(Unit::position) else {
            continue;
        };

        let moves: Vec<HexCoordinate> = engine
            .map()
            .neighbors(position)
            .into_iter()
            .filter(|hex| engine.check_move(side, id, *hex).is_ok())
            .collect();
        if !moves.is_empty() {
            let choice = moves[engine.dice().pick(moves.len())];
            act_move(engine, side, id, choice);
        }

        let targets = engine.attack_targets(id);
        if !targets.is_empty() {
            let choice = targets[engine.dice().pick(targets.len())];
            act_attack(engine, side, id, choice);
        }
    }

    if engine.dice().chance_half() {
        let unit_type = UnitType::ALL[engine.dice().pick(UnitType::ALL.len())];
        if let Some(city) = engine.free_city(side) {
            if engine.check_create(side, unit_type, city).is_ok() {
                act_create(engine, side, unit_type, city);
            }
        }
    }
}

fn medium_turn(engine: &mut GameEngine, side: Player) {
    let mut order = engine.unit_ids(side);
    // Stable: equal attack keeps creation order.
    order.sort_by_key(|id| Reverse(engine.unit(*id).map_or(0, |u| u.stats().attack)));

    for &id in &order {
        let weakest = engine
            .attack_targets(id)
            .into_iter()
            .filter_map(|hex| {
                engine
                    .get_unit_at(hex)
                    .map(|target| (target.current_health(), target.id(), hex))
            })
            .min();
        if let Some((_, _, hex)) = weakest {
            act_attack(engine, side, id, hex);
        }
    }

    for &id in &order {
        if let Some(destination) = advance_destination(engine, side, id) {
            act_move(engine, side, id, destination);
        }
    }

    produce(engine, side);
}

/// Furthest affordable, unoccupied hex on the path to the nearest enemy.
fn advance_destination(engine: &GameEngine, side: Player, id: UnitId) -> Option<HexCoordinate> {
    let unit = engine.unit(id)?;
    let budget = unit.remaining_movement();
    if budget == 0 {
        return None;
    }
    let from = unit.position();
    let enemy = nearest_enemy(engine, side, from)?;

    let mut spent = 0;
    let mut destination = None;
    for hex in engine.map().find_path(from, enemy).into_iter().skip(1) {
        let Some(cost) = engine.map().entry_cost(hex) else {
            break;
        };
        if spent + cost > budget || engine.get_unit_at(hex).is_some() {
            break;
        }
        spent += cost;
        destination = Some(hex);
    }
    destination
}

fn nearest_enemy(engine: &GameEngine, side: Player, from: HexCoordinate) -> Option<HexCoordinate> {
    let opponent = side.opponent()?;
    engine
        .units_of(opponent)
        .min_by_key(|u| (from.distance_to(u.position()), u.id()))
        .map(Unit::position)
}

fn produce(engine: &mut GameEngine, side: Player) {
    loop {
        let Some(population) = engine.resources(side).map(|r| r.population) else {
            return;
        };
        let owned = |unit_type: UnitType| {
            engine
                .units_of(side)
                .filter(|u| u.unit_type() == unit_type)
                .count()
        };

        let choice = if owned(UnitType::Cavalry) < CAVALRY_TARGET
            && population >= UnitType::Cavalry.cost()
        {
            UnitType::Cavalry
        } else if owned(UnitType::Archers) < ARCHER_TARGET && population >= UnitType::Archers.cost()
        {
            UnitType::Archers
        } else {
            UnitType::Infantry
        };
        if choice.cost() > population {
            return;
        }
        let Some(city) = engine.free_city(side) else {
            return;
        };
        if !act_create(engine, side, choice, city) {
            return;
        }
    }
}

fn act_move(engine: &mut GameEngine, side: Player, id: UnitId, target: HexCoordinate) {
    if let Err(error) = engine.move_unit_as(side, id, target) {
        tracing::debug!(?side, unit = %id, %target, %error, "ai move rejected");
    }
}

fn act_attack(engine: &mut GameEngine, side: Player, id: UnitId, target: HexCoordinate) {
    if let Err(error) = engine.attack_unit_as(side, id, target) {
        tracing::debug!(?side, unit = %id, %target, %error, "ai attack rejected");
    }
}

fn act_create(engine: &mut GameEngine, side: Player, unit_type: UnitType, hex: HexCoordinate) -> bool {
    match engine.create_unit_as(side, unit_type, hex) {
        Ok(_) => true,
        Err(error) => {
            tracing::debug!(?side, ?unit_type, %hex, %error, "ai production rejected");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::dice::{RandomSource, SeededDice};
    use crate::economy::Resources;
    use crate::engine::GameState;
    use crate::level::{Level, TileData};
    use crate::map::Terrain;
    use crate::snapshot::{GameStateData, SavedGame, SAVE_VERSION};

    struct FixedDice;

    impl RandomSource for FixedDice {
        fn roll(&mut self, _low: i32, _high: i32) -> i32 {
            0
        }

        fn pick(&mut self, _len: usize) -> usize {
            0
        }

        fn chance_half(&mut self) -> bool {
            true
        }
    }

    fn arena_level() -> Level {
        Level::from_ron_str(
            r#"Level(
                id: 9,
                name: "arena",
                map_width: 8,
                map_height: 6,
                tiles: [
                    (x: 0, y: 0, terrain: City, owner: Human),
                    (x: 7, y: 5, terrain: City, owner: Ai),
                ],
                player_start_position: (x: 0, y: 0),
                enemy_start_position: (x: 7, y: 5),
            )"#,
        )
        .unwrap()
    }

    /// Replays queued picks and coin flips. Rolls are always zero.
    struct Script {
        picks: VecDeque<usize>,
        coins: VecDeque<bool>,
    }

    impl Script {
        fn boxed(picks: &[usize], coins: &[bool]) -> Box<dyn RandomSource> {
            Box::new(Self {
                picks: picks.iter().copied().collect(),
                coins: coins.iter().copied().collect(),
            })
        }
    }

    impl RandomSource for Script {
        fn roll(&mut self, _low: i32, _high: i32) -> i32 {
            0
        }

        fn pick(&mut self, len: usize) -> usize {
            self.picks.pop_front().unwrap_or(0) % len.max(1)
        }

        fn chance_half(&mut self) -> bool {
            self.coins.pop_front().unwrap_or(false)
        }
    }

    /// Full-health unit with no movement left.
    fn planted(id: u32, unit_type: UnitType, owner: Player, (col, row): (i32, i32)) -> Unit {
        Unit::restored(
            UnitId(id),
            unit_type,
            owner,
            HexCoordinate::new(col, row),
            unit_type.stats().max_health,
            0,
            false,
        )
    }

    /// Restore an arena match with hand-placed units.
    fn arena(
        units: &[(UnitType, Player, (i32, i32), u32)],
        phase: GameState,
        dice: Box<dyn RandomSource>,
    ) -> GameEngine {
        let placed: Vec<Unit> = units
            .iter()
            .enumerate()
            .map(|(i, (unit_type, owner, (col, row), health))| {
                Unit::restored(
                    UnitId(i as u32),
                    *unit_type,
                    *owner,
                    HexCoordinate::new(*col, *row),
                    *health,
                    unit_type.stats().max_movement,
                    false,
                )
            })
            .collect();
        arena_with(&arena_level(), placed, phase, dice, Resources::default())
    }

    fn arena_with(
        level: &Level,
        placed: Vec<Unit>,
        phase: GameState,
        dice: Box<dyn RandomSource>,
        ai_resources: Resources,
    ) -> GameEngine {
        let saved = SavedGame {
            version: SAVE_VERSION,
            level_id: level.id,
            difficulty: Difficulty::Medium,
            state: GameStateData {
                current_turn: 1,
                phase,
                player_units: placed
                    .iter()
                    .filter(|u| u.owner() == Player::Human)
                    .cloned()
                    .collect(),
                ai_units: placed
                    .iter()
                    .filter(|u| u.owner() == Player::Ai)
                    .cloned()
                    .collect(),
                player_resources: Resources::default(),
                ai_resources,
                map: level.build_map().unwrap(),
            },
            started: true,
            player_losses: 0,
            ai_losses: 0,
            next_unit_id: placed.len() as u32,
        };
        GameEngine::restore(level, &saved, dice).unwrap()
    }

    #[test]
    fn test_medium_focuses_weakest_target() {
        let mut engine = arena(
            &[
                (UnitType::Infantry, Player::Human, (2, 2), 100),
                (UnitType::Infantry, Player::Human, (6, 2), 40),
                (UnitType::Archers, Player::Ai, (4, 2), 70),
            ],
            GameState::AiTurn,
            Box::new(FixedDice),
        );

        take_turn(&mut engine, Difficulty::Medium, Player::Ai);

        // 30 - 15/2 + 5 = 28
        assert_eq!(engine.unit(UnitId(1)).unwrap().current_health(), 12);
        assert_eq!(engine.unit(UnitId(0)).unwrap().current_health(), 100);
    }

    #[test]
    fn test_medium_production_prefers_cavalry() {
        let mut engine = arena(
            &[
                (UnitType::Infantry, Player::Human, (1, 1), 100),
                (UnitType::Infantry, Player::Ai, (5, 1), 100),
            ],
            GameState::AiTurn,
            Box::new(FixedDice),
        );

        take_turn(&mut engine, Difficulty::Medium, Player::Ai);

        let built = engine.get_unit_at(HexCoordinate::new(7, 5)).unwrap();
        assert_eq!(built.unit_type(), UnitType::Cavalry);
        assert_eq!(built.owner(), Player::Ai);
        // Only one free city, so production stops after one unit.
        assert_eq!(engine.resources(Player::Ai).unwrap().population, 2);
    }

    #[test]
    fn test_medium_advances_toward_enemy() {
        let mut engine = arena(
            &[
                (UnitType::Infantry, Player::Human, (1, 2), 100),
                (UnitType::Cavalry, Player::Ai, (6, 2), 120),
            ],
            GameState::AiTurn,
            Box::new(FixedDice),
        );

        take_turn(&mut engine, Difficulty::Medium, Player::Ai);

        let cavalry = engine.unit(UnitId(1)).unwrap();
        assert_eq!(cavalry.position(), HexCoordinate::new(2, 2));
        assert_eq!(cavalry.remaining_movement(), 0);
        assert_eq!(engine.map().owner(HexCoordinate::new(2, 2)), Some(Player::Ai));
    }

    #[test]
    fn test_medium_advance_stops_before_costly_terrain() {
        let mut level = arena_level();
        for row in 0..6 {
            level.tiles.push(TileData {
                x: 3,
                y: row,
                terrain: Terrain::River,
                owner: Player::Neutral,
            });
        }
        let units = vec![
            planted(0, UnitType::Infantry, Player::Human, (1, 2)),
            Unit::restored(
                UnitId(1),
                UnitType::Cavalry,
                Player::Ai,
                HexCoordinate::new(6, 2),
                120,
                4,
                false,
            ),
        ];
        let mut engine = arena_with(
            &level,
            units,
            GameState::AiTurn,
            Box::new(FixedDice),
            Resources::default(),
        );

        take_turn(&mut engine, Difficulty::Medium, Player::Ai);

        // Two plains steps leave 2 movement, short of the river's 3.
        let cavalry = engine.unit(UnitId(1)).unwrap();
        assert_eq!(cavalry.position(), HexCoordinate::new(4, 2));
        assert_eq!(cavalry.remaining_movement(), 2);
        assert_eq!(engine.map().owner(HexCoordinate::new(3, 2)), Some(Player::Neutral));
    }

    #[test]
    fn test_hard_plays_like_medium() {
        let units = [
            (UnitType::Infantry, Player::Human, (1, 2), 100),
            (UnitType::Archers, Player::Human, (2, 4), 70),
            (UnitType::Cavalry, Player::Ai, (6, 2), 120),
            (UnitType::Archers, Player::Ai, (5, 4), 70),
        ];
        let mut medium = arena(&units, GameState::AiTurn, Box::new(SeededDice::new(3)));
        let mut hard = arena(&units, GameState::AiTurn, Box::new(SeededDice::new(3)));

        take_turn(&mut medium, Difficulty::Medium, Player::Ai);
        take_turn(&mut hard, Difficulty::Hard, Player::Ai);

        assert_eq!(medium.state_hash(), hard.state_hash());
    }

    #[test]
    fn test_easy_is_reproducible() {
        let units = [
            (UnitType::Infantry, Player::Human, (1, 2), 100),
            (UnitType::Infantry, Player::Ai, (3, 2), 100),
            (UnitType::Archers, Player::Ai, (4, 3), 70),
        ];
        let mut a = arena(&units, GameState::AiTurn, Box::new(SeededDice::new(11)));
        let mut b = arena(&units, GameState::AiTurn, Box::new(SeededDice::new(11)));

        take_turn(&mut a, Difficulty::Easy, Player::Ai);
        take_turn(&mut b, Difficulty::Easy, Player::Ai);

        assert_eq!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_easy_steps_to_picked_neighbor() {
        // Neighbors of (4, 2) in order E, NE, NW, W, SW, SE.
        for (pick, expected) in [(0, (5, 2)), (3, (3, 2)), (5, (4, 3))] {
            let mut engine = arena(
                &[
                    (UnitType::Infantry, Player::Human, (0, 5), 100),
                    (UnitType::Infantry, Player::Ai, (4, 2), 100),
                ],
                GameState::AiTurn,
                Script::boxed(&[pick], &[]),
            );

            take_turn(&mut engine, Difficulty::Easy, Player::Ai);

            let unit = engine.unit(UnitId(1)).unwrap();
            let target = HexCoordinate::new(expected.0, expected.1);
            assert_eq!(unit.position(), target, "pick {pick}");
            assert_eq!(unit.remaining_movement(), 1);
            assert_eq!(engine.map().owner(target), Some(Player::Ai));
        }
    }

    #[test]
    fn test_easy_attacks_picked_target() {
        let units = vec![
            planted(0, UnitType::Infantry, Player::Human, (2, 2)),
            planted(1, UnitType::Infantry, Player::Human, (6, 2)),
            planted(2, UnitType::Archers, Player::Ai, (4, 2)),
        ];
        let mut engine = arena_with(
            &arena_level(),
            units,
            GameState::AiTurn,
            Script::boxed(&[1], &[]),
            Resources::default(),
        );

        take_turn(&mut engine, Difficulty::Easy, Player::Ai);

        // Targets are listed row-major, so index 1 is (6, 2).
        assert_eq!(engine.unit(UnitId(0)).unwrap().current_health(), 100);
        assert_eq!(engine.unit(UnitId(1)).unwrap().current_health(), 72);
        let archers = engine.unit(UnitId(2)).unwrap();
        assert_eq!(archers.position(), HexCoordinate::new(4, 2));
        assert!(archers.has_attacked());
    }

    #[test]
    fn test_easy_raises_picked_type_on_free_city() {
        let units = vec![
            planted(0, UnitType::Infantry, Player::Human, (1, 4)),
            planted(1, UnitType::Infantry, Player::Ai, (3, 2)),
        ];
        let mut engine = arena_with(
            &arena_level(),
            units,
            GameState::AiTurn,
            Script::boxed(&[2], &[true]),
            Resources::default(),
        );

        take_turn(&mut engine, Difficulty::Easy, Player::Ai);

        let built = engine.get_unit_at(HexCoordinate::new(7, 5)).unwrap();
        assert_eq!(built.unit_type(), UnitType::Cavalry);
        assert_eq!(built.owner(), Player::Ai);
        assert_eq!(engine.resources(Player::Ai).unwrap().population, 2);
    }

    #[test]
    fn test_easy_production_needs_coin_city_and_population() {
        let ai_count = |engine: &GameEngine| engine.units_of(Player::Ai).count();

        // Tails: nothing is raised.
        let mut engine = arena_with(
            &arena_level(),
            vec![
                planted(0, UnitType::Infantry, Player::Human, (1, 4)),
                planted(1, UnitType::Infantry, Player::Ai, (3, 2)),
            ],
            GameState::AiTurn,
            Script::boxed(&[0], &[false]),
            Resources::default(),
        );
        take_turn(&mut engine, Difficulty::Easy, Player::Ai);
        assert_eq!(ai_count(&engine), 1);

        // The only city is occupied.
        let mut engine = arena_with(
            &arena_level(),
            vec![
                planted(0, UnitType::Infantry, Player::Human, (1, 4)),
                planted(1, UnitType::Infantry, Player::Ai, (7, 5)),
            ],
            GameState::AiTurn,
            Script::boxed(&[0], &[true]),
            Resources::default(),
        );
        take_turn(&mut engine, Difficulty::Easy, Player::Ai);
        assert_eq!(ai_count(&engine), 1);
        assert_eq!(engine.resources(Player::Ai).unwrap().population, 5);

        // Cavalry picked with only 2 population: no cheaper fallback.
        let mut engine = arena_with(
            &arena_level(),
            vec![
                planted(0, UnitType::Infantry, Player::Human, (1, 4)),
                planted(1, UnitType::Infantry, Player::Ai, (3, 2)),
            ],
            GameState::AiTurn,
            Script::boxed(&[2], &[true]),
            Resources {
                population: 2,
                ..Resources::default()
            },
        );
        take_turn(&mut engine, Difficulty::Easy, Player::Ai);
        assert_eq!(ai_count(&engine), 1);
        assert!(engine.get_unit_at(HexCoordinate::new(7, 5)).is_none());
        assert_eq!(engine.resources(Player::Ai).unwrap().population, 2);
    }

    #[test]
    fn test_autoplay_drives_human_side() {
        let mut engine = arena(
            &[
                (UnitType::Cavalry, Player::Human, (1, 2), 120),
                (UnitType::Infantry, Player::Ai, (6, 2), 100),
            ],
            GameState::PlayerTurn,
            Box::new(FixedDice),
        );

        engine.auto_play_player_turn(Difficulty::Medium).unwrap();

        assert_eq!(
            engine.unit(UnitId(0)).unwrap().position(),
            HexCoordinate::new(5, 2)
        );
        assert_eq!(engine.state(), GameState::PlayerTurn);
    }
}
