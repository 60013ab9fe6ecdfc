//! Save, restore and replay of matches in progress.

use tc_core::prelude::*;
use tc_test_utils::determinism::{play_round, seeded_match};
use tc_test_utils::fixtures::{duel_level, hex, skirmish_level, unit_at, LevelBuilder};

fn mid_match(rounds: u32) -> (Level, GameEngine) {
    let level = skirmish_level();
    let mut engine = seeded_match(&level, Difficulty::Medium, 11);
    for _ in 0..rounds {
        play_round(&mut engine, Some(Difficulty::Easy));
    }
    (level, engine)
}

#[test]
fn restore_from_bytes_reproduces_state() {
    let (level, engine) = mid_match(4);
    let bytes = engine.save().to_bytes().unwrap();
    let saved = SavedGame::from_bytes(&bytes).unwrap();
    let restored = GameEngine::restore(&level, &saved, Box::new(SeededDice::new(0))).unwrap();

    assert_eq!(restored.state_hash(), engine.state_hash());
    assert_eq!(restored.get_game_state(), engine.get_game_state());
    assert_eq!(restored.current_turn(), engine.current_turn());
    assert_eq!(restored.player_losses(), engine.player_losses());
}

#[test]
fn restore_from_ron_file() {
    let (level, engine) = mid_match(2);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slot1.ron");
    std::fs::write(&path, engine.save().to_ron().unwrap()).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let saved = SavedGame::from_ron(&text).unwrap();
    let restored = GameEngine::restore(&level, &saved, Box::new(SeededDice::new(0))).unwrap();
    assert_eq!(restored.state_hash(), engine.state_hash());
}

#[test]
fn restored_match_continues_like_original() {
    let (level, mut original) = mid_match(3);
    let saved = original.save();
    let mut restored = GameEngine::restore(&level, &saved, Box::new(SeededDice::new(99))).unwrap();
    let mut twin = GameEngine::restore(&level, &saved, Box::new(SeededDice::new(99))).unwrap();

    for _ in 0..3 {
        play_round(&mut restored, Some(Difficulty::Medium));
        play_round(&mut twin, Some(Difficulty::Medium));
    }
    assert_eq!(restored.state_hash(), twin.state_hash());

    // The original keeps its own stream and may diverge, but must still play.
    play_round(&mut original, None);
    assert!(original.current_turn() >= saved.state.current_turn);
}

#[test]
fn restored_engine_accepts_actions() {
    let level = duel_level();
    let engine = seeded_match(&level, Difficulty::Easy, 3);
    let saved = engine.save();
    let mut restored = GameEngine::restore(&level, &saved, Box::new(SeededDice::new(3))).unwrap();

    let infantry = unit_at(&restored, 1, 2);
    restored.move_unit(infantry, hex(2, 2)).unwrap();
    let id = restored.create_unit(UnitType::Infantry, hex(0, 2)).unwrap();
    assert!(id.0 >= saved.next_unit_id);
}

#[test]
fn restore_rejects_other_level() {
    let (_, engine) = mid_match(1);
    let other = duel_level();
    assert!(matches!(
        GameEngine::restore(&other, &engine.save(), Box::new(SeededDice::new(0))),
        Err(GameError::SaveLevelMismatch { .. })
    ));
}

#[test]
fn restore_rejects_resized_level() {
    let (mut level, engine) = mid_match(1);
    level.map_width += 1;
    assert!(matches!(
        GameEngine::restore(&level, &engine.save(), Box::new(SeededDice::new(0))),
        Err(GameError::SaveLevelMismatch { .. })
    ));
}

#[test]
fn save_with_short_tile_list_is_rejected() {
    let level = duel_level();
    let mut engine = GameEngine::with_seed(&level, Difficulty::Easy, 3).unwrap();
    engine.start_game().unwrap();
    let mut saved = engine.save();
    saved.state.map = HexMap::new(8, 1);

    let text = saved.to_ron().unwrap();
    let stretched = text.replace("height: 1", "height: 6");
    assert_ne!(text, stretched);

    // Only eight tiles for an 8x6 grid: decoding fails instead of restoring.
    assert!(matches!(
        SavedGame::from_ron(&stretched),
        Err(GameError::Decode(_))
    ));
}

#[test]
fn restore_rejects_future_version() {
    let (level, engine) = mid_match(0);
    let mut saved = engine.save();
    saved.version += 1;
    assert!(matches!(
        GameEngine::restore(&level, &saved, Box::new(SeededDice::new(0))),
        Err(GameError::SaveVersionMismatch { .. })
    ));
}

#[test]
fn restore_rejects_stacked_units() {
    let (level, engine) = mid_match(0);
    let mut saved = engine.save();
    let first = saved.state.player_units[0].clone();
    let second = &mut saved.state.player_units[1];
    let edited = Unit::new(second.id(), second.unit_type(), second.owner(), first.position());
    *second = edited;
    assert!(matches!(
        GameEngine::restore(&level, &saved, Box::new(SeededDice::new(0))),
        Err(GameError::InvalidState(_))
    ));
}

#[test]
fn restore_rejects_overfull_population() {
    let (level, engine) = mid_match(0);
    let mut saved = engine.save();
    saved.state.ai_resources.population = POPULATION_CAP + 1;
    assert!(matches!(
        GameEngine::restore(&level, &saved, Box::new(SeededDice::new(0))),
        Err(GameError::InvalidState(_))
    ));
}

#[test]
fn same_seed_same_match() {
    let level = skirmish_level();
    let mut a = GameEngine::with_seed(&level, Difficulty::Easy, 2024).unwrap();
    let mut b = GameEngine::with_seed(&level, Difficulty::Easy, 2024).unwrap();
    a.start_game().unwrap();
    b.start_game().unwrap();
    for _ in 0..10 {
        play_round(&mut a, Some(Difficulty::Easy));
        play_round(&mut b, Some(Difficulty::Easy));
        assert_eq!(a.state_hash(), b.state_hash());
    }
}

#[test]
fn level_files_load_and_play() {
    let level = LevelBuilder::new(10, 8)
        .id(3)
        .city(0, 0, Player::Human)
        .city(9, 7, Player::Ai)
        .terrain(5, 4, Terrain::Forest)
        .player_start(1, 1)
        .player_units(UnitType::Infantry, 2)
        .enemy_start(8, 6)
        .enemy_units(UnitType::Archers, 2)
        .build();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("level_3.ron");
    std::fs::write(&path, level.to_ron_string().unwrap()).unwrap();

    let loaded = Level::load(&path).unwrap();
    assert_eq!(loaded.id, 3);
    let mut engine = seeded_match(&loaded, Difficulty::for_level(loaded.id), 5);
    assert_eq!(engine.difficulty(), Difficulty::Easy);
    play_round(&mut engine, Some(Difficulty::Medium));
    assert!(engine.current_turn() >= 1);
}
