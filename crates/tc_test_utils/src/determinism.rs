//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! A seeded match must replay exactly. Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The engine only iterates units in creation order and hexes row-major.
//!
//! - **Floating-point math**: Line sampling uses fixed-point arithmetic via
//!   [`tc_core::math::Fixed`].
//!
//! - **System randomness**: Every roll goes through a
//!   [`tc_core::dice::RandomSource`] the caller provides.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual rules (movement, combat, production)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full matches are reproducible
//! 4. **Parallel tests**: Running N matches on separate threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use tc_core::dice::SeededDice;
use tc_core::engine::{Difficulty, GameEngine, GameState};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps played per run.
    pub steps: u64,
}

impl DeterminismResult {
    fn from_hashes(hashes: Vec<u64>, steps: u64) -> Self {
        let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
        Self {
            is_deterministic,
            hashes,
            steps,
        }
    }

    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a scenario multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the scenario
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..steps {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    DeterminismResult::from_hashes(hashes, steps)
}

/// Play one full round: the human half-turn, then the AI half-turn.
///
/// With `player_policy` set the human side is auto-played first; otherwise
/// it passes. Does nothing once the match is over.
pub fn play_round(engine: &mut GameEngine, player_policy: Option<Difficulty>) {
    if engine.state() == GameState::PlayerTurn {
        if let Some(policy) = player_policy {
            let _ = engine.auto_play_player_turn(policy);
        }
        let _ = engine.end_player_turn();
    }
    if engine.state() == GameState::AiTurn {
        let _ = engine.process_ai_turn();
    }
}

/// Seeded match on a level, started and ready for the first round.
///
/// # Panics
///
/// Panics if the level is invalid.
#[must_use]
pub fn seeded_match(level: &tc_core::level::Level, difficulty: Difficulty, seed: u64) -> GameEngine {
    let mut engine =
        GameEngine::with_random_source(level, difficulty, Box::new(SeededDice::new(seed)))
            .expect("level should build");
    engine.start_game().expect("fresh engine should start");
    engine
}

/// Run a match twice and verify the final state hashes match exactly.
pub fn verify_match_determinism<F>(setup_fn: F, rounds: u64, player_policy: Option<Difficulty>) -> bool
where
    F: Fn() -> GameEngine,
{
    verify_determinism(
        2,
        rounds,
        &setup_fn,
        |engine| play_round(engine, player_policy),
        GameEngine::state_hash,
    )
    .is_deterministic
}

/// Run N matches on scoped threads and collect final hashes.
///
/// Engines are built inside each thread, so the setup function only needs
/// to be `Sync`.
pub fn run_parallel_matches_scoped<F>(
    setup_fn: F,
    num_matches: usize,
    rounds: u64,
    player_policy: Option<Difficulty>,
) -> DeterminismResult
where
    F: Fn() -> GameEngine + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_matches)
            .map(|_| {
                s.spawn(|| {
                    let mut engine = setup_fn();
                    for _ in 0..rounds {
                        play_round(&mut engine, player_policy);
                    }
                    engine.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    DeterminismResult::from_hashes(hashes, rounds)
}

/// Compare two runs round-by-round, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree throughout, `Some(round)` if they diverge at
/// that round (0 means the initial states already differ).
pub fn find_first_divergence<F>(setup_fn: F, rounds: u64, player_policy: Option<Difficulty>) -> Option<u64>
where
    F: Fn() -> GameEngine,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for round in 1..=rounds {
        play_round(&mut first, player_policy);
        play_round(&mut second, player_policy);

        if first.state_hash() != second.state_hash() {
            tracing::warn!(round, "matches diverged");
            return Some(round);
        }
    }

    None
}

/// Verify that a binary save round-trip preserves the match exactly.
///
/// Plays `rounds` rounds, saves, restores onto `level` and compares hashes.
pub fn verify_save_determinism<F>(
    setup_fn: F,
    level: &tc_core::level::Level,
    rounds: u64,
    player_policy: Option<Difficulty>,
) -> bool
where
    F: Fn() -> GameEngine,
{
    let mut engine = setup_fn();
    for _ in 0..rounds {
        play_round(&mut engine, player_policy);
    }
    let hash_before = engine.state_hash();

    let Ok(bytes) = engine.save().to_bytes() else {
        return false;
    };
    let Ok(saved) = tc_core::snapshot::SavedGame::from_bytes(&bytes) else {
        return false;
    };
    let Ok(restored) = GameEngine::restore(level, &saved, Box::new(SeededDice::new(0))) else {
        return false;
    };

    hash_before == restored.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for coordinates and maps.
pub mod strategies {
    use proptest::prelude::*;
    use tc_core::hex::{CubicCoordinate, HexCoordinate};
    use tc_core::map::{HexMap, Terrain};

    /// Any offset coordinate in a generous window around the origin.
    pub fn arb_hex() -> impl Strategy<Value = HexCoordinate> {
        (-200i32..200, -200i32..200).prop_map(|(col, row)| HexCoordinate::new(col, row))
    }

    /// An offset coordinate on a `width x height` map.
    pub fn arb_hex_on(width: u32, height: u32) -> impl Strategy<Value = HexCoordinate> {
        (0..width as i32, 0..height as i32).prop_map(|(col, row)| HexCoordinate::new(col, row))
    }

    /// A valid cube coordinate.
    pub fn arb_cubic() -> impl Strategy<Value = CubicCoordinate> {
        (-200i32..200, -200i32..200).prop_map(|(x, z)| {
            CubicCoordinate::new(x, -x - z, z).expect("components sum to zero")
        })
    }

    /// Any terrain kind.
    pub fn arb_terrain() -> impl Strategy<Value = Terrain> {
        prop_oneof![
            4 => Just(Terrain::Plains),
            1 => Just(Terrain::Hills),
            1 => Just(Terrain::Forest),
            1 => Just(Terrain::River),
            1 => Just(Terrain::City),
        ]
    }

    /// A `width x height` map with random terrain.
    pub fn arb_map(width: u32, height: u32) -> impl Strategy<Value = HexMap> {
        proptest::collection::vec(arb_terrain(), (width * height) as usize).prop_map(
            move |terrain| {
                let mut map = HexMap::new(width, height);
                for (i, kind) in terrain.into_iter().enumerate() {
                    let col = (i as u32 % width) as i32;
                    let row = (i as u32 / width) as i32;
                    map.set_terrain(HexCoordinate::new(col, row), kind);
                }
                map
            },
        )
    }
}
