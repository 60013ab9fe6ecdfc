//! Batch match runner for balance testing.
//!
//! Plays many seeded matches of one level in parallel using rayon and
//! aggregates their battle summaries.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tc_core::dice::SeededDice;
use tc_core::engine::{Difficulty, GameEngine, GameState};
use tc_core::level::Level;
use tc_core::victory::BattleSummary;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of matches to play.
    pub game_count: u32,
    /// Seed of the first match; match `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// AI strength. `None` uses the level's campaign difficulty.
    pub difficulty: Option<Difficulty>,
    /// Policy playing the human side. `None` passes every turn.
    pub player_policy: Option<Difficulty>,
    /// Turn limit; matches still running after it count as unfinished.
    pub max_turns: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            seed_start: 0,
            difficulty: None,
            player_policy: Some(Difficulty::Medium),
            max_turns: 100,
        }
    }
}

impl BatchConfig {
    /// Config for `game_count` matches.
    #[must_use]
    pub fn new(game_count: u32) -> Self {
        Self {
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the AI and human-side policies.
    #[must_use]
    pub fn with_policies(mut self, ai: Option<Difficulty>, player: Option<Difficulty>) -> Self {
        self.difficulty = ai;
        self.player_policy = player;
        self
    }

    /// Set the turn limit.
    #[must_use]
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }
}

/// One finished (or abandoned) match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Seed the match was played with.
    pub seed: u64,
    /// End-of-battle summary.
    pub summary: BattleSummary,
    /// Final state hash, for determinism checks.
    pub final_hash: u64,
}

/// Aggregate over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches played.
    pub total_games: u32,
    /// Human wins.
    pub victories: u32,
    /// AI wins.
    pub defeats: u32,
    /// Matches that hit the turn limit.
    pub unfinished: u32,
    /// Victories over finished matches.
    pub win_rate: f64,
    /// Mean final turn over finished matches.
    pub avg_turns: f64,
    /// Mean stars over victories.
    pub avg_stars: f64,
}

impl BatchSummary {
    /// Calculate summary from a list of records.
    #[must_use]
    pub fn from_records(records: &[GameRecord]) -> Self {
        let mut summary = Self {
            total_games: records.len() as u32,
            ..Default::default()
        };
        let mut turn_sum = 0u64;
        let mut star_sum = 0u64;

        for record in records {
            match record.summary.outcome {
                GameState::Victory => {
                    summary.victories += 1;
                    star_sum += u64::from(record.summary.stars);
                }
                GameState::Defeat => summary.defeats += 1,
                GameState::PlayerTurn | GameState::AiTurn => {
                    summary.unfinished += 1;
                    continue;
                }
            }
            turn_sum += u64::from(record.summary.turns);
        }

        let finished = summary.victories + summary.defeats;
        if finished > 0 {
            summary.win_rate = f64::from(summary.victories) / f64::from(finished);
            summary.avg_turns = turn_sum as f64 / f64::from(finished);
        }
        if summary.victories > 0 {
            summary.avg_stars = star_sum as f64 / f64::from(summary.victories);
        }
        summary
    }
}

/// Error during batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Level played.
    pub level_id: u32,
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual matches, in seed order.
    pub games: Vec<GameRecord>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime.
    pub duration_seconds: f64,
    /// Matches that could not be set up.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Play one seeded match to completion or the turn limit.
///
/// # Errors
///
/// Returns an error if the level cannot be turned into an engine or the
/// match refuses to start.
pub fn play_match(level: &Level, config: &BatchConfig, seed: u64) -> Result<GameRecord> {
    let difficulty = config
        .difficulty
        .unwrap_or_else(|| Difficulty::for_level(level.id));
    let mut engine =
        GameEngine::with_random_source(level, difficulty, Box::new(SeededDice::new(seed)))?;
    engine.start_game()?;

    while !engine.state().is_over() && engine.current_turn() <= config.max_turns {
        if let Some(policy) = config.player_policy {
            if let Err(error) = engine.auto_play_player_turn(policy) {
                debug!(seed, %error, "player policy skipped its turn");
            }
        }
        if engine.end_player_turn().is_err() {
            break;
        }
        if engine.state() == GameState::AiTurn && engine.process_ai_turn().is_err() {
            break;
        }
    }

    let summary = BattleSummary::from_engine(&engine);
    debug!(seed, outcome = ?summary.outcome, turns = summary.turns, "match finished");
    Ok(GameRecord {
        seed,
        summary,
        final_hash: engine.state_hash(),
    })
}

/// Run a batch of matches on the rayon pool.
#[must_use]
pub fn run_batch(level: &Level, config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        level = level.id,
        games = config.game_count,
        seed_start = config.seed_start,
        "starting batch run"
    );

    let results: Vec<std::result::Result<GameRecord, BatchError>> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            play_match(level, &config, seed).map_err(|e| {
                warn!(seed, error = %e, "match failed");
                BatchError {
                    seed,
                    message: e.to_string(),
                }
            })
        })
        .collect();

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.is_ok());
    let games: Vec<GameRecord> = games.into_iter().filter_map(|r| r.ok()).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(|r| r.err()).collect();

    let summary = BatchSummary::from_records(&games);
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        games = games.len(),
        win_rate = summary.win_rate,
        duration_seconds,
        "batch complete"
    );

    BatchResults {
        level_id: level.id,
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Play the same seed `runs` times and check every final hash agrees.
///
/// # Errors
///
/// Returns an error if the level cannot be turned into an engine.
pub fn verify_determinism(level: &Level, config: &BatchConfig, seed: u64, runs: u32) -> Result<bool> {
    let hashes = (0..runs)
        .map(|_| play_match(level, config, seed).map(|r| r.final_hash))
        .collect::<Result<Vec<_>>>()?;
    Ok(hashes.windows(2).all(|w| w[0] == w[1]))
}
