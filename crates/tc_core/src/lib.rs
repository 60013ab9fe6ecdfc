//! # Tactical Conquest Core
//!
//! Deterministic turn-based hex tactics engine.
//!
//! This crate contains **only** game rules:
//! - No rendering
//! - No audio
//! - No hidden randomness (every roll goes through [`dice::RandomSource`])
//! - No process-wide state (one [`engine::GameEngine`] per match)
//!
//! This separation enables:
//! - Headless batch simulation
//! - Reproducible matches from a seed
//! - Save and restore of a match in progress
//!
//! ## Crate Structure
//!
//! - [`hex`] - Offset and cube coordinates
//! - [`math`] - Fixed-point line sampling
//! - [`map`] - Terrain, ownership, line of sight
//! - [`pathfinding`] - A* and movement-range flood fill
//! - [`unit`] - Archetypes and per-unit state
//! - [`combat`] - Damage formula
//! - [`economy`] - Population pools
//! - [`level`] - Level data and validation
//! - [`engine`] - Turn state machine and actions
//! - [`ai`] - Scripted opponents
//! - [`events`] - Listener notifications
//! - [`snapshot`] - State snapshots and saves
//! - [`victory`] - Battle summary and star rating

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod combat;
pub mod dice;
pub mod economy;
pub mod engine;
pub mod error;
pub mod events;
pub mod hex;
pub mod level;
pub mod map;
pub mod math;
pub mod pathfinding;
pub mod snapshot;
pub mod unit;
pub mod victory;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::AttackProfile;
    pub use crate::dice::{RandomSource, SeededDice};
    pub use crate::economy::{Resources, POPULATION_CAP};
    pub use crate::engine::{AttackOutcome, Difficulty, GameEngine, GameState};
    pub use crate::error::{ActionError, ActionResult, GameError, Result};
    pub use crate::events::{EventLog, GameEvent, GameListener};
    pub use crate::hex::{CubicCoordinate, HexCoordinate};
    pub use crate::level::{Level, Position, StartUnit, TileData};
    pub use crate::map::{HexMap, Terrain, Tile};
    pub use crate::snapshot::{GameStateData, SavedGame};
    pub use crate::unit::{Player, Unit, UnitId, UnitType};
    pub use crate::victory::BattleSummary;
}
