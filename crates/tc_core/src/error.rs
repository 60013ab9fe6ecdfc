//! Error types for the tactics engine.
//!
//! Two families are kept apart:
//! - [`GameError`] covers malformed input and persistence failures. These
//!   surface from constructors and load/save helpers.
//! - [`ActionError`] covers expected illegal moves made by a caller. Action
//!   methods return it without touching engine state.

use thiserror::Error;

use crate::hex::HexCoordinate;
use crate::unit::UnitId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Result type alias for player and AI actions.
pub type ActionResult<T> = std::result::Result<T, ActionError>;

/// Top-level error type for engine construction and persistence.
#[derive(Debug, Error)]
pub enum GameError {
    /// Cubic coordinate components do not sum to zero.
    #[error("Invalid cubic coordinate ({x}, {y}, {z}): x + y + z must equal 0")]
    InvalidCubicCoordinate {
        /// X component.
        x: i32,
        /// Y component.
        y: i32,
        /// Z component.
        z: i32,
    },

    /// Level definition is structurally unusable.
    #[error("Invalid level {level_id}: {reason}")]
    InvalidLevel {
        /// Identifier of the offending level.
        level_id: u32,
        /// What is wrong with it.
        reason: String,
    },

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Reading or writing a file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary save encoding failed.
    #[error("Failed to encode save: {0}")]
    Encode(String),

    /// Binary or RON save decoding failed.
    #[error("Failed to decode save: {0}")]
    Decode(String),

    /// Save was produced by an incompatible format version.
    #[error("Save version mismatch: expected {expected}, got {found}")]
    SaveVersionMismatch {
        /// Version this build understands.
        expected: u32,
        /// Version found in the save.
        found: u32,
    },

    /// Save does not belong to the level it is restored against.
    #[error("Save does not match level {level_id}: {reason}")]
    SaveLevelMismatch {
        /// Level the restore was attempted against.
        level_id: u32,
        /// Description of the mismatch.
        reason: String,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

/// Why an action was rejected.
///
/// Every variant is an expected outcome of a caller asking for something the
/// rules do not allow; none of them indicate an engine bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionError {
    /// `start_game` has not been called yet.
    #[error("Game has not been started")]
    NotStarted,
    /// `start_game` was already called.
    #[error("Game already started")]
    AlreadyStarted,
    /// The game already ended in victory or defeat.
    #[error("Game is over")]
    GameOver,
    /// It is not the acting side's turn.
    #[error("Not this side's turn")]
    WrongTurn,
    /// No live unit with this id.
    #[error("Unknown unit {0}")]
    UnknownUnit(UnitId),
    /// The unit belongs to the other side.
    #[error("Unit {0} is not controlled by the acting side")]
    NotOwner(UnitId),
    /// Target hex lies outside the map.
    #[error("Hex {0} is out of bounds")]
    OutOfBounds(HexCoordinate),
    /// Target hex is not owned by the acting side.
    #[error("Hex {0} is not owned by the acting side")]
    NotOwnedHex(HexCoordinate),
    /// Target hex already holds a unit.
    #[error("Hex {0} is occupied")]
    Occupied(HexCoordinate),
    /// Not enough population to pay for the unit.
    #[error("Insufficient population: need {required}, have {available}")]
    InsufficientPopulation {
        /// Population required.
        required: u32,
        /// Population available.
        available: u32,
    },
    /// The unit has no movement left this turn.
    #[error("Unit {0} has no movement left")]
    NoMovement(UnitId),
    /// The target is further than the unit can travel.
    #[error("Hex {0} is beyond the unit's movement")]
    TooFar(HexCoordinate),
    /// No path leads to the target.
    #[error("Hex {0} is unreachable")]
    Unreachable(HexCoordinate),
    /// The unit already attacked this turn.
    #[error("Unit {0} has already attacked")]
    AlreadyAttacked(UnitId),
    /// There is no unit on the target hex.
    #[error("No defender at {0}")]
    NoDefender(HexCoordinate),
    /// The unit on the target hex is on the attacker's side.
    #[error("Unit at {0} is friendly")]
    FriendlyTarget(HexCoordinate),
    /// The target is beyond the attacker's range.
    #[error("Hex {0} is out of attack range")]
    OutOfRange(HexCoordinate),
}
