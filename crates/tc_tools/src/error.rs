//! Tool error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the development tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Error from the game engine or level loader.
    #[error(transparent)]
    Game(#[from] tc_core::error::GameError),

    /// The engine refused an action the tool needed.
    #[error("Action rejected: {0}")]
    Action(#[from] tc_core::error::ActionError),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Results could not be written or read as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A directory held no level files.
    #[error("No .ron level files found in {}", .0.display())]
    NoLevels(PathBuf),
}

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;
