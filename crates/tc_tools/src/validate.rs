//! Level file validation.
//!
//! Hard errors (out-of-bounds tiles, unplaceable armies) make a level
//! unusable. Lint warnings flag levels that load but are probably not what
//! the author meant.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tc_core::engine::{Difficulty, GameEngine};
use tc_core::level::Level;

use crate::error::{Result, ToolError};

/// Outcome of checking one level file.
#[derive(Debug, Clone, Serialize)]
pub struct LevelReport {
    /// File checked.
    pub path: PathBuf,
    /// Level id, when the file parsed.
    pub level_id: Option<u32>,
    /// Problems that stop the level from loading.
    pub errors: Vec<String>,
    /// Suspicious but playable content.
    pub warnings: Vec<String>,
}

impl LevelReport {
    /// Whether the level is usable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check a single level file.
///
/// Parse and structural failures are recorded in the report rather than
/// returned, so one broken file does not hide the others.
#[must_use]
pub fn validate_level_file(path: &Path) -> LevelReport {
    let mut report = LevelReport {
        path: path.to_path_buf(),
        level_id: None,
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    let level = match Level::load(path) {
        Ok(level) => level,
        Err(e) => {
            report.errors.push(e.to_string());
            return report;
        }
    };
    report.level_id = Some(level.id);
    report.warnings = level.lint();

    if let Err(e) = level.validate() {
        report.errors.push(e.to_string());
        return report;
    }
    // Placement can still fail on a structurally valid level.
    if let Err(e) = GameEngine::with_seed(&level, Difficulty::for_level(level.id), 0) {
        report.errors.push(e.to_string());
    }
    report
}

/// Check every `.ron` file directly inside `dir`, sorted by file name.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or holds no level files.
pub fn validate_levels_directory(dir: &Path) -> Result<Vec<LevelReport>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    if paths.is_empty() {
        return Err(ToolError::NoLevels(dir.to_path_buf()));
    }
    paths.sort();

    let reports: Vec<_> = paths.iter().map(|p| validate_level_file(p)).collect();
    tracing::info!(
        files = reports.len(),
        invalid = reports.iter().filter(|r| !r.is_valid()).count(),
        "levels checked"
    );
    Ok(reports)
}

/// Check a file or a directory of files.
///
/// # Errors
///
/// Returns an error if a directory cannot be read or holds no level files.
pub fn validate_path(path: &Path) -> Result<Vec<LevelReport>> {
    if path.is_dir() {
        validate_levels_directory(path)
    } else {
        Ok(vec![validate_level_file(path)])
    }
}
