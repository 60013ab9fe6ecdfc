//! # Tactical Conquest Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Level builders and canned scenarios
//! - Scripted random sources
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

pub use determinism::strategies;

/// Re-export proptest for convenience.
pub use proptest;
