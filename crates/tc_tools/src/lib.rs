//! # Tactical Conquest Development Tools
//!
//! Command-line helpers for level authors and balance work:
//! - Level file validation
//! - Headless batch simulation over many seeds

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod batch;
pub mod error;
pub mod validate;
