//! # Siege Development Tools
//!
//! Command-line tools for development:
//! - Data table validation
//! - Headless scenario runs with JSON reports and replay capture
//! - Replay verification

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod scenario;
pub mod validate;

use siege_core::error::SimError;
use thiserror::Error;

/// Error type for tool operations.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Input file missing.
    #[error("File not found: {0}")]
    FileNotFound(String),
    /// Failed to read or write a file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse a scenario.
    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Failed to write a JSON report.
    #[error("Failed to write report: {0}")]
    Report(#[from] serde_json::Error),
    /// The simulation rejected the input or a replay failed to verify.
    #[error(transparent)]
    Simulation(#[from] SimError),
    /// Static data tables are inconsistent.
    #[error("{0} data table issue(s) found")]
    InvalidTables(usize),
}

/// Result alias for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;
