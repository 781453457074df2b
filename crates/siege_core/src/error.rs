//! Error types for the siege simulation.

use thiserror::Error;

use crate::data::DefinitionKind;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for simulation construction, event intake and
/// replay handling. Ticking itself never fails.
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration is structurally invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A loadout references an id missing from the static tables.
    #[error("Unknown {kind} definition: '{id}'")]
    UnknownDefinition {
        /// Table that was searched.
        kind: DefinitionKind,
        /// Id that was not found.
        id: String,
    },

    /// An event in a batch is malformed.
    #[error("Invalid event at index {index}: {reason}")]
    InvalidEvent {
        /// Position of the event in the submitted batch.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// Events in a batch are not sorted by tick.
    #[error("Event at index {index} (tick {tick}) precedes previous event tick {previous}")]
    EventOutOfOrder {
        /// Position of the event in the submitted batch.
        index: usize,
        /// Tick of the offending event.
        tick: u64,
        /// Tick of the event before it.
        previous: u64,
    },

    /// An event targets a tick the simulation has already passed.
    #[error("Event at index {index} targets tick {tick}, simulation is at tick {current}")]
    PastEvent {
        /// Position of the event in the submitted batch.
        index: usize,
        /// Tick of the offending event.
        tick: u64,
        /// Current simulation tick.
        current: u64,
    },

    /// Snapshot or replay (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File IO failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Replay was recorded with a different protocol version.
    #[error("Replay version mismatch: expected {expected}, found {found}")]
    ReplayVersionMismatch {
        /// Version this build understands.
        expected: u32,
        /// Version in the file.
        found: u32,
    },

    /// Replayed state hash differs from the recorded checkpoint.
    #[error("Desync detected at tick {tick}: expected hash {expected:#010x}, got {actual:#010x}")]
    DesyncDetected {
        /// Tick of the mismatching checkpoint.
        tick: u64,
        /// Recorded hash.
        expected: u32,
        /// Recomputed hash.
        actual: u32,
    },
}

impl From<bincode::Error> for SimError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<ron::error::SpannedError> for SimError {
    fn from(err: ron::error::SpannedError) -> Self {
        Self::Serialization(err.to_string())
    }
}
