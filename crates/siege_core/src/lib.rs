//! # Siege Core
//!
//! Deterministic tick-based simulation core for Fortress Siege.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO (except replay files)
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Client prediction and server verification of the same run
//! - Replays and PvP playback
//! - Checkpoint-based desync detection
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`math`] / [`rng`] - Fixed-point arithmetic and the seeded RNG
//! - [`data`] - Static hero, turret, enemy, relic and artifact tables
//! - [`damage`] / [`targeting`] / [`skills`] / [`projectiles`] - Combat rules
//! - [`waves`] / [`systems`] - Per-tick systems
//! - [`simulation`] - The tick driver
//! - [`checkpoint`] / [`replay`] - Fingerprints and recorded runs

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod analytics;
pub mod checkpoint;
pub mod components;
pub mod config;
pub mod damage;
pub mod data;
pub mod effects;
pub mod error;
pub mod events;
pub mod math;
pub mod physics;
pub mod projectiles;
pub mod relics;
pub mod replay;
pub mod rng;
pub mod simulation;
pub mod skills;
pub mod state;
pub mod systems;
pub mod targeting;
pub mod waves;

#[cfg(test)]
mod testing;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::{DamageAnalytics, DamageRecorder, NullRecorder};
    pub use crate::checkpoint::{Checkpoint, PROTOCOL_VERSION};
    pub use crate::components::*;
    pub use crate::config::{HeroLoadout, SimConfig, TurretLoadout};
    pub use crate::error::{Result, SimError};
    pub use crate::events::{EventKind, GameEvent, TickEvents};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::replay::{Replay, ReplayPlayer};
    pub use crate::simulation::Simulation;
    pub use crate::state::{EndReason, GameState};
}
