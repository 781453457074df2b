//! Replay system for recording and re-running games.
//!
//! A replay stores what a run needs to be recreated: the seed, the resolved
//! config and the event list, plus the checkpoints the original run
//! produced. Playback feeds the same inputs into a fresh [`Simulation`] and
//! compares checkpoints as it goes.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analytics::NullRecorder;
use crate::checkpoint::{Checkpoint, PROTOCOL_VERSION};
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::events::GameEvent;
use crate::simulation::Simulation;

/// Replay file format version. Tracks [`PROTOCOL_VERSION`].
pub const REPLAY_VERSION: u32 = PROTOCOL_VERSION;

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Scenario identifier or name.
    pub scenario_id: String,
    /// Random seed used for the run.
    pub seed: u64,
    /// Configuration the run was built from.
    pub config: SimConfig,
    /// Player events in tick order.
    pub events: Vec<GameEvent>,
    /// Checkpoints produced by the recorded run.
    pub checkpoints: Vec<Checkpoint>,
    /// Tick the recording stopped at.
    pub final_tick: u64,
    /// State hash at `final_tick`.
    pub final_hash: u32,
}

impl Replay {
    /// Start a replay for a run that has not begun.
    #[must_use]
    pub fn new(scenario_id: impl Into<String>, seed: u64, config: SimConfig) -> Self {
        Self {
            version: REPLAY_VERSION,
            scenario_id: scenario_id.into(),
            seed,
            config,
            events: Vec::new(),
            checkpoints: Vec::new(),
            final_tick: 0,
            final_hash: 0,
        }
    }

    /// Record an event. Events must be recorded in tick order.
    pub fn record_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Capture the end of a recorded run.
    pub fn finalize<R: crate::analytics::DamageRecorder>(&mut self, simulation: &Simulation<R>) {
        self.checkpoints = simulation.checkpoints().to_vec();
        self.final_tick = simulation.state().tick;
        self.final_hash = simulation.state_hash();
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    /// Returns an error if file reading or deserialization fails, or
    /// [`SimError::ReplayVersionMismatch`] for a replay from another
    /// protocol version.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let replay: Self = bincode::deserialize(&bytes)?;

        if replay.version != REPLAY_VERSION {
            return Err(SimError::ReplayVersionMismatch {
                expected: REPLAY_VERSION,
                found: replay.version,
            });
        }

        Ok(replay)
    }

    /// Build a simulation at tick 0 with the recorded events queued.
    ///
    /// # Errors
    /// Returns an error if the config or event list is invalid.
    pub fn start(&self) -> Result<Simulation<NullRecorder>> {
        let mut simulation = Simulation::with_recorder(self.seed, self.config.clone(), NullRecorder)?;
        simulation.set_events(self.events.clone())?;
        Ok(simulation)
    }

    /// Events scheduled for a specific tick.
    #[must_use]
    pub fn events_at_tick(&self, tick: u64) -> Vec<&GameEvent> {
        self.events.iter().filter(|event| event.tick == tick).collect()
    }

    /// Total duration of the replay in ticks.
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.final_tick
    }

    /// Number of recorded events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    simulation: Simulation<NullRecorder>,
    /// Index of the next recorded checkpoint to compare.
    next_checkpoint: usize,
    /// Whether playback is paused.
    pub paused: bool,
}

impl ReplayPlayer {
    /// Create a player positioned at tick 0.
    ///
    /// # Errors
    /// Returns an error if the replay's config or events are invalid.
    pub fn new(replay: Replay) -> Result<Self> {
        let simulation = replay.start()?;
        Ok(Self {
            replay,
            simulation,
            next_checkpoint: 0,
            paused: false,
        })
    }

    /// Advance one tick, checking any checkpoint it produces.
    ///
    /// Returns `Ok(true)` while there are more ticks to play.
    ///
    /// # Errors
    /// Returns [`SimError::DesyncDetected`] when a checkpoint disagrees with
    /// the recording.
    pub fn advance(&mut self) -> Result<bool> {
        if self.paused || self.is_finished() {
            return Ok(!self.is_finished());
        }

        let events = self.simulation.step();
        if let Some(actual) = events.checkpoint {
            self.check(actual)?;
        }

        Ok(!self.is_finished())
    }

    fn check(&mut self, actual: Checkpoint) -> Result<()> {
        let Some(expected) = self.replay.checkpoints.get(self.next_checkpoint) else {
            return Ok(());
        };
        self.next_checkpoint += 1;
        if expected.tick != actual.tick || expected.chain_hash32 != actual.chain_hash32 {
            return Err(SimError::DesyncDetected {
                tick: actual.tick,
                expected: expected.chain_hash32,
                actual: actual.chain_hash32,
            });
        }
        Ok(())
    }

    /// Seek to a specific tick by replaying from the start.
    ///
    /// # Errors
    /// Returns an error if the simulation cannot be rebuilt or a checkpoint
    /// on the way disagrees.
    pub fn seek(&mut self, target_tick: u64) -> Result<()> {
        self.simulation = self.replay.start()?;
        self.next_checkpoint = 0;
        let paused = std::mem::replace(&mut self.paused, false);

        let target = target_tick.min(self.replay.final_tick);
        let mut result = Ok(());
        while self.simulation.state().tick < target && !self.simulation.is_ended() {
            if let Err(err) = self.advance() {
                result = Err(err);
                break;
            }
        }

        self.paused = paused;
        result
    }

    /// Current tick.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.simulation.state().tick
    }

    /// The simulation being played.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation<NullRecorder> {
        &self.simulation
    }

    /// The replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Whether playback has reached the end of the recording.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.current_tick() >= self.replay.final_tick || self.simulation.is_ended()
    }

    /// Play the whole replay and compare every checkpoint and the final
    /// hash.
    ///
    /// # Errors
    /// Returns [`SimError::DesyncDetected`] at the first disagreement.
    pub fn verify(&mut self) -> Result<()> {
        self.seek(self.replay.final_tick)?;
        let actual = self.simulation.state_hash();
        if self.current_tick() != self.replay.final_tick || actual != self.replay.final_hash {
            return Err(SimError::DesyncDetected {
                tick: self.current_tick(),
                expected: self.replay.final_hash,
                actual,
            });
        }
        Ok(())
    }

    /// Toggle pause state.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Progress as a percentage (0-100).
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.replay.final_tick == 0 {
            100.0
        } else {
            (self.current_tick() as f64 / self.replay.final_tick as f64) * 100.0
        }
    }
}
