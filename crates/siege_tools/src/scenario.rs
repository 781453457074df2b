//! Scenario loading and headless runs.
//!
//! A scenario is a seed, a [`SimConfig`] and an event script in one RON
//! file. Running it produces a JSON-serializable [`RunReport`] and a
//! [`Replay`] that `verify` can check later.

use std::path::Path;

use serde::{Deserialize, Serialize};
use siege_core::analytics::DamageAnalytics;
use siege_core::checkpoint::Checkpoint;
use siege_core::config::SimConfig;
use siege_core::events::GameEvent;
use siege_core::replay::Replay;
use siege_core::simulation::Simulation;
use siege_core::state::EndReason;
use tracing::{debug, info};

use crate::{Result, ToolError};

/// Tick cap for scenarios that do not set one: one hour at 30 Hz.
pub const DEFAULT_MAX_TICKS: u64 = 108_000;

fn default_max_ticks() -> u64 {
    DEFAULT_MAX_TICKS
}

/// A complete scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name, also used as the replay's scenario id.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Run seed.
    pub seed: u64,
    /// Run configuration.
    #[serde(default)]
    pub config: SimConfig,
    /// Player events in tick order.
    #[serde(default)]
    pub events: Vec<GameEvent>,
    /// Headless runs stop here even if the config has no tick limit.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

impl Scenario {
    /// Load a scenario from a RON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ToolError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Parse`] for malformed RON.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        Ok(ron::from_str(ron)?)
    }
}

/// Summary of a headless run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Scenario name.
    pub scenario: String,
    /// Run seed.
    pub seed: u64,
    /// Tick the run stopped at.
    pub final_tick: u64,
    /// Why the run ended, `None` if it hit the scenario's tick cap.
    pub end_reason: Option<EndReason>,
    /// Wave in progress when the run stopped.
    pub wave: u32,
    /// Enemies killed.
    pub kills: u32,
    /// Remaining fortress HP.
    pub fortress_hp: u32,
    /// Heroes still standing.
    pub heroes_standing: usize,
    /// Relics collected, in pick order.
    pub relics: Vec<String>,
    /// Events rejected at application time.
    pub rejected_events: usize,
    /// State hash at `final_tick`.
    pub final_hash: u32,
    /// Every checkpoint produced.
    pub checkpoints: Vec<Checkpoint>,
    /// Damage breakdown.
    pub analytics: DamageAnalytics,
}

/// Run a scenario to its end or tick cap.
///
/// # Errors
///
/// Returns an error if the scenario's config or events are invalid.
pub fn run_scenario(scenario: &Scenario) -> Result<(RunReport, Replay)> {
    let mut replay = Replay::new(scenario.name.clone(), scenario.seed, scenario.config.clone());
    for event in &scenario.events {
        replay.record_event(*event);
    }

    let mut sim = Simulation::new(scenario.seed, scenario.config.clone())?;
    sim.set_events(scenario.events.clone())?;
    info!(scenario = %scenario.name, seed = scenario.seed, "Running scenario");

    let mut rejected_events = 0;
    while sim.state().tick < scenario.max_ticks && !sim.is_ended() {
        let events = sim.step();
        rejected_events += events.rejected_events.len();
        if let Some(wave) = events.wave_cleared {
            debug!(tick = events.tick, wave, "Wave cleared");
        }
    }
    replay.finalize(&sim);

    let state = sim.state();
    let report = RunReport {
        scenario: scenario.name.clone(),
        seed: scenario.seed,
        final_tick: state.tick,
        end_reason: state.end_reason,
        wave: state.current_wave,
        kills: state.kills,
        fortress_hp: state.fortress_hp,
        heroes_standing: state.heroes.len(),
        relics: state.relics.clone(),
        rejected_events,
        final_hash: sim.state_hash(),
        checkpoints: sim.checkpoints().to_vec(),
        analytics: sim.recorder().clone(),
    };
    info!(
        final_tick = report.final_tick,
        end_reason = ?report.end_reason,
        wave = report.wave,
        kills = report.kills,
        final_hash = report.final_hash,
        "Scenario finished"
    );
    Ok((report, replay))
}

/// Write a report as pretty JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_report<P: AsRef<Path>>(report: &RunReport, path: P) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path.as_ref(), json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use siege_core::replay::ReplayPlayer;
    use siege_test_utils::fixtures::{full_roster_config, scripted_events};

    const SHIPPED: &str = include_str!("../../../scenarios/default_siege.ron");

    fn short_scenario() -> Scenario {
        Scenario {
            name: "short".into(),
            description: String::new(),
            seed: 42,
            config: full_roster_config(),
            events: scripted_events(5),
            max_ticks: 1800,
        }
    }

    #[test]
    fn test_shipped_scenario_parses() {
        let scenario = Scenario::from_ron_str(SHIPPED).unwrap();
        scenario.config.validate().unwrap();
        assert!(!scenario.events.is_empty());
    }

    #[test]
    fn test_defaults_fill_in() {
        let scenario = Scenario::from_ron_str(r#"(name: "bare", seed: 7)"#).unwrap();
        assert_eq!(scenario.config, SimConfig::default());
        assert_eq!(scenario.max_ticks, DEFAULT_MAX_TICKS);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Scenario::load("does/not/exist.ron"),
            Err(ToolError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_run_is_reproducible_and_verifiable() {
        let scenario = short_scenario();
        let (first, replay) = run_scenario(&scenario).unwrap();
        let (second, _) = run_scenario(&scenario).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.final_tick, 1800);
        assert_eq!(replay.final_hash, first.final_hash);

        ReplayPlayer::new(replay).unwrap().verify().unwrap();
    }

    #[test]
    fn test_report_written_as_json() {
        let (report, _) = run_scenario(&short_scenario()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report(&report, &path).unwrap();

        let parsed: RunReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, report);
    }
}
