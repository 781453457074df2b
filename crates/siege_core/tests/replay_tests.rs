//! Record a run, save it, load it back and verify it.

use siege_core::config::SimConfig;
use siege_core::error::SimError;
use siege_core::replay::{Replay, ReplayPlayer};
use siege_core::simulation::Simulation;
use siege_test_utils::fixtures::{full_roster_config, scripted_events, REFERENCE_SEED};

fn record(ticks: u64) -> Replay {
    let config = full_roster_config();
    let mut replay = Replay::new("full_roster", REFERENCE_SEED, config.clone());
    for event in scripted_events(5) {
        replay.record_event(event);
    }

    let mut sim = Simulation::new(REFERENCE_SEED, config).unwrap();
    sim.set_events(replay.events.clone()).unwrap();
    sim.run_until(ticks);
    replay.finalize(&sim);
    replay
}

#[test]
fn test_replay_round_trip_through_disk() {
    let replay = record(2400);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("full_roster.replay");

    replay.save(&path).unwrap();
    let loaded = Replay::load(&path).unwrap();
    assert_eq!(loaded, replay);

    let mut player = ReplayPlayer::new(loaded).unwrap();
    player.verify().unwrap();
    assert_eq!(player.current_tick(), 2400);
    assert_eq!(player.simulation().checkpoints(), replay.checkpoints.as_slice());
}

#[test]
fn test_replay_step_by_step_matches_checkpoints() {
    let replay = record(900);
    let expected = replay.checkpoints.len();
    let mut player = ReplayPlayer::new(replay).unwrap();

    let mut ticks = 0;
    while player.advance().unwrap() {
        ticks += 1;
    }
    assert_eq!(ticks + 1, 900);
    assert_eq!(player.simulation().checkpoints().len(), expected);
}

#[test]
fn test_edited_event_desyncs() {
    let mut replay = record(1800);
    // Drop the first ultimate; the run plays out differently from there.
    replay.events.remove(0);

    let mut player = ReplayPlayer::new(replay).unwrap();
    assert!(matches!(player.verify(), Err(SimError::DesyncDetected { .. })));
}

#[test]
fn test_corrupt_file_is_a_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.replay");
    std::fs::write(&path, b"not a replay").unwrap();
    assert!(Replay::load(&path).is_err());
}

#[test]
fn test_replay_of_default_run() {
    let config = SimConfig::default();
    let mut sim = Simulation::new(9, config.clone()).unwrap();
    sim.run_until(600);
    let mut replay = Replay::new("default", 9, config);
    replay.finalize(&sim);

    ReplayPlayer::new(replay).unwrap().verify().unwrap();
}
