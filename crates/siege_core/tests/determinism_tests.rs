//! Whole-run determinism tests.
//!
//! These drive complete simulations through the public API and compare
//! state hashes and checkpoint chains across independent instances.

use proptest::prelude::*;
use siege_core::analytics::NullRecorder;
use siege_core::config::SimConfig;
use siege_core::simulation::Simulation;
use siege_core::state::EndReason;
use siege_test_utils::determinism::{
    find_first_divergence, run_parallel_simulations_scoped, strategies, verify_determinism,
    verify_serialization_determinism, verify_simulation_determinism,
};
use siege_test_utils::fixtures::{
    full_roster_config, scripted_simulation, solo_config, REFERENCE_SEED,
};

#[test]
fn test_independent_instances_share_checkpoints() {
    let mut first = scripted_simulation(REFERENCE_SEED);
    let mut second = scripted_simulation(REFERENCE_SEED);

    for _ in 0..3000 {
        let a = first.step();
        let b = second.step();
        assert_eq!(a.checkpoint, b.checkpoint);
        assert_eq!(a.killed, b.killed);
        assert_eq!(a.hero_hits, b.hero_hits);
    }

    assert!(!first.checkpoints().is_empty());
    assert_eq!(first.checkpoints(), second.checkpoints());
    assert_eq!(first.recorder(), second.recorder());
}

#[test]
fn test_different_seeds_diverge() {
    let mut a = Simulation::new(1, full_roster_config()).unwrap();
    let mut b = Simulation::new(2, full_roster_config()).unwrap();
    a.run_until(600);
    b.run_until(600);
    assert_ne!(a.checkpoints(), b.checkpoints());
}

#[test]
fn test_recorder_does_not_affect_state() {
    let mut analytics = Simulation::new(77, full_roster_config()).unwrap();
    let mut silent = Simulation::with_recorder(77, full_roster_config(), NullRecorder).unwrap();
    analytics.run_until(1500);
    silent.run_until(1500);
    assert_eq!(analytics.state_hash(), silent.state_hash());
    assert!(analytics.recorder().total_dealt() > 0);
}

#[test]
fn test_generic_harness_on_scripted_run() {
    verify_determinism(
        3,
        900,
        || scripted_simulation(5),
        |sim| {
            sim.step();
        },
        Simulation::state_hash,
    )
    .assert_deterministic();
}

#[test]
fn test_parallel_full_roster_runs() {
    run_parallel_simulations_scoped(|| scripted_simulation(REFERENCE_SEED), 6, 1200)
        .assert_deterministic();
}

#[test]
fn test_no_divergence_tick_by_tick() {
    assert_eq!(find_first_divergence(|| scripted_simulation(11), 2000), None);
}

#[test]
fn test_snapshot_mid_wave_resumes_identically() {
    assert!(verify_serialization_determinism(
        || scripted_simulation(21),
        777,
        2400
    ));
}

#[test]
fn test_solo_hero_run_ends_in_defeat() {
    let config = SimConfig {
        max_ticks: Some(100_000),
        ..solo_config("pyromancer")
    };
    let run = || {
        let mut sim = Simulation::new(REFERENCE_SEED, config.clone()).unwrap();
        let reason = sim.run_to_end(100_000);
        (reason, sim.state().tick, sim.state_hash())
    };
    let (reason, tick, hash) = run();
    assert!(matches!(reason, Some(EndReason::Defeat | EndReason::TimeLimit)));
    assert_eq!(run(), (reason, tick, hash));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_random_loadouts_are_deterministic(
        seed in strategies::arb_seed(),
        config in strategies::arb_config(),
    ) {
        prop_assert!(verify_simulation_determinism(
            || Simulation::new(seed, config.clone()).unwrap(),
            900,
        ));
    }
}
