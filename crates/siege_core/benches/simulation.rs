//! Simulation benchmarks for siege_core.
//!
//! Run with: `cargo bench -p siege_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use siege_core::analytics::NullRecorder;
use siege_core::checkpoint::state_hash;
use siege_core::config::SimConfig;
use siege_core::simulation::Simulation;
use siege_test_utils::fixtures::{full_roster_config, scripted_events, REFERENCE_SEED};

/// One minute of play at the default tick rate.
const MINUTE_TICKS: u64 = 1800;

pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("default_loadout_one_minute", |b| {
        b.iter_batched(
            || Simulation::new(REFERENCE_SEED, SimConfig::default()).expect("default config"),
            |mut sim| black_box(sim.run_until(MINUTE_TICKS)),
            BatchSize::SmallInput,
        );
    });

    c.bench_function("full_roster_scripted_one_minute", |b| {
        b.iter_batched(
            || {
                let mut sim =
                    Simulation::with_recorder(REFERENCE_SEED, full_roster_config(), NullRecorder)
                        .expect("fixture config");
                sim.set_events(scripted_events(5)).expect("fixture events");
                sim
            },
            |mut sim| black_box(sim.run_until(MINUTE_TICKS)),
            BatchSize::SmallInput,
        );
    });

    // Mid-run state with a busy battlefield.
    let mut busy = Simulation::new(REFERENCE_SEED, full_roster_config()).expect("fixture config");
    busy.run_until(MINUTE_TICKS);
    c.bench_function("state_hash_mid_run", |b| {
        b.iter(|| black_box(state_hash(black_box(busy.state()))));
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
