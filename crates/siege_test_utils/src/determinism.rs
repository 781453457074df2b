//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and server verification depend on a run being reproducible bit
//! for bit. Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`siege_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Entities live in `Vec`s and are visited in insertion order.
//!
//! - **System randomness**: Every roll goes through the seeded
//!   [`siege_core::rng::Xorshift32`] stored in the game state.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual system determinism (waves, combat, etc.)
//! 2. **Property tests**: Random seeds and event scripts stay reproducible
//! 3. **Integration tests**: Full runs are reproducible
//! 4. **Parallel tests**: Running N simulations on threads all match

use std::thread;

use siege_core::analytics::DamageAnalytics;
use siege_core::events::GameEvent;
use siege_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u32>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u32> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:08x?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u32>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:08x?}",
                self.num_sims,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use siege_core::config::SimConfig;
/// use siege_core::simulation::Simulation;
/// use siege_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(
///     3,
///     120,
///     || Simulation::new(7, SimConfig::default()).unwrap(),
///     |sim| {
///         sim.step();
///     },
///     Simulation::state_hash,
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u32,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run the simulation twice with identical setup and check the final
/// state hashes and checkpoint chains match exactly.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut first = setup_fn();
    let mut second = setup_fn();
    first.run_until(num_ticks);
    second.run_until(num_ticks);

    first.state_hash() == second.state_hash() && first.checkpoints() == second.checkpoints()
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations_scoped<F>(
    setup_fn: F,
    num_sims: usize,
    num_ticks: u64,
) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    sim.run_until(num_ticks);
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if the runs agree, `Some(tick)` for the first tick at which the
/// state hashes differ.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(sim1.state().tick);
    }

    for _ in 0..num_ticks {
        sim1.step();
        sim2.step();

        if sim1.state_hash() != sim2.state_hash() {
            return Some(sim1.state().tick);
        }
    }

    None
}

/// Verify that a snapshot taken after `snapshot_tick` and restored into a
/// fresh simulation continues exactly like the original up to `end_tick`,
/// including the checkpoint chain.
pub fn verify_serialization_determinism<F>(setup_fn: F, snapshot_tick: u64, end_tick: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();
    sim.run_until(snapshot_tick);

    let Ok(bytes) = sim.snapshot() else {
        return false;
    };
    let pending: Vec<GameEvent> = sim.pending_events().to_vec();
    let snapped_at = sim.state().tick;

    let Ok(mut restored) = Simulation::restore(sim.config().clone(), &bytes, DamageAnalytics::default())
    else {
        return false;
    };
    if restored.state_hash() != sim.state_hash() || restored.set_events(pending).is_err() {
        return false;
    }

    sim.run_until(end_tick);
    restored.run_until(end_tick);
    let resumed: Vec<_> = sim
        .checkpoints()
        .iter()
        .filter(|c| c.tick > snapped_at)
        .copied()
        .collect();
    sim.state_hash() == restored.state_hash() && restored.checkpoints() == resumed.as_slice()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of simulation determinism.
pub mod strategies {
    use proptest::prelude::*;
    use siege_core::components::HeroCommand;
    use siege_core::config::{HeroLoadout, SimConfig, TurretLoadout};
    use siege_core::data::{ARTIFACTS, HEROES, TURRETS};
    use siege_core::events::{EventKind, GameEvent};
    use siege_core::math::{Fixed, Vec2Fixed};
    use siege_core::physics::{FIELD_HEIGHT, FIELD_WIDTH};

    /// Any run seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// A point inside the battlefield.
    pub fn arb_field_position() -> impl Strategy<Value = Vec2Fixed> {
        (0..FIELD_WIDTH.to_bits(), 0..FIELD_HEIGHT.to_bits())
            .prop_map(|(x, y)| Vec2Fixed::new(Fixed::from_bits(x), Fixed::from_bits(y)))
    }

    /// One hero loadout with an optional artifact.
    pub fn arb_hero_loadout() -> impl Strategy<Value = HeroLoadout> {
        (
            0..HEROES.len(),
            1u32..=20,
            proptest::option::of(0..ARTIFACTS.len()),
        )
            .prop_map(|(hero, level, artifact)| {
                let loadout = HeroLoadout::new(HEROES[hero].id, level);
                match artifact {
                    Some(index) => loadout.with_artifact(ARTIFACTS[index].id),
                    None => loadout,
                }
            })
    }

    /// A valid config: 1..=5 heroes and up to one turret per slot.
    pub fn arb_config() -> impl Strategy<Value = SimConfig> {
        (
            proptest::collection::vec(arb_hero_loadout(), 1..=5),
            proptest::collection::vec(proptest::option::of(0..TURRETS.len()), 6),
        )
            .prop_map(|(heroes, slots)| {
                let turrets = slots
                    .into_iter()
                    .enumerate()
                    .filter_map(|(slot, turret)| {
                        let slot = u8::try_from(slot).ok()?;
                        turret.map(|index| TurretLoadout::new(TURRETS[index].id, slot))
                    })
                    .collect();
                SimConfig {
                    heroes,
                    turrets,
                    ..SimConfig::default()
                }
            })
    }

    /// A hero order.
    pub fn arb_hero_command() -> impl Strategy<Value = HeroCommand> {
        prop_oneof![
            arb_field_position().prop_map(|p| HeroCommand::MoveTo { x: p.x, y: p.y }),
            (1u32..40).prop_map(|enemy_id| HeroCommand::Focus { enemy_id }),
            Just(HeroCommand::Return),
        ]
    }

    /// An event addressed to one of `hero_count` slots.
    pub fn arb_event_kind(hero_count: u8) -> impl Strategy<Value = EventKind> {
        let slots = 0..hero_count.max(1);
        prop_oneof![
            slots
                .clone()
                .prop_map(|hero_slot| EventKind::ActivateUltimate { hero_slot }),
            (slots, arb_hero_command())
                .prop_map(|(hero_slot, command)| EventKind::HeroCommand { hero_slot, command }),
            (0u8..4).prop_map(|option_index| EventKind::ChooseRelic { option_index }),
            Just(EventKind::RerollRelics),
        ]
    }

    /// A tick-sorted event script inside `0..max_tick`.
    pub fn arb_event_script(
        hero_count: u8,
        max_tick: u64,
        max_len: usize,
    ) -> impl Strategy<Value = Vec<GameEvent>> {
        proptest::collection::vec((0..max_tick, arb_event_kind(hero_count)), 0..max_len).prop_map(
            |mut raw| {
                raw.sort_by_key(|(tick, _)| *tick);
                raw.into_iter()
                    .map(|(tick, kind)| GameEvent::new(tick, kind))
                    .collect()
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::strategies::*;
    use super::*;
    use crate::fixtures::{full_roster_config, scripted_simulation, REFERENCE_SEED};
    use proptest::prelude::*;
    use siege_core::config::SimConfig;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u32, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
        assert_eq!(result.unique_hashes(), vec![100]);
    }

    #[test]
    #[should_panic(expected = "non-deterministic")]
    fn test_assert_deterministic_reports_mismatch() {
        let result = DeterminismResult {
            is_deterministic: false,
            hashes: vec![1, 2],
            ticks: 10,
        };
        result.assert_deterministic();
    }

    #[test]
    fn test_default_run_determinism() {
        assert!(verify_simulation_determinism(
            || Simulation::new(REFERENCE_SEED, SimConfig::default()).unwrap(),
            900,
        ));
    }

    #[test]
    fn test_scripted_run_has_no_divergence() {
        assert_eq!(find_first_divergence(|| scripted_simulation(3), 1200), None);
    }

    #[test]
    fn test_divergence_is_found() {
        use std::sync::atomic::{AtomicU64, Ordering};

        let seed = AtomicU64::new(1);
        let divergence = find_first_divergence(
            || Simulation::new(seed.fetch_add(1, Ordering::Relaxed), SimConfig::default()).unwrap(),
            10,
        );
        assert_eq!(divergence, Some(0));
    }

    #[test]
    fn test_parallel_runs_agree() {
        let result = run_parallel_simulations_scoped(|| scripted_simulation(REFERENCE_SEED), 4, 600);
        assert_eq!(result.hashes.len(), 4);
        result.assert_deterministic();
    }

    #[test]
    fn test_snapshot_resume_matches() {
        assert!(verify_serialization_determinism(
            || scripted_simulation(9),
            450,
            1500
        ));
        assert!(verify_serialization_determinism(
            || Simulation::new(1, full_roster_config()).unwrap(),
            0,
            200
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_generated_configs_validate(config in arb_config()) {
            prop_assert!(config.validate().is_ok());
        }

        #[test]
        fn prop_any_seed_is_reproducible(seed in arb_seed()) {
            prop_assert!(verify_simulation_determinism(
                || Simulation::new(seed, SimConfig::default()).unwrap(),
                300,
            ));
        }

        #[test]
        fn prop_event_scripts_are_reproducible(
            seed in arb_seed(),
            config in arb_config(),
            script in arb_event_script(5, 600, 24),
        ) {
            let hero_count = u8::try_from(config.heroes.len()).unwrap();
            let script: Vec<_> = script
                .into_iter()
                .filter(|e| e.kind.hero_slot().map_or(true, |slot| slot < hero_count))
                .collect();
            let setup = || {
                let mut sim = Simulation::new(seed, config.clone()).unwrap();
                sim.set_events(script.clone()).unwrap();
                sim
            };
            prop_assert!(verify_simulation_determinism(setup, 600));
        }
    }
}
