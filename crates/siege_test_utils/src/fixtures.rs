//! Test fixtures and helpers.
//!
//! Pre-built configurations and event scripts for consistent testing.

use siege_core::config::{HeroLoadout, SimConfig, TurretLoadout};
use siege_core::events::{EventKind, GameEvent};
use siege_core::math::{fx, Fixed, Vec2Fixed};
use siege_core::physics::FIELD_CENTER_Y;
use siege_core::simulation::Simulation;

/// Seed used by the reference end-to-end scenario.
pub const REFERENCE_SEED: u64 = 12345;

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> Fixed {
    Fixed::from_num(n)
}

/// A point on the lane centre.
#[must_use]
pub fn lane_point(x: i32) -> Vec2Fixed {
    Vec2Fixed::new(fx(x), FIELD_CENTER_Y)
}

/// One level-1 hero and nothing else.
#[must_use]
pub fn solo_config(hero: &str) -> SimConfig {
    SimConfig {
        heroes: vec![HeroLoadout::new(hero, 1)],
        turrets: Vec::new(),
        ..SimConfig::default()
    }
}

/// Every hero and turret type, with artifacts, so a run exercises dodge,
/// block, thorns and every skill.
#[must_use]
pub fn full_roster_config() -> SimConfig {
    SimConfig {
        heroes: vec![
            HeroLoadout::new("vanguard", 5).with_artifact("thornmail_vest"),
            HeroLoadout::new("pyromancer", 4).with_artifact("warbrand"),
            HeroLoadout::new("frostwarden", 4).with_artifact("aegis_buckler"),
            HeroLoadout::new("stormcaller", 3).with_artifact("phantom_cloak"),
            HeroLoadout::new("reaper", 3).with_artifact("phoenix_feather"),
        ],
        turrets: vec![
            TurretLoadout::new("arrow_tower", 0),
            TurretLoadout::new("frost_spire", 1),
            TurretLoadout::new("cannon", 2),
            TurretLoadout::new("flame_brazier", 3),
            TurretLoadout::new("tesla_coil", 4),
        ],
        ..SimConfig::default()
    }
}

/// A scripted set of player inputs touching every event kind except
/// forfeit: ultimates, hero orders and relic picks and rerolls after the
/// first few waves.
#[must_use]
pub fn scripted_events(hero_count: u8) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for wave in 0..6u64 {
        let base = 300 + wave * 600;
        for slot in 0..hero_count {
            events.push(GameEvent::new(
                base + u64::from(slot),
                EventKind::ActivateUltimate { hero_slot: slot },
            ));
        }
        events.push(GameEvent::new(
            base + 100,
            EventKind::HeroCommand {
                hero_slot: 0,
                command: siege_core::components::HeroCommand::MoveTo {
                    x: fx(12),
                    y: FIELD_CENTER_Y,
                },
            },
        ));
        events.push(GameEvent::new(
            base + 250,
            EventKind::HeroCommand {
                hero_slot: 0,
                command: siege_core::components::HeroCommand::Return,
            },
        ));
        events.push(GameEvent::new(base + 400, EventKind::RerollRelics));
        events.push(GameEvent::new(
            base + 401,
            EventKind::ChooseRelic { option_index: 0 },
        ));
    }
    events
}

/// A full-roster simulation with [`scripted_events`] queued.
///
/// # Panics
///
/// Panics if the fixture config or events are rejected.
#[must_use]
pub fn scripted_simulation(seed: u64) -> Simulation {
    let config = full_roster_config();
    let hero_count = u8::try_from(config.heroes.len()).expect("small roster");
    let mut sim = Simulation::new(seed, config).expect("valid fixture config");
    sim.set_events(scripted_events(hero_count))
        .expect("valid fixture events");
    sim
}
