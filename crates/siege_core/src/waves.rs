//! Waves and enemy behaviour.
//!
//! The wave director alternates between an intermission and an active wave.
//! Wave `n` spawns `6 + 2n` enemies at a fixed interval; every tenth wave
//! ends with a boss. Each spawn draws its enemy type from the pool unlocked
//! by the wave number, then a vertical offset, in that order.
//!
//! Enemies walk toward the fortress and stop to fight anything in range,
//! heroes first, then turrets. An enemy that reaches the fortress wall
//! damages it once and is removed.

use tracing::{debug, info};

use crate::analytics::{Attribution, DamageDealt, DamageRecorder};
use crate::components::{DamageOverTime, DamageSource, Enemy, EntityId, StatusEffects};
use crate::config::SimConfig;
use crate::damage::{apply_damage_to_enemy, apply_damage_to_hero, apply_damage_to_turret, IncomingHit};
use crate::data::{EnemyDefinition, ENEMIES};
use crate::events::{HeroHit, TickEvents};
use crate::math::{fp, fx, fx_ratio, Fixed, Vec2Fixed};
use crate::physics::{ms_to_ticks, per_second_to_per_tick, FIELD_CENTER_Y, FIELD_WIDTH, FORTRESS_X};
use crate::state::{GameState, WavePhase};
use crate::targeting::{find_closest_hero_in_range, find_closest_turret_in_range};

/// Enemies spawned by wave 0; each wave adds [`ENEMIES_PER_WAVE`].
pub const BASE_ENEMIES_PER_WAVE: u32 = 6;

/// Extra enemies per wave number.
pub const ENEMIES_PER_WAVE: u32 = 2;

/// Boss waves are multiples of this.
pub const BOSS_WAVE_INTERVAL: u32 = 10;

/// HP growth per wave past the first.
pub const HP_SCALING_PER_WAVE: Fixed = fx_ratio(12, 100);

/// Damage growth per wave past the first.
pub const DAMAGE_SCALING_PER_WAVE: Fixed = fx_ratio(8, 100);

/// Largest vertical offset from the lane centre for a spawn.
pub const SPAWN_Y_VARIANCE: Fixed = fx(2);

/// Number of enemies wave `wave` spawns.
#[must_use]
pub const fn wave_enemy_count(wave: u32) -> u32 {
    BASE_ENEMIES_PER_WAVE + ENEMIES_PER_WAVE * wave
}

/// Whether `wave` ends with a boss.
#[must_use]
pub const fn is_boss_wave(wave: u32) -> bool {
    wave > 0 && wave % BOSS_WAVE_INTERVAL == 0
}

fn wave_scale(per_wave: Fixed, wave: u32) -> Fixed {
    let steps = i32::try_from(wave.saturating_sub(1)).unwrap_or(i32::MAX);
    Fixed::ONE.saturating_add(per_wave.saturating_mul_int(steps))
}

/// Regular enemies that can spawn on `wave`, in table order.
#[must_use]
pub fn unlocked_pool(wave: u32) -> Vec<&'static EnemyDefinition> {
    ENEMIES
        .iter()
        .filter(|def| !def.is_boss && def.min_wave <= wave)
        .collect()
}

/// The boss for `wave`: the highest-unlocked boss definition.
#[must_use]
pub fn boss_for_wave(wave: u32) -> Option<&'static EnemyDefinition> {
    ENEMIES
        .iter()
        .filter(|def| def.is_boss && def.min_wave <= wave)
        .last()
}

/// Instantiate an enemy with wave scaling and per-tick rates.
#[must_use]
pub fn build_enemy(
    def: &'static EnemyDefinition,
    id: EntityId,
    position: Vec2Fixed,
    wave: u32,
    tick_hz: u32,
) -> Enemy {
    let max_hp = fp::mul_int(def.base_hp, wave_scale(HP_SCALING_PER_WAVE, wave)).max(1);
    Enemy {
        id,
        definition_id: def.id.to_string(),
        position,
        current_hp: max_hp,
        max_hp,
        speed: per_second_to_per_tick(def.speed, tick_hz),
        damage: fp::mul_int(def.damage, wave_scale(DAMAGE_SCALING_PER_WAVE, wave)),
        class: def.class,
        attack_range: def.attack_range,
        attack_interval: ms_to_ticks(def.attack_interval_ms, tick_hz).max(1),
        attack_cooldown: 0,
        knockback_resistance: def.knockback_resistance,
        cc_resistance: def.cc_resistance,
        is_boss: def.is_boss,
        status: StatusEffects::default(),
    }
}

/// Add an enemy to the state at `position`. Returns its id.
pub fn spawn_enemy(
    state: &mut GameState,
    def: &'static EnemyDefinition,
    position: Vec2Fixed,
) -> EntityId {
    let id = state.allocate_enemy_id();
    let enemy = build_enemy(def, id, position, state.current_wave, state.tick_hz);
    state.enemies.push(enemy);
    id
}

/// Start waves when their intermission ends and spawn due enemies.
pub fn wave_director(state: &mut GameState, config: &SimConfig, events: &mut TickEvents) {
    let tick = state.tick;
    match state.wave.phase {
        WavePhase::Intermission => {
            if tick < state.wave.timer_tick {
                return;
            }
            let wave = state.current_wave;
            state.wave.phase = WavePhase::Active;
            state.wave.enemies_total = wave_enemy_count(wave);
            state.wave.enemies_spawned = 0;
            state.wave.timer_tick =
                tick + u64::from(ms_to_ticks(config.first_spawn_delay_ms, state.tick_hz));
            for hero in &mut state.heroes {
                hero.consumed_passives.clear();
            }
            events.wave_started = Some(wave);
            info!(tick, wave, enemies = state.wave.enemies_total, "Wave started");
        }
        WavePhase::Active => {
            if state.wave.fully_spawned() || tick < state.wave.timer_tick {
                return;
            }
            if let Some(id) = spawn_next(state) {
                events.spawned.push(id);
            }
            state.wave.enemies_spawned += 1;
            state.wave.timer_tick =
                tick + u64::from(ms_to_ticks(config.spawn_interval_ms, state.tick_hz).max(1));
        }
    }
}

fn spawn_next(state: &mut GameState) -> Option<EntityId> {
    let wave = state.current_wave;
    let last = state.wave.enemies_spawned + 1 == state.wave.enemies_total;
    let def = match boss_for_wave(wave) {
        Some(boss) if last && is_boss_wave(wave) => boss,
        _ => {
            let pool = unlocked_pool(wave);
            if pool.is_empty() {
                return None;
            }
            pool[state.rng.next_index(pool.len())]
        }
    };
    let offset = state.rng.next_signed(SPAWN_Y_VARIANCE);
    let position = Vec2Fixed::new(FIELD_WIDTH, FIELD_CENTER_Y.saturating_add(offset));
    let id = spawn_enemy(state, def, position);
    debug!(tick = state.tick, enemy = id, kind = def.id, "Enemy spawned");
    Some(id)
}

/// Tick burn and poison pulses and drop expired effects.
pub fn status_system<R: DamageRecorder + ?Sized>(state: &mut GameState, recorder: &mut R) {
    let tick = state.tick;
    let tick_hz = u64::from(state.tick_hz);
    for enemy in &mut state.enemies {
        if !enemy.is_alive() {
            continue;
        }
        if tick >= enemy.status.slow_until {
            enemy.status.slow_amount = Fixed::ZERO;
        }
        let mut burn = enemy.status.burn;
        pulse_dot(enemy, &mut burn, Attribution::Burn, tick, tick_hz, recorder);
        enemy.status.burn = burn;
        let mut poison = enemy.status.poison;
        pulse_dot(enemy, &mut poison, Attribution::Poison, tick, tick_hz, recorder);
        enemy.status.poison = poison;
    }
}

fn pulse_dot<R: DamageRecorder + ?Sized>(
    enemy: &mut Enemy,
    dot: &mut Option<DamageOverTime>,
    attribution: Attribution<'_>,
    tick: u64,
    tick_hz: u64,
    recorder: &mut R,
) {
    let Some(active) = dot.as_mut() else {
        return;
    };
    // A pulse due on the expiry tick still lands.
    if tick >= active.next_pulse && active.next_pulse <= active.until && enemy.is_alive() {
        active.next_pulse += tick_hz.max(1);
        let dealt = apply_damage_to_enemy(enemy, active.damage_per_second);
        recorder.record_dealt(&DamageDealt {
            tick,
            source: active.source,
            attribution,
            target: enemy.id,
            amount: dealt,
            crit: false,
        });
    }
    if tick >= active.until {
        *dot = None;
    }
}

/// Move enemies, resolve their attacks and leak the ones that reach the wall.
pub fn enemy_system<R: DamageRecorder + ?Sized>(
    state: &mut GameState,
    recorder: &mut R,
    events: &mut TickEvents,
) {
    let tick = state.tick;
    let mut leaked = Vec::new();

    for index in 0..state.enemies.len() {
        let enemy = &mut state.enemies[index];
        if !enemy.is_alive() {
            continue;
        }
        let frozen = enemy.status.is_frozen(tick);
        if enemy.attack_cooldown > 0 && !frozen {
            enemy.attack_cooldown -= 1;
        }
        if enemy.status.is_disabled(tick) {
            continue;
        }

        let origin = enemy.position;
        let range = enemy.attack_range;
        if let Some(hero_index) = find_closest_hero_in_range(&state.heroes, origin, range) {
            let enemy = &mut state.enemies[index];
            if enemy.attack_cooldown > 0 {
                continue;
            }
            enemy.attack_cooldown = enemy.attack_interval;
            let hit = IncomingHit {
                amount: i64::from(enemy.damage),
                class: enemy.class,
                attacker: enemy.id,
                tick,
            };
            let hero = &mut state.heroes[hero_index];
            let outcome = apply_damage_to_hero(hero, &hit, &mut state.rng, recorder);
            events.hero_hits.push(HeroHit {
                hero_slot: hero.slot,
                enemy_id: enemy.id,
                outcome,
            });
            if outcome.reflected > 0 {
                let dealt = apply_damage_to_enemy(enemy, outcome.reflected);
                recorder.record_dealt(&DamageDealt {
                    tick,
                    source: DamageSource::Hero { slot: hero.slot },
                    attribution: Attribution::Thorns,
                    target: enemy.id,
                    amount: dealt,
                    crit: false,
                });
            }
            continue;
        }

        if let Some(turret_index) = find_closest_turret_in_range(&state.turrets, origin, range) {
            let enemy = &mut state.enemies[index];
            if enemy.attack_cooldown == 0 {
                enemy.attack_cooldown = enemy.attack_interval;
                apply_damage_to_turret(&mut state.turrets[turret_index], enemy.damage);
            }
            continue;
        }

        let enemy = &mut state.enemies[index];
        let step = fp::mul(enemy.speed, enemy.status.speed_factor(tick));
        enemy.position.x = enemy.position.x.saturating_sub(step);
        if enemy.position.x <= FORTRESS_X {
            let damage = enemy.damage.min(state.fortress_hp);
            state.fortress_hp -= damage;
            events.fortress_damage += damage;
            leaked.push(enemy.id);
            debug!(tick, enemy = enemy.id, damage, "Enemy reached the fortress");
        }
    }

    if !leaked.is_empty() {
        state.enemies.retain(|e| !leaked.contains(&e.id));
        events.leaked.extend(leaked);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{DamageAnalytics, NullRecorder};
    use crate::config::HeroLoadout;
    use crate::data;
    use crate::effects::SkillEffect;
    use crate::projectiles::deliver_effect;

    fn config() -> SimConfig {
        SimConfig {
            heroes: vec![HeroLoadout::new("vanguard", 1)],
            turrets: Vec::new(),
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_wave_composition() {
        assert_eq!(wave_enemy_count(1), 8);
        assert_eq!(wave_enemy_count(10), 26);
        assert!(is_boss_wave(10));
        assert!(!is_boss_wave(0));
        assert!(!is_boss_wave(11));
        assert_eq!(unlocked_pool(1).len(), 1);
        assert!(unlocked_pool(6).iter().all(|d| !d.is_boss));
        assert_eq!(boss_for_wave(10).map(|d| d.id), Some("warlord"));
        assert!(boss_for_wave(9).is_none());
    }

    #[test]
    fn test_wave_scaling_floors() {
        let grunt = data::enemy("grunt").unwrap();
        let enemy = build_enemy(grunt, 1, Vec2Fixed::ZERO, 1, 30);
        assert_eq!(enemy.max_hp, 120);
        assert_eq!(enemy.damage, 20);

        let enemy = build_enemy(grunt, 1, Vec2Fixed::ZERO, 11, 30);
        // 120 * 2.2 and 20 * 1.8, each floored after Q16.16 truncation
        assert!((262..=264).contains(&enemy.max_hp));
        assert!((35..=36).contains(&enemy.damage));
        assert_eq!(enemy.attack_interval, 45);
    }

    #[test]
    fn test_director_spawns_on_schedule() {
        let config = config();
        let mut state = GameState::new(42, &config).unwrap();
        let mut events = TickEvents::default();

        wave_director(&mut state, &config, &mut events);
        assert_eq!(events.wave_started, Some(1));
        assert_eq!(state.wave.enemies_total, 8);

        // first spawn 1500ms = 45 ticks after the wave starts
        state.tick = 44;
        wave_director(&mut state, &config, &mut events);
        assert!(state.enemies.is_empty());
        state.tick = 45;
        wave_director(&mut state, &config, &mut events);
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.enemies[0].position.x, FIELD_WIDTH);
        let offset = state.enemies[0].position.y - FIELD_CENTER_Y;
        assert!(offset >= -SPAWN_Y_VARIANCE && offset < SPAWN_Y_VARIANCE);
        assert_eq!(state.wave.timer_tick, 45 + 24);
    }

    #[test]
    fn test_spawns_are_reproducible() {
        let config = config();
        let run = || {
            let mut state = GameState::new(7, &config).unwrap();
            state.current_wave = 6;
            let mut events = TickEvents::default();
            for tick in 0..1000 {
                state.tick = tick;
                wave_director(&mut state, &config, &mut events);
            }
            state
                .enemies
                .iter()
                .map(|e| (e.definition_id.clone(), e.position))
                .collect::<Vec<_>>()
        };
        let first = run();
        assert_eq!(first.len(), 18);
        assert_eq!(first, run());
    }

    #[test]
    fn test_boss_closes_boss_wave() {
        let config = config();
        let mut state = GameState::new(3, &config).unwrap();
        state.current_wave = 10;
        let mut events = TickEvents::default();
        for tick in 0..2000 {
            state.tick = tick;
            wave_director(&mut state, &config, &mut events);
        }
        assert_eq!(state.enemies.len(), 26);
        assert!(state.enemies.last().unwrap().is_boss);
        assert_eq!(state.enemies.iter().filter(|e| e.is_boss).count(), 1);
    }

    #[test]
    fn test_enemy_attacks_hero_in_range() {
        let config = config();
        let mut state = GameState::new(12345, &config).unwrap();
        let brute = data::enemy("brute").unwrap();
        let hero_pos = state.heroes[0].position;
        spawn_enemy(&mut state, brute, Vec2Fixed::new(hero_pos.x + fx(1), hero_pos.y));
        let mut events = TickEvents::default();

        enemy_system(&mut state, &mut NullRecorder, &mut events);
        assert_eq!(state.heroes[0].current_hp, 900);
        assert_eq!(events.hero_hits.len(), 1);
        assert_eq!(state.enemies[0].position.x, hero_pos.x + fx(1));

        // cooldown holds the next swing
        state.tick += 1;
        enemy_system(&mut state, &mut NullRecorder, &mut events);
        assert_eq!(state.heroes[0].current_hp, 900);
    }

    #[test]
    fn test_enemy_leaks_into_fortress() {
        let config = config();
        let mut state = GameState::new(1, &config).unwrap();
        let grunt = data::enemy("grunt").unwrap();
        spawn_enemy(&mut state, grunt, Vec2Fixed::new(FORTRESS_X, fx(1)));
        let mut events = TickEvents::default();

        enemy_system(&mut state, &mut NullRecorder, &mut events);
        assert!(state.enemies.is_empty());
        assert_eq!(events.leaked.len(), 1);
        assert_eq!(state.fortress_hp, config.fortress_max_hp - 20);
    }

    #[test]
    fn test_stunned_enemy_does_not_move() {
        let config = config();
        let mut state = GameState::new(1, &config).unwrap();
        let grunt = data::enemy("grunt").unwrap();
        spawn_enemy(&mut state, grunt, Vec2Fixed::new(fx(30), fx(1)));
        state.enemies[0].status.stun_until = 5;

        enemy_system(&mut state, &mut NullRecorder, &mut TickEvents::default());
        assert_eq!(state.enemies[0].position.x, fx(30));

        state.tick = 5;
        enemy_system(&mut state, &mut NullRecorder, &mut TickEvents::default());
        assert!(state.enemies[0].position.x < fx(30));
    }

    fn dot_total(effect: SkillEffect, tick_hz: u32) -> (u32, Option<u64>) {
        let config = SimConfig {
            tick_hz,
            ..config()
        };
        let mut state = GameState::new(1, &config).unwrap();
        let grunt = data::enemy("grunt").unwrap();
        spawn_enemy(&mut state, grunt, Vec2Fixed::new(fx(30), fx(1)));
        let source = DamageSource::Hero { slot: 0 };
        deliver_effect(&mut state.enemies[0], &effect, 0, tick_hz, source);
        let mut analytics = DamageAnalytics::default();

        for tick in 0..u64::from(tick_hz) * 10 {
            state.tick = tick;
            status_system(&mut state, &mut analytics);
        }
        let status = &state.enemies[0].status;
        assert!(status.burn.is_none() && status.poison.is_none());
        let dealt = state.enemies[0].max_hp - state.enemies[0].current_hp;
        let key = match effect {
            SkillEffect::Poison { .. } => "poison",
            _ => "burn",
        };
        (dealt, analytics.damage_by_attribution.get(key).copied())
    }

    #[test]
    fn test_dot_deals_dps_times_seconds() {
        let burn = |seconds: u32| SkillEffect::Burn {
            damage_per_second: 6,
            duration_ms: seconds * 1000,
        };
        assert_eq!(dot_total(burn(3), 30), (18, Some(18)));
        assert_eq!(dot_total(burn(1), 30), (6, Some(6)));
        assert_eq!(dot_total(burn(2), 60), (12, Some(12)));

        let poison = SkillEffect::Poison {
            damage_per_second: 5,
            duration_ms: 4000,
        };
        assert_eq!(dot_total(poison, 30), (20, Some(20)));
    }

    #[test]
    fn test_dot_pulses_on_whole_seconds() {
        let config = config();
        let mut state = GameState::new(1, &config).unwrap();
        let grunt = data::enemy("grunt").unwrap();
        spawn_enemy(&mut state, grunt, Vec2Fixed::new(fx(30), fx(1)));
        state.enemies[0].status.poison = Some(DamageOverTime {
            damage_per_second: 5,
            until: 61,
            next_pulse: 30,
            source: DamageSource::Hero { slot: 0 },
        });

        let mut pulses = Vec::new();
        for tick in 0..90 {
            state.tick = tick;
            let before = state.enemies[0].current_hp;
            status_system(&mut state, &mut NullRecorder);
            if state.enemies[0].current_hp < before {
                pulses.push(tick);
            }
        }
        assert_eq!(pulses, vec![30, 60]);
        assert!(state.enemies[0].status.poison.is_none());
    }
}
