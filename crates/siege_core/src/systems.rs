//! Hero, turret and cleanup systems.
//!
//! Systems are free functions over [`GameState`], run by the simulation in
//! a fixed order each tick. Entities are visited in storage order.

use tracing::{debug, info};

use crate::components::{ActiveHero, DamageSource, HeroCommand};
use crate::config::SimConfig;
use crate::damage::hero_damage_multiplier;
use crate::data::{self, HeroDefinition, SkillTrigger};
use crate::effects::BuffStat;
use crate::events::TickEvents;
use crate::math::{fp, Fixed, Vec2Fixed};
use crate::physics::{clamp_to_field, ms_to_ticks, per_second_to_per_tick};
use crate::projectiles::{launch_projectile, ProjectileLaunch};
use crate::relics::open_relic_offer;
use crate::skills::execute_cast;
use crate::state::{GameState, RelicModifiers, WavePhase};
use crate::targeting::find_closest_enemy_in_range;

/// Ticks between basic attacks once attack speed bonuses apply.
///
/// The base interval is divided by `1 + bonus` and floored, never below one
/// tick.
#[must_use]
pub fn scaled_attack_interval(interval_ms: u32, tick_hz: u32, attack_speed_bonus: Fixed) -> u32 {
    let base = ms_to_ticks(interval_ms, tick_hz).max(1);
    let speed = RelicModifiers::multiplier(attack_speed_bonus);
    let base_fixed = fp::from_int(i32::try_from(base).unwrap_or(i32::MAX));
    let scaled = fp::floor_to_int(fp::div(base_fixed, speed));
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Buffs, regen, movement, auto skills and basic attacks for every hero.
pub fn hero_system(state: &mut GameState, events: &mut TickEvents) {
    for index in 0..state.heroes.len() {
        let Some(def) = state.heroes[index].definition() else {
            continue;
        };
        if !state.heroes[index].is_alive() {
            continue;
        }
        upkeep(&mut state.heroes[index], state.tick, state.tick_hz);
        move_hero(state, index, def);

        let target = select_hero_target(state, index, def);
        let Some(target_index) = target else {
            continue;
        };

        let multiplier = hero_damage_multiplier(&state.heroes[index], &state.relic_modifiers);
        let auto_skill = def.skills.iter().enumerate().find(|(slot, skill)| {
            skill.trigger == SkillTrigger::Auto
                && state.heroes[index].skill_cooldowns.get(*slot) == Some(&0)
        });
        if let Some((skill_index, skill)) = auto_skill {
            let cast = execute_cast(state, index, skill_index, skill, multiplier);
            events.skills_cast.push(cast);
        }

        basic_attack(state, index, def, target_index, multiplier);
    }
}

fn upkeep(hero: &mut ActiveHero, tick: u64, tick_hz: u32) {
    hero.buffs.retain(|buff| tick < buff.expiration_tick);
    if hero.shield_amount > 0 && tick >= hero.shield_expires_tick {
        hero.shield_amount = 0;
    }
    if tick_hz > 0 && tick % u64::from(tick_hz) == 0 {
        let regen = fp::floor_to_int(hero.buff_total(BuffStat::HpRegen));
        if regen > 0 {
            hero.heal(regen.unsigned_abs());
        }
    }
    hero.attack_cooldown = hero.attack_cooldown.saturating_sub(1);
    for cooldown in &mut hero.skill_cooldowns {
        *cooldown = cooldown.saturating_sub(1);
    }
}

fn move_hero(state: &mut GameState, index: usize, def: &'static HeroDefinition) {
    let hero = &state.heroes[index];
    let destination = match hero.command {
        Some(HeroCommand::MoveTo { x, y }) => Some(clamp_to_field(Vec2Fixed::new(x, y))),
        Some(HeroCommand::Focus { enemy_id }) => state
            .enemy(enemy_id)
            .filter(|enemy| enemy.is_alive())
            .filter(|enemy| {
                hero.position.distance_squared(enemy.position)
                    > fp::square_wide(def.attack_range)
            })
            .map(|enemy| enemy.position),
        Some(HeroCommand::Return) | None => Some(hero.home),
    };
    let Some(destination) = destination else {
        return;
    };

    let bonus = hero.buff_total(BuffStat::MoveSpeed);
    let speed = fp::mul(def.move_speed, RelicModifiers::multiplier(bonus));
    let step = per_second_to_per_tick(speed, state.tick_hz);

    let hero = &mut state.heroes[index];
    let (position, arrived) = hero.position.move_towards(destination, step);
    hero.position = position;
    if arrived && hero.command == Some(HeroCommand::Return) {
        hero.command = None;
    }
}

/// A focused hero only fights its focus target; everyone else picks the
/// closest enemy in range. A dead focus target clears the order.
fn select_hero_target(
    state: &mut GameState,
    index: usize,
    def: &'static HeroDefinition,
) -> Option<usize> {
    let hero = &state.heroes[index];
    if let Some(HeroCommand::Focus { enemy_id }) = hero.command {
        let focus = state
            .enemies
            .iter()
            .position(|enemy| enemy.id == enemy_id && enemy.is_alive());
        match focus {
            Some(enemy_index) => {
                let enemy = &state.enemies[enemy_index];
                let in_range = hero.position.distance_squared(enemy.position)
                    <= fp::square_wide(def.attack_range);
                return in_range.then_some(enemy_index);
            }
            None => {
                debug!(tick = state.tick, hero = hero.slot, enemy_id, "Focus target gone");
                state.heroes[index].command = None;
            }
        }
    }
    let hero = &state.heroes[index];
    find_closest_enemy_in_range(&state.enemies, hero.position, def.attack_range)
}

fn basic_attack(
    state: &mut GameState,
    index: usize,
    def: &'static HeroDefinition,
    target_index: usize,
    multiplier: Fixed,
) {
    let hero = &state.heroes[index];
    if hero.attack_cooldown > 0 {
        return;
    }
    let Some(target) = state.enemies.get(target_index).filter(|e| e.is_alive()) else {
        return;
    };
    let bonus = state
        .relic_modifiers
        .attack_speed
        .saturating_add(hero.buff_total(BuffStat::AttackSpeed));
    let interval = scaled_attack_interval(def.attack_interval_ms, state.tick_hz, bonus);
    let launch = ProjectileLaunch {
        source: DamageSource::Hero { slot: hero.slot },
        origin: hero.position,
        target_enemy_id: target.id,
        target_position: target.position,
        speed: per_second_to_per_tick(def.projectile_speed, state.tick_hz),
        damage: fp::mul_int(def.damage_at(hero.level), multiplier),
        damage_class: def.class,
        effects: Vec::new(),
        skill_id: None,
        crit_eligible: true,
    };
    state.heroes[index].attack_cooldown = interval;
    launch_projectile(state, launch);
}

/// Turret targeting and shots. Turret shots never crit.
pub fn turret_system(state: &mut GameState) {
    let damage_multiplier = RelicModifiers::multiplier(state.relic_modifiers.turret_damage);
    for index in 0..state.turrets.len() {
        let turret = &mut state.turrets[index];
        if !turret.is_alive() {
            continue;
        }
        let Some(def) = data::turret(&turret.definition_id) else {
            continue;
        };
        turret.attack_cooldown = turret.attack_cooldown.saturating_sub(1);
        if turret.attack_cooldown > 0 {
            continue;
        }
        let origin = turret.position;
        let id = turret.id;
        let Some(target_index) = find_closest_enemy_in_range(&state.enemies, origin, def.range)
        else {
            continue;
        };
        let target = &state.enemies[target_index];
        let launch = ProjectileLaunch {
            source: DamageSource::Turret { id },
            origin,
            target_enemy_id: target.id,
            target_position: target.position,
            speed: per_second_to_per_tick(def.projectile_speed, state.tick_hz),
            damage: fp::mul_int(def.damage, damage_multiplier),
            damage_class: def.class,
            effects: def.on_hit.to_vec(),
            skill_id: None,
            crit_eligible: false,
        };
        state.turrets[index].attack_cooldown =
            ms_to_ticks(def.attack_interval_ms, state.tick_hz).max(1);
        launch_projectile(state, launch);
    }
}

/// Remove the dead, detect a cleared wave and open the relic offer.
pub fn cleanup_system(state: &mut GameState, config: &SimConfig, events: &mut TickEvents) {
    let tick = state.tick;

    let before = state.enemies.len();
    events
        .killed
        .extend(state.enemies.iter().filter(|e| !e.is_alive()).map(|e| e.id));
    state.enemies.retain(|e| e.is_alive());
    let killed = u32::try_from(before - state.enemies.len()).unwrap_or(u32::MAX);
    state.kills = state.kills.saturating_add(killed);

    for hero in state.heroes.iter().filter(|h| !h.is_alive()) {
        info!(tick, hero = hero.slot, definition = %hero.definition_id, "Hero fallen");
        events.heroes_fallen.push(hero.slot);
    }
    state.heroes.retain(|h| h.is_alive());

    for turret in state.turrets.iter().filter(|t| !t.is_alive()) {
        info!(tick, turret = turret.id, "Turret destroyed");
        events.turrets_destroyed.push(turret.id);
    }
    state.turrets.retain(|t| t.is_alive());

    let cleared = state.wave.phase == WavePhase::Active
        && state.wave.fully_spawned()
        && state.enemies.is_empty();
    if !cleared {
        return;
    }

    let wave = state.current_wave;
    events.wave_cleared = Some(wave);
    info!(tick, wave, kills = state.kills, "Wave cleared");
    state.current_wave = wave.saturating_add(1);
    state.wave.phase = WavePhase::Intermission;
    state.wave.timer_tick = tick + u64::from(ms_to_ticks(config.intermission_ms, state.tick_hz));

    let final_wave = config.target_wave.is_some_and(|target| wave >= target);
    if !final_wave {
        events.relic_offered = open_relic_offer(state, wave);
    }
}
