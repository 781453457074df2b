//! Projectile travel and impact.
//!
//! Projectiles home on a single enemy. Each tick a projectile re-reads its
//! target's position and steps toward it; when the step reaches the target
//! the hit resolves. If the target is gone the projectile is discarded on
//! the same tick, so a projectile never outlives its target.

use crate::analytics::{Attribution, DamageDealt, DamageRecorder};
use crate::components::{ActiveProjectile, DamageOverTime, DamageSource, Enemy, EntityId};
use crate::damage::{apply_damage_to_enemy, roll_crit};
use crate::data::DamageClass;
use crate::effects::SkillEffect;
use crate::events::TickEvents;
use crate::math::{Fixed, Vec2Fixed};
use crate::physics::{apply_knockback, ms_to_ticks, scale_cc_duration};
use crate::state::GameState;

/// Projectiles older than this are discarded.
pub const PROJECTILE_MAX_LIFETIME_TICKS: u64 = 300;

/// Everything needed to launch a projectile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectileLaunch {
    /// Shooter.
    pub source: DamageSource,
    /// Launch point.
    pub origin: Vec2Fixed,
    /// Enemy to chase.
    pub target_enemy_id: EntityId,
    /// Where the enemy is now.
    pub target_position: Vec2Fixed,
    /// Units per tick.
    pub speed: Fixed,
    /// Damage on impact.
    pub damage: u32,
    /// Damage class.
    pub damage_class: DamageClass,
    /// Effects delivered on impact.
    pub effects: Vec<SkillEffect>,
    /// Skill id, for attribution.
    pub skill_id: Option<String>,
    /// Roll crits on impact.
    pub crit_eligible: bool,
}

/// Add a projectile to the state. Returns its id.
pub fn launch_projectile(state: &mut GameState, launch: ProjectileLaunch) -> EntityId {
    let id = state.allocate_projectile_id();
    state.projectiles.push(ActiveProjectile {
        id,
        source: launch.source,
        target_enemy_id: launch.target_enemy_id,
        start: launch.origin,
        position: launch.origin,
        target_position: launch.target_position,
        speed: launch.speed,
        damage: launch.damage,
        damage_class: launch.damage_class,
        effects: launch.effects,
        spawn_tick: state.tick,
        skill_id: launch.skill_id,
        crit_eligible: launch.crit_eligible,
    });
    id
}

/// Apply a status effect to an enemy.
///
/// Re-applying an effect never shortens it: expiries take the later tick,
/// slows keep the stronger amount, and damage over time keeps the higher
/// per-second damage and its pulse schedule. Buff, heal and shield effects
/// are caster-only and ignored here.
pub fn deliver_effect(
    enemy: &mut Enemy,
    effect: &SkillEffect,
    tick: u64,
    tick_hz: u32,
    source: DamageSource,
) {
    let status = &mut enemy.status;
    match *effect {
        SkillEffect::Slow {
            amount,
            duration_ms,
        } => {
            let until = tick + u64::from(ms_to_ticks(duration_ms, tick_hz));
            status.slow_amount = if tick < status.slow_until {
                status.slow_amount.max(amount)
            } else {
                amount
            };
            status.slow_until = status.slow_until.max(until);
        }
        SkillEffect::Stun { duration_ms } => {
            let ticks = scale_cc_duration(ms_to_ticks(duration_ms, tick_hz), enemy.cc_resistance);
            status.stun_until = status.stun_until.max(tick + u64::from(ticks));
        }
        SkillEffect::Freeze { duration_ms } => {
            let ticks = scale_cc_duration(ms_to_ticks(duration_ms, tick_hz), enemy.cc_resistance);
            status.freeze_until = status.freeze_until.max(tick + u64::from(ticks));
        }
        SkillEffect::Burn {
            damage_per_second,
            duration_ms,
        } => {
            refresh_dot(&mut status.burn, damage_per_second, duration_ms, tick, tick_hz, source);
        }
        SkillEffect::Poison {
            damage_per_second,
            duration_ms,
        } => {
            refresh_dot(&mut status.poison, damage_per_second, duration_ms, tick, tick_hz, source);
        }
        SkillEffect::Knockback { force } => {
            enemy.position.x = apply_knockback(enemy.position.x, force, enemy.knockback_resistance);
        }
        SkillEffect::Damage { .. }
        | SkillEffect::PercentCurrentHpDamage { .. }
        | SkillEffect::Buff { .. }
        | SkillEffect::Heal { .. }
        | SkillEffect::Shield { .. } => {}
    }
}

fn refresh_dot(
    slot: &mut Option<DamageOverTime>,
    damage_per_second: u32,
    duration_ms: u32,
    tick: u64,
    tick_hz: u32,
    source: DamageSource,
) {
    let until = tick + u64::from(ms_to_ticks(duration_ms, tick_hz));
    match slot {
        Some(existing) if tick < existing.until => {
            if damage_per_second >= existing.damage_per_second {
                existing.damage_per_second = damage_per_second;
                existing.source = source;
            }
            existing.until = existing.until.max(until);
        }
        _ => {
            *slot = Some(DamageOverTime {
                damage_per_second,
                until,
                next_pulse: tick + u64::from(tick_hz),
                source,
            });
        }
    }
}

/// Advance every projectile one tick and resolve impacts in launch order.
pub fn projectile_system<R: DamageRecorder + ?Sized>(
    state: &mut GameState,
    recorder: &mut R,
    events: &mut TickEvents,
) {
    let tick = state.tick;
    let tick_hz = state.tick_hz;
    let projectiles = std::mem::take(&mut state.projectiles);
    let mut in_flight = Vec::with_capacity(projectiles.len());

    for mut projectile in projectiles {
        if tick.saturating_sub(projectile.spawn_tick) > PROJECTILE_MAX_LIFETIME_TICKS {
            continue;
        }
        let Some(target) = state
            .enemies
            .iter_mut()
            .find(|e| e.id == projectile.target_enemy_id && e.is_alive())
        else {
            continue;
        };

        projectile.target_position = target.position;
        let (position, arrived) = projectile
            .position
            .move_towards(projectile.target_position, projectile.speed);
        projectile.position = position;
        if !arrived {
            in_flight.push(projectile);
            continue;
        }

        let (damage, crit) = if projectile.crit_eligible {
            roll_crit(&mut state.rng, projectile.damage, &state.relic_modifiers)
        } else {
            (projectile.damage, false)
        };
        let dealt = apply_damage_to_enemy(target, damage);
        let attribution = match (&projectile.source, projectile.skill_id.as_deref()) {
            (_, Some(skill)) => Attribution::Skill(skill),
            (DamageSource::Turret { .. }, None) => Attribution::TurretShot,
            (_, None) => Attribution::BasicAttack,
        };
        recorder.record_dealt(&DamageDealt {
            tick,
            source: projectile.source,
            attribution,
            target: target.id,
            amount: dealt,
            crit,
        });
        events.projectile_hits += 1;

        if target.is_alive() {
            for effect in &projectile.effects {
                deliver_effect(target, effect, tick, tick_hz, projectile.source);
            }
        }
    }

    state.projectiles = in_flight;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::DamageAnalytics;
    use crate::config::{HeroLoadout, SimConfig};
    use crate::math::{fx, fx_pct};
    use crate::testing::{test_enemy, TEST_TICK_HZ};

    fn state_with_enemy(x: Fixed) -> GameState {
        let config = SimConfig {
            heroes: vec![HeroLoadout::new("vanguard", 1)],
            turrets: Vec::new(),
            ..SimConfig::default()
        };
        let mut state = GameState::new(9, &config).unwrap();
        state.enemies.push(test_enemy("grunt", 1, x));
        state
    }

    fn shot(state: &GameState, speed: Fixed, effects: Vec<SkillEffect>) -> ProjectileLaunch {
        ProjectileLaunch {
            source: DamageSource::Turret { id: 1 },
            origin: Vec2Fixed::new(fx(8), state.enemies[0].position.y),
            target_enemy_id: state.enemies[0].id,
            target_position: state.enemies[0].position,
            speed,
            damage: 30,
            damage_class: DamageClass::Physical,
            effects,
            skill_id: None,
            crit_eligible: false,
        }
    }

    #[test]
    fn test_projectile_travels_then_hits() {
        let mut state = state_with_enemy(fx(10));
        let launch = shot(&state, fx(1), vec![SkillEffect::Stun { duration_ms: 1000 }]);
        launch_projectile(&mut state, launch);
        let mut analytics = DamageAnalytics::default();

        let mut events = TickEvents::default();
        projectile_system(&mut state, &mut analytics, &mut events);
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.enemies[0].current_hp, 120);

        projectile_system(&mut state, &mut analytics, &mut events);
        assert!(state.projectiles.is_empty());
        assert_eq!(state.enemies[0].current_hp, 90);
        assert!(state.enemies[0].status.is_stunned(state.tick));
        assert_eq!(events.projectile_hits, 1);
        assert_eq!(analytics.damage_by_turret.get(&1), Some(&30));
    }

    #[test]
    fn test_projectile_dropped_when_target_gone() {
        let mut state = state_with_enemy(fx(20));
        let launch = shot(&state, fx(1), Vec::new());
        launch_projectile(&mut state, launch);
        state.enemies[0].current_hp = 0;

        projectile_system(&mut state, &mut DamageAnalytics::default(), &mut TickEvents::default());
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_projectile_expires() {
        let mut state = state_with_enemy(fx(30));
        let launch = shot(&state, Fixed::from_bits(1), Vec::new());
        launch_projectile(&mut state, launch);
        state.tick = PROJECTILE_MAX_LIFETIME_TICKS + 1;

        projectile_system(&mut state, &mut DamageAnalytics::default(), &mut TickEvents::default());
        assert!(state.projectiles.is_empty());
        assert_eq!(state.enemies[0].current_hp, 120);
    }

    #[test]
    fn test_deliver_effects_never_shorten() {
        let mut enemy = test_enemy("brute", 4, fx(10));
        let source = DamageSource::Hero { slot: 0 };

        deliver_effect(&mut enemy, &SkillEffect::Slow { amount: fx_pct(40), duration_ms: 2000 }, 0, TEST_TICK_HZ, source);
        deliver_effect(&mut enemy, &SkillEffect::Slow { amount: fx_pct(10), duration_ms: 500 }, 0, TEST_TICK_HZ, source);
        assert_eq!(enemy.status.slow_amount, fx_pct(40));
        assert_eq!(enemy.status.slow_until, 60);

        // brute resists a quarter of crowd control: 30 ticks -> 22
        deliver_effect(&mut enemy, &SkillEffect::Stun { duration_ms: 1000 }, 0, TEST_TICK_HZ, source);
        assert_eq!(enemy.status.stun_until, 22);

        deliver_effect(&mut enemy, &SkillEffect::Knockback { force: fx(2) }, 0, TEST_TICK_HZ, source);
        assert_eq!(enemy.position.x, fx(11));
    }

    #[test]
    fn test_dot_refresh_keeps_pulse_schedule() {
        let mut enemy = test_enemy("grunt", 1, fx(10));
        let source = DamageSource::Hero { slot: 1 };
        let burn = |dps, ms| SkillEffect::Burn { damage_per_second: dps, duration_ms: ms };

        deliver_effect(&mut enemy, &burn(6, 3000), 0, TEST_TICK_HZ, source);
        deliver_effect(&mut enemy, &burn(4, 6000), 10, TEST_TICK_HZ, source);
        let dot = enemy.status.burn.unwrap();
        assert_eq!(dot.damage_per_second, 6);
        assert_eq!(dot.until, 190);
        assert_eq!(dot.next_pulse, 30);
    }
}
