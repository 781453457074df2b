//! Skill resolution.
//!
//! A cast splits its effects three ways:
//!
//! - **immediate** effects (buff, heal, shield) land on the caster at once;
//! - **damage** effects launch one projectile per target, and each
//!   projectile carries every status effect of the cast to its target;
//! - status effects in a cast with **no** damage effect are applied to every
//!   live enemy immediately, with no projectile.
//!
//! Area and all-target damage is never split: each target's projectile
//! carries the full amount.

use tracing::debug;

use crate::components::{ActiveHero, Buff, DamageSource, Enemy, EntityId};
use crate::data::{DamageClass, SkillDefinition};
use crate::effects::{EffectTarget, SkillEffect};
use crate::events::SkillCast;
use crate::math::{fp, Fixed, Vec2Fixed};
use crate::physics::{ms_to_ticks, per_second_to_per_tick};
use crate::projectiles::{deliver_effect, launch_projectile, ProjectileLaunch};
use crate::state::GameState;
use crate::targeting::find_closest_enemy_2d;

/// Caster-side inputs to [`resolve_skill`].
#[derive(Debug, Clone, Copy)]
pub struct CastContext {
    /// Caster position.
    pub origin: Vec2Fixed,
    /// Caster level, for percent-HP damage caps.
    pub level: u32,
    /// Multiplier on flat damage.
    pub damage_multiplier: Fixed,
}

/// One projectile a cast will launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedProjectile {
    /// Enemy to chase.
    pub target_enemy_id: EntityId,
    /// Where the enemy is now.
    pub target_position: Vec2Fixed,
    /// Damage on impact.
    pub damage: u32,
    /// Status effects carried to the target.
    pub effects: Vec<SkillEffect>,
    /// Roll crits on impact. Percent-HP damage never crits, so its cap holds.
    pub crit_eligible: bool,
}

/// Everything a cast does, before it is applied to the state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillResolution {
    /// Effects on the caster.
    pub immediate: Vec<SkillEffect>,
    /// Projectiles to launch.
    pub projectiles: Vec<PlannedProjectile>,
    /// Status effects applied without a projectile.
    pub direct_effects: Vec<SkillEffect>,
    /// Enemies receiving `direct_effects`.
    pub direct_targets: Vec<EntityId>,
}

/// Work out what casting `effects` does against `enemies`.
#[must_use]
pub fn resolve_skill(
    effects: &[SkillEffect],
    ctx: &CastContext,
    enemies: &[Enemy],
) -> SkillResolution {
    let mut resolution = SkillResolution::default();
    let delivered: Vec<SkillEffect> = effects
        .iter()
        .filter(|e| e.is_delivered())
        .copied()
        .collect();

    let mut has_damage = false;
    for effect in effects {
        match *effect {
            SkillEffect::Buff { .. } | SkillEffect::Heal { .. } | SkillEffect::Shield { .. } => {
                resolution.immediate.push(*effect);
            }
            SkillEffect::Damage { amount, target } => {
                has_damage = true;
                let damage = fp::mul_int(amount, ctx.damage_multiplier);
                for enemy in select_targets(enemies, ctx.origin, target) {
                    resolution.projectiles.push(PlannedProjectile {
                        target_enemy_id: enemy.id,
                        target_position: enemy.position,
                        damage,
                        effects: delivered.clone(),
                        crit_eligible: true,
                    });
                }
            }
            SkillEffect::PercentCurrentHpDamage {
                percent,
                max_base_damage,
                scaling_per_level,
                target,
            } => {
                has_damage = true;
                let cap = max_base_damage
                    .saturating_add(ctx.level.saturating_mul(scaling_per_level));
                for enemy in select_targets(enemies, ctx.origin, target) {
                    resolution.projectiles.push(PlannedProjectile {
                        target_enemy_id: enemy.id,
                        target_position: enemy.position,
                        damage: fp::mul_int(enemy.current_hp, percent).min(cap),
                        effects: delivered.clone(),
                        crit_eligible: false,
                    });
                }
            }
            SkillEffect::Slow { .. }
            | SkillEffect::Stun { .. }
            | SkillEffect::Freeze { .. }
            | SkillEffect::Burn { .. }
            | SkillEffect::Poison { .. }
            | SkillEffect::Knockback { .. } => {}
        }
    }

    if !has_damage && !delivered.is_empty() {
        resolution.direct_targets = enemies
            .iter()
            .filter(|e| e.is_alive())
            .map(|e| e.id)
            .collect();
        if !resolution.direct_targets.is_empty() {
            resolution.direct_effects = delivered;
        }
    }

    resolution
}

fn select_targets(enemies: &[Enemy], origin: Vec2Fixed, target: EffectTarget) -> Vec<&Enemy> {
    match target {
        EffectTarget::Single => find_closest_enemy_2d(enemies, origin.x, origin.y)
            .into_iter()
            .collect(),
        EffectTarget::Area | EffectTarget::All => {
            enemies.iter().filter(|e| e.is_alive()).collect()
        }
    }
}

/// Apply a buff, heal or shield to the caster.
pub fn apply_immediate_effect(
    hero: &mut ActiveHero,
    effect: &SkillEffect,
    skill_id: &str,
    tick: u64,
    tick_hz: u32,
) {
    match *effect {
        SkillEffect::Buff {
            stat,
            amount,
            duration_ms,
        } => hero.apply_buff(Buff {
            id: format!("{skill_id}:{}", stat.code()),
            stat,
            amount,
            expiration_tick: tick + u64::from(ms_to_ticks(duration_ms, tick_hz)),
        }),
        SkillEffect::Heal { amount } => {
            hero.heal(amount);
        }
        SkillEffect::Shield {
            amount,
            duration_ms,
        } => {
            hero.shield_amount = amount;
            hero.shield_expires_tick = tick + u64::from(ms_to_ticks(duration_ms, tick_hz));
        }
        SkillEffect::Damage { .. }
        | SkillEffect::PercentCurrentHpDamage { .. }
        | SkillEffect::Slow { .. }
        | SkillEffect::Stun { .. }
        | SkillEffect::Freeze { .. }
        | SkillEffect::Burn { .. }
        | SkillEffect::Poison { .. }
        | SkillEffect::Knockback { .. } => {}
    }
}

/// Cast skill `skill_index` of the hero at `hero_index` and start its
/// cooldown.
pub fn execute_cast(
    state: &mut GameState,
    hero_index: usize,
    skill_index: usize,
    skill: &'static SkillDefinition,
    damage_multiplier: Fixed,
) -> SkillCast {
    let tick = state.tick;
    let tick_hz = state.tick_hz;
    let hero = &state.heroes[hero_index];
    let slot = hero.slot;
    let (class, speed) = hero.definition().map_or(
        (DamageClass::Physical, Fixed::ONE),
        |def| (def.class, per_second_to_per_tick(def.projectile_speed, tick_hz)),
    );
    let ctx = CastContext {
        origin: hero.position,
        level: hero.level,
        damage_multiplier,
    };

    let resolution = resolve_skill(skill.effects, &ctx, &state.enemies);

    let hero = &mut state.heroes[hero_index];
    for effect in &resolution.immediate {
        apply_immediate_effect(hero, effect, skill.id, tick, tick_hz);
    }
    if let Some(cooldown) = hero.skill_cooldowns.get_mut(skill_index) {
        *cooldown = ms_to_ticks(skill.cooldown_ms, tick_hz);
    }

    let source = DamageSource::Hero { slot };
    let launched = u32::try_from(resolution.projectiles.len()).unwrap_or(u32::MAX);
    for planned in resolution.projectiles {
        launch_projectile(
            state,
            ProjectileLaunch {
                source,
                origin: ctx.origin,
                target_enemy_id: planned.target_enemy_id,
                target_position: planned.target_position,
                speed,
                damage: planned.damage,
                damage_class: class,
                effects: planned.effects,
                skill_id: Some(skill.id.to_string()),
                crit_eligible: planned.crit_eligible,
            },
        );
    }

    for enemy in state
        .enemies
        .iter_mut()
        .filter(|e| resolution.direct_targets.contains(&e.id))
    {
        for effect in &resolution.direct_effects {
            deliver_effect(enemy, effect, tick, tick_hz, source);
        }
    }

    debug!(tick, hero = slot, skill = skill.id, projectiles = launched, "Skill cast");

    SkillCast {
        hero_slot: slot,
        skill_id: skill.id.to_string(),
        projectiles: launched,
    }
}
