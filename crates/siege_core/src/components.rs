//! Battlefield entities.
//!
//! Entities are plain data. Behaviour lives in the system modules
//! ([`crate::systems`], [`crate::waves`], [`crate::projectiles`]), which
//! read definitions from [`crate::data`] by id.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::data::{self, ArtifactDefinition, DamageClass, EnemyDefinition, HeroDefinition, PassiveId};
use crate::effects::{BuffStat, SkillEffect};
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Identifier for enemies, projectiles and turrets.
pub type EntityId = u32;

/// Who dealt a piece of damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageSource {
    /// A hero, by formation slot.
    Hero {
        /// Slot of the hero.
        slot: u8,
    },
    /// A turret, by id.
    Turret {
        /// Turret id.
        id: EntityId,
    },
    /// An enemy, by id.
    Enemy {
        /// Enemy id.
        id: EntityId,
    },
}

// ============================================================================
// Heroes
// ============================================================================

/// Timed stat modifier on a hero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buff {
    /// `"{skill_id}:{stat code}"`; recasting the same skill refreshes it.
    pub id: String,
    /// Stat modified.
    pub stat: BuffStat,
    /// Bonus amount.
    #[serde(with = "fixed_serde")]
    pub amount: Fixed,
    /// First tick on which the buff is gone.
    pub expiration_tick: u64,
}

/// Player order for a hero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeroCommand {
    /// Walk to a point and hold there.
    MoveTo {
        /// Target x.
        #[serde(with = "fixed_serde")]
        x: Fixed,
        /// Target y.
        #[serde(with = "fixed_serde")]
        y: Fixed,
    },
    /// Chase and attack one enemy until it dies.
    Focus {
        /// Enemy to focus.
        enemy_id: EntityId,
    },
    /// Walk back to the formation slot.
    Return,
}

/// A hero on the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveHero {
    /// Formation slot; stable for the whole run.
    pub slot: u8,
    /// Hero definition id.
    pub definition_id: String,
    /// Hero level.
    pub level: u32,
    /// Current HP.
    pub current_hp: u32,
    /// Max HP after relic modifiers.
    pub max_hp: u32,
    /// Max HP before relic modifiers.
    pub base_max_hp: u32,
    /// Current position.
    pub position: Vec2Fixed,
    /// Formation position.
    pub home: Vec2Fixed,
    /// Active buffs in application order.
    pub buffs: Vec<Buff>,
    /// Equipped artifact id.
    pub equipped_artifact: Option<String>,
    /// Remaining shield HP.
    pub shield_amount: u32,
    /// First tick on which the shield is gone.
    pub shield_expires_tick: u64,
    /// Ticks until the next basic attack.
    pub attack_cooldown: u32,
    /// Ticks until each skill is ready, in definition order.
    pub skill_cooldowns: Vec<u32>,
    /// Once-per-wave passives already used this wave.
    pub consumed_passives: BTreeSet<PassiveId>,
    /// Current player order.
    pub command: Option<HeroCommand>,
}

impl ActiveHero {
    /// Static definition for this hero.
    #[must_use]
    pub fn definition(&self) -> Option<&'static HeroDefinition> {
        data::hero(&self.definition_id)
    }

    /// Static definition for the equipped artifact.
    #[must_use]
    pub fn artifact(&self) -> Option<&'static ArtifactDefinition> {
        self.equipped_artifact.as_deref().and_then(data::artifact)
    }

    /// Whether the hero is still standing.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    /// Whether the hero has `passive` from its definition or its artifact.
    #[must_use]
    pub fn has_passive(&self, passive: PassiveId) -> bool {
        self.definition().is_some_and(|def| def.has_passive(passive))
            || self.artifact().and_then(|a| a.passive) == Some(passive)
    }

    /// Sum of active buffs on `stat`.
    #[must_use]
    pub fn buff_total(&self, stat: BuffStat) -> Fixed {
        self.buffs
            .iter()
            .filter(|b| b.stat == stat)
            .fold(Fixed::ZERO, |acc, b| acc.saturating_add(b.amount))
    }

    /// Add or refresh a buff by id.
    pub fn apply_buff(&mut self, buff: Buff) {
        if let Some(existing) = self.buffs.iter_mut().find(|b| b.id == buff.id) {
            *existing = buff;
        } else {
            self.buffs.push(buff);
        }
    }

    /// Restore HP, capped at max. Returns the amount actually healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.current_hp;
        self.current_hp = self.current_hp.saturating_add(amount).min(self.max_hp);
        self.current_hp - before
    }
}

// ============================================================================
// Turrets
// ============================================================================

/// A turret on a pillar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTurret {
    /// Turret id.
    pub id: EntityId,
    /// Turret definition id.
    pub definition_id: String,
    /// Pillar slot (0..6, two per pillar).
    pub slot: u8,
    /// Fixed position.
    pub position: Vec2Fixed,
    /// Current HP.
    pub current_hp: u32,
    /// Max HP.
    pub max_hp: u32,
    /// Ticks until the next shot.
    pub attack_cooldown: u32,
}

impl ActiveTurret {
    /// Whether the turret is still standing.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.current_hp > 0
    }
}

// ============================================================================
// Enemies
// ============================================================================

/// Damage over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageOverTime {
    /// Damage dealt per pulse.
    pub damage_per_second: u32,
    /// First tick on which the effect is gone.
    pub until: u64,
    /// Tick of the next pulse.
    pub next_pulse: u64,
    /// Who applied it.
    pub source: DamageSource,
}

/// Status effects on an enemy. Every expiry is the first tick on which the
/// effect no longer applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusEffects {
    /// Fraction of speed removed while slowed.
    #[serde(with = "fixed_serde")]
    pub slow_amount: Fixed,
    /// Slow expiry.
    pub slow_until: u64,
    /// Stun expiry.
    pub stun_until: u64,
    /// Freeze expiry.
    pub freeze_until: u64,
    /// Active burn.
    pub burn: Option<DamageOverTime>,
    /// Active poison.
    pub poison: Option<DamageOverTime>,
}

impl StatusEffects {
    /// Stunned this tick.
    #[must_use]
    pub const fn is_stunned(&self, tick: u64) -> bool {
        tick < self.stun_until
    }

    /// Frozen this tick.
    #[must_use]
    pub const fn is_frozen(&self, tick: u64) -> bool {
        tick < self.freeze_until
    }

    /// Cannot act this tick.
    #[must_use]
    pub const fn is_disabled(&self, tick: u64) -> bool {
        self.is_stunned(tick) || self.is_frozen(tick)
    }

    /// Movement multiplier after slows.
    #[must_use]
    pub fn speed_factor(&self, tick: u64) -> Fixed {
        if tick < self.slow_until {
            (Fixed::ONE - self.slow_amount).max(Fixed::ZERO)
        } else {
            Fixed::ONE
        }
    }
}

/// An enemy on the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    /// Enemy id.
    pub id: EntityId,
    /// Enemy definition id.
    pub definition_id: String,
    /// Current position.
    pub position: Vec2Fixed,
    /// Current HP.
    pub current_hp: u32,
    /// Max HP after wave scaling.
    pub max_hp: u32,
    /// Movement in units per tick.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Damage per attack after wave scaling.
    pub damage: u32,
    /// Class of its attacks.
    pub class: DamageClass,
    /// Attack range.
    #[serde(with = "fixed_serde")]
    pub attack_range: Fixed,
    /// Ticks between attacks.
    pub attack_interval: u32,
    /// Ticks until the next attack.
    pub attack_cooldown: u32,
    /// Fraction of knockback ignored.
    #[serde(with = "fixed_serde")]
    pub knockback_resistance: Fixed,
    /// Fraction of crowd-control duration ignored.
    #[serde(with = "fixed_serde")]
    pub cc_resistance: Fixed,
    /// Boss flag.
    pub is_boss: bool,
    /// Active status effects.
    pub status: StatusEffects,
}

impl Enemy {
    /// Static definition for this enemy.
    #[must_use]
    pub fn definition(&self) -> Option<&'static EnemyDefinition> {
        data::enemy(&self.definition_id)
    }

    /// Whether the enemy is still alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.current_hp > 0
    }
}

// ============================================================================
// Projectiles
// ============================================================================

/// A projectile in flight. Projectiles home on one enemy and vanish if it
/// dies first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveProjectile {
    /// Projectile id.
    pub id: EntityId,
    /// Shooter.
    pub source: DamageSource,
    /// Enemy being chased.
    pub target_enemy_id: EntityId,
    /// Launch point.
    pub start: Vec2Fixed,
    /// Current position.
    pub position: Vec2Fixed,
    /// Last known target position.
    pub target_position: Vec2Fixed,
    /// Units per tick.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Damage on impact before crits.
    pub damage: u32,
    /// Class of the damage.
    pub damage_class: DamageClass,
    /// Effects delivered on impact.
    pub effects: Vec<SkillEffect>,
    /// Tick of launch.
    pub spawn_tick: u64,
    /// Skill that fired it, `None` for basic attacks and turret shots.
    pub skill_id: Option<String>,
    /// Whether impact rolls for a critical hit.
    pub crit_eligible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{fx, fx_pct};

    fn hero() -> ActiveHero {
        ActiveHero {
            slot: 0,
            definition_id: "reaper".into(),
            level: 1,
            current_hp: 500,
            max_hp: 750,
            base_max_hp: 750,
            position: Vec2Fixed::ZERO,
            home: Vec2Fixed::ZERO,
            buffs: Vec::new(),
            equipped_artifact: Some("phoenix_feather".into()),
            shield_amount: 0,
            shield_expires_tick: 0,
            attack_cooldown: 0,
            skill_cooldowns: vec![0, 0],
            consumed_passives: BTreeSet::new(),
            command: None,
        }
    }

    #[test]
    fn test_passives_from_definition_and_artifact() {
        let hero = hero();
        assert!(hero.has_passive(PassiveId::Thorns));
        assert!(hero.has_passive(PassiveId::FatalHitBlock));
    }

    #[test]
    fn test_buff_refresh_by_id() {
        let mut hero = hero();
        let buff = |amount, until| Buff {
            id: "bulwark:3".into(),
            stat: BuffStat::DamageReduction,
            amount,
            expiration_tick: until,
        };
        hero.apply_buff(buff(fx_pct(30), 100));
        hero.apply_buff(buff(fx_pct(30), 200));
        assert_eq!(hero.buffs.len(), 1);
        assert_eq!(hero.buffs[0].expiration_tick, 200);
        assert_eq!(hero.buff_total(BuffStat::DamageReduction), fx_pct(30));
        assert_eq!(hero.buff_total(BuffStat::Damage), Fixed::ZERO);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut hero = hero();
        assert_eq!(hero.heal(1000), 250);
        assert_eq!(hero.current_hp, 750);
    }

    #[test]
    fn test_status_expiry_boundaries() {
        let status = StatusEffects {
            slow_amount: fx_pct(40),
            slow_until: 10,
            stun_until: 5,
            ..StatusEffects::default()
        };
        assert!(status.is_disabled(4));
        assert!(!status.is_disabled(5));
        assert_eq!(status.speed_factor(9), fx_pct(60) + Fixed::from_bits(1));
        assert_eq!(status.speed_factor(10), fx(1));
    }
}
