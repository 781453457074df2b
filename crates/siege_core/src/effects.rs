//! Skill effect definitions.
//!
//! A skill is a list of [`SkillEffect`]s. Resolution (see [`crate::skills`])
//! sorts them into three buckets: effects on the caster, damage carried by
//! projectiles, and status effects that ride along with that damage.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};

/// Who a damage effect is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectTarget {
    /// The enemy closest to the caster.
    Single,
    /// Every live enemy, one projectile each.
    Area,
    /// Every live enemy, one projectile each.
    All,
}

/// Hero stat that a timed buff modifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuffStat {
    /// Additive damage multiplier bonus.
    Damage,
    /// Additive attack speed bonus.
    AttackSpeed,
    /// Additive movement speed bonus.
    MoveSpeed,
    /// Fraction of incoming damage ignored (capped at 75%).
    DamageReduction,
    /// HP restored once per simulated second.
    HpRegen,
}

impl BuffStat {
    /// Stable numeric code, used in buff ids and state hashing.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Damage => 0,
            Self::AttackSpeed => 1,
            Self::MoveSpeed => 2,
            Self::DamageReduction => 3,
            Self::HpRegen => 4,
        }
    }
}

/// One effect of a skill or turret hit.
///
/// Durations are in milliseconds and converted to ticks with the
/// simulation's tick rate when applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillEffect {
    /// Flat damage, scaled by the caster's damage multiplier.
    Damage {
        /// Base damage per target.
        amount: u32,
        /// Target selection.
        target: EffectTarget,
    },
    /// Damage proportional to each target's current HP, capped per level.
    PercentCurrentHpDamage {
        /// Fraction of current HP.
        #[serde(with = "fixed_serde")]
        percent: Fixed,
        /// Cap at level 0.
        max_base_damage: u32,
        /// Cap growth per hero level.
        scaling_per_level: u32,
        /// Target selection.
        target: EffectTarget,
    },
    /// Timed stat buff on the caster.
    Buff {
        /// Stat to modify.
        stat: BuffStat,
        /// Bonus amount.
        #[serde(with = "fixed_serde")]
        amount: Fixed,
        /// Duration in milliseconds.
        duration_ms: u32,
    },
    /// Instant heal on the caster.
    Heal {
        /// HP restored.
        amount: u32,
    },
    /// Damage-absorbing shield on the caster.
    Shield {
        /// Shield HP.
        amount: u32,
        /// Duration in milliseconds.
        duration_ms: u32,
    },
    /// Movement slow on the target.
    Slow {
        /// Fraction of speed removed.
        #[serde(with = "fixed_serde")]
        amount: Fixed,
        /// Duration in milliseconds.
        duration_ms: u32,
    },
    /// Target cannot move or attack.
    Stun {
        /// Duration in milliseconds.
        duration_ms: u32,
    },
    /// Target cannot move, attack, or recover attack cooldown.
    Freeze {
        /// Duration in milliseconds.
        duration_ms: u32,
    },
    /// Fire damage over time, pulsing once per second.
    Burn {
        /// Damage per pulse.
        damage_per_second: u32,
        /// Duration in milliseconds.
        duration_ms: u32,
    },
    /// Poison damage over time, pulsing once per second.
    Poison {
        /// Damage per pulse.
        damage_per_second: u32,
        /// Duration in milliseconds.
        duration_ms: u32,
    },
    /// Push the target back toward the spawn edge.
    Knockback {
        /// Distance before resistance.
        #[serde(with = "fixed_serde")]
        force: Fixed,
    },
}

impl SkillEffect {
    /// Effects applied directly to the caster with no travel time.
    #[must_use]
    pub const fn is_immediate(&self) -> bool {
        matches!(self, Self::Buff { .. } | Self::Heal { .. } | Self::Shield { .. })
    }

    /// Effects that spawn projectiles.
    #[must_use]
    pub const fn is_damage(&self) -> bool {
        matches!(self, Self::Damage { .. } | Self::PercentCurrentHpDamage { .. })
    }

    /// Effects applied to an enemy, either on impact or immediately when
    /// the cast carries no damage.
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(
            self,
            Self::Slow { .. }
                | Self::Stun { .. }
                | Self::Freeze { .. }
                | Self::Burn { .. }
                | Self::Poison { .. }
                | Self::Knockback { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::fx_pct;

    #[test]
    fn test_buckets_are_disjoint_and_total() {
        let effects = [
            SkillEffect::Damage {
                amount: 1,
                target: EffectTarget::Single,
            },
            SkillEffect::PercentCurrentHpDamage {
                percent: fx_pct(10),
                max_base_damage: 1,
                scaling_per_level: 1,
                target: EffectTarget::All,
            },
            SkillEffect::Buff {
                stat: BuffStat::Damage,
                amount: fx_pct(10),
                duration_ms: 1,
            },
            SkillEffect::Heal { amount: 1 },
            SkillEffect::Shield {
                amount: 1,
                duration_ms: 1,
            },
            SkillEffect::Slow {
                amount: fx_pct(10),
                duration_ms: 1,
            },
            SkillEffect::Stun { duration_ms: 1 },
            SkillEffect::Freeze { duration_ms: 1 },
            SkillEffect::Burn {
                damage_per_second: 1,
                duration_ms: 1,
            },
            SkillEffect::Poison {
                damage_per_second: 1,
                duration_ms: 1,
            },
            SkillEffect::Knockback { force: fx_pct(50) },
        ];

        for effect in &effects {
            let buckets = [
                effect.is_immediate(),
                effect.is_damage(),
                effect.is_delivered(),
            ];
            assert_eq!(
                buckets.iter().filter(|b| **b).count(),
                1,
                "{effect:?} must land in exactly one bucket"
            );
        }
    }
}
