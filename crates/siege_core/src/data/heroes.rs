//! Hero definitions.

use super::{DamageClass, PassiveId};
use crate::effects::{BuffStat, EffectTarget, SkillEffect};
use crate::math::{fx, fx_pct, fx_ratio, Fixed};

/// When a skill fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkillTrigger {
    /// Cast automatically when off cooldown and an enemy is in range.
    Auto,
    /// Cast only by an explicit player event.
    Ultimate,
}

/// A hero skill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillDefinition {
    /// Unique skill id.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Auto-cast or ultimate.
    pub trigger: SkillTrigger,
    /// Cooldown after casting, in milliseconds.
    pub cooldown_ms: u32,
    /// Effects resolved on cast.
    pub effects: &'static [SkillEffect],
}

/// Data-driven hero definition.
///
/// Distances are in world units, speeds in units per second and intervals
/// in milliseconds; the simulation converts them with its tick rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeroDefinition {
    /// Unique string identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Class of the hero's attacks.
    pub class: DamageClass,
    /// Damage class this hero takes 25% extra damage from.
    pub weakness: Option<DamageClass>,
    /// Max HP at level 1.
    pub base_hp: u32,
    /// Max HP gained per level past 1.
    pub hp_per_level: u32,
    /// Basic attack damage at level 1.
    pub base_damage: u32,
    /// Damage gained per level past 1.
    pub damage_per_level: u32,
    /// Basic attack and auto-skill range.
    pub attack_range: Fixed,
    /// Time between basic attacks.
    pub attack_interval_ms: u32,
    /// Movement speed.
    pub move_speed: Fixed,
    /// Speed of the hero's projectiles.
    pub projectile_speed: Fixed,
    /// Innate passives.
    pub passives: &'static [PassiveId],
    /// Skills, in cooldown-slot order.
    pub skills: &'static [SkillDefinition],
}

impl HeroDefinition {
    /// Max HP at `level`.
    #[must_use]
    pub fn max_hp_at(&self, level: u32) -> u32 {
        self.base_hp + self.hp_per_level * level.saturating_sub(1)
    }

    /// Basic attack damage at `level`.
    #[must_use]
    pub fn damage_at(&self, level: u32) -> u32 {
        self.base_damage + self.damage_per_level * level.saturating_sub(1)
    }

    /// The hero's ultimate skill, if it has one.
    #[must_use]
    pub fn ultimate(&self) -> Option<(usize, &'static SkillDefinition)> {
        self.skills
            .iter()
            .enumerate()
            .find(|(_, skill)| skill.trigger == SkillTrigger::Ultimate)
    }

    /// Whether the hero has `passive` innately.
    #[must_use]
    pub fn has_passive(&self, passive: PassiveId) -> bool {
        self.passives.contains(&passive)
    }
}

/// All heroes.
pub static HEROES: &[HeroDefinition] = &[
    HeroDefinition {
        id: "vanguard",
        name: "Vanguard",
        class: DamageClass::Physical,
        weakness: Some(DamageClass::Void),
        base_hp: 1000,
        hp_per_level: 80,
        base_damage: 40,
        damage_per_level: 4,
        attack_range: fx_ratio(5, 2),
        attack_interval_ms: 1000,
        move_speed: fx(3),
        projectile_speed: fx(12),
        passives: &[PassiveId::FatalHitBlock],
        skills: &[
            SkillDefinition {
                id: "shield_bash",
                name: "Shield Bash",
                trigger: SkillTrigger::Auto,
                cooldown_ms: 6000,
                effects: &[
                    SkillEffect::Damage {
                        amount: 60,
                        target: EffectTarget::Single,
                    },
                    SkillEffect::Stun { duration_ms: 800 },
                ],
            },
            SkillDefinition {
                id: "bulwark",
                name: "Bulwark",
                trigger: SkillTrigger::Ultimate,
                cooldown_ms: 30_000,
                effects: &[
                    SkillEffect::Shield {
                        amount: 300,
                        duration_ms: 5000,
                    },
                    SkillEffect::Buff {
                        stat: BuffStat::DamageReduction,
                        amount: fx_pct(30),
                        duration_ms: 5000,
                    },
                    SkillEffect::Buff {
                        stat: BuffStat::HpRegen,
                        amount: fx(20),
                        duration_ms: 5000,
                    },
                ],
            },
        ],
    },
    HeroDefinition {
        id: "pyromancer",
        name: "Pyromancer",
        class: DamageClass::Fire,
        weakness: Some(DamageClass::Ice),
        base_hp: 600,
        hp_per_level: 50,
        base_damage: 55,
        damage_per_level: 6,
        attack_range: fx(7),
        attack_interval_ms: 1200,
        move_speed: fx_ratio(5, 2),
        projectile_speed: fx(10),
        passives: &[],
        skills: &[
            SkillDefinition {
                id: "fireball",
                name: "Fireball",
                trigger: SkillTrigger::Auto,
                cooldown_ms: 5000,
                effects: &[
                    SkillEffect::Damage {
                        amount: 80,
                        target: EffectTarget::Single,
                    },
                    SkillEffect::Burn {
                        damage_per_second: 6,
                        duration_ms: 3000,
                    },
                ],
            },
            SkillDefinition {
                id: "inferno",
                name: "Inferno",
                trigger: SkillTrigger::Ultimate,
                cooldown_ms: 40_000,
                effects: &[
                    SkillEffect::Damage {
                        amount: 150,
                        target: EffectTarget::All,
                    },
                    SkillEffect::Burn {
                        damage_per_second: 10,
                        duration_ms: 4000,
                    },
                ],
            },
        ],
    },
    HeroDefinition {
        id: "frostwarden",
        name: "Frostwarden",
        class: DamageClass::Ice,
        weakness: Some(DamageClass::Fire),
        base_hp: 700,
        hp_per_level: 60,
        base_damage: 35,
        damage_per_level: 4,
        attack_range: fx(6),
        attack_interval_ms: 1100,
        move_speed: fx_ratio(5, 2),
        projectile_speed: fx(11),
        passives: &[],
        skills: &[
            SkillDefinition {
                id: "frost_nova",
                name: "Frost Nova",
                trigger: SkillTrigger::Auto,
                cooldown_ms: 8000,
                effects: &[SkillEffect::Slow {
                    amount: fx_pct(40),
                    duration_ms: 2500,
                }],
            },
            SkillDefinition {
                id: "absolute_zero",
                name: "Absolute Zero",
                trigger: SkillTrigger::Ultimate,
                cooldown_ms: 45_000,
                effects: &[
                    SkillEffect::Damage {
                        amount: 40,
                        target: EffectTarget::All,
                    },
                    SkillEffect::Freeze { duration_ms: 2000 },
                ],
            },
        ],
    },
    HeroDefinition {
        id: "stormcaller",
        name: "Stormcaller",
        class: DamageClass::Lightning,
        weakness: Some(DamageClass::Nature),
        base_hp: 650,
        hp_per_level: 55,
        base_damage: 45,
        damage_per_level: 5,
        attack_range: fx(8),
        attack_interval_ms: 900,
        move_speed: fx(3),
        projectile_speed: fx(16),
        passives: &[],
        skills: &[
            SkillDefinition {
                id: "chain_bolt",
                name: "Chain Bolt",
                trigger: SkillTrigger::Auto,
                cooldown_ms: 4000,
                effects: &[SkillEffect::Damage {
                    amount: 50,
                    target: EffectTarget::Area,
                }],
            },
            SkillDefinition {
                id: "judgement",
                name: "Judgement",
                trigger: SkillTrigger::Ultimate,
                cooldown_ms: 50_000,
                effects: &[SkillEffect::PercentCurrentHpDamage {
                    percent: fx_pct(25),
                    max_base_damage: 400,
                    scaling_per_level: 40,
                    target: EffectTarget::All,
                }],
            },
        ],
    },
    HeroDefinition {
        id: "reaper",
        name: "Reaper",
        class: DamageClass::Void,
        weakness: Some(DamageClass::Physical),
        base_hp: 750,
        hp_per_level: 65,
        base_damage: 60,
        damage_per_level: 7,
        attack_range: fx(3),
        attack_interval_ms: 1000,
        move_speed: fx_ratio(7, 2),
        projectile_speed: fx(14),
        passives: &[PassiveId::Thorns],
        skills: &[
            SkillDefinition {
                id: "soul_rend",
                name: "Soul Rend",
                trigger: SkillTrigger::Auto,
                cooldown_ms: 7000,
                effects: &[
                    SkillEffect::Damage {
                        amount: 70,
                        target: EffectTarget::Single,
                    },
                    SkillEffect::Poison {
                        damage_per_second: 5,
                        duration_ms: 4000,
                    },
                ],
            },
            SkillDefinition {
                id: "harvest",
                name: "Harvest",
                trigger: SkillTrigger::Ultimate,
                cooldown_ms: 60_000,
                effects: &[
                    SkillEffect::PercentCurrentHpDamage {
                        percent: fx_pct(35),
                        max_base_damage: 600,
                        scaling_per_level: 60,
                        target: EffectTarget::Single,
                    },
                    SkillEffect::Heal { amount: 200 },
                ],
            },
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_scaling() {
        let vanguard = &HEROES[0];
        assert_eq!(vanguard.max_hp_at(1), 1000);
        assert_eq!(vanguard.max_hp_at(3), 1160);
        assert_eq!(vanguard.damage_at(0), 40);
    }

    #[test]
    fn test_every_hero_has_an_ultimate() {
        for hero in HEROES {
            assert!(hero.ultimate().is_some(), "{} has no ultimate", hero.id);
        }
    }
}
