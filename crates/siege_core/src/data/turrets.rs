//! Turret definitions.

use super::DamageClass;
use crate::effects::SkillEffect;
use crate::math::{fx, fx_pct, fx_ratio, Fixed};

/// Data-driven turret definition. Turrets sit on pillars and never move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurretDefinition {
    /// Unique string identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Class of the turret's shots.
    pub class: DamageClass,
    /// Max HP.
    pub max_hp: u32,
    /// Damage per shot.
    pub damage: u32,
    /// Targeting range.
    pub range: Fixed,
    /// Time between shots, in milliseconds.
    pub attack_interval_ms: u32,
    /// Projectile speed in units per second.
    pub projectile_speed: Fixed,
    /// Effects delivered with every shot.
    pub on_hit: &'static [SkillEffect],
}

/// All turrets.
pub static TURRETS: &[TurretDefinition] = &[
    TurretDefinition {
        id: "arrow_tower",
        name: "Arrow Tower",
        class: DamageClass::Physical,
        max_hp: 500,
        damage: 25,
        range: fx(9),
        attack_interval_ms: 800,
        projectile_speed: fx(18),
        on_hit: &[],
    },
    TurretDefinition {
        id: "cannon",
        name: "Cannon",
        class: DamageClass::Physical,
        max_hp: 700,
        damage: 60,
        range: fx(7),
        attack_interval_ms: 2000,
        projectile_speed: fx(10),
        on_hit: &[SkillEffect::Knockback {
            force: fx_pct(80),
        }],
    },
    TurretDefinition {
        id: "frost_spire",
        name: "Frost Spire",
        class: DamageClass::Ice,
        max_hp: 450,
        damage: 15,
        range: fx(8),
        attack_interval_ms: 1200,
        projectile_speed: fx(14),
        on_hit: &[SkillEffect::Slow {
            amount: fx_pct(30),
            duration_ms: 1500,
        }],
    },
    TurretDefinition {
        id: "flame_brazier",
        name: "Flame Brazier",
        class: DamageClass::Fire,
        max_hp: 400,
        damage: 20,
        range: fx_ratio(13, 2),
        attack_interval_ms: 1000,
        projectile_speed: fx(12),
        on_hit: &[SkillEffect::Burn {
            damage_per_second: 4,
            duration_ms: 2000,
        }],
    },
    TurretDefinition {
        id: "tesla_coil",
        name: "Tesla Coil",
        class: DamageClass::Lightning,
        max_hp: 450,
        damage: 35,
        range: fx(6),
        attack_interval_ms: 1500,
        projectile_speed: fx(24),
        on_hit: &[SkillEffect::Stun { duration_ms: 300 }],
    },
];
