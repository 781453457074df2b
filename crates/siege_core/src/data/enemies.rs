//! Enemy definitions.

use super::DamageClass;
use crate::math::{fx, fx_pct, fx_ratio, Fixed};

/// Data-driven enemy definition. Stats are wave-1 values; the wave system
/// scales HP and damage with the wave number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyDefinition {
    /// Unique string identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Class of the enemy's attacks.
    pub class: DamageClass,
    /// Base HP.
    pub base_hp: u32,
    /// Movement speed in units per second.
    pub speed: Fixed,
    /// Base damage per attack.
    pub damage: u32,
    /// Attack range.
    pub attack_range: Fixed,
    /// Time between attacks, in milliseconds.
    pub attack_interval_ms: u32,
    /// First wave this enemy can spawn on.
    pub min_wave: u32,
    /// Fraction of knockback distance ignored.
    pub knockback_resistance: Fixed,
    /// Fraction of crowd-control duration ignored.
    pub cc_resistance: Fixed,
    /// Bosses are spawned only on boss waves, never rolled from the pool.
    pub is_boss: bool,
}

/// All enemies.
pub static ENEMIES: &[EnemyDefinition] = &[
    EnemyDefinition {
        id: "grunt",
        name: "Grunt",
        class: DamageClass::Physical,
        base_hp: 120,
        speed: fx_ratio(6, 5),
        damage: 20,
        attack_range: fx(1),
        attack_interval_ms: 1500,
        min_wave: 1,
        knockback_resistance: Fixed::ZERO,
        cc_resistance: Fixed::ZERO,
        is_boss: false,
    },
    EnemyDefinition {
        id: "runner",
        name: "Runner",
        class: DamageClass::Nature,
        base_hp: 70,
        speed: fx_ratio(12, 5),
        damage: 12,
        attack_range: fx(1),
        attack_interval_ms: 1000,
        min_wave: 2,
        knockback_resistance: Fixed::ZERO,
        cc_resistance: fx_pct(10),
        is_boss: false,
    },
    EnemyDefinition {
        id: "brute",
        name: "Brute",
        class: DamageClass::Physical,
        base_hp: 420,
        speed: fx_ratio(9, 10),
        damage: 100,
        attack_range: fx_ratio(6, 5),
        attack_interval_ms: 2500,
        min_wave: 4,
        knockback_resistance: fx_pct(50),
        cc_resistance: fx_pct(25),
        is_boss: false,
    },
    EnemyDefinition {
        id: "shaman",
        name: "Shaman",
        class: DamageClass::Fire,
        base_hp: 150,
        speed: fx(1),
        damage: 30,
        attack_range: fx(5),
        attack_interval_ms: 2000,
        min_wave: 3,
        knockback_resistance: Fixed::ZERO,
        cc_resistance: Fixed::ZERO,
        is_boss: false,
    },
    EnemyDefinition {
        id: "wraith",
        name: "Wraith",
        class: DamageClass::Void,
        base_hp: 180,
        speed: fx_ratio(8, 5),
        damage: 35,
        attack_range: fx_ratio(3, 2),
        attack_interval_ms: 1800,
        min_wave: 6,
        knockback_resistance: fx_pct(20),
        cc_resistance: fx_pct(40),
        is_boss: false,
    },
    EnemyDefinition {
        id: "warlord",
        name: "Warlord",
        class: DamageClass::Void,
        base_hp: 3000,
        speed: fx_ratio(7, 10),
        damage: 180,
        attack_range: fx(2),
        attack_interval_ms: 3000,
        min_wave: 10,
        knockback_resistance: fx_pct(80),
        cc_resistance: fx_pct(60),
        is_boss: true,
    },
];
