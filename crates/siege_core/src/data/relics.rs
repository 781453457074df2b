//! Relic definitions. Relics are run-wide modifiers picked between waves.

use crate::math::{fx_pct, Fixed};

/// Offer weighting tier. Purely descriptive; offers roll uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rarity {
    /// Common.
    Common,
    /// Rare.
    Rare,
    /// Epic.
    Epic,
}

/// Stat a relic modifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelicStat {
    /// Hero damage multiplier bonus.
    Damage,
    /// Hero attack speed bonus.
    AttackSpeed,
    /// Flat crit chance bonus.
    CritChance,
    /// Crit multiplier bonus.
    CritMultiplier,
    /// Hero max HP multiplier bonus.
    HeroMaxHp,
    /// Fortress max HP multiplier bonus.
    FortressMaxHp,
    /// Turret damage multiplier bonus.
    TurretDamage,
}

/// One additive modifier granted by a relic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelicModifier {
    /// Stat affected.
    pub stat: RelicStat,
    /// Additive amount (may be negative).
    pub amount: Fixed,
}

/// Data-driven relic definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelicDefinition {
    /// Unique string identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Tier.
    pub rarity: Rarity,
    /// Modifiers applied when the relic is chosen.
    pub modifiers: &'static [RelicModifier],
}

const fn modifier(stat: RelicStat, percent: i32) -> RelicModifier {
    RelicModifier {
        stat,
        amount: fx_pct(percent),
    }
}

/// All relics.
pub static RELICS: &[RelicDefinition] = &[
    RelicDefinition {
        id: "iron_will",
        name: "Iron Will",
        rarity: Rarity::Common,
        modifiers: &[modifier(RelicStat::HeroMaxHp, 15)],
    },
    RelicDefinition {
        id: "sharpened_edge",
        name: "Sharpened Edge",
        rarity: Rarity::Common,
        modifiers: &[modifier(RelicStat::Damage, 10)],
    },
    RelicDefinition {
        id: "quickdraw",
        name: "Quickdraw",
        rarity: Rarity::Common,
        modifiers: &[modifier(RelicStat::AttackSpeed, 15)],
    },
    RelicDefinition {
        id: "eagle_eye",
        name: "Eagle Eye",
        rarity: Rarity::Rare,
        modifiers: &[modifier(RelicStat::CritChance, 10)],
    },
    RelicDefinition {
        id: "executioner",
        name: "Executioner",
        rarity: Rarity::Rare,
        modifiers: &[modifier(RelicStat::CritMultiplier, 50)],
    },
    RelicDefinition {
        id: "stone_walls",
        name: "Stone Walls",
        rarity: Rarity::Common,
        modifiers: &[modifier(RelicStat::FortressMaxHp, 25)],
    },
    RelicDefinition {
        id: "engineer_kit",
        name: "Engineer's Kit",
        rarity: Rarity::Rare,
        modifiers: &[modifier(RelicStat::TurretDamage, 25)],
    },
    RelicDefinition {
        id: "berserker_totem",
        name: "Berserker Totem",
        rarity: Rarity::Epic,
        modifiers: &[
            modifier(RelicStat::Damage, 20),
            modifier(RelicStat::HeroMaxHp, -10),
        ],
    },
    RelicDefinition {
        id: "storm_heart",
        name: "Storm Heart",
        rarity: Rarity::Epic,
        modifiers: &[
            modifier(RelicStat::AttackSpeed, 10),
            modifier(RelicStat::CritChance, 5),
        ],
    },
];
