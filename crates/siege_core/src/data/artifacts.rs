//! Artifact definitions. One artifact may be equipped per hero.

use super::PassiveId;
use crate::math::{fx_pct, Fixed};

/// Data-driven artifact definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArtifactDefinition {
    /// Unique string identifier.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Chance to ignore a hit entirely.
    pub dodge_chance: Fixed,
    /// Chance to reduce a hit to a quarter.
    pub block_chance: Fixed,
    /// Fraction of the blocked portion healed back.
    pub block_lifesteal: Fixed,
    /// Additive damage multiplier bonus.
    pub damage_bonus: Fixed,
    /// Passive granted while equipped.
    pub passive: Option<PassiveId>,
}

/// All artifacts.
pub static ARTIFACTS: &[ArtifactDefinition] = &[
    ArtifactDefinition {
        id: "phantom_cloak",
        name: "Phantom Cloak",
        dodge_chance: fx_pct(15),
        block_chance: Fixed::ZERO,
        block_lifesteal: Fixed::ZERO,
        damage_bonus: Fixed::ZERO,
        passive: None,
    },
    ArtifactDefinition {
        id: "aegis_buckler",
        name: "Aegis Buckler",
        dodge_chance: Fixed::ZERO,
        block_chance: fx_pct(25),
        block_lifesteal: fx_pct(50),
        damage_bonus: Fixed::ZERO,
        passive: None,
    },
    ArtifactDefinition {
        id: "thornmail_vest",
        name: "Thornmail Vest",
        dodge_chance: Fixed::ZERO,
        block_chance: fx_pct(10),
        block_lifesteal: Fixed::ZERO,
        damage_bonus: Fixed::ZERO,
        passive: Some(PassiveId::Thorns),
    },
    ArtifactDefinition {
        id: "phoenix_feather",
        name: "Phoenix Feather",
        dodge_chance: Fixed::ZERO,
        block_chance: Fixed::ZERO,
        block_lifesteal: Fixed::ZERO,
        damage_bonus: Fixed::ZERO,
        passive: Some(PassiveId::FatalHitBlock),
    },
    ArtifactDefinition {
        id: "warbrand",
        name: "Warbrand",
        dodge_chance: Fixed::ZERO,
        block_chance: Fixed::ZERO,
        block_lifesteal: Fixed::ZERO,
        damage_bonus: fx_pct(15),
        passive: None,
    },
];
