//! Static definition tables.
//!
//! Heroes, turrets, enemies, relics and artifacts are compiled-in `'static`
//! tables keyed by string id. They are never mutated, so any number of
//! simulations on any number of threads can read them concurrently.
//!
//! **Note:** This module contains no IO. Loadouts reference these tables by
//! id; [`crate::config::SimConfig::validate`] rejects unknown ids up front.

mod artifacts;
mod enemies;
mod heroes;
mod relics;
mod turrets;

use serde::{Deserialize, Serialize};

pub use artifacts::{ArtifactDefinition, ARTIFACTS};
pub use enemies::{EnemyDefinition, ENEMIES};
pub use heroes::{HeroDefinition, SkillDefinition, SkillTrigger, HEROES};
pub use relics::{RelicDefinition, RelicModifier, RelicStat, Rarity, RELICS};
pub use turrets::{TurretDefinition, TURRETS};

/// Elemental class of an attack. Heroes take extra damage from the class
/// listed as their weakness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageClass {
    /// Weapons and claws.
    Physical,
    /// Flames and burns.
    Fire,
    /// Frost and freezing.
    Ice,
    /// Storms and shocks.
    Lightning,
    /// Shadow magic.
    Void,
    /// Poisons and thorns.
    Nature,
}

/// Passive abilities granted by hero definitions or artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PassiveId {
    /// Once per wave, a hit that would kill the hero leaves it at 1 HP.
    FatalHitBlock,
    /// Reflects part of the damage taken back at the attacker.
    Thorns,
}

impl PassiveId {
    /// Stable code for hashing.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::FatalHitBlock => 0,
            Self::Thorns => 1,
        }
    }
}

/// Which table a definition id was looked up in, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    /// Hero table.
    Hero,
    /// Turret table.
    Turret,
    /// Enemy table.
    Enemy,
    /// Relic table.
    Relic,
    /// Artifact table.
    Artifact,
}

impl std::fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Hero => "hero",
            Self::Turret => "turret",
            Self::Enemy => "enemy",
            Self::Relic => "relic",
            Self::Artifact => "artifact",
        };
        f.write_str(name)
    }
}

/// Look up a hero definition by id.
#[must_use]
pub fn hero(id: &str) -> Option<&'static HeroDefinition> {
    HEROES.iter().find(|def| def.id == id)
}

/// Look up a turret definition by id.
#[must_use]
pub fn turret(id: &str) -> Option<&'static TurretDefinition> {
    TURRETS.iter().find(|def| def.id == id)
}

/// Look up an enemy definition by id.
#[must_use]
pub fn enemy(id: &str) -> Option<&'static EnemyDefinition> {
    ENEMIES.iter().find(|def| def.id == id)
}

/// Look up a relic definition by id.
#[must_use]
pub fn relic(id: &str) -> Option<&'static RelicDefinition> {
    RELICS.iter().find(|def| def.id == id)
}

/// Look up an artifact definition by id.
#[must_use]
pub fn artifact(id: &str) -> Option<&'static ArtifactDefinition> {
    ARTIFACTS.iter().find(|def| def.id == id)
}

/// A problem found while checking the static tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableIssue {
    /// Table the issue was found in.
    pub kind: DefinitionKind,
    /// Offending definition id.
    pub id: &'static str,
    /// What is wrong.
    pub message: String,
}

impl std::fmt::Display for TableIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}': {}", self.kind, self.id, self.message)
    }
}

/// Check table-wide invariants: unique ids, sane stats, at most one
/// ultimate per hero, a non-boss enemy available on wave 1.
#[must_use]
pub fn validate_tables() -> Vec<TableIssue> {
    let mut issues = Vec::new();

    check_unique(DefinitionKind::Hero, HEROES.iter().map(|d| d.id), &mut issues);
    check_unique(DefinitionKind::Turret, TURRETS.iter().map(|d| d.id), &mut issues);
    check_unique(DefinitionKind::Enemy, ENEMIES.iter().map(|d| d.id), &mut issues);
    check_unique(DefinitionKind::Relic, RELICS.iter().map(|d| d.id), &mut issues);
    check_unique(DefinitionKind::Artifact, ARTIFACTS.iter().map(|d| d.id), &mut issues);

    for def in HEROES {
        if def.base_hp == 0 {
            issues.push(TableIssue {
                kind: DefinitionKind::Hero,
                id: def.id,
                message: "base_hp must be positive".into(),
            });
        }
        let ultimates = def
            .skills
            .iter()
            .filter(|s| s.trigger == SkillTrigger::Ultimate)
            .count();
        if ultimates > 1 {
            issues.push(TableIssue {
                kind: DefinitionKind::Hero,
                id: def.id,
                message: format!("has {ultimates} ultimates, expected at most 1"),
            });
        }
        for skill in def.skills {
            if skill.effects.is_empty() {
                issues.push(TableIssue {
                    kind: DefinitionKind::Hero,
                    id: def.id,
                    message: format!("skill '{}' has no effects", skill.id),
                });
            }
        }
    }

    for def in TURRETS {
        if def.attack_interval_ms == 0 || def.max_hp == 0 {
            issues.push(TableIssue {
                kind: DefinitionKind::Turret,
                id: def.id,
                message: "attack interval and max_hp must be positive".into(),
            });
        }
        if def.on_hit.iter().any(|e| !e.is_delivered()) {
            issues.push(TableIssue {
                kind: DefinitionKind::Turret,
                id: def.id,
                message: "on-hit effects must be deliverable status effects".into(),
            });
        }
    }

    if !ENEMIES.iter().any(|e| !e.is_boss && e.min_wave <= 1) {
        issues.push(TableIssue {
            kind: DefinitionKind::Enemy,
            id: "*",
            message: "no regular enemy unlocked on wave 1".into(),
        });
    }

    for def in RELICS {
        if def.modifiers.is_empty() {
            issues.push(TableIssue {
                kind: DefinitionKind::Relic,
                id: def.id,
                message: "relic has no modifiers".into(),
            });
        }
    }

    issues
}

fn check_unique(
    kind: DefinitionKind,
    ids: impl Iterator<Item = &'static str>,
    issues: &mut Vec<TableIssue>,
) {
    let mut seen: Vec<&'static str> = Vec::new();
    for id in ids {
        if seen.contains(&id) {
            issues.push(TableIssue {
                kind,
                id,
                message: "duplicate id".into(),
            });
        } else {
            seen.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_are_valid() {
        let issues = validate_tables();
        assert!(issues.is_empty(), "table issues: {issues:?}");
    }

    #[test]
    fn test_lookups() {
        assert_eq!(hero("vanguard").map(|d| d.base_hp), Some(1000));
        assert!(turret("cannon").is_some());
        assert!(enemy("brute").is_some());
        assert!(relic("eagle_eye").is_some());
        assert!(artifact("phantom_cloak").is_some());
        assert!(hero("missing").is_none());
    }

    #[test]
    fn test_two_ultimates_use_percent_hp_damage() {
        let count = HEROES
            .iter()
            .flat_map(|h| h.skills.iter())
            .filter(|s| s.trigger == SkillTrigger::Ultimate)
            .filter(|s| {
                s.effects.iter().any(|e| {
                    matches!(e, crate::effects::SkillEffect::PercentCurrentHpDamage { .. })
                })
            })
            .count();
        assert_eq!(count, 2);
    }
}
