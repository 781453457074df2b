//! Run configuration.
//!
//! A [`SimConfig`] plus a seed and an event list is everything needed to
//! reproduce a run. Configs are plain serde data so the same structure can
//! be embedded in replays and written by hand as RON.
//!
//! # Example RON
//!
//! ```ron
//! SimConfig(
//!     tick_hz: 30,
//!     target_wave: Some(10),
//!     heroes: [
//!         HeroLoadout(definition_id: "vanguard", level: 3, artifact: Some("aegis_buckler")),
//!     ],
//!     turrets: [TurretLoadout(definition_id: "cannon", slot: 0)],
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::data::{self, DefinitionKind};
use crate::error::{Result, SimError};
use crate::targeting::{PILLAR_COUNT, PILLAR_SLOTS};

/// Default ticks per simulated second.
pub const DEFAULT_TICK_HZ: u32 = 30;

/// Default ticks between checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = 300;

/// Default relic rerolls per run.
pub const DEFAULT_RELIC_REROLLS: u32 = 2;

/// Default fortress HP.
pub const DEFAULT_FORTRESS_HP: u32 = 2000;

/// Highest accepted tick rate.
pub const MAX_TICK_HZ: u32 = 240;

/// Most heroes a loadout may field.
pub const MAX_HEROES: usize = 10;

/// Highest hero level.
pub const MAX_HERO_LEVEL: u32 = 100;

/// One hero in the loadout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroLoadout {
    /// Hero definition id.
    pub definition_id: String,
    /// Level, 1-based.
    pub level: u32,
    /// Equipped artifact id.
    #[serde(default)]
    pub artifact: Option<String>,
}

impl HeroLoadout {
    /// Hero with no artifact.
    #[must_use]
    pub fn new(definition_id: impl Into<String>, level: u32) -> Self {
        Self {
            definition_id: definition_id.into(),
            level,
            artifact: None,
        }
    }

    /// Equip an artifact.
    #[must_use]
    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }
}

/// One turret in the loadout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurretLoadout {
    /// Turret definition id.
    pub definition_id: String,
    /// Pillar slot, `0..PILLAR_SLOTS`. Even slots are the top of a pillar.
    pub slot: u8,
}

impl TurretLoadout {
    /// Turret on `slot`.
    #[must_use]
    pub fn new(definition_id: impl Into<String>, slot: u8) -> Self {
        Self {
            definition_id: definition_id.into(),
            slot,
        }
    }
}

/// Complete run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Ticks per simulated second.
    pub tick_hz: u32,
    /// Ticks between checkpoints.
    pub checkpoint_interval: u64,
    /// First wave number.
    pub starting_wave: u32,
    /// Run is won once this wave is cleared. `None` runs until defeat.
    pub target_wave: Option<u32>,
    /// Run ends with [`crate::state::EndReason::TimeLimit`] at this tick.
    pub max_ticks: Option<u64>,
    /// Fortress HP before relics.
    pub fortress_max_hp: u32,
    /// Relic rerolls available for the whole run.
    pub relic_reroll_limit: u32,
    /// Delay before the first wave starts.
    pub first_wave_delay_ms: u32,
    /// Delay between a wave starting and its first spawn.
    pub first_spawn_delay_ms: u32,
    /// Delay between consecutive spawns.
    pub spawn_interval_ms: u32,
    /// Pause between a wave clear and the next wave.
    pub intermission_ms: u32,
    /// Pillars open for turrets, counted from the fortress outward.
    pub unlocked_pillars: u8,
    /// Heroes in formation order.
    pub heroes: Vec<HeroLoadout>,
    /// Turrets.
    pub turrets: Vec<TurretLoadout>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_hz: DEFAULT_TICK_HZ,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            starting_wave: 1,
            target_wave: None,
            max_ticks: None,
            fortress_max_hp: DEFAULT_FORTRESS_HP,
            relic_reroll_limit: DEFAULT_RELIC_REROLLS,
            first_wave_delay_ms: 0,
            first_spawn_delay_ms: 1500,
            spawn_interval_ms: 800,
            intermission_ms: 3000,
            unlocked_pillars: PILLAR_COUNT,
            heroes: vec![
                HeroLoadout::new("vanguard", 1),
                HeroLoadout::new("pyromancer", 1),
                HeroLoadout::new("frostwarden", 1),
            ],
            turrets: vec![
                TurretLoadout::new("arrow_tower", 0),
                TurretLoadout::new("cannon", 3),
            ],
        }
    }
}

impl SimConfig {
    /// Parse a config from RON and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Serialization`] for malformed RON and any
    /// error from [`validate`](Self::validate).
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and resolve every id against the static tables.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] for out-of-range values and
    /// [`SimError::UnknownDefinition`] for unknown ids.
    pub fn validate(&self) -> Result<()> {
        if self.tick_hz == 0 || self.tick_hz > MAX_TICK_HZ {
            return Err(SimError::InvalidConfig(format!(
                "tick_hz must be in 1..={MAX_TICK_HZ}, got {}",
                self.tick_hz
            )));
        }
        if self.checkpoint_interval == 0 {
            return Err(SimError::InvalidConfig(
                "checkpoint_interval must be positive".into(),
            ));
        }
        if self.starting_wave == 0 {
            return Err(SimError::InvalidConfig("starting_wave is 1-based".into()));
        }
        if let Some(target) = self.target_wave {
            if target < self.starting_wave {
                return Err(SimError::InvalidConfig(format!(
                    "target_wave {target} precedes starting_wave {}",
                    self.starting_wave
                )));
            }
        }
        if self.max_ticks == Some(0) {
            return Err(SimError::InvalidConfig("max_ticks must be positive".into()));
        }
        if self.fortress_max_hp == 0 {
            return Err(SimError::InvalidConfig(
                "fortress_max_hp must be positive".into(),
            ));
        }
        if self.spawn_interval_ms == 0 {
            return Err(SimError::InvalidConfig(
                "spawn_interval_ms must be positive".into(),
            ));
        }
        if self.heroes.is_empty() || self.heroes.len() > MAX_HEROES {
            return Err(SimError::InvalidConfig(format!(
                "loadout must field 1..={MAX_HEROES} heroes, got {}",
                self.heroes.len()
            )));
        }

        for loadout in &self.heroes {
            if data::hero(&loadout.definition_id).is_none() {
                return Err(SimError::UnknownDefinition {
                    kind: DefinitionKind::Hero,
                    id: loadout.definition_id.clone(),
                });
            }
            if loadout.level == 0 || loadout.level > MAX_HERO_LEVEL {
                return Err(SimError::InvalidConfig(format!(
                    "hero '{}' level must be in 1..={MAX_HERO_LEVEL}",
                    loadout.definition_id
                )));
            }
            if let Some(artifact) = &loadout.artifact {
                if data::artifact(artifact).is_none() {
                    return Err(SimError::UnknownDefinition {
                        kind: DefinitionKind::Artifact,
                        id: artifact.clone(),
                    });
                }
            }
        }

        if self.unlocked_pillars > PILLAR_COUNT {
            return Err(SimError::InvalidConfig(format!(
                "unlocked_pillars must be in 0..={PILLAR_COUNT}, got {}",
                self.unlocked_pillars
            )));
        }
        let open_slots = usize::from(self.unlocked_pillars) * 2;

        let mut used_slots = [false; PILLAR_SLOTS];
        for loadout in &self.turrets {
            if data::turret(&loadout.definition_id).is_none() {
                return Err(SimError::UnknownDefinition {
                    kind: DefinitionKind::Turret,
                    id: loadout.definition_id.clone(),
                });
            }
            let slot = usize::from(loadout.slot);
            if slot >= PILLAR_SLOTS {
                return Err(SimError::InvalidConfig(format!(
                    "turret slot {slot} out of range 0..{PILLAR_SLOTS}"
                )));
            }
            if slot >= open_slots {
                return Err(SimError::InvalidConfig(format!(
                    "turret slot {slot} is on a locked pillar ({} unlocked)",
                    self.unlocked_pillars
                )));
            }
            if used_slots[slot] {
                return Err(SimError::InvalidConfig(format!(
                    "turret slot {slot} used twice"
                )));
            }
            used_slots[slot] = true;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn test_from_ron_fills_defaults() {
        let config = SimConfig::from_ron_str(
            r#"(
                target_wave: Some(5),
                heroes: [(definition_id: "reaper", level: 4, artifact: Some("warbrand"))],
                turrets: [],
            )"#,
        )
        .unwrap();
        assert_eq!(config.tick_hz, DEFAULT_TICK_HZ);
        assert_eq!(config.target_wave, Some(5));
        assert_eq!(config.heroes[0].artifact.as_deref(), Some("warbrand"));
    }

    #[test]
    fn test_malformed_ron() {
        let err = SimConfig::from_ron_str("(tick_hz: \"fast\")").unwrap_err();
        assert!(matches!(err, SimError::Serialization(_)));
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases: Vec<Box<dyn Fn(&mut SimConfig)>> = vec![
            Box::new(|c| c.tick_hz = 0),
            Box::new(|c| c.checkpoint_interval = 0),
            Box::new(|c| c.starting_wave = 0),
            Box::new(|c| c.target_wave = Some(0)),
            Box::new(|c| c.max_ticks = Some(0)),
            Box::new(|c| c.heroes.clear()),
            Box::new(|c| c.heroes[0].level = 0),
            Box::new(|c| c.turrets.push(TurretLoadout::new("cannon", 0))),
            Box::new(|c| c.turrets.push(TurretLoadout::new("cannon", 9))),
            Box::new(|c| c.unlocked_pillars = 4),
            Box::new(|c| c.unlocked_pillars = 1),
        ];
        for mutate in cases {
            let mut config = SimConfig::default();
            mutate(&mut config);
            assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_rejects_unknown_ids() {
        let mut config = SimConfig::default();
        config.heroes[0] = HeroLoadout::new("vanguard", 1).with_artifact("cursed_ring");
        assert!(matches!(
            config.validate(),
            Err(SimError::UnknownDefinition {
                kind: DefinitionKind::Artifact,
                ..
            })
        ));

        let mut config = SimConfig::default();
        config.turrets[0].definition_id = "ballista".into();
        assert!(matches!(
            config.validate(),
            Err(SimError::UnknownDefinition {
                kind: DefinitionKind::Turret,
                ..
            })
        ));
    }
}
