//! The simulation's single mutable root.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::components::{ActiveHero, ActiveProjectile, ActiveTurret, Enemy, EntityId};
use crate::config::SimConfig;
use crate::data::{self, DefinitionKind, RelicDefinition, RelicStat};
use crate::error::{Result, SimError};
use crate::math::{fixed_serde, fp, Fixed};
use crate::physics::ms_to_ticks;
use crate::rng::Xorshift32;
use crate::targeting::{formation_home, pillar_position};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// Fortress destroyed.
    Defeat,
    /// Cleared the target wave.
    Victory,
    /// Player forfeited.
    Forfeited,
    /// Hit the configured tick limit.
    TimeLimit,
}

/// Wave director phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// Waiting for the next wave to start.
    Intermission,
    /// Spawning and fighting the current wave.
    Active,
}

impl WavePhase {
    /// Stable code for hashing.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Intermission => 0,
            Self::Active => 1,
        }
    }
}

/// Wave director bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveState {
    /// Current phase.
    pub phase: WavePhase,
    /// In `Intermission`, the tick the next wave starts; in `Active`, the
    /// tick of the next spawn.
    pub timer_tick: u64,
    /// Enemies this wave will spawn in total.
    pub enemies_total: u32,
    /// Enemies spawned so far this wave.
    pub enemies_spawned: u32,
}

impl WaveState {
    /// All of this wave's enemies have been spawned.
    #[must_use]
    pub const fn fully_spawned(&self) -> bool {
        self.enemies_spawned >= self.enemies_total
    }
}

/// Aggregated additive bonuses from collected relics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelicModifiers {
    /// Hero damage bonus.
    #[serde(with = "fixed_serde")]
    pub damage: Fixed,
    /// Hero attack speed bonus.
    #[serde(with = "fixed_serde")]
    pub attack_speed: Fixed,
    /// Crit chance bonus.
    #[serde(with = "fixed_serde")]
    pub crit_chance: Fixed,
    /// Crit multiplier bonus.
    #[serde(with = "fixed_serde")]
    pub crit_multiplier: Fixed,
    /// Hero max HP bonus.
    #[serde(with = "fixed_serde")]
    pub hero_max_hp: Fixed,
    /// Fortress max HP bonus.
    #[serde(with = "fixed_serde")]
    pub fortress_max_hp: Fixed,
    /// Turret damage bonus.
    #[serde(with = "fixed_serde")]
    pub turret_damage: Fixed,
}

impl RelicModifiers {
    /// Add every modifier of `relic`.
    pub fn add(&mut self, relic: &RelicDefinition) {
        for modifier in relic.modifiers {
            let slot = match modifier.stat {
                RelicStat::Damage => &mut self.damage,
                RelicStat::AttackSpeed => &mut self.attack_speed,
                RelicStat::CritChance => &mut self.crit_chance,
                RelicStat::CritMultiplier => &mut self.crit_multiplier,
                RelicStat::HeroMaxHp => &mut self.hero_max_hp,
                RelicStat::FortressMaxHp => &mut self.fortress_max_hp,
                RelicStat::TurretDamage => &mut self.turret_damage,
            };
            *slot = slot.saturating_add(modifier.amount);
        }
    }

    /// `1 + bonus`, floored at zero.
    #[must_use]
    pub fn multiplier(bonus: Fixed) -> Fixed {
        (Fixed::ONE + bonus).max(Fixed::ZERO)
    }
}

/// Relic choices waiting for the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelicOffer {
    /// Wave whose clear produced this offer.
    pub wave: u32,
    /// Relic ids on offer.
    pub options: Vec<String>,
}

/// Complete simulation state. Everything a tick reads or writes lives here,
/// so a serialized `GameState` plus the remaining events fully determines
/// the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Ticks completed so far.
    pub tick: u64,
    /// Seed the run started from.
    pub seed: u64,
    /// Ticks per simulated second.
    pub tick_hz: u32,
    /// Whether the run is over.
    pub ended: bool,
    /// Why the run ended.
    pub end_reason: Option<EndReason>,
    /// Wave the run started on.
    pub starting_wave: u32,
    /// Wave being fought, or next to start during intermission.
    pub current_wave: u32,
    /// Wave director state.
    pub wave: WaveState,
    /// Fortress HP.
    pub fortress_hp: u32,
    /// Fortress max HP after relic modifiers.
    pub fortress_max_hp: u32,
    /// Fortress max HP before relic modifiers.
    pub fortress_base_max_hp: u32,
    /// Heroes in slot order. Fallen heroes are removed.
    pub heroes: Vec<ActiveHero>,
    /// Turrets in placement order. Destroyed turrets are removed.
    pub turrets: Vec<ActiveTurret>,
    /// Enemies in spawn order.
    pub enemies: Vec<Enemy>,
    /// Projectiles in launch order.
    pub projectiles: Vec<ActiveProjectile>,
    /// Next projectile id.
    pub next_projectile_id: EntityId,
    /// Next enemy id.
    pub next_enemy_id: EntityId,
    /// The run's only randomness source.
    pub rng: Xorshift32,
    /// Collected relic ids in pick order.
    pub relics: Vec<String>,
    /// Aggregated relic bonuses.
    pub relic_modifiers: RelicModifiers,
    /// Open relic offer.
    pub relic_offer: Option<RelicOffer>,
    /// Rerolls left this run.
    pub relic_rerolls_remaining: u32,
    /// Enemies killed.
    pub kills: u32,
    /// Chain hash of the latest checkpoint, 0 before the first. Carried in
    /// snapshots so a restored run continues the same chain.
    pub checkpoint_chain: u32,
}

impl GameState {
    /// Build the opening state for a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownDefinition`] if a loadout names an id
    /// missing from the static tables.
    pub fn new(seed: u64, config: &SimConfig) -> Result<Self> {
        let total = config.heroes.len();
        let mut heroes = Vec::with_capacity(total);
        for (index, loadout) in config.heroes.iter().enumerate() {
            let def = data::hero(&loadout.definition_id).ok_or_else(|| {
                SimError::UnknownDefinition {
                    kind: DefinitionKind::Hero,
                    id: loadout.definition_id.clone(),
                }
            })?;
            let home = formation_home(index, total);
            let max_hp = def.max_hp_at(loadout.level);
            heroes.push(ActiveHero {
                slot: u8::try_from(index)
                    .map_err(|_| SimError::InvalidConfig("too many heroes".into()))?,
                definition_id: loadout.definition_id.clone(),
                level: loadout.level,
                current_hp: max_hp,
                max_hp,
                base_max_hp: max_hp,
                position: home,
                home,
                buffs: Vec::new(),
                equipped_artifact: loadout.artifact.clone(),
                shield_amount: 0,
                shield_expires_tick: 0,
                attack_cooldown: 0,
                skill_cooldowns: vec![0; def.skills.len()],
                consumed_passives: BTreeSet::new(),
                command: None,
            });
        }

        let mut turrets = Vec::with_capacity(config.turrets.len());
        for (index, loadout) in config.turrets.iter().enumerate() {
            let def = data::turret(&loadout.definition_id).ok_or_else(|| {
                SimError::UnknownDefinition {
                    kind: DefinitionKind::Turret,
                    id: loadout.definition_id.clone(),
                }
            })?;
            turrets.push(ActiveTurret {
                id: EntityId::try_from(index + 1)
                    .map_err(|_| SimError::InvalidConfig("too many turrets".into()))?,
                definition_id: loadout.definition_id.clone(),
                slot: loadout.slot,
                position: pillar_position(loadout.slot),
                current_hp: def.max_hp,
                max_hp: def.max_hp,
                attack_cooldown: 0,
            });
        }

        Ok(Self {
            tick: 0,
            seed,
            tick_hz: config.tick_hz,
            ended: false,
            end_reason: None,
            starting_wave: config.starting_wave,
            current_wave: config.starting_wave,
            wave: WaveState {
                phase: WavePhase::Intermission,
                timer_tick: u64::from(ms_to_ticks(config.first_wave_delay_ms, config.tick_hz)),
                enemies_total: 0,
                enemies_spawned: 0,
            },
            fortress_hp: config.fortress_max_hp,
            fortress_max_hp: config.fortress_max_hp,
            fortress_base_max_hp: config.fortress_max_hp,
            heroes,
            turrets,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            next_projectile_id: 1,
            next_enemy_id: 1,
            rng: Xorshift32::new(seed),
            relics: Vec::new(),
            relic_modifiers: RelicModifiers::default(),
            relic_offer: None,
            relic_rerolls_remaining: config.relic_reroll_limit,
            kills: 0,
            checkpoint_chain: 0,
        })
    }

    /// Hero by formation slot.
    #[must_use]
    pub fn hero_by_slot(&self, slot: u8) -> Option<&ActiveHero> {
        self.heroes.iter().find(|h| h.slot == slot)
    }

    /// Position of a hero in `heroes` by formation slot.
    #[must_use]
    pub fn hero_index(&self, slot: u8) -> Option<usize> {
        self.heroes.iter().position(|h| h.slot == slot)
    }

    /// Enemy by id.
    #[must_use]
    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    /// Take the next projectile id.
    pub fn allocate_projectile_id(&mut self) -> EntityId {
        let id = self.next_projectile_id;
        self.next_projectile_id = self.next_projectile_id.wrapping_add(1);
        id
    }

    /// Take the next enemy id.
    pub fn allocate_enemy_id(&mut self) -> EntityId {
        let id = self.next_enemy_id;
        self.next_enemy_id = self.next_enemy_id.wrapping_add(1);
        id
    }

    /// Collect a relic: record it, add its modifiers and resize max HP
    /// pools. Max HP increases raise current HP by the same amount; decreases
    /// only clamp current HP.
    pub fn collect_relic(&mut self, relic: &'static RelicDefinition) {
        self.relics.push(relic.id.to_string());
        self.relic_modifiers.add(relic);

        let hero_mult = RelicModifiers::multiplier(self.relic_modifiers.hero_max_hp);
        for hero in &mut self.heroes {
            let new_max = fp::mul_int(hero.base_max_hp, hero_mult).max(1);
            resize_pool(&mut hero.current_hp, &mut hero.max_hp, new_max);
        }

        let fortress_mult = RelicModifiers::multiplier(self.relic_modifiers.fortress_max_hp);
        let new_max = fp::mul_int(self.fortress_base_max_hp, fortress_mult).max(1);
        resize_pool(&mut self.fortress_hp, &mut self.fortress_max_hp, new_max);
    }
}

fn resize_pool(current: &mut u32, max: &mut u32, new_max: u32) {
    if new_max > *max {
        *current = current.saturating_add(new_max - *max);
    }
    *max = new_max;
    *current = (*current).min(new_max);
}
