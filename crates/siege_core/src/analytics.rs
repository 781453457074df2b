//! Damage attribution.
//!
//! The simulation reports every point of damage to an injected
//! [`DamageRecorder`]. Recorders observe; they never feed back into the
//! tick, so swapping one for another cannot change a run's outcome.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::components::{DamageSource, EntityId};
use crate::data::DamageClass;

/// What kind of damage instance this was, for attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribution<'a> {
    /// Hero basic attack.
    BasicAttack,
    /// Hero skill, by id.
    Skill(&'a str),
    /// Turret shot.
    TurretShot,
    /// Burn pulse.
    Burn,
    /// Poison pulse.
    Poison,
    /// Thorns reflection.
    Thorns,
}

impl fmt::Display for Attribution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BasicAttack => f.write_str("basic_attack"),
            Self::Skill(id) => write!(f, "skill:{id}"),
            Self::TurretShot => f.write_str("turret_shot"),
            Self::Burn => f.write_str("burn"),
            Self::Poison => f.write_str("poison"),
            Self::Thorns => f.write_str("thorns"),
        }
    }
}

/// Damage dealt to an enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageDealt<'a> {
    /// Tick of the hit.
    pub tick: u64,
    /// Who dealt it.
    pub source: DamageSource,
    /// How it was dealt.
    pub attribution: Attribution<'a>,
    /// Enemy hit.
    pub target: EntityId,
    /// HP actually removed.
    pub amount: u32,
    /// Whether the hit was a critical.
    pub crit: bool,
}

/// Damage taken by a hero, after every defensive layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageTaken {
    /// Tick of the hit.
    pub tick: u64,
    /// Hero slot.
    pub hero_slot: u8,
    /// Attacking enemy.
    pub attacker: EntityId,
    /// Class of the attack.
    pub class: DamageClass,
    /// HP actually removed.
    pub amount: u32,
}

/// Sink for damage attribution.
pub trait DamageRecorder {
    /// Called for every damage instance on an enemy.
    fn record_dealt(&mut self, event: &DamageDealt<'_>);

    /// Called for every hit that reaches a hero's HP step.
    fn record_taken(&mut self, event: &DamageTaken);
}

/// Recorder that drops everything. Used for verification runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecorder;

impl DamageRecorder for NullRecorder {
    fn record_dealt(&mut self, _event: &DamageDealt<'_>) {}

    fn record_taken(&mut self, _event: &DamageTaken) {}
}

/// Default recorder: running totals keyed by hero slot and attribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageAnalytics {
    /// Damage dealt per hero slot.
    pub damage_by_hero: BTreeMap<u8, u64>,
    /// Damage dealt per turret id.
    pub damage_by_turret: BTreeMap<EntityId, u64>,
    /// Damage dealt per attribution key (`basic_attack`, `skill:<id>`, ...).
    pub damage_by_attribution: BTreeMap<String, u64>,
    /// Damage taken per hero slot.
    pub damage_taken_by_hero: BTreeMap<u8, u64>,
    /// Critical hits landed.
    pub crits: u64,
}

impl DamageAnalytics {
    /// Total damage dealt to enemies.
    #[must_use]
    pub fn total_dealt(&self) -> u64 {
        self.damage_by_attribution.values().sum()
    }
}

impl DamageRecorder for DamageAnalytics {
    fn record_dealt(&mut self, event: &DamageDealt<'_>) {
        let amount = u64::from(event.amount);
        match event.source {
            DamageSource::Hero { slot } => {
                *self.damage_by_hero.entry(slot).or_default() += amount;
            }
            DamageSource::Turret { id } => {
                *self.damage_by_turret.entry(id).or_default() += amount;
            }
            DamageSource::Enemy { .. } => {}
        }
        *self
            .damage_by_attribution
            .entry(event.attribution.to_string())
            .or_default() += amount;
        if event.crit {
            self.crits += 1;
        }
    }

    fn record_taken(&mut self, event: &DamageTaken) {
        *self.damage_taken_by_hero.entry(event.hero_slot).or_default() += u64::from(event.amount);
    }
}
