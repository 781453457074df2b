//! Player input events and per-tick outputs.
//!
//! Input arrives as a tick-stamped [`GameEvent`] list. The list is checked
//! structurally when it is submitted ([`validate_batch`]); whether an event
//! can actually take effect (an offer is open, an ultimate is ready) is
//! decided when its tick comes up, and refusals are reported in
//! [`TickEvents::rejected_events`].

use serde::{Deserialize, Serialize};

use crate::checkpoint::Checkpoint;
use crate::components::{EntityId, HeroCommand};
use crate::damage::HeroHitOutcome;
use crate::error::{Result, SimError};
use crate::state::EndReason;

/// What a player event does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Take one relic from the open offer.
    ChooseRelic {
        /// Index into the offer.
        option_index: u8,
    },
    /// Replace the open offer with a fresh roll.
    RerollRelics,
    /// Cast a hero's ultimate.
    ActivateUltimate {
        /// Formation slot of the hero.
        hero_slot: u8,
    },
    /// Give a hero an order.
    HeroCommand {
        /// Formation slot of the hero.
        hero_slot: u8,
        /// The order.
        command: HeroCommand,
    },
    /// Give up the run.
    Forfeit,
}

impl EventKind {
    /// Hero slot the event addresses, if any.
    #[must_use]
    pub const fn hero_slot(&self) -> Option<u8> {
        match self {
            Self::ActivateUltimate { hero_slot } | Self::HeroCommand { hero_slot, .. } => {
                Some(*hero_slot)
            }
            Self::ChooseRelic { .. } | Self::RerollRelics | Self::Forfeit => None,
        }
    }
}

/// A player event scheduled for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick on which the event is applied, before any system runs.
    pub tick: u64,
    /// The event.
    pub kind: EventKind,
}

impl GameEvent {
    /// Create an event.
    #[must_use]
    pub const fn new(tick: u64, kind: EventKind) -> Self {
        Self { tick, kind }
    }
}

/// Check a batch before it is queued: sorted by tick, nothing behind
/// `current_tick`, hero slots within the loadout.
///
/// # Errors
///
/// Returns the first problem found as [`SimError::EventOutOfOrder`],
/// [`SimError::PastEvent`] or [`SimError::InvalidEvent`].
pub fn validate_batch(events: &[GameEvent], current_tick: u64, hero_count: usize) -> Result<()> {
    let mut previous = None;
    for (index, event) in events.iter().enumerate() {
        if event.tick < current_tick {
            return Err(SimError::PastEvent {
                index,
                tick: event.tick,
                current: current_tick,
            });
        }
        if let Some(previous) = previous {
            if event.tick < previous {
                return Err(SimError::EventOutOfOrder {
                    index,
                    tick: event.tick,
                    previous,
                });
            }
        }
        if let Some(slot) = event.kind.hero_slot() {
            if usize::from(slot) >= hero_count {
                return Err(SimError::InvalidEvent {
                    index,
                    reason: format!("hero slot {slot} out of range 0..{hero_count}"),
                });
            }
        }
        previous = Some(event.tick);
    }
    Ok(())
}

/// Why an event was skipped at application time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// No relic offer is open.
    NoRelicOffer,
    /// Option index past the end of the offer.
    OptionOutOfRange,
    /// Reroll budget spent.
    NoRerollsLeft,
    /// Hero in that slot has fallen.
    HeroFallen,
    /// Hero has no ultimate.
    NoUltimate,
    /// Ultimate still cooling down.
    UltimateOnCooldown {
        /// Ticks left.
        remaining: u32,
    },
    /// Focus target does not exist.
    UnknownEnemy,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRelicOffer => f.write_str("no relic offer is open"),
            Self::OptionOutOfRange => f.write_str("offer option out of range"),
            Self::NoRerollsLeft => f.write_str("no rerolls left"),
            Self::HeroFallen => f.write_str("hero has fallen"),
            Self::NoUltimate => f.write_str("hero has no ultimate"),
            Self::UltimateOnCooldown { remaining } => {
                write!(f, "ultimate on cooldown for {remaining} more ticks")
            }
            Self::UnknownEnemy => f.write_str("focus target does not exist"),
        }
    }
}

/// An event that reached its tick but could not take effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedEvent {
    /// The event.
    pub event: GameEvent,
    /// Why it was skipped.
    pub reason: RejectReason,
}

/// A hero taking a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroHit {
    /// Hero slot.
    pub hero_slot: u8,
    /// Attacking enemy.
    pub enemy_id: EntityId,
    /// What the damage layers did with the hit.
    pub outcome: HeroHitOutcome,
}

/// A skill cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCast {
    /// Hero slot.
    pub hero_slot: u8,
    /// Skill id.
    pub skill_id: String,
    /// Projectiles launched by the cast.
    pub projectiles: u32,
}

/// Everything observable that happened during one tick.
///
/// These events can be used by the outer layer to drive effects and UI.
/// They are outputs only; nothing in the simulation reads them back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Tick these events belong to.
    pub tick: u64,
    /// Wave that started this tick.
    pub wave_started: Option<u32>,
    /// Wave cleared this tick.
    pub wave_cleared: Option<u32>,
    /// Enemies spawned.
    pub spawned: Vec<EntityId>,
    /// Enemies killed.
    pub killed: Vec<EntityId>,
    /// Enemies that reached the fortress.
    pub leaked: Vec<EntityId>,
    /// Damage taken by the fortress.
    pub fortress_damage: u32,
    /// Hits on heroes.
    pub hero_hits: Vec<HeroHit>,
    /// Heroes that fell.
    pub heroes_fallen: Vec<u8>,
    /// Turrets destroyed.
    pub turrets_destroyed: Vec<EntityId>,
    /// Skills cast.
    pub skills_cast: Vec<SkillCast>,
    /// Projectiles that hit their target.
    pub projectile_hits: u32,
    /// Relic offer opened this tick.
    pub relic_offered: Option<Vec<String>>,
    /// Relic collected this tick.
    pub relic_chosen: Option<String>,
    /// Events skipped at application time.
    pub rejected_events: Vec<RejectedEvent>,
    /// Events found behind the tick cursor.
    pub protocol_errors: Vec<GameEvent>,
    /// Checkpoint appended at the end of this tick.
    pub checkpoint: Option<Checkpoint>,
    /// Set on the tick the run ended.
    pub ended: Option<EndReason>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_batch() {
        let events = [
            GameEvent::new(5, EventKind::RerollRelics),
            GameEvent::new(5, EventKind::ActivateUltimate { hero_slot: 1 }),
            GameEvent::new(9, EventKind::Forfeit),
        ];
        validate_batch(&events, 5, 2).unwrap();
    }

    #[test]
    fn test_out_of_order() {
        let events = [
            GameEvent::new(9, EventKind::Forfeit),
            GameEvent::new(5, EventKind::RerollRelics),
        ];
        assert!(matches!(
            validate_batch(&events, 0, 1),
            Err(SimError::EventOutOfOrder { index: 1, .. })
        ));
    }

    #[test]
    fn test_past_event() {
        let events = [GameEvent::new(3, EventKind::Forfeit)];
        assert!(matches!(
            validate_batch(&events, 4, 1),
            Err(SimError::PastEvent { index: 0, .. })
        ));
    }

    #[test]
    fn test_hero_slot_range() {
        let events = [GameEvent::new(
            0,
            EventKind::HeroCommand {
                hero_slot: 3,
                command: HeroCommand::Return,
            },
        )];
        assert!(matches!(
            validate_batch(&events, 0, 3),
            Err(SimError::InvalidEvent { index: 0, .. })
        ));
    }
}
