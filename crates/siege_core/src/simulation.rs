//! Core simulation loop.
//!
//! A [`Simulation`] owns one [`GameState`] and advances it one fixed tick at
//! a time. Player input is supplied up front as a tick-stamped event list;
//! each tick applies the events due on it and then runs the systems in a
//! fixed order.
//!
//! # Determinism
//!
//! Identical `(seed, config, events)` produce an identical state at every
//! tick:
//! - No floating point (fixed-point via [`crate::math::Fixed`])
//! - One seeded RNG stream, drawn in a fixed order
//! - Entities visited in storage order, which is spawn order
//!
//! # Example
//!
//! ```
//! use siege_core::config::SimConfig;
//! use siege_core::events::{EventKind, GameEvent};
//! use siege_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(12345, SimConfig::default()).unwrap();
//! sim.set_events(vec![GameEvent::new(10, EventKind::ActivateUltimate { hero_slot: 0 })])
//!     .unwrap();
//! for _ in 0..60 {
//!     sim.step();
//! }
//! assert_eq!(sim.state().tick, 60);
//! ```

use tracing::{error, info, warn};

use crate::analytics::{DamageAnalytics, DamageRecorder};
use crate::checkpoint::{state_hash, Checkpoint};
use crate::components::{EntityId, HeroCommand};
use crate::config::SimConfig;
use crate::damage::hero_damage_multiplier;
use crate::data::{self, DefinitionKind};
use crate::error::{Result, SimError};
use crate::events::{validate_batch, EventKind, GameEvent, RejectReason, RejectedEvent, TickEvents};
use crate::math::Vec2Fixed;
use crate::projectiles::projectile_system;
use crate::relics::{choose_relic, reroll_relics};
use crate::skills::execute_cast;
use crate::state::{EndReason, GameState};
use crate::systems::{cleanup_system, hero_system, turret_system};
use crate::waves::{enemy_system, spawn_enemy, status_system, wave_director};

/// The deterministic simulation driver.
///
/// # System Execution Order
///
/// Each tick:
/// 1. **Events** - apply every queued event stamped with this tick
/// 2. **Wave director** - start waves, spawn due enemies
/// 3. **Status** - burn and poison pulses, effect expiry
/// 4. **Heroes** - upkeep, movement, auto skills, basic attacks
/// 5. **Turrets** - targeting and shots
/// 6. **Projectiles** - travel and impact
/// 7. **Enemies** - movement and attacks
/// 8. **Cleanup** - remove the dead, wave clear, relic offer
/// 9. **End check**
///
/// Then the tick counter advances and, on checkpoint ticks, a
/// [`Checkpoint`] is appended.
#[derive(Debug)]
pub struct Simulation<R: DamageRecorder = DamageAnalytics> {
    config: SimConfig,
    state: GameState,
    events: Vec<GameEvent>,
    cursor: usize,
    checkpoints: Vec<Checkpoint>,
    recorder: R,
}

impl Simulation {
    /// Create a simulation recording into a fresh [`DamageAnalytics`].
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] or
    /// [`SimError::UnknownDefinition`] for a bad configuration.
    pub fn new(seed: u64, config: SimConfig) -> Result<Self> {
        Self::with_recorder(seed, config, DamageAnalytics::default())
    }
}

impl<R: DamageRecorder> Simulation<R> {
    /// Create a simulation that reports damage to `recorder`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] or
    /// [`SimError::UnknownDefinition`] for a bad configuration.
    pub fn with_recorder(seed: u64, config: SimConfig, recorder: R) -> Result<Self> {
        config.validate()?;
        let state = GameState::new(seed, &config)?;
        info!(
            seed,
            heroes = state.heroes.len(),
            turrets = state.turrets.len(),
            starting_wave = state.starting_wave,
            "Simulation created"
        );
        Ok(Self {
            config,
            state,
            events: Vec::new(),
            cursor: 0,
            checkpoints: Vec::new(),
            recorder,
        })
    }

    /// Resume from a [`Self::snapshot`] taken under the same `config`.
    /// The event queue and checkpoint history start empty; new checkpoints
    /// continue the snapshot's chain.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Serialization`] if the snapshot does not decode,
    /// [`SimError::InvalidConfig`] if it was taken at another tick rate, or
    /// a config error.
    pub fn restore(config: SimConfig, snapshot: &[u8], recorder: R) -> Result<Self> {
        config.validate()?;
        let state: GameState = bincode::deserialize(snapshot)?;
        if state.tick_hz != config.tick_hz {
            return Err(SimError::InvalidConfig(format!(
                "snapshot runs at {} Hz, config at {} Hz",
                state.tick_hz, config.tick_hz
            )));
        }
        Ok(Self {
            config,
            state,
            events: Vec::new(),
            cursor: 0,
            checkpoints: Vec::new(),
            recorder,
        })
    }

    /// Replace the event queue.
    ///
    /// # Errors
    ///
    /// Rejects the whole batch, leaving the old queue in place, if it is
    /// not sorted by tick, holds an event behind the current tick, or names
    /// a hero slot outside the loadout.
    pub fn set_events(&mut self, events: Vec<GameEvent>) -> Result<()> {
        validate_batch(&events, self.state.tick, self.config.heroes.len())?;
        self.events = events;
        self.cursor = 0;
        Ok(())
    }

    /// Events not yet applied.
    #[must_use]
    pub fn pending_events(&self) -> &[GameEvent] {
        &self.events[self.cursor..]
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Configuration the run was built from.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Checkpoints taken so far, oldest first.
    #[must_use]
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// The damage recorder.
    #[must_use]
    pub const fn recorder(&self) -> &R {
        &self.recorder
    }

    /// Give up the simulation and keep the recorder.
    #[must_use]
    pub fn into_recorder(self) -> R {
        self.recorder
    }

    /// FNV-1a hash of the current state.
    #[must_use]
    pub fn state_hash(&self) -> u32 {
        state_hash(&self.state)
    }

    /// Whether the run has ended.
    #[must_use]
    pub const fn is_ended(&self) -> bool {
        self.state.ended
    }

    /// Serialize the current state with bincode.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Serialization`] if encoding fails.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&self.state)?)
    }

    /// Place an enemy of type `definition_id` at `position`, scaled for the
    /// current wave. For scenario setup and tests; regular spawns come from
    /// the wave director.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownDefinition`] for an unknown enemy id.
    pub fn spawn_enemy_at(&mut self, definition_id: &str, position: Vec2Fixed) -> Result<EntityId> {
        let def = data::enemy(definition_id).ok_or_else(|| SimError::UnknownDefinition {
            kind: DefinitionKind::Enemy,
            id: definition_id.to_string(),
        })?;
        Ok(spawn_enemy(&mut self.state, def, position))
    }

    /// Advance exactly one tick.
    ///
    /// Once the run has ended this is a no-op returning empty events.
    pub fn step(&mut self) -> TickEvents {
        let mut events = TickEvents {
            tick: self.state.tick,
            ..TickEvents::default()
        };
        if self.state.ended {
            return events;
        }

        self.apply_due_events(&mut events);

        if !self.state.ended {
            let state = &mut self.state;
            wave_director(state, &self.config, &mut events);
            status_system(state, &mut self.recorder);
            hero_system(state, &mut events);
            turret_system(state);
            projectile_system(state, &mut self.recorder, &mut events);
            enemy_system(state, &mut self.recorder, &mut events);
            cleanup_system(state, &self.config, &mut events);
            self.check_end(&mut events);
        }

        self.state.tick += 1;

        let interval = self.config.checkpoint_interval;
        if interval > 0 && self.state.tick % interval == 0 {
            let checkpoint = Checkpoint::capture(&self.state, self.state.checkpoint_chain);
            self.state.checkpoint_chain = checkpoint.chain_hash32;
            self.checkpoints.push(checkpoint);
            events.checkpoint = Some(checkpoint);
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.state.tick, state_hash = hash, "Simulation state hash");
        }

        #[cfg(feature = "debug-validation")]
        self.validate_invariants();

        events
    }

    /// Step until the state reaches `tick` or the run ends. Returns the
    /// number of ticks stepped.
    pub fn run_until(&mut self, tick: u64) -> u64 {
        let start = self.state.tick;
        while self.state.tick < tick && !self.state.ended {
            self.step();
        }
        self.state.tick - start
    }

    /// Step until the run ends or `max_ticks` is reached.
    pub fn run_to_end(&mut self, max_ticks: u64) -> Option<EndReason> {
        self.run_until(max_ticks);
        self.state.end_reason
    }

    fn apply_due_events(&mut self, events: &mut TickEvents) {
        let tick = self.state.tick;
        while let Some(event) = self.events.get(self.cursor).copied() {
            if event.tick > tick {
                break;
            }
            self.cursor += 1;
            if event.tick < tick {
                error!(tick, event_tick = event.tick, ?event, "Event behind the tick cursor");
                events.protocol_errors.push(event);
                continue;
            }
            if let Err(reason) = self.apply_event(event, events) {
                warn!(tick, ?event, %reason, "Event rejected");
                events.rejected_events.push(RejectedEvent { event, reason });
            }
            if self.state.ended {
                break;
            }
        }
    }

    fn apply_event(
        &mut self,
        event: GameEvent,
        events: &mut TickEvents,
    ) -> std::result::Result<(), RejectReason> {
        let state = &mut self.state;
        match event.kind {
            EventKind::ChooseRelic { option_index } => {
                events.relic_chosen = Some(choose_relic(state, option_index)?);
            }
            EventKind::RerollRelics => {
                events.relic_offered = Some(reroll_relics(state)?);
            }
            EventKind::ActivateUltimate { hero_slot } => {
                let index = state.hero_index(hero_slot).ok_or(RejectReason::HeroFallen)?;
                let hero = &state.heroes[index];
                let (skill_index, skill) = hero
                    .definition()
                    .and_then(|def| def.ultimate())
                    .ok_or(RejectReason::NoUltimate)?;
                let remaining = hero.skill_cooldowns.get(skill_index).copied().unwrap_or(0);
                if remaining > 0 {
                    return Err(RejectReason::UltimateOnCooldown { remaining });
                }
                let multiplier = hero_damage_multiplier(hero, &state.relic_modifiers);
                let cast = execute_cast(state, index, skill_index, skill, multiplier);
                events.skills_cast.push(cast);
            }
            EventKind::HeroCommand { hero_slot, command } => {
                let index = state.hero_index(hero_slot).ok_or(RejectReason::HeroFallen)?;
                if let HeroCommand::Focus { enemy_id } = command {
                    if !state.enemy(enemy_id).is_some_and(|e| e.is_alive()) {
                        return Err(RejectReason::UnknownEnemy);
                    }
                }
                state.heroes[index].command = Some(command);
            }
            EventKind::Forfeit => self.end(EndReason::Forfeited, events),
        }
        Ok(())
    }

    fn check_end(&mut self, events: &mut TickEvents) {
        let state = &self.state;
        let reason = if state.fortress_hp == 0 {
            EndReason::Defeat
        } else if self
            .config
            .target_wave
            .is_some_and(|target| state.current_wave > target)
        {
            EndReason::Victory
        } else if self
            .config
            .max_ticks
            .is_some_and(|max| state.tick + 1 >= max)
        {
            EndReason::TimeLimit
        } else {
            return;
        };
        self.end(reason, events);
    }

    fn end(&mut self, reason: EndReason, events: &mut TickEvents) {
        self.state.ended = true;
        self.state.end_reason = Some(reason);
        events.ended = Some(reason);
        info!(
            tick = self.state.tick,
            ?reason,
            wave = self.state.current_wave,
            kills = self.state.kills,
            "Run ended"
        );
    }

    #[cfg(feature = "debug-validation")]
    fn validate_invariants(&self) {
        let state = &self.state;
        for hero in &state.heroes {
            debug_assert!(hero.current_hp <= hero.max_hp, "hero {} over max hp", hero.slot);
        }
        for enemy in &state.enemies {
            debug_assert!(enemy.current_hp <= enemy.max_hp, "enemy {} over max hp", enemy.id);
        }
        debug_assert!(state.fortress_hp <= state.fortress_max_hp);
        debug_assert!(state
            .projectiles
            .iter()
            .all(|p| p.id < state.next_projectile_id));
    }
}
