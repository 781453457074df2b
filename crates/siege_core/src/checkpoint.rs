//! State fingerprints for desync detection.
//!
//! Every `checkpoint_interval` ticks the simulation hashes the fields of
//! [`GameState`] that drive future ticks with FNV-1a (32-bit) and chains the
//! result onto the previous checkpoint. Two runs agree up to a tick exactly
//! when their chain hashes at that tick agree.
//!
//! All integers are fed to the hasher little-endian and fixed-point values
//! as raw bits, so the hash is identical on every platform. The field list
//! is part of the replay format: changing it requires bumping
//! [`PROTOCOL_VERSION`].

use serde::{Deserialize, Serialize};

use crate::components::{ActiveHero, DamageOverTime, Enemy, HeroCommand};
use crate::math::{Fixed, Vec2Fixed};
use crate::state::{GameState, RelicModifiers};

/// Version of the tick order, RNG call order and hashed field list.
pub const PROTOCOL_VERSION: u32 = 2;

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Incremental FNV-1a 32-bit hasher.
#[derive(Debug, Clone, Copy)]
pub struct Fnv1a32 {
    hash: u32,
}

impl Default for Fnv1a32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Fnv1a32 {
    /// Start a new hash.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hash: FNV_OFFSET_BASIS,
        }
    }

    /// Feed raw bytes.
    pub fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.hash ^= u32::from(byte);
            self.hash = self.hash.wrapping_mul(FNV_PRIME);
        }
    }

    /// Feed a byte.
    pub fn write_u8(&mut self, value: u8) {
        self.write(&[value]);
    }

    /// Feed a `u32`, little-endian.
    pub fn write_u32(&mut self, value: u32) {
        self.write(&value.to_le_bytes());
    }

    /// Feed a `u64`, little-endian.
    pub fn write_u64(&mut self, value: u64) {
        self.write(&value.to_le_bytes());
    }

    /// Feed a fixed-point value as its raw bits.
    pub fn write_fixed(&mut self, value: Fixed) {
        self.write(&value.to_bits().to_le_bytes());
    }

    /// Feed a position.
    pub fn write_vec(&mut self, value: Vec2Fixed) {
        self.write_fixed(value.x);
        self.write_fixed(value.y);
    }

    /// Feed a collection length.
    pub fn write_len(&mut self, len: usize) {
        self.write_u32(u32::try_from(len).unwrap_or(u32::MAX));
    }

    /// Feed a string, length first.
    pub fn write_str(&mut self, value: &str) {
        self.write_len(value.len());
        self.write(value.as_bytes());
    }

    /// The hash so far.
    #[must_use]
    pub const fn finish(&self) -> u32 {
        self.hash
    }
}

/// FNV-1a of a byte slice.
#[must_use]
pub fn fnv1a32(bytes: &[u8]) -> u32 {
    let mut hasher = Fnv1a32::new();
    hasher.write(bytes);
    hasher.finish()
}

/// A state fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Tick the fingerprint was taken at, after the tick counter advanced.
    pub tick: u64,
    /// Hash of the state at `tick`.
    pub hash32: u32,
    /// `hash32` chained onto the previous checkpoint's chain hash.
    pub chain_hash32: u32,
}

impl Checkpoint {
    /// Fingerprint `state`, chaining onto `previous_chain` (0 for the first
    /// checkpoint of a run).
    #[must_use]
    pub fn capture(state: &GameState, previous_chain: u32) -> Self {
        let hash32 = state_hash(state);
        Self {
            tick: state.tick,
            hash32,
            chain_hash32: chain_hash(previous_chain, hash32),
        }
    }
}

/// `fnv1a32(previous.le ++ hash.le)`.
#[must_use]
pub fn chain_hash(previous: u32, hash: u32) -> u32 {
    let mut hasher = Fnv1a32::new();
    hasher.write_u32(previous);
    hasher.write_u32(hash);
    hasher.finish()
}

/// Hash the parts of `state` that determine future ticks.
#[must_use]
pub fn state_hash(state: &GameState) -> u32 {
    let mut h = Fnv1a32::new();
    h.write_u64(state.tick);
    h.write_u32(state.rng.state());
    h.write_u32(state.current_wave);
    h.write_u8(state.wave.phase.code());
    h.write_u64(state.wave.timer_tick);
    h.write_u32(state.wave.enemies_spawned);
    h.write_u32(state.fortress_hp);
    h.write_u8(u8::from(state.ended));

    h.write_len(state.heroes.len());
    for hero in &state.heroes {
        hash_hero(&mut h, hero);
    }

    h.write_len(state.turrets.len());
    for turret in &state.turrets {
        h.write_u32(turret.id);
        h.write_u32(turret.current_hp);
        h.write_vec(turret.position);
        h.write_u32(turret.attack_cooldown);
    }

    h.write_len(state.enemies.len());
    for enemy in &state.enemies {
        hash_enemy(&mut h, enemy);
    }

    h.write_len(state.projectiles.len());
    for projectile in &state.projectiles {
        h.write_u32(projectile.id);
        h.write_u32(projectile.target_enemy_id);
        h.write_vec(projectile.position);
        h.write_u32(projectile.damage);
    }

    h.write_u32(state.next_projectile_id);
    h.write_u32(state.next_enemy_id);
    h.write_u32(state.kills);

    h.write_len(state.relics.len());
    for relic in &state.relics {
        h.write_str(relic);
    }
    hash_modifiers(&mut h, &state.relic_modifiers);
    match &state.relic_offer {
        Some(offer) => {
            h.write_u8(1);
            h.write_u32(offer.wave);
            h.write_len(offer.options.len());
            for option in &offer.options {
                h.write_str(option);
            }
        }
        None => h.write_u8(0),
    }
    h.write_u32(state.relic_rerolls_remaining);
    h.finish()
}

fn hash_modifiers(h: &mut Fnv1a32, modifiers: &RelicModifiers) {
    h.write_fixed(modifiers.damage);
    h.write_fixed(modifiers.attack_speed);
    h.write_fixed(modifiers.crit_chance);
    h.write_fixed(modifiers.crit_multiplier);
    h.write_fixed(modifiers.hero_max_hp);
    h.write_fixed(modifiers.fortress_max_hp);
    h.write_fixed(modifiers.turret_damage);
}

fn hash_command(h: &mut Fnv1a32, command: Option<&HeroCommand>) {
    match command {
        None => h.write_u8(0),
        Some(HeroCommand::MoveTo { x, y }) => {
            h.write_u8(1);
            h.write_fixed(*x);
            h.write_fixed(*y);
        }
        Some(HeroCommand::Focus { enemy_id }) => {
            h.write_u8(2);
            h.write_u32(*enemy_id);
        }
        Some(HeroCommand::Return) => h.write_u8(3),
    }
}

fn hash_hero(h: &mut Fnv1a32, hero: &ActiveHero) {
    h.write_u8(hero.slot);
    h.write_u32(hero.current_hp);
    h.write_u32(hero.max_hp);
    h.write_vec(hero.position);
    h.write_u32(hero.shield_amount);
    h.write_u64(hero.shield_expires_tick);
    h.write_u32(hero.attack_cooldown);
    h.write_len(hero.skill_cooldowns.len());
    for &cooldown in &hero.skill_cooldowns {
        h.write_u32(cooldown);
    }
    h.write_len(hero.buffs.len());
    for buff in &hero.buffs {
        h.write_u8(buff.stat.code());
        h.write_fixed(buff.amount);
        h.write_u64(buff.expiration_tick);
    }
    h.write_len(hero.consumed_passives.len());
    for passive in &hero.consumed_passives {
        h.write_u8(passive.code());
    }
    hash_command(h, hero.command.as_ref());
}

fn hash_enemy(h: &mut Fnv1a32, enemy: &Enemy) {
    h.write_u32(enemy.id);
    h.write_u32(enemy.current_hp);
    h.write_vec(enemy.position);
    h.write_u32(enemy.attack_cooldown);
    let status = &enemy.status;
    h.write_fixed(status.slow_amount);
    h.write_u64(status.slow_until);
    h.write_u64(status.stun_until);
    h.write_u64(status.freeze_until);
    hash_dot(h, status.burn.as_ref());
    hash_dot(h, status.poison.as_ref());
}

fn hash_dot(h: &mut Fnv1a32, dot: Option<&DamageOverTime>) {
    match dot {
        Some(dot) => {
            h.write_u8(1);
            h.write_u32(dot.damage_per_second);
            h.write_u64(dot.until);
            h.write_u64(dot.next_pulse);
        }
        None => h.write_u8(0),
    }
}
