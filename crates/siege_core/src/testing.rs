//! Builders shared by unit tests.

use std::collections::BTreeSet;

use crate::components::{ActiveHero, Enemy};
use crate::data;
use crate::math::{Fixed, Vec2Fixed};
use crate::physics::FIELD_CENTER_Y;
use crate::targeting::formation_home;
use crate::waves::build_enemy;

pub(crate) const TEST_TICK_HZ: u32 = 30;

/// Hero in slot 0 at its single-hero formation spot, full HP.
pub(crate) fn test_hero(definition_id: &str, level: u32) -> ActiveHero {
    let def = data::hero(definition_id).expect("known hero");
    let home = formation_home(0, 1);
    let max_hp = def.max_hp_at(level);
    ActiveHero {
        slot: 0,
        definition_id: definition_id.to_string(),
        level,
        current_hp: max_hp,
        max_hp,
        base_max_hp: max_hp,
        position: home,
        home,
        buffs: Vec::new(),
        equipped_artifact: None,
        shield_amount: 0,
        shield_expires_tick: 0,
        attack_cooldown: 0,
        skill_cooldowns: vec![0; def.skills.len()],
        consumed_passives: BTreeSet::new(),
        command: None,
    }
}

/// Enemy with id 1 on the lane centre at `x`.
pub(crate) fn test_enemy(definition_id: &str, wave: u32, x: Fixed) -> Enemy {
    let def = data::enemy(definition_id).expect("known enemy");
    build_enemy(def, 1, Vec2Fixed::new(x, FIELD_CENTER_Y), wave, TEST_TICK_HZ)
}
