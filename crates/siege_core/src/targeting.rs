//! Target selection and battlefield slots.
//!
//! Every search is a linear scan in storage order using squared distances.
//! Comparisons are strict, so the first candidate wins a tie; storage order
//! is spawn order, which makes ties deterministic.

use crate::components::{ActiveHero, ActiveTurret, Enemy};
use crate::math::{fp, fx, fx_ratio, Fixed, FixedWide, Vec2Fixed};
use crate::physics::FIELD_CENTER_Y;

/// X coordinate of the hero formation anchor.
pub const HERO_ANCHOR_X: Fixed = fx(6);

/// Number of turret pillars.
pub const PILLAR_COUNT: u8 = 3;

/// X coordinates of the turret pillars.
pub const PILLAR_X: [Fixed; PILLAR_COUNT as usize] = [fx(8), fx(14), fx(20)];

/// Y coordinate of a pillar's top slot.
pub const PILLAR_TOP_Y: Fixed = fx_ratio(7, 2);

/// Y coordinate of a pillar's bottom slot.
pub const PILLAR_BOTTOM_Y: Fixed = fx_ratio(23, 2);

/// Number of turret slots (top and bottom of each pillar).
pub const PILLAR_SLOTS: usize = PILLAR_COUNT as usize * 2;

const FORMATION_1: [(Fixed, Fixed); 1] = [(fx(0), fx(0))];
const FORMATION_2: [(Fixed, Fixed); 2] = [(fx(0), fx_ratio(-3, 2)), (fx(0), fx_ratio(3, 2))];
const FORMATION_3: [(Fixed, Fixed); 3] = [(fx_ratio(3, 2), fx(0)), (fx(0), fx(-2)), (fx(0), fx(2))];
const FORMATION_4: [(Fixed, Fixed); 4] = [
    (fx_ratio(3, 2), fx_ratio(-3, 2)),
    (fx_ratio(3, 2), fx_ratio(3, 2)),
    (fx(0), fx(-3)),
    (fx(0), fx(3)),
];
const FORMATION_5: [(Fixed, Fixed); 5] = [
    (fx(2), fx(0)),
    (fx(1), fx_ratio(-5, 2)),
    (fx(1), fx_ratio(5, 2)),
    (fx(0), fx(-4)),
    (fx(0), fx(4)),
];

const GRID_ROW_STEP: Fixed = fx_ratio(-3, 2);
const GRID_COL_STEP: Fixed = fx_ratio(5, 2);

/// Closest live enemy to `(x, y)`; the first in storage order wins ties.
#[must_use]
pub fn find_closest_enemy_2d(enemies: &[Enemy], x: Fixed, y: Fixed) -> Option<&Enemy> {
    closest_index(enemies, Vec2Fixed::new(x, y), None, |e| {
        e.is_alive().then_some(e.position)
    })
    .map(|i| &enemies[i])
}

/// Index of the closest live enemy within `range` of `origin`.
#[must_use]
pub fn find_closest_enemy_in_range(
    enemies: &[Enemy],
    origin: Vec2Fixed,
    range: Fixed,
) -> Option<usize> {
    closest_index(enemies, origin, Some(range), |e| {
        e.is_alive().then_some(e.position)
    })
}

/// Index of the closest live hero within `range` of `origin`.
#[must_use]
pub fn find_closest_hero_in_range(
    heroes: &[ActiveHero],
    origin: Vec2Fixed,
    range: Fixed,
) -> Option<usize> {
    closest_index(heroes, origin, Some(range), |h| {
        h.is_alive().then_some(h.position)
    })
}

/// Index of the closest live turret within `range` of `origin`.
#[must_use]
pub fn find_closest_turret_in_range(
    turrets: &[ActiveTurret],
    origin: Vec2Fixed,
    range: Fixed,
) -> Option<usize> {
    closest_index(turrets, origin, Some(range), |t| {
        t.is_alive().then_some(t.position)
    })
}

fn closest_index<T>(
    items: &[T],
    origin: Vec2Fixed,
    range: Option<Fixed>,
    position: impl Fn(&T) -> Option<Vec2Fixed>,
) -> Option<usize> {
    let limit: Option<FixedWide> = range.map(fp::square_wide);
    let mut best: Option<(usize, FixedWide)> = None;
    for (index, item) in items.iter().enumerate() {
        let Some(pos) = position(item) else {
            continue;
        };
        let dist_sq = origin.distance_squared(pos);
        if limit.is_some_and(|limit| dist_sq > limit) {
            continue;
        }
        if best.map_or(true, |(_, best_sq)| dist_sq < best_sq) {
            best = Some((index, dist_sq));
        }
    }
    best.map(|(index, _)| index)
}

/// Offset of formation slot `index` when `total` heroes are fielded.
///
/// Totals 1 through 5 use hand-placed layouts; larger groups fall back to a
/// three-wide grid stepping back from the anchor. Defined for every input.
#[must_use]
pub fn get_formation_position(index: usize, total: usize) -> Vec2Fixed {
    let table: &[(Fixed, Fixed)] = match total {
        1 => &FORMATION_1,
        2 => &FORMATION_2,
        3 => &FORMATION_3,
        4 => &FORMATION_4,
        5 => &FORMATION_5,
        _ => &[],
    };
    if let Some(&(dx, dy)) = table.get(index) {
        return Vec2Fixed::new(dx, dy);
    }

    let row = i32::try_from(index / 3).unwrap_or(i32::MAX);
    let col = i32::try_from(index % 3).unwrap_or(0);
    Vec2Fixed::new(
        GRID_ROW_STEP.saturating_mul_int(row),
        GRID_COL_STEP.saturating_mul_int(col - 1),
    )
}

/// World position of formation slot `index` out of `total`.
#[must_use]
pub fn formation_home(index: usize, total: usize) -> Vec2Fixed {
    let offset = get_formation_position(index, total);
    Vec2Fixed::new(
        HERO_ANCHOR_X.saturating_add(offset.x),
        FIELD_CENTER_Y.saturating_add(offset.y),
    )
}

/// World position of turret slot `slot`. Even slots sit on top of a pillar.
/// Out-of-range slots clamp to the last pillar.
#[must_use]
pub fn pillar_position(slot: u8) -> Vec2Fixed {
    let pillar = usize::from(slot / 2).min(PILLAR_X.len() - 1);
    let y = if slot % 2 == 0 {
        PILLAR_TOP_Y
    } else {
        PILLAR_BOTTOM_Y
    };
    Vec2Fixed::new(PILLAR_X[pillar], y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_enemy;

    #[test]
    fn test_first_enemy_wins_ties() {
        let mut a = test_enemy("grunt", 1, fx(10));
        a.id = 1;
        a.position = Vec2Fixed::new(fx(10), fx(5));
        let mut b = a.clone();
        b.id = 2;
        b.position = Vec2Fixed::new(fx(10), fx(9));
        // both are 2 units from (10, 7)
        let enemies = vec![a, b];
        let closest = find_closest_enemy_2d(&enemies, fx(10), fx(7)).unwrap();
        assert_eq!(closest.id, 1);

        let reversed: Vec<_> = enemies.into_iter().rev().collect();
        let closest = find_closest_enemy_2d(&reversed, fx(10), fx(7)).unwrap();
        assert_eq!(closest.id, 2);
    }

    #[test]
    fn test_dead_enemies_are_skipped() {
        let mut near = test_enemy("grunt", 1, fx(7));
        near.current_hp = 0;
        let mut far = test_enemy("grunt", 1, fx(20));
        far.id = 2;
        let enemies = vec![near, far];
        assert_eq!(find_closest_enemy_2d(&enemies, fx(6), fx(7)).unwrap().id, 2);
        assert!(find_closest_enemy_2d(&[], fx(0), fx(0)).is_none());
    }

    #[test]
    fn test_range_limit_is_inclusive() {
        let enemies = vec![test_enemy("grunt", 1, fx(10))];
        let origin = Vec2Fixed::new(fx(7), FIELD_CENTER_Y);
        assert_eq!(find_closest_enemy_in_range(&enemies, origin, fx(3)), Some(0));
        assert_eq!(find_closest_enemy_in_range(&enemies, origin, fx(2)), None);
    }

    #[test]
    fn test_formation_table() {
        assert_eq!(get_formation_position(0, 1), Vec2Fixed::ZERO);
        assert_eq!(
            get_formation_position(1, 2),
            Vec2Fixed::new(fx(0), fx_ratio(3, 2))
        );
        assert_eq!(get_formation_position(0, 5), Vec2Fixed::new(fx(2), fx(0)));
        assert_eq!(get_formation_position(3, 4), Vec2Fixed::new(fx(0), fx(3)));
        // index past a small table falls through to the grid
        assert_eq!(
            get_formation_position(4, 4),
            Vec2Fixed::new(fx_ratio(-3, 2), fx(0))
        );
    }

    #[test]
    fn test_formation_grid_fallback() {
        // row 1, col 2
        assert_eq!(
            get_formation_position(5, 7),
            Vec2Fixed::new(fx_ratio(-3, 2), fx_ratio(5, 2))
        );
        assert_eq!(
            get_formation_position(0, 6),
            Vec2Fixed::new(fx(0), fx_ratio(-5, 2))
        );
    }

    #[test]
    fn test_formation_is_total() {
        for total in 0..12 {
            for index in 0..14 {
                let _ = formation_home(index, total);
            }
        }
        let _ = get_formation_position(usize::MAX, usize::MAX);
    }

    #[test]
    fn test_formation_slots_are_distinct() {
        for total in 1..=9 {
            let homes: Vec<_> = (0..total).map(|i| formation_home(i, total)).collect();
            for i in 0..total {
                for j in (i + 1)..total {
                    assert_ne!(homes[i], homes[j], "total {total}: slots {i} and {j} overlap");
                }
            }
        }
    }

    #[test]
    fn test_pillar_positions() {
        assert_eq!(pillar_position(0), Vec2Fixed::new(fx(8), PILLAR_TOP_Y));
        assert_eq!(pillar_position(5), Vec2Fixed::new(fx(20), PILLAR_BOTTOM_Y));
    }
}
