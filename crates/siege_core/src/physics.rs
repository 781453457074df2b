//! Battlefield geometry and time-base conversions.
//!
//! The field is a horizontal lane: enemies spawn at [`FIELD_WIDTH`] and walk
//! toward the fortress wall at [`FORTRESS_X`]. Data tables express speeds
//! per second and durations in milliseconds; everything inside a tick works
//! in per-tick units produced by the helpers below.

use crate::math::{fp, fx, fx_ratio, Fixed, Vec2Fixed};

/// X coordinate where enemies spawn; also the far clamp for knockback.
pub const FIELD_WIDTH: Fixed = fx(40);

/// Height of the lane.
pub const FIELD_HEIGHT: Fixed = fx(15);

/// Vertical centre of the lane.
pub const FIELD_CENTER_Y: Fixed = fx_ratio(15, 2);

/// X coordinate of the fortress wall. Enemies crossing it leak.
pub const FORTRESS_X: Fixed = fx(2);

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Vec2Fixed, b: Vec2Fixed) -> Fixed {
    a.distance(b)
}

/// Push an x coordinate back toward the spawn edge.
///
/// The pushed distance is `force × (1 − resistance)`; resistance at or above
/// 1 cancels the push. The result never passes [`FIELD_WIDTH`].
#[must_use]
pub fn apply_knockback(x: Fixed, force: Fixed, resistance: Fixed) -> Fixed {
    let taken = (Fixed::ONE - resistance).max(Fixed::ZERO);
    let pushed = fp::mul(force.max(Fixed::ZERO), taken);
    x.saturating_add(pushed).min(FIELD_WIDTH)
}

/// Shorten a crowd-control duration by the target's resistance.
///
/// `floor(ticks × (1 − resistance))`, but never below one tick when the
/// input was non-zero: resisted control still lands.
#[must_use]
pub fn scale_cc_duration(ticks: u32, resistance: Fixed) -> u32 {
    if ticks == 0 {
        return 0;
    }
    let taken = (Fixed::ONE - resistance).max(Fixed::ZERO);
    fp::mul_int(ticks, taken).max(1)
}

/// Convert milliseconds to whole ticks, rounding up.
#[must_use]
pub fn ms_to_ticks(ms: u32, tick_hz: u32) -> u32 {
    let scaled = u64::from(ms) * u64::from(tick_hz);
    u32::try_from(scaled.div_ceil(1000)).unwrap_or(u32::MAX)
}

/// Convert a per-second rate (speed, regen) to a per-tick rate.
#[must_use]
pub fn per_second_to_per_tick(value: Fixed, tick_hz: u32) -> Fixed {
    fp::div(value, fp::from_int(i32::try_from(tick_hz).unwrap_or(i32::MAX)))
}

/// Clamp a position into the lane rectangle.
#[must_use]
pub fn clamp_to_field(pos: Vec2Fixed) -> Vec2Fixed {
    Vec2Fixed::new(
        pos.x.clamp(Fixed::ZERO, FIELD_WIDTH),
        pos.y.clamp(Fixed::ZERO, FIELD_HEIGHT),
    )
}
