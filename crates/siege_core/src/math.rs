//! Fixed-point math utilities for deterministic simulation.
//!
//! All game simulation uses Q16.16 fixed-point arithmetic to ensure
//! deterministic behavior across platforms. Floating-point operations
//! can produce different results on different CPUs and compilers.
//!
//! Multiplication and division go through [`fp`] rather than the
//! operator impls on [`Fixed`], so every rounding step is spelled out:
//! products are floored (arithmetic shift), quotients truncate toward zero.

use fixed::types::{I16F16, I48F16};
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Q16.16: 16 bits integer part, 16 bits fractional part.
/// Range: -32768.0 to 32767.99998
/// Precision: 1/65536 (about 0.0000153)
pub type Fixed = I16F16;

/// Wide fixed-point type for squared distances.
///
/// Squaring a Q16.16 distance overflows 32 bits for anything past 181 units,
/// so squared quantities keep 48 integer bits.
pub type FixedWide = I48F16;

/// Number of fractional bits in [`Fixed`].
pub const FP_SHIFT: u32 = 16;

/// Raw representation of 1.0.
pub const FP_ONE: i32 = 1 << FP_SHIFT;

/// Build a [`Fixed`] from an integer in a const context.
#[must_use]
pub const fn fx(n: i32) -> Fixed {
    Fixed::from_bits(n << FP_SHIFT)
}

/// Build a [`Fixed`] from a ratio `num / den` in a const context.
///
/// Truncates toward zero, like [`fp::div`].
#[must_use]
pub const fn fx_ratio(num: i32, den: i32) -> Fixed {
    Fixed::from_bits((((num as i64) << FP_SHIFT) / den as i64) as i32)
}

/// Build a [`Fixed`] from a percentage in a const context (`fx_pct(25)` = 0.25).
#[must_use]
pub const fn fx_pct(percent: i32) -> Fixed {
    fx_ratio(percent, 100)
}

/// Explicitly-rounded fixed-point operations.
pub mod fp {
    use super::{Fixed, FixedWide, FP_SHIFT};

    /// Convert an integer to fixed point, saturating outside the Q16.16 range.
    #[must_use]
    pub fn from_int(n: i32) -> Fixed {
        Fixed::saturating_from_num(n)
    }

    /// Convert a float to fixed point: `floor(value * 65536)`.
    ///
    /// Only for tooling and test setup; never call this inside a tick.
    #[must_use]
    pub fn from_float(value: f64) -> Fixed {
        Fixed::from_bits((value * f64::from(super::FP_ONE)).floor() as i32)
    }

    /// Convert fixed point back to a float. Exact for every raw value.
    #[must_use]
    pub fn to_float(value: Fixed) -> f64 {
        f64::from(value.to_bits()) / f64::from(super::FP_ONE)
    }

    /// Multiply two fixed-point numbers: `(a * b) >> 16` in 64 bits.
    #[must_use]
    pub fn mul(a: Fixed, b: Fixed) -> Fixed {
        let product = i64::from(a.to_bits()) * i64::from(b.to_bits());
        Fixed::from_bits((product >> FP_SHIFT) as i32)
    }

    /// Divide two fixed-point numbers: `(a << 16) / b` in 64 bits.
    ///
    /// Division by zero saturates to `MAX` for non-negative `a`, `MIN` otherwise.
    #[must_use]
    pub fn div(a: Fixed, b: Fixed) -> Fixed {
        if b == Fixed::ZERO {
            return if a >= Fixed::ZERO {
                Fixed::MAX
            } else {
                Fixed::MIN
            };
        }
        let shifted = i64::from(a.to_bits()) << FP_SHIFT;
        Fixed::from_bits((shifted / i64::from(b.to_bits())) as i32)
    }

    /// Square root via Newton's method on the raw value.
    ///
    /// `sqrt(raw) << 8` keeps the result in Q16.16. Non-positive input yields 0.
    #[must_use]
    pub fn sqrt(value: Fixed) -> Fixed {
        let raw = i64::from(value.to_bits());
        if raw <= 0 {
            return Fixed::ZERO;
        }
        let mut x = raw;
        let mut y = (x + 1) >> 1;
        while y < x {
            x = y;
            y = (x + raw / x) >> 1;
        }
        Fixed::from_bits((x << 8) as i32)
    }

    /// Squared Euclidean distance between `(ax, ay)` and `(bx, by)`.
    ///
    /// Avoids the square root for range comparisons. Each squared term is
    /// floored independently, so the result is symmetric in its endpoints.
    #[must_use]
    pub fn dist_sq(ax: Fixed, ay: Fixed, bx: Fixed, by: Fixed) -> FixedWide {
        let dx = i128::from(ax.to_bits()) - i128::from(bx.to_bits());
        let dy = i128::from(ay.to_bits()) - i128::from(by.to_bits());
        let sum = ((dx * dx) >> FP_SHIFT) + ((dy * dy) >> FP_SHIFT);
        FixedWide::from_bits(i64::try_from(sum).unwrap_or(i64::MAX))
    }

    /// Euclidean distance, computed as an integer square root of the
    /// unshifted sum of squares (which is already Q32.32).
    #[must_use]
    pub fn dist(ax: Fixed, ay: Fixed, bx: Fixed, by: Fixed) -> Fixed {
        let dx = i128::from(ax.to_bits()) - i128::from(bx.to_bits());
        let dy = i128::from(ay.to_bits()) - i128::from(by.to_bits());
        let sum = (dx * dx + dy * dy) as u128;
        let root = isqrt_u128(sum);
        Fixed::from_bits(i32::try_from(root).unwrap_or(i32::MAX))
    }

    /// Square a range so it can be compared against [`dist_sq`].
    #[must_use]
    pub fn square_wide(value: Fixed) -> FixedWide {
        let raw = i64::from(value.to_bits());
        FixedWide::from_bits((raw * raw) >> FP_SHIFT)
    }

    /// `floor(n * factor)` for integer quantities such as damage and HP.
    ///
    /// Negative results clamp to 0; results past `u32::MAX` saturate.
    #[must_use]
    pub fn mul_int(n: u32, factor: Fixed) -> u32 {
        let product = (i64::from(n) * i64::from(factor.to_bits())) >> FP_SHIFT;
        u32::try_from(product.max(0)).unwrap_or(u32::MAX)
    }

    /// Integer part, rounding toward negative infinity.
    #[must_use]
    pub fn floor_to_int(value: Fixed) -> i32 {
        value.to_bits() >> FP_SHIFT
    }

    fn isqrt_u128(n: u128) -> u128 {
        if n < 2 {
            return n;
        }
        let mut x = n;
        let mut y = (x + 1) >> 1;
        while y < x {
            x = y;
            y = (x + n / x) >> 1;
        }
        x
    }
}

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i32)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i32::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> FixedWide {
        fp::dist_sq(self.x, self.y, other.x, other.y)
    }

    /// Calculate Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fp::dist(self.x, self.y, other.x, other.y)
    }

    /// Step toward `target` by at most `step` units.
    ///
    /// Returns the new position and whether the target was reached.
    #[must_use]
    pub fn move_towards(self, target: Self, step: Fixed) -> (Self, bool) {
        if step <= Fixed::ZERO {
            return (self, self == target);
        }
        let distance = self.distance(target);
        if distance <= step {
            return (target, true);
        }
        let ratio = fp::div(step, distance);
        let moved = Self::new(
            self.x + fp::mul(target.x - self.x, ratio),
            self.y + fp::mul(target.y - self.y, ratio),
        );
        (moved, false)
    }
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_const_constructors() {
        assert_eq!(fx(3), fp::from_int(3));
        assert_eq!(fx_pct(25).to_bits(), FP_ONE / 4);
        assert_eq!(fx_ratio(3, 2).to_bits(), FP_ONE + FP_ONE / 2);
    }

    #[test]
    fn test_mul_floors() {
        // 1.5 * 1.5 = 2.25 exactly
        assert_eq!(fp::mul(fx_ratio(3, 2), fx_ratio(3, 2)), fx_ratio(9, 4));
        // -1/65536 * 0.5 floors to -1/65536, not 0
        let tiny_neg = Fixed::from_bits(-1);
        assert_eq!(fp::mul(tiny_neg, fx_ratio(1, 2)).to_bits(), -1);
    }

    #[test]
    fn test_div_by_zero_saturates() {
        assert_eq!(fp::div(fx(5), Fixed::ZERO), Fixed::MAX);
        assert_eq!(fp::div(fx(-5), Fixed::ZERO), Fixed::MIN);
        assert_eq!(fp::div(fx(10), fx(4)), fx_ratio(5, 2));
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(fp::sqrt(fx(16)), fx(4));
        assert_eq!(fp::sqrt(fx(-4)), Fixed::ZERO);
    }

    #[test]
    fn test_dist_sq_and_dist() {
        let d2 = fp::dist_sq(fx(3), fx(0), fx(0), fx(4));
        assert_eq!(d2, FixedWide::from_num(25));
        assert_eq!(fp::dist(fx(3), fx(0), fx(0), fx(4)), fx(5));
    }

    #[test]
    fn test_dist_sq_does_not_overflow_across_field() {
        let d2 = fp::dist_sq(fx(-30000), fx(0), fx(30000), fx(0));
        assert_eq!(d2, FixedWide::from_num(3_600_000_000_i64));
    }

    #[test]
    fn test_mul_int_floors_and_clamps() {
        assert_eq!(fp::mul_int(100, fx_pct(125)), 125);
        assert_eq!(fp::mul_int(7, fx_pct(25)), 1);
        assert_eq!(fp::mul_int(10, fx(-1)), 0);
    }

    #[test]
    fn test_move_towards() {
        let start = Vec2Fixed::new(fx(0), fx(0));
        let target = Vec2Fixed::new(fx(3), fx(4));
        let (pos, arrived) = start.move_towards(target, fx(1));
        assert!(!arrived);
        // step ratio truncates, so allow a few raw units of slack
        assert!((pos.distance(start) - fx(1)).abs() <= Fixed::from_bits(4));
        assert!(pos.x > Fixed::ZERO && pos.y > pos.x);

        let (pos, arrived) = start.move_towards(target, fx(10));
        assert!(arrived);
        assert_eq!(pos, target);
    }

    proptest! {
        #[test]
        fn prop_float_round_trip_is_exact(bits in any::<i32>()) {
            let value = Fixed::from_bits(bits);
            prop_assert_eq!(fp::from_float(fp::to_float(value)), value);
        }

        #[test]
        fn prop_dist_sq_is_symmetric(
            a in any::<i32>(), b in any::<i32>(), c in any::<i32>(), d in any::<i32>(),
        ) {
            let (a, b, c, d) = (
                Fixed::from_bits(a), Fixed::from_bits(b),
                Fixed::from_bits(c), Fixed::from_bits(d),
            );
            prop_assert_eq!(fp::dist_sq(a, b, c, d), fp::dist_sq(c, d, a, b));
        }
    }
}
