//! Deterministic random number generation.
//!
//! Every randomized decision in the simulation (spawn rolls, crits, dodge and
//! block, relic offers) draws from a single [`Xorshift32`] stream owned by the
//! game state. The order of draws is part of the replay protocol: reordering
//! calls changes every downstream tick.

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, FP_SHIFT};

/// State used when a seed folds to zero (xorshift has a fixed point at 0).
pub const ZERO_SEED_REPLACEMENT: u32 = 0x9E37_79B9;

/// Seeded 32-bit xorshift generator (13, 17, 5 triple).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    /// Create a generator from a 64-bit seed.
    ///
    /// The seed is folded to 32 bits (`low ^ high`).
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let folded = (seed as u32) ^ ((seed >> 32) as u32);
        Self::from_state(folded)
    }

    /// Restore a generator from a raw state word.
    #[must_use]
    pub fn from_state(state: u32) -> Self {
        Self {
            state: if state == 0 {
                ZERO_SEED_REPLACEMENT
            } else {
                state
            },
        }
    }

    /// Current raw state, for hashing and snapshots.
    #[must_use]
    pub const fn state(&self) -> u32 {
        self.state
    }

    /// Advance and return the next 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Next value mapped to `[0, 1)`.
    ///
    /// Boundary helper for callers outside the tick; simulation code uses
    /// [`next_fixed_unit`](Self::next_fixed_unit).
    pub fn next_float(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Next value as a Q16.16 fraction in `[0, 1)`.
    pub fn next_fixed_unit(&mut self) -> Fixed {
        Fixed::from_bits((self.next_u32() >> (32 - FP_SHIFT)) as i32)
    }

    /// Uniform integer in `[lo, hi]` (inclusive). Returns `lo` without
    /// drawing when the range is empty or a single value.
    pub fn next_range(&mut self, lo: u32, hi: u32) -> u32 {
        if lo >= hi {
            return lo;
        }
        let span = u64::from(hi - lo) + 1;
        lo + (u64::from(self.next_u32()) % span) as u32
    }

    /// Uniform index into a collection of `len` items. Draws nothing for
    /// `len <= 1`.
    pub fn next_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        (u64::from(self.next_u32()) % len as u64) as usize
    }

    /// Uniform fixed-point value in `[-magnitude, magnitude)`.
    pub fn next_signed(&mut self, magnitude: Fixed) -> Fixed {
        let unit = self.next_fixed_unit();
        let doubled = crate::math::fp::mul(unit, magnitude + magnitude);
        doubled - magnitude
    }

    /// Roll against probability `p`.
    ///
    /// A non-positive `p` returns `false` without consuming a draw, so an
    /// entity with no dodge or block chance never advances the stream.
    pub fn chance(&mut self, p: Fixed) -> bool {
        if p <= Fixed::ZERO {
            return false;
        }
        self.next_fixed_unit() < p
    }
}
