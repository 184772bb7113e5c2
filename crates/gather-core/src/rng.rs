//! Deterministic PRNG for order generation.
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, and trivially
//! serializable so a loaded shift continues the same order sequence.

use crate::fixed::Fixed64;

/// SplitMix64 pseudo-random number generator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform fraction in `[0, 1)`.
    pub fn unit(&mut self) -> Fixed64 {
        // The upper 32 random bits become the fractional part of a Q32.32.
        Fixed64::from_bits((self.next_u64() >> 32) as i64)
    }

    /// Returns `true` with the given probability (Fixed64 in [0, 1]).
    ///
    /// - probability <= 0 always returns false
    /// - probability >= 1 always returns true
    pub fn chance(&mut self, probability: Fixed64) -> bool {
        if probability <= Fixed64::ZERO {
            return false;
        }
        if probability >= Fixed64::ONE {
            return true;
        }
        self.unit() < probability
    }

    /// Uniform value in `[min, max)`. Returns `min` when the range is empty.
    pub fn range(&mut self, min: Fixed64, max: Fixed64) -> Fixed64 {
        if max <= min {
            return min;
        }
        let span = max - min;
        min + span.saturating_mul(self.unit())
    }

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "index() on an empty range");
        let upper = self.next_u64() >> 32;
        ((upper * len as u64) >> 32) as usize
    }

    /// Get the internal state (for serialization).
    pub fn state(&self) -> u64 {
        self.state
    }
}
