//! Leading-zero difficulty for mined blocks

use crate::core::digest::digest_bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Difficulty added on top of `length / 100`
pub const BASE_DIFFICULTY: u32 = 24;

/// Chain lengths per extra difficulty bit
pub const LENGTH_PER_BIT: u32 = 100;

/// Number of state words the evaluator can require to be zero
const MAX_ZERO_LIMBS: usize = 3;

/// Required number of leading zero bits of a block digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Difficulty(u32);

impl Difficulty {
    /// Wrap an explicit bit count
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Difficulty of the block at chain position `length`
    pub const fn from_length(length: u32) -> Self {
        Self(length / LENGTH_PER_BIT + BASE_DIFFICULTY)
    }

    /// Leading zero bits required
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether the evaluator fully checks this difficulty.
    ///
    /// From 128 bits on, the fourth state word is only tested for the
    /// `bits % 32` remainder, so e.g. 128 accepts any h3.
    pub const fn is_supported(self) -> bool {
        self.0 < (MAX_ZERO_LIMBS as u32 + 1) * 32
    }

    /// Test a compression result against this difficulty
    #[inline]
    pub fn check(self, state: &[u32; 8]) -> Option<[u8; 32]> {
        passes(state, self.0)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bits", self.0)
    }
}

/// Check that the top `difficulty_bits` of the digest are zero.
///
/// Whole words are tested first (h0, then h1, then h2) so most candidates are
/// rejected on the first comparison. The remaining `difficulty_bits % 32`
/// bits are tested against the next word. On success the digest is
/// serialised big-endian.
#[inline]
pub fn passes(state: &[u32; 8], difficulty_bits: u32) -> Option<[u8; 32]> {
    let zero_limbs = ((difficulty_bits / 32) as usize).min(MAX_ZERO_LIMBS);
    if state[..zero_limbs].iter().any(|&limb| limb != 0) {
        return None;
    }

    let remainder = difficulty_bits % 32;
    if remainder > 0 && state[zero_limbs] >> (32 - remainder) != 0 {
        return None;
    }

    Some(digest_bytes(state))
}
