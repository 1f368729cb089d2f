//! Nonce type for mining operations

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 64-bit proof-of-work nonce, written big-endian into the message block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Nonce(pub u64);

impl Nonce {
    /// Create a new Nonce
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the inner value
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Advance the nonce by `stride` in place, wrapping at 2^64
    pub fn advance(&mut self, stride: u64) {
        self.0 = self.0.wrapping_add(stride);
    }

    /// Create a nonce from big-endian bytes
    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }

    /// Convert nonce to big-endian bytes
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Nonce {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Nonce> for u64 {
    fn from(nonce: Nonce) -> Self {
        nonce.0
    }
}
