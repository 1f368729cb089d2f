//! One lane of the nonce search

use crate::core::{Difficulty, MessageBlock, Nonce};

/// The slice of the nonce space one lane walks in a batch.
///
/// Candidates are `start + lane_id + k * stride` for `k` in
/// `0..iteration_budget`, all in wrapping `u64` arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBatch {
    pub start: u64,
    pub stride: u64,
    pub lane_id: u32,
    pub iteration_budget: u64,
}

impl SearchBatch {
    pub fn new(start: u64, stride: u64, lane_id: u32, iteration_budget: u64) -> Self {
        Self {
            start,
            stride,
            lane_id,
            iteration_budget,
        }
    }

    /// First candidate of the lane
    pub fn first_nonce(&self) -> Nonce {
        Nonce::new(self.start.wrapping_add(u64::from(self.lane_id)))
    }

    /// The candidates in the order the lane tries them
    pub fn nonces(&self) -> impl Iterator<Item = Nonce> {
        let stride = self.stride;
        let mut next = self.first_nonce();
        (0..self.iteration_budget).map(move |_| {
            let current = next;
            next.advance(stride);
            current
        })
    }
}

/// Walk one lane until a candidate meets `difficulty` or the budget runs out.
///
/// Only the nonce slot of `block` is rewritten; nothing is allocated per
/// candidate.
pub fn search_lane(
    block: &mut MessageBlock,
    batch: &SearchBatch,
    difficulty: Difficulty,
) -> Option<(Nonce, [u8; 32])> {
    let mut nonce = batch.first_nonce();
    for _ in 0..batch.iteration_budget {
        block.set_nonce(nonce);
        if let Some(digest) = difficulty.check(&block.hash()) {
            return Some((nonce, digest));
        }
        nonce.advance(batch.stride);
    }
    None
}
