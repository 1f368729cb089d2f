//! Proof-of-work search engine
//!
//! This module contains the single-block SHA-256 core, the fixed message
//! layout, the difficulty evaluator and the parallel lane search.

pub mod coordinator;
pub mod difficulty;
pub mod digest;
pub mod lane;
mod message;
mod nonce;
mod template;

pub use coordinator::{MiningResult, SearchCoordinator};
pub use difficulty::{passes, Difficulty};
pub use digest::{compress, digest_bytes};
pub use lane::{search_lane, SearchBatch};
pub use message::MessageBlock;
pub use nonce::Nonce;
pub use template::BlockTemplate;

/// Constants for the message layout
pub mod constants {
    /// Size of one SHA-256 block in bytes
    pub const BLOCK_SIZE: usize = 64;

    /// Size of a hash in bytes (SHA-256)
    pub const HASH_SIZE: usize = 32;

    /// Size of the nonce in bytes
    pub const NONCE_SIZE: usize = 8;

    /// Size of the length field in bytes
    pub const LENGTH_SIZE: usize = 4;

    /// Padding marker byte plus the 64-bit bit length
    pub const PADDING_OVERHEAD: usize = 9;

    /// Longest contents that still fit a single block
    pub const MAX_CONTENTS_LEN: usize =
        BLOCK_SIZE - HASH_SIZE - NONCE_SIZE - LENGTH_SIZE - PADDING_OVERHEAD;
}


#[cfg(test)]
mod tests_property;
