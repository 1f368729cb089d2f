//! Block template: what a mining attempt is searching for

use crate::core::constants::HASH_SIZE;
use crate::core::{Difficulty, MessageBlock};
use crate::error::Result;
use std::fmt;

/// The parameters of one mining attempt.
///
/// Immutable once built; a newer chain head replaces the whole template.
#[derive(Clone, PartialEq, Eq)]
pub struct BlockTemplate {
    prev_hash: [u8; HASH_SIZE],
    contents: String,
    length: u32,
    block: MessageBlock,
}

impl BlockTemplate {
    /// Build a template, rejecting contents that do not fit one block
    pub fn new(prev_hash: [u8; HASH_SIZE], contents: impl Into<String>, length: u32) -> Result<Self> {
        let contents = contents.into();
        let block = MessageBlock::new(&prev_hash, contents.as_bytes(), length)?;
        Ok(Self {
            prev_hash,
            contents,
            length,
            block,
        })
    }

    /// Hash of the block this one extends
    pub fn prev_hash(&self) -> &[u8; HASH_SIZE] {
        &self.prev_hash
    }

    /// Lowercase hex of the previous hash, as used on the wire
    pub fn prev_hash_hex(&self) -> String {
        hex::encode(self.prev_hash)
    }

    /// Block contents (the miner identity)
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Chain position of the block being mined
    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn difficulty(&self) -> Difficulty {
        Difficulty::from_length(self.length)
    }

    /// A private copy of the laid-out message block, nonce slot zeroed
    pub fn message_block(&self) -> MessageBlock {
        self.block
    }
}

impl fmt::Debug for BlockTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockTemplate")
            .field("prev_hash", &self.prev_hash_hex())
            .field("contents", &self.contents)
            .field("length", &self.length)
            .finish()
    }
}

impl fmt::Display for BlockTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "length {} after {}", self.length, self.prev_hash_hex())
    }
}
