//! Wire types exchanged with the chain node
//!
//! JSON field names follow the node's API (`PrevHash`, `Contents`, `Nonce`,
//! `Length`).

use crate::core::constants::{HASH_SIZE, MAX_CONTENTS_LEN};
use crate::core::{digest_bytes, BlockTemplate, MessageBlock, Nonce};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A block as served by `/head` and `/next/{hash}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HeadRecord {
    pub prev_hash: String,
    pub contents: String,
    pub nonce: u64,
    pub length: u32,
}

impl HeadRecord {
    /// Decoded previous hash
    pub fn prev_hash_bytes(&self) -> Result<[u8; HASH_SIZE]> {
        decode_hash(&self.prev_hash)
    }

    /// SHA-256 of `prev_hash || contents || nonce || length`, i.e. this block's hash.
    ///
    /// Uses the fixed-layout core when the contents fit one block and the
    /// general-purpose hasher otherwise.
    pub fn digest(&self) -> Result<[u8; 32]> {
        let prev_hash = self.prev_hash_bytes()?;
        let contents = self.contents.as_bytes();

        if contents.len() <= MAX_CONTENTS_LEN {
            let mut block = MessageBlock::new(&prev_hash, contents, self.length)?;
            block.set_nonce(Nonce::new(self.nonce));
            return Ok(digest_bytes(&block.hash()));
        }

        let mut hasher = Sha256::new();
        hasher.update(prev_hash);
        hasher.update(contents);
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(self.length.to_be_bytes());
        Ok(hasher.finalize().into())
    }

    /// The template for the block extending this one
    pub fn next_template(&self, identity: &str) -> Result<BlockTemplate> {
        let length = self.length.checked_add(1).ok_or_else(|| {
            Error::malformed_response(format!("Length {} cannot be extended", self.length))
        })?;
        BlockTemplate::new(self.digest()?, identity, length)
    }
}

/// Body of `POST /add`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Submission {
    pub prev_hash: String,
    pub contents: String,
    pub nonce: u64,
    pub length: u32,
}

impl Submission {
    /// Solution for `template` at `nonce`
    pub fn new(template: &BlockTemplate, nonce: Nonce) -> Self {
        Self {
            prev_hash: template.prev_hash_hex(),
            contents: template.contents().to_string(),
            nonce: nonce.value(),
            length: template.length(),
        }
    }
}

impl fmt::Display for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nonce {} for length {} after {}",
            self.nonce, self.length, self.prev_hash
        )
    }
}

/// Where templates come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetMode {
    /// Follow the node's current head
    Head,
    /// Extend a given block and follow its successors
    NextAfter { hash: [u8; HASH_SIZE], length: u32 },
}

impl TargetMode {
    /// The template to start from, if the mode fixes one without asking the node
    pub fn initial_template(&self, identity: &str) -> Result<Option<BlockTemplate>> {
        match self {
            TargetMode::Head => Ok(None),
            TargetMode::NextAfter { hash, length } => {
                let next_length = length
                    .checked_add(1)
                    .ok_or_else(|| Error::config(format!("Length {} cannot be extended", length)))?;
                BlockTemplate::new(*hash, identity, next_length).map(Some)
            }
        }
    }
}

impl fmt::Display for TargetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetMode::Head => write!(f, "head"),
            TargetMode::NextAfter { hash, length } => {
                write!(f, "next-after {} (length {})", hex::encode(hash), length)
            }
        }
    }
}

/// Decode a 32-byte hex hash coming from the node
pub fn decode_hash(hex_str: &str) -> Result<[u8; HASH_SIZE]> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| Error::malformed_response(format!("PrevHash is not hex: {}", e)))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        Error::malformed_response(format!(
            "PrevHash must be {} bytes, got {}",
            HASH_SIZE,
            bytes.len()
        ))
    })
}
