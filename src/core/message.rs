//! Fixed-layout message block
//!
//! Layout for a template with `c` content bytes:
//!
//! | bytes              | field                              |
//! |--------------------|------------------------------------|
//! | `0..32`            | previous block hash                |
//! | `32..32+c`         | contents                           |
//! | `32+c..40+c`       | nonce, u64 big-endian              |
//! | `40+c..44+c`       | length, u32 big-endian             |
//! | `44+c`             | `0x80` padding marker              |
//! | `56..64`           | message bit length, u64 big-endian |
//!
//! With the usual two content bytes the message is 46 bytes long and the
//! trailing bit length reads `0x0170`.

use crate::core::constants::{BLOCK_SIZE, HASH_SIZE, LENGTH_SIZE, MAX_CONTENTS_LEN, NONCE_SIZE};
use crate::core::digest::compress;
use crate::core::Nonce;
use crate::error::{Error, Result};
use std::fmt;

/// One padded SHA-256 block with a writable nonce slot
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MessageBlock {
    bytes: [u8; BLOCK_SIZE],
    nonce_offset: usize,
}

impl MessageBlock {
    /// Lay out a message block; the nonce slot starts zeroed
    pub fn new(prev_hash: &[u8; HASH_SIZE], contents: &[u8], length: u32) -> Result<Self> {
        if contents.len() > MAX_CONTENTS_LEN {
            return Err(Error::invalid_template(format!(
                "contents are {} bytes, at most {} fit in a single block",
                contents.len(),
                MAX_CONTENTS_LEN
            )));
        }

        let nonce_offset = HASH_SIZE + contents.len();
        let length_offset = nonce_offset + NONCE_SIZE;
        let message_len = length_offset + LENGTH_SIZE;

        let mut bytes = [0u8; BLOCK_SIZE];
        bytes[..HASH_SIZE].copy_from_slice(prev_hash);
        bytes[HASH_SIZE..nonce_offset].copy_from_slice(contents);
        bytes[length_offset..message_len].copy_from_slice(&length.to_be_bytes());
        bytes[message_len] = 0x80;
        bytes[BLOCK_SIZE - 8..].copy_from_slice(&((message_len as u64) * 8).to_be_bytes());

        Ok(Self {
            bytes,
            nonce_offset,
        })
    }

    /// Number of message bytes before padding
    pub fn message_len(&self) -> usize {
        self.nonce_offset + NONCE_SIZE + LENGTH_SIZE
    }

    /// The unpadded message
    pub fn message(&self) -> &[u8] {
        &self.bytes[..self.message_len()]
    }

    /// The full padded block
    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.bytes
    }

    /// Read the nonce currently in the slot
    pub fn nonce(&self) -> Nonce {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        nonce_bytes.copy_from_slice(&self.bytes[self.nonce_offset..self.nonce_offset + NONCE_SIZE]);
        Nonce::from_be_bytes(nonce_bytes)
    }

    /// Overwrite the nonce slot in place
    #[inline]
    pub fn set_nonce(&mut self, nonce: Nonce) {
        self.bytes[self.nonce_offset..self.nonce_offset + NONCE_SIZE]
            .copy_from_slice(&nonce.to_be_bytes());
    }

    /// Run the compression function over the block
    #[inline]
    pub fn hash(&self) -> [u32; 8] {
        compress(&self.bytes)
    }

    /// Hex dump of the padded block
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Debug for MessageBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBlock")
            .field("hex", &self.to_hex())
            .field("nonce", &self.nonce())
            .finish()
    }
}
