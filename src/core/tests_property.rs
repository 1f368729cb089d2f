//! Property-based tests for the search engine
//!
//! The fixed-layout core is checked against the `sha2` crate, which shares no
//! code with it.

use super::constants::MAX_CONTENTS_LEN;
use super::*;
use proptest::prelude::*;
use sha2::{Digest, Sha256};

fn reference_digest(prev_hash: &[u8; 32], contents: &[u8], nonce: u64, length: u32) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(prev_hash);
    hasher.update(contents);
    hasher.update(nonce.to_be_bytes());
    hasher.update(length.to_be_bytes());
    hasher.finalize().into()
}

proptest! {
    #[test]
    fn digest_matches_reference_for_46_byte_messages(
        prev_hash in prop::array::uniform32(any::<u8>()),
        contents in prop::array::uniform2(any::<u8>()),
        nonce in any::<u64>(),
        length in any::<u32>(),
    ) {
        let mut block = MessageBlock::new(&prev_hash, &contents, length).unwrap();
        block.set_nonce(Nonce::new(nonce));
        prop_assert_eq!(block.message_len(), 46);
        prop_assert_eq!(
            digest_bytes(&block.hash()),
            reference_digest(&prev_hash, &contents, nonce, length)
        );
    }

    #[test]
    fn digest_matches_reference_for_any_fitting_contents(
        prev_hash in prop::array::uniform32(any::<u8>()),
        contents in prop::collection::vec(any::<u8>(), 0..=MAX_CONTENTS_LEN),
        nonce in any::<u64>(),
        length in any::<u32>(),
    ) {
        let mut block = MessageBlock::new(&prev_hash, &contents, length).unwrap();
        block.set_nonce(Nonce::new(nonce));
        let mut expected = prev_hash.to_vec();
        expected.extend_from_slice(&contents);
        expected.extend_from_slice(&nonce.to_be_bytes());
        expected.extend_from_slice(&length.to_be_bytes());
        prop_assert_eq!(block.message(), expected.as_slice());
        prop_assert_eq!(
            digest_bytes(&block.hash()),
            reference_digest(&prev_hash, &contents, nonce, length)
        );
    }

    #[test]
    fn hashing_is_idempotent(
        prev_hash in prop::array::uniform32(any::<u8>()),
        nonce in any::<u64>(),
    ) {
        let mut block = MessageBlock::new(&prev_hash, b"32", 1).unwrap();
        block.set_nonce(Nonce::new(nonce));
        prop_assert_eq!(block.hash(), block.hash());
    }

    #[test]
    fn difficulty_is_monotone(
        state in prop::array::uniform8(any::<u32>()),
        low in 0u32..128,
        extra in 0u32..128,
    ) {
        let high = low.saturating_add(extra).min(127);
        if passes(&state, high).is_some() {
            prop_assert!(passes(&state, low).is_some());
        }
    }

    #[test]
    fn passing_digest_has_leading_zeros(
        state in prop::array::uniform8(any::<u32>()),
        bits in 0u32..128,
    ) {
        if let Some(digest) = passes(&state, bits) {
            let leading = digest
                .iter()
                .position(|&b| b != 0)
                .map(|i| i as u32 * 8 + digest[i].leading_zeros())
                .unwrap_or(256);
            prop_assert!(leading >= bits);
        }
    }

    #[test]
    fn zeroed_prefix_always_passes(
        mut state in prop::array::uniform8(any::<u32>()),
        bits in 0u32..128,
    ) {
        // Clear exactly the top `bits` bits
        for (index, limb) in state.iter_mut().enumerate() {
            let covered = bits.saturating_sub(index as u32 * 32).min(32);
            if covered == 32 {
                *limb = 0;
            } else if covered > 0 {
                *limb &= u32::MAX >> covered;
            }
        }
        prop_assert!(passes(&state, bits).is_some());
    }

    #[test]
    fn lane_search_is_deterministic(
        start in any::<u64>(),
        stride in 1u64..64,
        lane_id in 0u32..64,
    ) {
        let template = BlockTemplate::new([9; 32], "32", 0).unwrap();
        let batch = SearchBatch::new(start, stride, lane_id, 256);
        let difficulty = Difficulty::from_bits(4);

        let first = search_lane(&mut template.message_block(), &batch, difficulty);
        let second = search_lane(&mut template.message_block(), &batch, difficulty);
        prop_assert_eq!(first, second);

        if let Some((nonce, _)) = first {
            prop_assert!(batch.nonces().any(|candidate| candidate == nonce));
        }
    }
}
