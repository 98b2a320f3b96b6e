//! Content-addressable block hashing (C1).
//!
//! A chained SHA-256 hash over fixed-size token blocks: block *i*'s id
//! commits to the id of block *i-1*, so membership of the *i*-th id in a
//! pool implies the pool holds the same token prefix up through block *i*.
//! That's what lets `BlockPool::block_hits` be an O(n) set probe instead of
//! an O(n*block_size) token comparison.

use sha2::{Digest, Sha256};

pub type BlockId = u64;

/// Sentinel standing in for "no previous block" when hashing block 0.
const NO_PREV: BlockId = 0;

/// Hashes one block given the id of the previous block in the chain.
///
/// `is_first` must be `true` only for the very first block of a sequence —
/// it, along with `prev`, is folded into the digest so that a sequence
/// starting with the same tokens as another but at a different chain
/// position never collides.
pub fn hash_block(prev: BlockId, is_first: bool, tokens: &[i64]) -> BlockId {
    let mut text = String::with_capacity(tokens.len() * 8 + 16);
    text.push_str(if is_first { "1" } else { "0" });
    text.push('|');
    text.push_str(&prev.to_string());
    for t in tokens {
        text.push('|');
        text.push_str(&t.to_string());
    }

    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut high = [0u8; 8];
    high.copy_from_slice(&digest[0..8]);
    BlockId::from_be_bytes(high)
}

/// Hashes `tokens` into one `BlockId` per full block of `block_size`
/// tokens. A trailing partial block is discarded. Deterministic across
/// processes, architectures, and runs.
pub fn hash_sequence(tokens: &[i64], block_size: usize) -> Vec<BlockId> {
    assert!(block_size > 0, "block_size must be > 0");
    let num_blocks = tokens.len() / block_size;
    let mut ids = Vec::with_capacity(num_blocks);
    let mut prev = NO_PREV;
    for i in 0..num_blocks {
        let slice = &tokens[i * block_size..(i + 1) * block_size];
        let id = hash_block(prev, i == 0, slice);
        ids.push(id);
        prev = id;
    }
    ids
}
