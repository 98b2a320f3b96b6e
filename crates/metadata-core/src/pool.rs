//! Block pool accounting (C2): a capacity-bounded set of block ids shared
//! by memory nodes (CPU cache) and compute nodes (GPU residency).

use std::collections::HashSet;

use metadata_common::{Error, Result};

use crate::hash::{hash_sequence, BlockId};

#[derive(Debug, Clone)]
pub struct BlockPool {
    capacity: usize,
    block_size: usize,
    held: HashSet<BlockId>,
}

impl BlockPool {
    pub fn new(capacity: usize, block_size: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidArgument("capacity must be > 0".into()));
        }
        if block_size == 0 {
            return Err(Error::InvalidArgument("block_size must be > 0".into()));
        }
        Ok(Self {
            capacity,
            block_size,
            held: HashSet::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    /// Replaces the held set with `ids`. Fails (leaving the pool untouched)
    /// if the resulting set would exceed capacity.
    pub fn sync(&mut self, ids: &[BlockId]) -> Result<()> {
        let candidate: HashSet<BlockId> = ids.iter().copied().collect();
        if candidate.len() > self.capacity {
            return Err(Error::NoCapacity(format!(
                "sync of {} distinct blocks exceeds capacity {}",
                candidate.len(),
                self.capacity
            )));
        }
        self.held = candidate;
        Ok(())
    }

    /// Unions `ids` into the held set. Fails (leaving the pool untouched)
    /// if the union would exceed capacity.
    pub fn add_blocks(&mut self, ids: &[BlockId]) -> Result<()> {
        let mut candidate = self.held.clone();
        candidate.extend(ids.iter().copied());
        if candidate.len() > self.capacity {
            return Err(Error::NoCapacity(format!(
                "add_blocks would grow to {} distinct blocks, capacity {}",
                candidate.len(),
                self.capacity
            )));
        }
        self.held = candidate;
        Ok(())
    }

    /// Removes each id in `ids`. All-or-nothing: if any id is missing, the
    /// pool is left unchanged and `NotFound` is returned.
    pub fn delete_blocks(&mut self, ids: &[BlockId]) -> Result<()> {
        for id in ids {
            if !self.held.contains(id) {
                return Err(Error::NotFound(format!("block {id} not held")));
            }
        }
        for id in ids {
            self.held.remove(id);
        }
        Ok(())
    }

    pub fn free_blocks(&self) -> usize {
        self.capacity - self.held.len()
    }

    /// Longest-known-prefix: the largest `k` such that `ids[0..k)` are all
    /// held. Ordered, as opposed to `MemoryNode::check_hits`'s unordered
    /// intersection count.
    pub fn block_hits(&self, ids: &[BlockId]) -> usize {
        let mut k = 0;
        for id in ids {
            if self.held.contains(id) {
                k += 1;
            } else {
                break;
            }
        }
        k
    }

    pub fn sequence_hits(&self, tokens: &[i64], block_size: usize) -> usize {
        let ids = hash_sequence(tokens, block_size);
        self.block_hits(&ids)
    }

    /// Unordered intersection count between `ids` and the held set. Used by
    /// `MemoryNode::check_hits` for fleet-wide affinity scoring.
    pub fn intersection_count(&self, ids: &[BlockId]) -> usize {
        ids.iter().filter(|id| self.held.contains(id)).count()
    }
}
