//! Memory node (C3): a host's KV-cache repository.

use std::sync::atomic::{AtomicU64, Ordering};

use metadata_common::Result;

use crate::hash::BlockId;
use crate::pool::BlockPool;

/// Fetch/hit counters for `MemoryNode::check_hits`. Atomic so a scheduling
/// scan over many hosts (scheduler.rs's `best_prefill_host`) can take a
/// read lock on each `HostGroup` instead of a write lock — scanning and hit
/// queries are readers per the concurrency model, not writers.
#[derive(Debug, Default)]
pub struct HitStatistics {
    num_fetch: AtomicU64,
    fetch_hits: AtomicU64,
}

impl HitStatistics {
    fn update(&self, num_fetch: usize, fetch_hits: usize) {
        self.num_fetch.fetch_add(num_fetch as u64, Ordering::Relaxed);
        self.fetch_hits.fetch_add(fetch_hits as u64, Ordering::Relaxed);
    }

    pub fn num_fetch(&self) -> u64 {
        self.num_fetch.load(Ordering::Relaxed)
    }

    pub fn fetch_hits(&self) -> u64 {
        self.fetch_hits.load(Ordering::Relaxed)
    }

    pub fn ratio(&self) -> f64 {
        let num_fetch = self.num_fetch();
        if num_fetch == 0 {
            0.0
        } else {
            self.fetch_hits() as f64 / num_fetch as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Prefill,
    Decode,
}

#[derive(Debug)]
pub struct MemoryNode {
    pub kind: NodeKind,
    pool: BlockPool,
    pub hit_statistics: HitStatistics,
}

impl MemoryNode {
    pub fn new(kind: NodeKind, capacity: usize, block_size: usize) -> Result<Self> {
        Ok(Self {
            kind,
            pool: BlockPool::new(capacity, block_size)?,
            hit_statistics: HitStatistics::default(),
        })
    }

    pub fn pool(&self) -> &BlockPool {
        &self.pool
    }

    pub fn sync(&mut self, ids: &[BlockId]) -> Result<()> {
        self.pool.sync(ids)
    }

    pub fn add_blocks(&mut self, ids: &[BlockId]) -> Result<()> {
        self.pool.add_blocks(ids)
    }

    pub fn delete_blocks(&mut self, ids: &[BlockId]) -> Result<()> {
        self.pool.delete_blocks(ids)
    }

    /// Unordered intersection count between `ids` and the cached set. This
    /// is the fleet-affinity signal the scheduler ranks hosts by — distinct
    /// from `BlockPool::block_hits`'s ordered longest-prefix measure used
    /// inside a single GPU pool. Takes `&self`: the hit counters are atomic,
    /// so probing a pool's membership doesn't require exclusive access.
    pub fn check_hits(&self, ids: &[BlockId]) -> usize {
        let hit_count = self.pool.intersection_count(ids);
        self.hit_statistics.update(ids.len(), hit_count);
        hit_count
    }
}
