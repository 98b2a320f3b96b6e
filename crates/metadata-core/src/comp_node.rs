//! Compute node (C4): GPU (or CPU) residency plus in-flight load signal.

use metadata_common::Result;

use crate::hash::BlockId;
use crate::pool::BlockPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Prefill,
    Decode,
    Cpu,
}

#[derive(Debug, Clone)]
pub struct BaseInfo {
    pub host: String,
    pub port: u16,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct ComputeNode {
    pub base_info: BaseInfo,
    gpu_pool: BlockPool,
    pub request_count: u64,
}

impl ComputeNode {
    pub fn new(base_info: BaseInfo, capacity: usize, block_size: usize) -> Result<Self> {
        Ok(Self {
            base_info,
            gpu_pool: BlockPool::new(capacity, block_size)?,
            request_count: 0,
        })
    }

    pub fn gpu_pool(&self) -> &BlockPool {
        &self.gpu_pool
    }

    /// Atomic sync: both fields move together, or (on a capacity failure)
    /// neither does.
    pub fn sync(&mut self, request_count: u64, gpu_block_ids: &[BlockId]) -> Result<()> {
        self.gpu_pool.sync(gpu_block_ids)?;
        self.request_count = request_count;
        Ok(())
    }

    pub fn free_blocks(&self) -> usize {
        self.gpu_pool.free_blocks()
    }
}
