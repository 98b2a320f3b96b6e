//! Topology registry (C5): per-host grouping of one memory node with zero
//! or more compute nodes, per role, plus a flat set of CPU compute nodes.
//!
//! Lock discipline: each `HostGroup` carries its own reader-writer lock
//! protecting its memory node, its compute-node map, and its round-robin
//! counter together. The top-level host maps are guarded by a coarser lock
//! taken only for add/remove; scheduling scans take a read lock on the
//! top-level map and then per-HostGroup locks, always in that order, to
//! avoid deadlock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use metadata_common::{Error, Result};
use tokio::sync::RwLock;

use crate::comp_node::{BaseInfo, ComputeNode, Role};
use crate::hash::BlockId;
use crate::mem_node::{MemoryNode, NodeKind};

pub struct HostGroup {
    pub host: String,
    pub mem_node: MemoryNode,
    pub comp_nodes: IndexMap<u16, ComputeNode>,
    pub rr_counter: AtomicUsize,
}

impl HostGroup {
    fn new(host: String, mem_node: MemoryNode) -> Self {
        Self {
            host,
            mem_node,
            comp_nodes: IndexMap::new(),
            rr_counter: AtomicUsize::new(0),
        }
    }

    /// Picks the next compute port by round robin. `NoCapacity` if the
    /// group has no compute nodes.
    pub fn next_port(&self) -> Result<u16> {
        if self.comp_nodes.is_empty() {
            return Err(Error::NoCapacity(format!(
                "host {} has no compute nodes",
                self.host
            )));
        }
        let idx = self.rr_counter.fetch_add(1, Ordering::Relaxed) % self.comp_nodes.len();
        Ok(*self.comp_nodes.get_index(idx).unwrap().0)
    }
}

struct CpuEntry {
    host: String,
    port: u16,
    node: ComputeNode,
}

pub struct Registry {
    pub prefill_hosts: RwLock<IndexMap<String, Arc<RwLock<HostGroup>>>>,
    pub decode_hosts: RwLock<IndexMap<String, Arc<RwLock<HostGroup>>>>,
    cpu_nodes: RwLock<Vec<CpuEntry>>,
    cpu_rr: AtomicUsize,
    block_size: usize,
}

impl Registry {
    pub fn new(block_size: usize) -> Self {
        Self {
            prefill_hosts: RwLock::new(IndexMap::new()),
            decode_hosts: RwLock::new(IndexMap::new()),
            cpu_nodes: RwLock::new(Vec::new()),
            cpu_rr: AtomicUsize::new(0),
            block_size,
        }
    }

    fn hosts_for(&self, kind: NodeKind) -> &RwLock<IndexMap<String, Arc<RwLock<HostGroup>>>> {
        match kind {
            NodeKind::Prefill => &self.prefill_hosts,
            NodeKind::Decode => &self.decode_hosts,
        }
    }

    pub async fn add_memory_node(&self, host: &str, kind: NodeKind, capacity: usize) -> Result<()> {
        let mut hosts = self.hosts_for(kind).write().await;
        if hosts.contains_key(host) {
            return Err(Error::AlreadyExists(format!(
                "memory node for host {host} ({kind:?}) already registered"
            )));
        }
        let mem_node = MemoryNode::new(kind, capacity, self.block_size)?;
        hosts.insert(host.to_string(), Arc::new(RwLock::new(HostGroup::new(host.to_string(), mem_node))));
        tracing::info!(host, ?kind, capacity, "registered memory node");
        Ok(())
    }

    pub async fn add_compute_node(&self, host: &str, port: u16, role: Role, capacity: usize) -> Result<()> {
        match role {
            Role::Prefill | Role::Decode => {
                let kind = match role {
                    Role::Prefill => NodeKind::Prefill,
                    Role::Decode => NodeKind::Decode,
                    Role::Cpu => unreachable!(),
                };
                let hosts = self.hosts_for(kind).read().await;
                let group = hosts.get(host).ok_or_else(|| {
                    Error::PreconditionFailed(format!(
                        "memory node for host {host} must be registered before its compute node"
                    ))
                })?;
                let mut group = group.write().await;
                let base = BaseInfo { host: host.to_string(), port, role };
                let node = ComputeNode::new(base, capacity, self.block_size)?;
                group.comp_nodes.insert(port, node);
                tracing::info!(host, port, ?role, capacity, "registered compute node");
                Ok(())
            }
            Role::Cpu => {
                let base = BaseInfo { host: host.to_string(), port, role: Role::Cpu };
                let node = ComputeNode::new(base, capacity, self.block_size)?;
                let mut cpus = self.cpu_nodes.write().await;
                cpus.push(CpuEntry { host: host.to_string(), port, node });
                tracing::info!(host, port, capacity, "registered cpu compute node");
                Ok(())
            }
        }
    }

    pub async fn sync_memory(&self, host: &str, kind: NodeKind, ids: &[BlockId]) -> Result<usize> {
        let hosts = self.hosts_for(kind).read().await;
        let group = hosts
            .get(host)
            .ok_or_else(|| Error::NotFound(format!("memory node {kind:?} at host {host} not found")))?
            .clone();
        drop(hosts);
        let mut group = group.write().await;
        group.mem_node.sync(ids)?;
        Ok(group.mem_node.pool().held_count())
    }

    pub async fn add_blocks_to_memory(&self, host: &str, kind: NodeKind, ids: &[BlockId]) -> Result<usize> {
        let hosts = self.hosts_for(kind).read().await;
        let group = hosts
            .get(host)
            .ok_or_else(|| Error::NotFound(format!("memory node {kind:?} at host {host} not found")))?
            .clone();
        drop(hosts);
        let mut group = group.write().await;
        group.mem_node.add_blocks(ids)?;
        Ok(group.mem_node.pool().held_count())
    }

    pub async fn sync_compute(
        &self,
        host: &str,
        port: u16,
        role: Role,
        request_count: u64,
        gpu_block_ids: &[BlockId],
    ) -> Result<()> {
        match role {
            Role::Prefill | Role::Decode => {
                let kind = match role {
                    Role::Prefill => NodeKind::Prefill,
                    Role::Decode => NodeKind::Decode,
                    Role::Cpu => unreachable!(),
                };
                let hosts = self.hosts_for(kind).read().await;
                let group = hosts
                    .get(host)
                    .ok_or_else(|| Error::NotFound(format!("compute node {role:?} at {host}:{port} not found")))?
                    .clone();
                drop(hosts);
                let mut group = group.write().await;
                let node = group
                    .comp_nodes
                    .get_mut(&port)
                    .ok_or_else(|| Error::NotFound(format!("compute node {role:?} at {host}:{port} not found")))?;
                node.sync(request_count, gpu_block_ids)
            }
            Role::Cpu => {
                let mut cpus = self.cpu_nodes.write().await;
                let entry = cpus
                    .iter_mut()
                    .find(|e| e.host == host && e.port == port)
                    .ok_or_else(|| Error::NotFound(format!("compute node cpu at {host}:{port} not found")))?;
                entry.node.sync(request_count, gpu_block_ids)
            }
        }
    }

    pub async fn remove_host(&self, host: &str, kind: NodeKind) -> Result<()> {
        let mut hosts = self.hosts_for(kind).write().await;
        hosts
            .shift_remove(host)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("host {host} ({kind:?}) not found")))
    }

    pub async fn remove_compute_node(&self, host: &str, port: u16, role: Role) -> Result<()> {
        match role {
            Role::Prefill | Role::Decode => {
                let kind = match role {
                    Role::Prefill => NodeKind::Prefill,
                    Role::Decode => NodeKind::Decode,
                    Role::Cpu => unreachable!(),
                };
                let hosts = self.hosts_for(kind).read().await;
                let group = hosts
                    .get(host)
                    .ok_or_else(|| Error::NotFound(format!("compute node {role:?} at {host}:{port} not found")))?
                    .clone();
                drop(hosts);
                let mut group = group.write().await;
                group
                    .comp_nodes
                    .shift_remove(&port)
                    .map(|_| ())
                    .ok_or_else(|| Error::NotFound(format!("compute node {role:?} at {host}:{port} not found")))
            }
            Role::Cpu => {
                let mut cpus = self.cpu_nodes.write().await;
                let before = cpus.len();
                cpus.retain(|e| !(e.host == host && e.port == port));
                if cpus.len() == before {
                    Err(Error::NotFound(format!("cpu compute node at {host}:{port} not found")))
                } else {
                    Ok(())
                }
            }
        }
    }

    pub async fn cpu_node_count(&self) -> usize {
        self.cpu_nodes.read().await.len()
    }

    pub async fn next_cpu(&self) -> Result<(String, u16)> {
        let cpus = self.cpu_nodes.read().await;
        if cpus.is_empty() {
            return Err(Error::NoCapacity("no cpu compute nodes registered".into()));
        }
        let idx = self.cpu_rr.fetch_add(1, Ordering::Relaxed) % cpus.len();
        let entry = &cpus[idx];
        Ok((entry.host.clone(), entry.port))
    }

    /// Fleet-wide fraction of `check_hits` probes that found at least the
    /// requested block set, aggregated over every registered memory node.
    pub async fn memory_hit_rate(&self) -> f64 {
        let mut num_fetch = 0u64;
        let mut fetch_hits = 0u64;
        for hosts in [&self.prefill_hosts, &self.decode_hosts] {
            let hosts = hosts.read().await;
            for group in hosts.values() {
                let group = group.read().await;
                num_fetch += group.mem_node.hit_statistics.num_fetch();
                fetch_hits += group.mem_node.hit_statistics.fetch_hits();
            }
        }
        if num_fetch == 0 {
            0.0
        } else {
            fetch_hits as f64 / num_fetch as f64
        }
    }

    pub async fn prefill_host_count(&self) -> usize {
        self.prefill_hosts.read().await.len()
    }

    pub async fn decode_host_count(&self) -> usize {
        self.decode_hosts.read().await.len()
    }
}
