//! Scheduler (C6): prefill placement biased by prefix-cache affinity,
//! decode placement by round robin with occasional CPU-hybrid sampling.
//!
//! Stateless except for three monotonic counters (`prefill_rr`,
//! `decode_rr`, `hybrid_sampler`) and each `HostGroup`'s own `rr_counter`.

use std::sync::atomic::{AtomicU64, Ordering};

use metadata_common::{Error, Result};

use crate::hash::BlockId;
use crate::registry::Registry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefillDecision {
    pub cn_host: String,
    pub cn_port: u16,
    pub mn_host: Option<String>,
    pub direct_hybrid_decode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeDecision {
    pub cn_host: String,
    pub cn_port: u16,
    pub mn_host: Option<String>,
}

pub struct Scheduler {
    prefill_rr: AtomicU64,
    decode_rr: AtomicU64,
    hybrid_sampler: AtomicU64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            prefill_rr: AtomicU64::new(0),
            decode_rr: AtomicU64::new(0),
            hybrid_sampler: AtomicU64::new(0),
        }
    }

    /// Host with the strictly largest `check_hits` score over
    /// `registry.prefill_hosts`, in insertion order (ties go to whichever
    /// host was inserted first, since a later equal score never beats a
    /// strictly-greater comparison). `None` if every host scores zero.
    async fn best_prefill_host(&self, registry: &Registry, block_hashes: &[BlockId]) -> Option<String> {
        let hosts = registry.prefill_hosts.read().await;
        let mut best: Option<(String, usize)> = None;
        for (host, group) in hosts.iter() {
            let group = group.read().await;
            let score = group.mem_node.check_hits(block_hashes);
            if score > best.as_ref().map(|(_, s)| *s).unwrap_or(0) {
                best = Some((host.clone(), score));
            }
        }
        best.map(|(host, _)| host)
    }

    pub async fn get_mn_for_prefix_sharing(&self, registry: &Registry, block_hashes: &[BlockId]) -> Option<String> {
        self.best_prefill_host(registry, block_hashes).await
    }

    pub async fn schedule_prefill(&self, registry: &Registry, block_hashes: &[BlockId]) -> Result<PrefillDecision> {
        let best = self.best_prefill_host(registry, block_hashes).await;

        let (cn_host, mn_host) = match best {
            Some(host) => {
                let mn_host = Some(host.clone());
                (host, mn_host)
            }
            None => {
                let hosts = registry.prefill_hosts.read().await;
                if hosts.is_empty() {
                    return Err(Error::NoCapacity("no prefill hosts registered".into()));
                }
                let idx = self.prefill_rr.fetch_add(1, Ordering::Relaxed) as usize % hosts.len();
                let host = hosts.get_index(idx).unwrap().0.clone();
                (host, None)
            }
        };

        let hosts = registry.prefill_hosts.read().await;
        let group = hosts
            .get(&cn_host)
            .ok_or_else(|| Error::Internal(format!("prefill host {cn_host} vanished mid-schedule")))?;
        let cn_port = group.read().await.next_port()?;

        let direct_hybrid_decode = self.hybrid_sampler.fetch_add(1, Ordering::Relaxed) % 100 == 0;

        tracing::debug!(
            cn_host = %cn_host, cn_port, mn_host = ?mn_host, direct_hybrid_decode,
            "scheduled prefill"
        );
        Ok(PrefillDecision { cn_host, cn_port, mn_host, direct_hybrid_decode })
    }

    pub async fn schedule_decode(
        &self,
        registry: &Registry,
        direct_hybrid: bool,
    ) -> Result<DecodeDecision> {
        if direct_hybrid {
            let (host, port) = registry.next_cpu().await?;
            tracing::debug!(cn_host = %host, cn_port = port, "scheduled hybrid decode onto cpu node");
            return Ok(DecodeDecision { cn_host: host, cn_port: port, mn_host: None });
        }

        let hosts = registry.decode_hosts.read().await;
        if hosts.is_empty() {
            return Err(Error::NoCapacity("no decode hosts registered".into()));
        }
        let idx = self.decode_rr.fetch_add(1, Ordering::Relaxed) as usize % hosts.len();
        let (host, group) = hosts.get_index(idx).unwrap();
        let cn_port = group.read().await.next_port()?;
        tracing::debug!(cn_host = %host, cn_port, "scheduled gpu decode");
        Ok(DecodeDecision { cn_host: host.clone(), cn_port, mn_host: Some(host.clone()) })
    }

    pub async fn memory_hit_rate(&self, registry: &Registry) -> f64 {
        registry.memory_hit_rate().await
    }
}
