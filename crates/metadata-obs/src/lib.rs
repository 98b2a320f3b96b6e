//! Observability: registry-population gauges refreshed on a background
//! tick, ported from the teacher's GPU-metrics polling pattern but fed by
//! the topology registry instead of NVML.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use prometheus::{Gauge, IntGauge};

use metadata_core::{Registry, Scheduler};

static PREFILL_HOSTS: Lazy<IntGauge> = Lazy::new(|| {
    prometheus::register_int_gauge!("metadata_prefill_hosts", "Registered prefill hosts").unwrap()
});
static DECODE_HOSTS: Lazy<IntGauge> = Lazy::new(|| {
    prometheus::register_int_gauge!("metadata_decode_hosts", "Registered decode hosts").unwrap()
});
static CPU_NODES: Lazy<IntGauge> = Lazy::new(|| {
    prometheus::register_int_gauge!("metadata_cpu_nodes", "Registered CPU compute nodes").unwrap()
});
static MEMPOOL_HIT_RATE: Lazy<Gauge> = Lazy::new(|| {
    prometheus::register_gauge!("metadata_mempool_hit_rate", "Fleet-wide memory-node hit rate").unwrap()
});

pub fn init() {
    // Touch statics to force registration before the first scrape.
    let _ = &*PREFILL_HOSTS;
    let _ = &*DECODE_HOSTS;
    let _ = &*CPU_NODES;
    let _ = &*MEMPOOL_HIT_RATE;
}

/// Refreshes the registry-population gauges and the mempool hit-rate gauge
/// from current state. Cheap enough to call from a request handler as well
/// as from the background poller.
pub async fn refresh(registry: &Registry, scheduler: &Scheduler) {
    PREFILL_HOSTS.set(registry.prefill_host_count().await as i64);
    DECODE_HOSTS.set(registry.decode_host_count().await as i64);
    CPU_NODES.set(registry.cpu_node_count().await as i64);
    MEMPOOL_HIT_RATE.set(scheduler.memory_hit_rate(registry).await);
}

pub fn spawn_registry_polling(registry: Arc<Registry>, scheduler: Arc<Scheduler>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(5));
        loop {
            ticker.tick().await;
            refresh(&registry, &scheduler).await;
        }
    });
}
