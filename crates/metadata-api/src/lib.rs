//! Control surface (C7): translates the external JSON-over-HTTP API into
//! `metadata-core` registry/scheduler operations.

mod error;
mod handlers;
mod wire;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use once_cell::sync::Lazy;
use prometheus::{Histogram, IntCounter};

use metadata_common::config::ServerConfig;
use metadata_core::{Registry, Scheduler};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub scheduler: Arc<Scheduler>,
    schedule_prefill_total: &'static IntCounter,
    schedule_decode_total: &'static IntCounter,
    hybrid_decode_total: &'static IntCounter,
    schedule_latency_seconds: &'static Histogram,
}

// Registered once per process via `Lazy`, not per `app_with_config` call —
// the global prometheus registry panics on a second registration of the
// same metric name, which a test binary spawning several apps would hit.
static SCHEDULE_PREFILL_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    prometheus::register_int_counter!("metadata_schedule_prefill_total", "Total schedule_prefill requests")
        .expect("counter")
});
static SCHEDULE_DECODE_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    prometheus::register_int_counter!("metadata_schedule_decode_total", "Total schedule_decode requests")
        .expect("counter")
});
static HYBRID_DECODE_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    prometheus::register_int_counter!(
        "metadata_hybrid_decode_total",
        "Total prefill schedules that signalled direct hybrid decode"
    )
    .expect("counter")
});
static SCHEDULE_LATENCY_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    prometheus::register_histogram!("metadata_schedule_latency_seconds", "Latency of scheduling decisions")
        .expect("histogram")
});

pub fn app() -> Router {
    app_with_config(ServerConfig::load())
}

pub fn app_with_config(config: ServerConfig) -> Router {
    metadata_obs::init();

    let registry = Arc::new(Registry::new(config.block_size));
    let scheduler = Arc::new(Scheduler::new());
    metadata_obs::spawn_registry_polling(registry.clone(), scheduler.clone());

    let state = AppState {
        registry,
        scheduler,
        schedule_prefill_total: &SCHEDULE_PREFILL_TOTAL,
        schedule_decode_total: &SCHEDULE_DECODE_TOTAL,
        hybrid_decode_total: &HYBRID_DECODE_TOTAL,
        schedule_latency_seconds: &SCHEDULE_LATENCY_SECONDS,
    };

    Router::new()
        .route("/", get(handlers::server_stats))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .route("/metrics", get(handlers::metrics))
        .route("/compnode/add_node", post(handlers::add_compnode))
        .route("/mempool/add_node", post(handlers::add_memnode))
        .route("/compnode/schedule_prefill", post(handlers::schedule_prefill))
        .route("/compnode/schedule_decode", post(handlers::schedule_decode))
        .route("/mempool/get_mn", post(handlers::get_mn_for_prefix_sharing))
        .route("/compnode/sync", put(handlers::sync_compnode))
        .route("/mempool/sync", put(handlers::sync_memnode))
        .route("/mempool/blocks", post(handlers::add_blocks_to_mempool))
        .route("/mempool/hits", post(handlers::mempool_hits))
        .route("/compnode/remove_node", delete(handlers::remove_compnode))
        .route("/mempool/remove_node", delete(handlers::remove_memnode))
        .with_state(state)
}
