use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use metadata_core::{NodeKind, Role};

use crate::error::ApiResult;
use crate::wire::*;
use crate::AppState;

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.registry.prefill_host_count().await > 0
        && (state.registry.decode_host_count().await > 0 || state.registry.cpu_node_count().await > 0);
    if ready {
        ([("content-type", "text/plain")], "ready")
    } else {
        ([("content-type", "text/plain")], "not-ready")
    }
}

pub async fn metrics() -> impl IntoResponse {
    use prometheus::{Encoder, TextEncoder};
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    ([("content-type", encoder.format_type().to_string())], buffer)
}

pub async fn server_stats(State(state): State<AppState>) -> Json<ServerStats> {
    let prefill = state.registry.prefill_host_count().await;
    let decode = state.registry.decode_host_count().await;
    let cpu = state.registry.cpu_node_count().await;
    Json(ServerStats {
        compnode_count: prefill + decode + cpu,
        mempool_count: prefill + decode,
    })
}

pub async fn add_compnode(
    State(state): State<AppState>,
    Json(req): Json<AddCompNode>,
) -> ApiResult<Json<StatusResponse>> {
    tracing::info!(target: "api", host = %req.host, port = req.port, role = ?req.role, "add_compnode");
    state
        .registry
        .add_compute_node(&req.host, req.port, req.role.into(), req.num_gpu_blocks)
        .await?;
    Ok(Json(StatusResponse::ok()))
}

pub async fn add_memnode(
    State(state): State<AppState>,
    Json(req): Json<AddMemNode>,
) -> ApiResult<Json<StatusResponse>> {
    tracing::info!(target: "api", host = %req.host, node_type = ?req.node_type, "add_memnode");
    state
        .registry
        .add_memory_node(&req.host, req.node_type.into(), req.num_blocks)
        .await?;
    Ok(Json(StatusResponse::ok()))
}

pub async fn schedule_prefill(
    State(state): State<AppState>,
    Json(req): Json<SchedulePrefillRequest>,
) -> ApiResult<Json<DataEnvelope<PrefillData>>> {
    state.schedule_prefill_total.inc();
    let timer = state.schedule_latency_seconds.start_timer();
    let decision = state.scheduler.schedule_prefill(&state.registry, &req.block_hashes).await?;
    timer.observe_duration();
    if decision.direct_hybrid_decode {
        state.hybrid_decode_total.inc();
    }
    tracing::debug!(target: "api", cn_host = %decision.cn_host, cn_port = decision.cn_port, "schedule_prefill decision");
    Ok(Json(DataEnvelope {
        data: PrefillData {
            cn_host: decision.cn_host,
            cn_port: decision.cn_port,
            mn_host: decision.mn_host,
            direct_hybrid_decode: decision.direct_hybrid_decode,
        },
    }))
}

pub async fn schedule_decode(
    State(state): State<AppState>,
    Json(req): Json<ScheduleDecodeRequest>,
) -> ApiResult<Json<DataEnvelope<DecodeData>>> {
    state.schedule_decode_total.inc();
    let timer = state.schedule_latency_seconds.start_timer();
    let decision = state.scheduler.schedule_decode(&state.registry, req.direct_hybrid).await?;
    timer.observe_duration();
    tracing::debug!(target: "api", cn_host = %decision.cn_host, cn_port = decision.cn_port, "schedule_decode decision");
    Ok(Json(DataEnvelope {
        data: DecodeData { cn_host: decision.cn_host, cn_port: decision.cn_port, mn_host: decision.mn_host },
    }))
}

pub async fn get_mn_for_prefix_sharing(
    State(state): State<AppState>,
    Json(req): Json<GetMnForPrefixSharing>,
) -> Json<DataEnvelope<MnForPrefixSharingData>> {
    let mn_host = state.scheduler.get_mn_for_prefix_sharing(&state.registry, &req.block_hashes).await;
    Json(DataEnvelope { data: MnForPrefixSharingData { mn_host } })
}

pub async fn sync_compnode(
    State(state): State<AppState>,
    Json(data): Json<CompNodeSync>,
) -> ApiResult<Json<StatusResponse>> {
    state
        .registry
        .sync_compute(&data.host, data.port, data.role.into(), data.request_count, &data.gpu_blocks)
        .await?;
    Ok(Json(StatusResponse::ok()))
}

pub async fn sync_memnode(
    State(state): State<AppState>,
    Json(data): Json<MemNodeSync>,
) -> ApiResult<Json<StatusResponse>> {
    let kind: NodeKind = data.node_type.into();
    let held = state.registry.sync_memory(&data.host, kind, &data.block_hashes).await?;
    Ok(Json(StatusResponse { status: format!("{held} cached blocks now") }))
}

pub async fn add_blocks_to_mempool(
    State(state): State<AppState>,
    Json(data): Json<MemNodeSync>,
) -> ApiResult<Json<StatusResponse>> {
    let kind: NodeKind = data.node_type.into();
    let held = state.registry.add_blocks_to_memory(&data.host, kind, &data.block_hashes).await?;
    Ok(Json(StatusResponse { status: format!("{held} cached blocks now") }))
}

pub async fn mempool_hits(State(state): State<AppState>) -> Json<HitsResponse> {
    let ratio = state.scheduler.memory_hit_rate(&state.registry).await;
    Json(HitsResponse { ret: ratio })
}

pub async fn remove_compnode(
    State(state): State<AppState>,
    Json(req): Json<RemoveCompNode>,
) -> ApiResult<Json<StatusResponse>> {
    let role: Role = req.role.into();
    state.registry.remove_compute_node(&req.host, req.port, role).await?;
    Ok(Json(StatusResponse::ok()))
}

pub async fn remove_memnode(
    State(state): State<AppState>,
    Json(req): Json<RemoveMemNode>,
) -> ApiResult<Json<StatusResponse>> {
    let kind: NodeKind = req.node_type.into();
    state.registry.remove_host(&req.host, kind).await?;
    Ok(Json(StatusResponse::ok()))
}
