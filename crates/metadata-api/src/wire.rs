//! JSON request/response bodies for the control-plane HTTP API, matching
//! the external interface table.

use metadata_core::{BlockId, NodeKind, Role};
use serde::{Deserialize, Deserializer, Serialize};

/// `HostId` is opaque on the wire — either a JSON string or a JSON number —
/// normalized to a `String` internally.
pub fn deserialize_host_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HostIdWire {
        Str(String),
        Num(i64),
    }
    match HostIdWire::deserialize(deserializer)? {
        HostIdWire::Str(s) => Ok(s),
        HostIdWire::Num(n) => Ok(n.to_string()),
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    Prefill,
    Decode,
    Cpu,
}

impl From<WireRole> for Role {
    fn from(r: WireRole) -> Self {
        match r {
            WireRole::Prefill => Role::Prefill,
            WireRole::Decode => Role::Decode,
            WireRole::Cpu => Role::Cpu,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WireNodeType {
    Prefill,
    Decode,
}

impl From<WireNodeType> for NodeKind {
    fn from(k: WireNodeType) -> Self {
        match k {
            WireNodeType::Prefill => NodeKind::Prefill,
            WireNodeType::Decode => NodeKind::Decode,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddCompNode {
    #[serde(deserialize_with = "deserialize_host_id")]
    pub host: String,
    pub port: u16,
    pub role: WireRole,
    pub num_gpu_blocks: usize,
}

#[derive(Debug, Deserialize)]
pub struct AddMemNode {
    #[serde(deserialize_with = "deserialize_host_id")]
    pub host: String,
    pub node_type: WireNodeType,
    pub num_blocks: usize,
}

#[derive(Debug, Deserialize)]
pub struct SchedulePrefillRequest {
    pub block_hashes: Vec<BlockId>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleDecodeRequest {
    pub block_hashes: Vec<BlockId>,
    #[serde(default)]
    pub direct_hybrid: bool,
}

#[derive(Debug, Serialize)]
pub struct PrefillData {
    pub cn_host: String,
    pub cn_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mn_host: Option<String>,
    pub direct_hybrid_decode: bool,
}

#[derive(Debug, Serialize)]
pub struct DecodeData {
    pub cn_host: String,
    pub cn_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mn_host: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "success".to_string() }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompNodeSync {
    #[serde(deserialize_with = "deserialize_host_id")]
    pub host: String,
    pub port: u16,
    pub role: WireRole,
    pub request_count: u64,
    pub gpu_blocks: Vec<BlockId>,
}

#[derive(Debug, Deserialize)]
pub struct MemNodeSync {
    #[serde(deserialize_with = "deserialize_host_id")]
    pub host: String,
    pub node_type: WireNodeType,
    pub block_hashes: Vec<BlockId>,
}

#[derive(Debug, Serialize)]
pub struct HitsResponse {
    pub ret: f64,
}

#[derive(Debug, Serialize)]
pub struct ServerStats {
    pub compnode_count: usize,
    pub mempool_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct GetMnForPrefixSharing {
    pub block_hashes: Vec<BlockId>,
}

#[derive(Debug, Serialize)]
pub struct MnForPrefixSharingData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mn_host: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveCompNode {
    #[serde(deserialize_with = "deserialize_host_id")]
    pub host: String,
    pub port: u16,
    pub role: WireRole,
}

#[derive(Debug, Deserialize)]
pub struct RemoveMemNode {
    #[serde(deserialize_with = "deserialize_host_id")]
    pub host: String,
    pub node_type: WireNodeType,
}
