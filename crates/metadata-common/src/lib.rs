pub type Result<T> = core::result::Result<T, Error>;

/// Wire-neutral error taxonomy for the control plane. `metadata-api` maps
/// each variant to the HTTP status described in the external interface.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("no capacity: {0}")]
    NoCapacity(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "NotFound",
            Error::AlreadyExists(_) => "AlreadyExists",
            Error::PreconditionFailed(_) => "PreconditionFailed",
            Error::NoCapacity(_) => "NoCapacity",
            Error::InvalidArgument(_) => "InvalidArgument",
            Error::Internal(_) => "Internal",
        }
    }
}

pub mod config {
    use serde::Deserialize;
    use std::env;

    #[derive(Debug, Clone, Deserialize)]
    pub struct ServerConfig {
        pub block_size: usize,
        pub bind_addr: String,
        pub port: u16,
    }

    impl Default for ServerConfig {
        fn default() -> Self {
            Self {
                block_size: 16,
                bind_addr: "0.0.0.0".to_string(),
                port: 6666,
            }
        }
    }

    impl ServerConfig {
        pub fn load() -> Self {
            if let Ok(path) = env::var("RUNNER_CONFIG") {
                let Ok(text) = std::fs::read_to_string(path) else { return Self::default() };
                let Ok(cfg) = serde_yaml::from_str::<ServerConfig>(&text) else { return Self::default() };
                return cfg;
            }
            let mut cfg = Self::default();
            if let Some(v) = env::var("RUNNER_BLOCK_SIZE").ok().and_then(|v| v.parse().ok()) {
                cfg.block_size = v;
            }
            if let Ok(addr) = env::var("RUNNER_BIND_ADDR") {
                cfg.bind_addr = addr;
            }
            if let Some(v) = env::var("RUNNER_PORT").ok().and_then(|v| v.parse().ok()) {
                cfg.port = v;
            }
            cfg
        }
    }
}
