//! Core data type definitions

use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalConfig {
    pub storage: StorageConfig,
    pub session: SessionConfig,
}

/// Which key-value backend the durable store writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// In-process map, lost on exit
    Memory,
    /// One JSON file per key under `data_dir`
    File,
}

impl std::fmt::Display for StorageBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendKind::Memory => write!(f, "memory"),
            StorageBackendKind::File => write!(f, "file"),
        }
    }
}

impl std::str::FromStr for StorageBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageBackendKind::Memory),
            "file" => Ok(StorageBackendKind::File),
            _ => Err(format!("Unknown storage backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    /// Directory for the file backend; a leading `~` is expanded
    pub data_dir: String,
    /// Namespace prepended to every key
    pub key_prefix: String,
    /// Byte quota for the memory backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_bytes: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Role assigned by the simulated authenticator
    pub default_role: String,
    /// Artificial delay before a simulated login completes
    pub simulated_latency_ms: u64,
    /// Upper bound on a single authenticator call
    pub login_timeout_ms: u64,
    /// Durable key mirroring the session token
    pub token_key: String,
    /// Durable key holding the signed-in user profile
    pub user_key: String,
}
