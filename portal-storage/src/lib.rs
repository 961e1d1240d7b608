//! Portal Storage - durable key-value persistence
//!
//! Raw string backends sit behind [`KeyValueBackend`]. [`DurableStore`] layers
//! JSON serialization and namespacing on top and contains every failure:
//! reads fall back to a caller-supplied value, writes and removals are logged
//! and dropped. [`PersistedValue`] binds one key to an in-memory value.

pub mod backend;
pub mod durable;
pub mod file;
pub mod memory;
pub mod persisted;

pub use backend::KeyValueBackend;
pub use durable::DurableStore;
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use persisted::PersistedValue;

use portal_core::{ErrorContext, PortalError, StorageBackendKind, StorageConfig};
use std::sync::Arc;
use tracing::info;

/// Storage-level error type
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage quota exceeded: {needed} bytes needed, quota is {quota} bytes")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Invalid key: {key:?}")]
    InvalidKey { key: String },

    #[error("Storage backend lock poisoned")]
    Poisoned,
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for PortalError {
    fn from(err: StorageError) -> Self {
        let context = match &err {
            StorageError::QuotaExceeded { .. } => ErrorContext::new("storage")
                .with_suggestion("Remove unused keys or raise storage.quota_bytes"),
            StorageError::Io(_) => ErrorContext::new("storage")
                .with_suggestion("Check that storage.data_dir exists and is writable"),
            _ => ErrorContext::new("storage"),
        };
        PortalError::Storage {
            message: err.to_string(),
            source: Some(Box::new(err)),
            context,
        }
    }
}

/// Open the backend selected by configuration
pub fn open_backend(config: &StorageConfig) -> StorageResult<Arc<dyn KeyValueBackend>> {
    let backend: Arc<dyn KeyValueBackend> = match config.backend {
        StorageBackendKind::Memory => Arc::new(MemoryBackend::with_quota(config.quota_bytes)),
        StorageBackendKind::File => Arc::new(FileBackend::new(config.resolved_data_dir())?),
    };
    info!(backend = %config.backend, "Opened storage backend");
    Ok(backend)
}
