//! Durable Store - typed, failure-safe access to a key-value backend
//!
//! The non-`try_` methods never return errors: reads degrade to the
//! caller's fallback and writes degrade to a logged no-op, so a full or
//! broken store can only cost persistence, never the caller's state change.

use crate::{open_backend, KeyValueBackend, MemoryBackend, StorageResult};
use portal_core::StorageConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// JSON key-value shim over a shared backend
#[derive(Clone)]
pub struct DurableStore {
    backend: Arc<dyn KeyValueBackend>,
    prefix: String,
}

impl std::fmt::Debug for DurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl DurableStore {
    /// Wrap a backend, namespacing every key with `prefix`
    pub fn new(backend: Arc<dyn KeyValueBackend>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    /// Store backed by a fresh unbounded [`MemoryBackend`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()), "")
    }

    /// Open the configured backend and namespace
    pub fn from_config(config: &StorageConfig) -> StorageResult<Self> {
        Ok(Self::new(open_backend(config)?, config.key_prefix.clone()))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueBackend> {
        &self.backend
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Read and deserialize `key`; `Ok(None)` when absent
    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.backend.get_item(&self.full_key(key))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Read `key`, returning `fallback` when absent, unreadable or corrupt
    pub fn get<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        match self.try_get(key) {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(key = key, "Key not set, using fallback");
                fallback
            }
            Err(e) => {
                warn!(key = key, error = %e, "Failed to read stored value, using fallback");
                fallback
            }
        }
    }

    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.get(key, T::default())
    }

    /// Serialize and store `value` under `key`
    pub fn try_set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let raw = serde_json::to_string(value)?;
        self.backend.set_item(&self.full_key(key), &raw)
    }

    /// Serialize and store `value`; failures are logged, never returned
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_set(key, value) {
            warn!(key = key, error = %e, "Failed to persist value");
        }
    }

    pub fn try_remove(&self, key: &str) -> StorageResult<()> {
        self.backend.remove_item(&self.full_key(key))
    }

    /// Delete `key`; absence is not an error and failures are logged
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.try_remove(key) {
            warn!(key = key, error = %e, "Failed to remove stored value");
        }
    }

    /// Whether a raw entry exists under `key`, valid JSON or not
    pub fn contains(&self, key: &str) -> bool {
        matches!(self.backend.get_item(&self.full_key(key)), Ok(Some(_)))
    }

    /// Keys in this store's namespace, prefix stripped
    pub fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self
            .backend
            .keys()?
            .into_iter()
            .filter_map(|k| k.strip_prefix(&self.prefix).map(str::to_string))
            .collect())
    }

    /// Remove every key in this store's namespace, leaving other keys alone
    pub fn clear(&self) -> StorageResult<()> {
        for key in self.keys()? {
            self.try_remove(&key)?;
        }
        Ok(())
    }
}
