//! In-process backend

use crate::{KeyValueBackend, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// Map-backed store, optionally capped at a byte quota
///
/// Usage is counted as the sum of key and value lengths, the way browsers
/// account for `localStorage`.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: Option<usize>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota_bytes,
        }
    }

    /// Bytes currently used by keys and values
    pub fn usage_bytes(&self) -> StorageResult<usize> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.iter().map(|(k, v)| k.len() + v.len()).sum())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;

        if let Some(quota) = self.quota_bytes {
            let used: usize = entries.iter().map(|(k, v)| k.len() + v.len()).sum();
            let replaced = entries.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
            let needed = used - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn clear(&self) -> StorageResult<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get_item("theme").unwrap(), None);

        backend.set_item("theme", "\"dark\"").unwrap();
        assert_eq!(backend.get_item("theme").unwrap().as_deref(), Some("\"dark\""));

        backend.remove_item("theme").unwrap();
        assert_eq!(backend.get_item("theme").unwrap(), None);

        // Removing an absent key is not an error
        backend.remove_item("theme").unwrap();
    }

    #[test]
    fn test_quota_counts_replaced_value_once() {
        let backend = MemoryBackend::with_quota(Some(10));
        backend.set_item("abc", "1234567").unwrap();
        assert_eq!(backend.usage_bytes().unwrap(), 10);

        // Overwriting with a value of the same size fits exactly
        backend.set_item("abc", "7654321").unwrap();

        let err = backend.set_item("d", "1").unwrap_err();
        match err {
            StorageError::QuotaExceeded { needed, quota } => {
                assert_eq!(needed, 12);
                assert_eq!(quota, 10);
            }
            other => panic!("Expected QuotaExceeded, got {other:?}"),
        }
        assert_eq!(backend.get_item("abc").unwrap().as_deref(), Some("7654321"));
    }

    #[test]
    fn test_keys_sorted_and_clear() {
        let backend = MemoryBackend::new();
        backend.set_item("b", "2").unwrap();
        backend.set_item("a", "1").unwrap();
        assert_eq!(backend.keys().unwrap(), vec!["a", "b"]);

        backend.clear().unwrap();
        assert!(backend.is_empty());
    }
}
