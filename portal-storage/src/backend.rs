//! Raw key-value backend trait

use crate::StorageResult;

/// String-keyed persistent store holding string values
///
/// Shaped after browser `localStorage`: absence is `Ok(None)`, removing a
/// missing key succeeds. Implementations must be shareable across threads.
pub trait KeyValueBackend: Send + Sync {
    /// Read the raw value stored under `key`
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete `key`
    fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// All stored keys, sorted
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Remove every key
    fn clear(&self) -> StorageResult<()> {
        for key in self.keys()? {
            self.remove_item(&key)?;
        }
        Ok(())
    }
}
