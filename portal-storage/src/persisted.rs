//! A single value mirrored to a durable key

use crate::DurableStore;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Typed handle binding an in-memory value to one key
///
/// The in-memory value is authoritative: `set` and `update` change it first
/// and then persist, so a failed write leaves the handle updated and the
/// stored copy stale.
#[derive(Debug)]
pub struct PersistedValue<T> {
    store: DurableStore,
    key: String,
    initial: T,
    value: T,
}

impl<T> PersistedValue<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Load `key` from `store`, using `initial` when absent or corrupt
    pub fn load(store: DurableStore, key: impl Into<String>, initial: T) -> Self {
        let key = key.into();
        let value = store.get(&key, initial.clone());
        Self {
            store,
            key,
            initial,
            value,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.store.set(&self.key, &self.value);
    }

    pub fn update<F: FnOnce(&mut T)>(&mut self, f: F) {
        f(&mut self.value);
        self.store.set(&self.key, &self.value);
    }

    /// Restore the initial value and drop the stored copy
    pub fn reset(&mut self) {
        self.value = self.initial.clone();
        self.store.remove(&self.key);
    }
}
