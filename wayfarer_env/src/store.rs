//! Key-value storage abstraction.

use crate::error::StoreError;

/// A string key-value store.
///
/// This is the only persistence surface the rest of Wayfarer sees: the
/// latest itinerary and per-trip day progress are both plain JSON strings
/// under derived keys.
///
/// # Implementations
///
/// - **Production**: `SledStore` - embedded database, survives restarts
/// - **Tests / simulation**: `MemoryStore` - a mutex-guarded map
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Returns true if `key` holds a value.
    fn contains(&self, key: &str) -> bool {
        matches!(self.get(key), Ok(Some(_)))
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}
