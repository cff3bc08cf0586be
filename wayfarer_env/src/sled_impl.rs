//! Sled-based persistent key-value store.

use crate::{KeyValueStore, StoreError};
use std::path::Path;

/// Persistent store on an embedded sled database.
///
/// Every write is flushed before returning so a value set just before the
/// process exits is still there on the next launch.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open a persistent store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)
            .map_err(|e| StoreError::backend(format!("Failed to open sled DB: {}", e)))?;
        Ok(Self { db })
    }

    /// Create a temporary store, deleted when dropped
    pub fn open_temp() -> Result<Self, StoreError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| StoreError::backend(format!("Failed to open temp DB: {}", e)))?;
        Ok(Self { db })
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .db
            .get(key.as_bytes())
            .map_err(|e| StoreError::backend(format!("Get failed: {}", e)))?;

        match value {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(StoreError::serialization),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| StoreError::backend(format!("Insert failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| StoreError::backend(format!("Flush failed: {}", e)))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| StoreError::backend(format!("Remove failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sled_store_roundtrip() {
        let store = SledStore::open_temp().unwrap();

        assert_eq!(store.get("seen:trip").unwrap(), None);
        store.set("seen:trip", "1").unwrap();
        assert_eq!(store.get("seen:trip").unwrap().as_deref(), Some("1"));

        store.remove("seen:trip").unwrap();
        assert!(!store.contains("seen:trip"));
    }

    #[test]
    fn test_sled_store_invalid_utf8_is_serialization_error() {
        let store = SledStore::open_temp().unwrap();
        store.db.insert(b"raw", &[0xff, 0xfe][..]).unwrap();

        assert!(matches!(
            store.get("raw"),
            Err(StoreError::Serialization(_))
        ));
    }
}
