//! Process-local record store.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::{Record, StoreError};
use crate::ports::RecordStore;

/// Record store kept in process memory.
///
/// Keys are unique: a second `set` on the same key fails with
/// `AlreadyExists` and leaves the first record in place.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<String, Record>>,
}

impl InMemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get(&self, key: &str) -> Result<Record, StoreError> {
        self.records
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn set(&self, key: &str, record: Record) -> Result<(), StoreError> {
        let mut records = self.records.write();
        if records.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        records.insert(key.to_string(), record);
        Ok(())
    }
}
