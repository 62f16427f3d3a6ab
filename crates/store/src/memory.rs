//! A JSON-backed in-memory store.
//!
//! Records are kept as serialized JSON strings and deserialized on read,
//! so every use exercises the round-trip contract (null-key sentinel
//! included) the same way an external database would.

use crate::error::StoreError;
use crate::record::{NavigationRecord, ReferenceStore};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn resource_ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}

impl ReferenceStore for MemoryStore {
    fn put_navigation(
        &mut self,
        resource: &str,
        record: &NavigationRecord,
    ) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(record)?;
        self.records.insert(resource.to_string(), serialized);
        Ok(())
    }

    fn navigation(&self, resource: &str) -> Result<Option<NavigationRecord>, StoreError> {
        match self.records.get(resource) {
            Some(serialized) => Ok(Some(serde_json::from_str(serialized)?)),
            None => Ok(None),
        }
    }
}
