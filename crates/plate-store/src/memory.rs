use std::collections::BTreeMap;

use plate_core::{AssociationStore, Owner, PlateError};
use serde_json::Value;

/// In-process store, used by tests and one-shot CLI runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    entries: BTreeMap<(Owner, String), Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AssociationStore for MemoryStore {
    fn put(&mut self, owner: Owner, key: &str, value: Value) -> Result<(), PlateError> {
        self.entries.insert((owner, key.to_string()), value);
        Ok(())
    }

    fn get(&self, owner: Owner, key: &str) -> Result<Option<Value>, PlateError> {
        Ok(self.entries.get(&(owner, key.to_string())).cloned())
    }

    fn keys(&self, owner: Owner) -> Result<Vec<String>, PlateError> {
        Ok(self
            .entries
            .keys()
            .filter(|(entry_owner, _)| *entry_owner == owner)
            .map(|(_, key)| key.clone())
            .collect())
    }
}
