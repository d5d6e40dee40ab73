//! Contract for the association records attached to items and plans.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::PlateError;

/// Entity an association is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Owner {
    /// A physical item, typically a plate collection.
    Item(u64),
    /// A plan grouping the operations of a run.
    Plan(u64),
}

impl Owner {
    /// Short label used as the owner kind in persisted records.
    pub fn kind(&self) -> &'static str {
        match self {
            Owner::Item(_) => "item",
            Owner::Plan(_) => "plan",
        }
    }

    /// Raw identifier of the owner.
    pub fn id(&self) -> u64 {
        match self {
            Owner::Item(id) | Owner::Plan(id) => *id,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind(), self.id())
    }
}

/// Key/value persistence for data associated with items and plans.
///
/// Writing an existing key replaces its value.
pub trait AssociationStore {
    /// Stores `value` under `key` for `owner`.
    fn put(&mut self, owner: Owner, key: &str, value: Value) -> Result<(), PlateError>;

    /// Returns the value stored under `key` for `owner`, if any.
    fn get(&self, owner: Owner, key: &str) -> Result<Option<Value>, PlateError>;

    /// Keys associated with `owner`, sorted.
    fn keys(&self, owner: Owner) -> Result<Vec<String>, PlateError>;
}
