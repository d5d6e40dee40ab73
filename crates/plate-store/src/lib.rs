//! Association store backends for plate workflows.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, SCHEMA_VERSION};
