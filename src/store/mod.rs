pub mod memory;
pub mod sqlite;
pub mod trait_def;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use trait_def::{KeyValueStore, StoreError, StoreResult};
