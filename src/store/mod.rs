//! Versioned response stores.
//!
//! One named store exists per deployed cache version. The lifecycle manager
//! creates and deletes whole stores; the router adds entries to the current
//! one. Backends:
//! - `SqliteStore` - durable, survives restarts
//! - `MemoryStore` - in-memory fake for tests and ephemeral hosts

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{CacheStore, CachedResponse};
