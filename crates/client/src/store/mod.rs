//! Persisted key-value store backends.
//!
//! Both implement [`platepal_core::cache::KeyValueStore`]. Failures are
//! best-effort: the aggregate cache logs and ignores them.

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
