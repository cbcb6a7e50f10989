use async_trait::async_trait;

use super::Result;

/// Pluggable persisted key-value store.
///
/// Writes are best-effort: callers log and ignore failures, so an
/// implementation may fail without affecting the in-memory data flow.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Gets a value by key.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Sets a value, replacing any existing one.
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Removes a value. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Removes every value in the store.
    async fn clear(&self) -> Result<()>;
}
