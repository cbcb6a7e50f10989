//! SQLite-backed key-value store.
//!
//! One `kv` table holds every record; values are the encoded cache records
//! as opaque blobs.

use async_trait::async_trait;
use tokio_rusqlite::Connection;

use platepal_core::cache::{CacheError, KeyValueStore, Result};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

const SELECT_VALUE: &str = "SELECT value FROM kv WHERE key = ?1";

const UPSERT_VALUE: &str = r#"
INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
"#;

const DELETE_VALUE: &str = "DELETE FROM kv WHERE key = ?1";

const DELETE_ALL: &str = "DELETE FROM kv";

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

fn map_err(e: tokio_rusqlite::Error) -> CacheError {
    match e {
        tokio_rusqlite::Error::ConnectionClosed => {
            CacheError::ConnectionFailed("connection closed".to_string())
        }
        other => CacheError::OperationFailed(other.to_string()),
    }
}

/// Persistent store in a SQLite database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) a file-based store.
    pub async fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| CacheError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Opens a store that lives only as long as the connection.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| CacheError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(CREATE_TABLE).map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(map_err)
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let key = key.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(SELECT_VALUE).map_err(wrap_err)?;
                match stmt.query_row([&key], |row| row.get::<_, Vec<u8>>(0)) {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(wrap_err(e)),
                }
            })
            .await
            .map_err(map_err)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let key = key.to_string();
        let value = value.to_vec();
        let updated_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| {
                conn.execute(UPSERT_VALUE, rusqlite::params![key, value, updated_at])
                    .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(map_err)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let key = key.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(DELETE_VALUE, [&key]).map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(map_err)
    }

    async fn clear(&self) -> Result<()> {
        self.conn
            .call(|conn| {
                conn.execute(DELETE_ALL, []).map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(map_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_key_returns_none() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        assert_eq!(store.get("profile_u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites_existing_value() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        store.set("profile_u1", b"old").await.unwrap();
        store.set("profile_u1", b"new").await.unwrap();

        assert_eq!(store.get("profile_u1").await.unwrap(), Some(b"new".to_vec()));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        store.set("profile_u1", b"1").await.unwrap();
        store.set("reviews_u1", b"2").await.unwrap();

        store.remove("profile_u1").await.unwrap();
        assert_eq!(store.get("profile_u1").await.unwrap(), None);
        assert!(store.get("reviews_u1").await.unwrap().is_some());

        store.clear().await.unwrap();
        assert_eq!(store.get("reviews_u1").await.unwrap(), None);
    }
}
