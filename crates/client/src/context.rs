//! Composition root.
//!
//! Builds one gateway and one aggregate cache sharing a persisted store.
//! Tests construct isolated contexts; nothing here is process-global.

use std::sync::Arc;

use platepal_core::cache::KeyValueStore;

use crate::aggregate::UserDataCache;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::gateway::{EnvCredential, Gateway};
use crate::store::MemoryStore;

/// Which persisted store backs the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Process-local, lost on exit.
    Memory,
    /// SQLite file at `Config::sqlite_path`.
    #[cfg(feature = "sqlite")]
    Sqlite,
}

/// The wired-up client components.
pub struct ClientContext {
    pub config: Config,
    pub gateway: Arc<Gateway>,
    pub users: Arc<UserDataCache>,
}

impl ClientContext {
    /// Opens the requested store and wires the components.
    pub async fn open(config: Config, store: StoreKind) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = match store {
            StoreKind::Memory => Arc::new(
                MemoryStore::new(config.cache_max_entries)
                    .map_err(|e| ApiError::Config(e.to_string()))?,
            ),
            #[cfg(feature = "sqlite")]
            StoreKind::Sqlite => Arc::new(
                crate::store::SqliteStore::open(&config.sqlite_path)
                    .await
                    .map_err(|e| ApiError::Config(e.to_string()))?,
            ),
        };
        Self::with_store(config, store).await
    }

    /// Wires the components around an existing store.
    pub async fn with_store(config: Config, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let fallback = Arc::new(EnvCredential::new(
            config.gateway.fallback_token_var.clone(),
        ));
        let gateway = Arc::new(
            Gateway::builder(config.gateway.clone())
                .store(store)
                .fallback(fallback)
                .build()?,
        );
        let users = UserDataCache::new(Arc::clone(&gateway), config.aggregate.clone()).await;

        Ok(Self {
            config,
            gateway,
            users,
        })
    }
}
