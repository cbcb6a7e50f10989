//! Best-effort persistence of aggregate fields.

use serde::{de::DeserializeOwned, Serialize};

use platepal_core::cache::{
    decode_record, encode_record, entity_key, owner_keys, CachedEntityRecord, EntityKind,
};

use super::{Field, UserDataCache};
use crate::error::ApiError;

impl UserDataCache {
    /// Reads a persisted record. Store failures and undecodable records are
    /// misses.
    pub(super) async fn read_record<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        owner_id: &str,
    ) -> Option<CachedEntityRecord<T>> {
        let key = entity_key(kind, owner_id);
        let bytes = match self.store.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::trace!(owner_id, kind = %kind, "Cache miss");
                return None;
            }
            Err(err) => {
                tracing::warn!(owner_id, kind = %kind, error = %err, "Cache read failed, treating as miss");
                return None;
            }
        };

        match decode_record(&bytes) {
            Ok(record) => {
                tracing::trace!(owner_id, kind = %kind, "Cache hit");
                Some(record)
            }
            Err(err) => {
                tracing::trace!(owner_id, kind = %kind, error = %err, "Undecodable cache record, treating as miss");
                None
            }
        }
    }

    /// Persists a fresh record. Failures are logged and swallowed.
    pub(super) async fn write_record<T: Serialize>(&self, kind: EntityKind, owner_id: &str, data: &T) {
        let record = CachedEntityRecord::new(data, self.config.ttl_for(kind));
        let result = match encode_record(&record) {
            Ok(bytes) => self.store.set(&entity_key(kind, owner_id), &bytes).await,
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            let err = ApiError::from(err);
            tracing::warn!(owner_id, kind = %kind, error = %err, "Ignoring cache write failure");
        }
    }

    /// Removes a persisted record. Failures are logged and swallowed.
    pub(super) async fn remove_record(&self, kind: EntityKind, owner_id: &str) {
        if let Err(err) = self.store.remove(&entity_key(kind, owner_id)).await {
            tracing::warn!(owner_id, kind = %kind, error = %err, "Ignoring cache removal failure");
        }
    }

    /// Invalidates everything cached for `owner_id` without refetching.
    ///
    /// Persisted records and in-flight entries are dropped. If `owner_id`
    /// is the current owner, rendered data stays but is marked stale, the
    /// pagination cursor is reset, and fetches still running for it are
    /// neither applied nor persisted.
    pub async fn clear_cache(&self, owner_id: &str) {
        // Before the revision bump, so no new fetch attaches to an old task.
        self.forget_in_flight(owner_id).await;
        for key in owner_keys(owner_id) {
            if let Err(err) = self.store.remove(&key).await {
                tracing::warn!(owner_id, key = %key, error = %err, "Ignoring cache removal failure");
            }
        }

        self.state.send_if_modified(|state| {
            if !state.is_owner(owner_id) {
                return false;
            }
            for field in Field::ALL {
                self.invalidate(state, field);
            }
            true
        });

        tracing::debug!(owner_id, "Cache cleared");
    }
}
