//! Persisted cache records and their freshness rules.
//!
//! Records are stored JSON-encoded as `{ "data": ..., "timestamp": ..., "ttl": ... }`
//! where `timestamp` is the write time and `ttl` the freshness window, both in
//! milliseconds. There is no schema version: a record that fails to decode is a
//! cache miss.

use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{CacheError, Result};

/// Whether a cached record may be served without revalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    /// Still readable, but a background refresh is due.
    Stale,
}

/// A persisted value together with the time it was cached and its TTL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedEntityRecord<T> {
    pub data: T,
    /// Write time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Freshness window in milliseconds.
    pub ttl: u64,
}

impl<T> CachedEntityRecord<T> {
    /// Creates a record cached now.
    pub fn new(data: T, ttl: Duration) -> Self {
        Self::cached_at(data, crate::now_millis(), ttl)
    }

    /// Creates a record with an explicit cache time.
    pub fn cached_at(data: T, timestamp: i64, ttl: Duration) -> Self {
        Self {
            data,
            timestamp,
            ttl: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Returns true iff `now - timestamp < ttl`.
    pub fn is_fresh_at(&self, now: i64) -> bool {
        let age = now.saturating_sub(self.timestamp);
        i128::from(age) < i128::from(self.ttl)
    }

    /// Returns true if the record is fresh at the current time.
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(crate::now_millis())
    }

    /// Classifies the record at the given time.
    pub fn freshness_at(&self, now: i64) -> Freshness {
        if self.is_fresh_at(now) {
            Freshness::Fresh
        } else {
            Freshness::Stale
        }
    }

    /// Classifies the record at the current time.
    pub fn freshness(&self) -> Freshness {
        self.freshness_at(crate::now_millis())
    }
}

/// Serializes a record to JSON bytes.
pub fn encode_record<T: Serialize>(record: &CachedEntityRecord<T>) -> Result<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Deserializes JSON bytes to a record.
///
/// Callers treat any error as a cache miss.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<CachedEntityRecord<T>> {
    serde_json::from_slice(bytes).map_err(|e| CacheError::Serialization(e.to_string()))
}
