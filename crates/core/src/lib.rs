//! platepal_core - functional core of the platepal data-access layer.
//!
//! Pure data types and pure functions shared by the request gateway and the
//! aggregate cache, plus the traits at the seams where the imperative shell
//! plugs in (persisted key-value stores, fallback credentials).

pub mod auth;
pub mod cache;
pub mod error;
pub mod inflight;
pub mod user;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
