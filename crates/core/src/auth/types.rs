use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::calculate_expiry;

/// Response body of the session-issuing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGrant {
    pub access_token: String,
    /// Issued lifetime in seconds.
    pub expires_in: u64,
}

/// Cached session credential.
///
/// There is a single process-wide value owned by the gateway; it is replaced
/// wholesale on refresh and cleared on logout or 401.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub last_fetched_at: DateTime<Utc>,
}

impl SessionToken {
    /// Builds the cached credential from a grant received at `fetched_at`.
    pub fn from_grant(grant: SessionGrant, fetched_at: DateTime<Utc>) -> Self {
        Self {
            expires_at: calculate_expiry(fetched_at, grant.expires_in),
            token: grant.access_token,
            last_fetched_at: fetched_at,
        }
    }
}
