use std::time::Duration;

use chrono::{DateTime, Utc};

use super::SessionToken;

/// Calculate token expiry from fetch time and issued lifetime in seconds.
pub fn calculate_expiry(fetched_at: DateTime<Utc>, expires_in_secs: u64) -> DateTime<Utc> {
    let lifetime = i64::try_from(expires_in_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX);
    fetched_at
        .checked_add_signed(lifetime)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Check if a token may still be attached to requests.
///
/// A token is usable only while `now < expires_at - safety_margin`, so it is
/// never sent when it could expire in transit.
pub fn is_token_usable(token: &SessionToken, now: DateTime<Utc>, safety_margin: Duration) -> bool {
    let margin = chrono::Duration::from_std(safety_margin).unwrap_or(chrono::Duration::MAX);
    token
        .expires_at
        .checked_sub_signed(margin)
        .is_some_and(|deadline| now < deadline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionGrant;

    const MARGIN: Duration = Duration::from_secs(60);

    fn token_expiring_at(expires_at: DateTime<Utc>) -> SessionToken {
        SessionToken {
            token: "tok".to_string(),
            expires_at,
            last_fetched_at: expires_at - chrono::Duration::hours(1),
        }
    }

    #[test]
    fn calculate_expiry_adds_lifetime_to_fetch_time() {
        let fetched = Utc::now();
        assert_eq!(
            calculate_expiry(fetched, 3600),
            fetched + chrono::Duration::hours(1)
        );
    }

    #[test]
    fn from_grant_populates_every_field() {
        let fetched = Utc::now();
        let token = SessionToken::from_grant(
            SessionGrant {
                access_token: "abc".to_string(),
                expires_in: 900,
            },
            fetched,
        );
        assert_eq!(token.token, "abc");
        assert_eq!(token.last_fetched_at, fetched);
        assert_eq!(token.expires_at, fetched + chrono::Duration::seconds(900));
    }

    #[test]
    fn is_token_usable_well_before_expiry() {
        let now = Utc::now();
        let token = token_expiring_at(now + chrono::Duration::minutes(10));
        assert!(is_token_usable(&token, now, MARGIN));
    }

    #[test]
    fn is_token_usable_rejects_token_inside_safety_margin() {
        let now = Utc::now();
        let token = token_expiring_at(now + chrono::Duration::seconds(30));
        assert!(!is_token_usable(&token, now, MARGIN));
    }

    #[test]
    fn is_token_usable_rejects_token_exactly_at_margin() {
        let now = Utc::now();
        let token = token_expiring_at(now + chrono::Duration::seconds(60));
        assert!(!is_token_usable(&token, now, MARGIN));
    }

    #[test]
    fn is_token_usable_rejects_expired_token() {
        let now = Utc::now();
        let token = token_expiring_at(now - chrono::Duration::seconds(1));
        assert!(!is_token_usable(&token, now, Duration::ZERO));
    }
}
