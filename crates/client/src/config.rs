use std::{env, time::Duration};

use platepal_core::cache::EntityKind;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub aggregate: AggregateConfig,
    /// Maximum number of entries in the memory store (default: 1,000)
    pub cache_max_entries: usize,
    /// Path to the SQLite store file (default: "platepal-cache.db")
    pub sqlite_path: String,
}

/// Settings for the authenticated request gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API base URL (default: "http://localhost:3000")
    pub base_url: String,
    /// Path of the session-issuing endpoint (default: "/auth/session")
    pub session_path: String,
    /// Environment variable read by the fallback credential
    /// (default: "PLATEPAL_ACCESS_TOKEN")
    pub fallback_token_var: String,
    /// Per-request timeout (default: 10s)
    pub request_timeout: Duration,
    /// A token is not used within this margin of its expiry (default: 60s)
    pub safety_margin: Duration,
    /// Wait before retrying while a session fetch is finalizing (default: 50ms)
    pub session_backoff: Duration,
    /// Lifetime of an in-flight session fetch entry (default: 30s)
    pub dedup_ttl: Duration,
}

/// Sub-resources loaded alongside the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub reviews: bool,
    pub lists: bool,
    pub restaurants: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            reviews: true,
            lists: true,
            restaurants: true,
        }
    }
}

/// Settings for the aggregate user-data cache.
#[derive(Debug, Clone)]
pub struct AggregateConfig {
    /// Repeated loads for one owner inside this window collapse (default: 300ms)
    pub load_debounce: Duration,
    pub profile_ttl: Duration,
    pub reviews_ttl: Duration,
    pub lists_ttl: Duration,
    pub restaurants_ttl: Duration,
    /// Entities requested per page (default: 20)
    pub page_size: u32,
    /// Lifetime of an in-flight entity fetch entry (default: 30s)
    pub dedup_ttl: Duration,
    pub features: FeatureFlags,
}

impl AggregateConfig {
    /// Cache TTL for records of the given kind.
    ///
    /// The pagination cursor shares the restaurants TTL.
    pub fn ttl_for(&self, kind: EntityKind) -> Duration {
        match kind {
            EntityKind::Profile => self.profile_ttl,
            EntityKind::Reviews => self.reviews_ttl,
            EntityKind::Lists => self.lists_ttl,
            EntityKind::Restaurants | EntityKind::RestaurantsCursor => self.restaurants_ttl,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PLATEPAL_URL` - API base URL (default: "http://localhost:3000")
    /// - `PLATEPAL_SESSION_PATH` - Session endpoint path (default: "/auth/session")
    /// - `PLATEPAL_FALLBACK_TOKEN_VAR` - Fallback credential variable (default: "PLATEPAL_ACCESS_TOKEN")
    /// - `REQUEST_TIMEOUT_MS` - Request timeout (default: 10,000)
    /// - `SESSION_SAFETY_MARGIN_SECS` - Token safety margin (default: 60)
    /// - `SESSION_RETRY_BACKOFF_MS` - Session finalizing backoff (default: 50)
    /// - `DEDUP_TTL_SECS` - In-flight entry lifetime (default: 30)
    /// - `LOAD_DEBOUNCE_MS` - Load debounce window (default: 300)
    /// - `PROFILE_TTL_SECS`, `REVIEWS_TTL_SECS`, `LISTS_TTL_SECS`, `RESTAURANTS_TTL_SECS`
    ///   - Cache TTLs (default: 300, 120, 300, 120)
    /// - `PAGE_SIZE` - Entities per page (default: 20)
    /// - `FEATURE_REVIEWS`, `FEATURE_LISTS`, `FEATURE_RESTAURANTS` - Sub-resource flags (default: true)
    /// - `CACHE_MAX_ENTRIES` - Memory store capacity (default: 1,000)
    /// - `SQLITE_PATH` - SQLite store path (default: "platepal-cache.db")
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let num = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        let flag = |key: &str| -> bool {
            lookup(key)
                .map(|v| !matches!(v.trim(), "0" | "false" | "off" | "no"))
                .unwrap_or(true)
        };
        let dedup_ttl = Duration::from_secs(num("DEDUP_TTL_SECS", 30));

        Self {
            gateway: GatewayConfig {
                base_url: lookup("PLATEPAL_URL")
                    .unwrap_or_else(|| "http://localhost:3000".to_string()),
                session_path: lookup("PLATEPAL_SESSION_PATH")
                    .unwrap_or_else(|| "/auth/session".to_string()),
                fallback_token_var: lookup("PLATEPAL_FALLBACK_TOKEN_VAR")
                    .unwrap_or_else(|| "PLATEPAL_ACCESS_TOKEN".to_string()),
                request_timeout: Duration::from_millis(num("REQUEST_TIMEOUT_MS", 10_000)),
                safety_margin: Duration::from_secs(num("SESSION_SAFETY_MARGIN_SECS", 60)),
                session_backoff: Duration::from_millis(num("SESSION_RETRY_BACKOFF_MS", 50)),
                dedup_ttl,
            },
            aggregate: AggregateConfig {
                load_debounce: Duration::from_millis(num("LOAD_DEBOUNCE_MS", 300)),
                profile_ttl: Duration::from_secs(num("PROFILE_TTL_SECS", 300)),
                reviews_ttl: Duration::from_secs(num("REVIEWS_TTL_SECS", 120)),
                lists_ttl: Duration::from_secs(num("LISTS_TTL_SECS", 300)),
                restaurants_ttl: Duration::from_secs(num("RESTAURANTS_TTL_SECS", 120)),
                page_size: u32::try_from(num("PAGE_SIZE", 20)).unwrap_or(20).max(1),
                dedup_ttl,
                features: FeatureFlags {
                    reviews: flag("FEATURE_REVIEWS"),
                    lists: flag("FEATURE_LISTS"),
                    restaurants: flag("FEATURE_RESTAURANTS"),
                },
            },
            cache_max_entries: usize::try_from(num("CACHE_MAX_ENTRIES", 1_000))
                .unwrap_or(1_000)
                .max(1),
            sqlite_path: lookup("SQLITE_PATH").unwrap_or_else(|| "platepal-cache.db".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Config::from_lookup(|_| None).gateway
    }
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Config::from_lookup(|_| None).aggregate
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::from_lookup(|_| None);

        assert_eq!(config.gateway.base_url, "http://localhost:3000");
        assert_eq!(config.gateway.session_path, "/auth/session");
        assert_eq!(config.gateway.request_timeout, Duration::from_secs(10));
        assert_eq!(config.gateway.safety_margin, Duration::from_secs(60));
        assert_eq!(config.gateway.session_backoff, Duration::from_millis(50));
        assert_eq!(config.aggregate.load_debounce, Duration::from_millis(300));
        assert_eq!(config.aggregate.page_size, 20);
        assert_eq!(config.aggregate.features, FeatureFlags::default());
        assert_eq!(config.cache_max_entries, 1_000);
        assert_eq!(config.sqlite_path, "platepal-cache.db");
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("PLATEPAL_URL", "https://api.platepal.test"),
            ("REQUEST_TIMEOUT_MS", "2500"),
            ("LOAD_DEBOUNCE_MS", "20"),
            ("FEATURE_LISTS", "false"),
            ("PAGE_SIZE", "5"),
        ]));

        assert_eq!(config.gateway.base_url, "https://api.platepal.test");
        assert_eq!(config.gateway.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.aggregate.load_debounce, Duration::from_millis(20));
        assert!(!config.aggregate.features.lists);
        assert!(config.aggregate.features.reviews);
        assert_eq!(config.aggregate.page_size, 5);
    }

    #[test]
    fn test_unparseable_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("REQUEST_TIMEOUT_MS", "soon"),
            ("PAGE_SIZE", "0"),
        ]));

        assert_eq!(config.gateway.request_timeout, Duration::from_secs(10));
        assert_eq!(config.aggregate.page_size, 1);
    }

    #[test]
    fn test_ttl_for_kind() {
        let aggregate = AggregateConfig::default();
        assert_eq!(aggregate.ttl_for(EntityKind::Profile), Duration::from_secs(300));
        assert_eq!(aggregate.ttl_for(EntityKind::Reviews), Duration::from_secs(120));
        assert_eq!(
            aggregate.ttl_for(EntityKind::RestaurantsCursor),
            aggregate.restaurants_ttl
        );
    }
}
