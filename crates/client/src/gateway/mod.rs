//! Authenticated request gateway.
//!
//! Every outbound call goes through [`Gateway`]: it resolves a session
//! credential (cached, shared between concurrent callers), attaches it,
//! enforces the request timeout and reacts to `401` by tearing down all
//! local state.

mod credentials;
mod dispatch;
mod events;
mod users;

use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::{Arc, Weak};

use tokio::sync::{broadcast, Mutex, RwLock};
use url::Url;

use platepal_core::auth::{FallbackCredential, SessionToken};
use platepal_core::cache::KeyValueStore;
use platepal_core::inflight::InFlight;

use crate::config::GatewayConfig;
use crate::error::{ApiError, Result};
use crate::store::MemoryStore;

pub use credentials::EnvCredential;
pub use dispatch::RequestOptions;
pub use events::{GatewayEvent, TeardownListener};

/// Capacity of the event channel; slow subscribers lag rather than block.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Credential state shared with spawned session fetches.
struct SessionState {
    token: RwLock<Option<SessionToken>>,
    /// Set while a fetched token is being written into the cache.
    finalizing: AtomicBool,
    /// Set once a 401 has been handled; cleared by the next successful fetch.
    signed_out: AtomicBool,
    /// Bumped on teardown so session fetches started before it are discarded.
    epoch: AtomicU64,
}

/// Authenticated request gateway.
///
/// Construct with [`Gateway::builder`]. The gateway is meant to be shared
/// (`Arc<Gateway>`) by every component of one client process.
pub struct Gateway {
    http: reqwest::Client,
    base_url: Url,
    config: GatewayConfig,
    store: Arc<dyn KeyValueStore>,
    fallback: Option<Arc<dyn FallbackCredential>>,
    session: Arc<SessionState>,
    session_fetches: InFlight<SessionToken, ApiError>,
    events: broadcast::Sender<GatewayEvent>,
    listeners: Mutex<Vec<Weak<dyn TeardownListener>>>,
}

impl Gateway {
    /// Starts building a gateway for the given configuration.
    pub fn builder(config: GatewayConfig) -> GatewayBuilder {
        GatewayBuilder {
            config,
            store: None,
            fallback: None,
            http: None,
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The persisted store this gateway clears on teardown.
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    /// Subscribes to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.events.subscribe()
    }

    /// Build a URL for an endpoint path.
    fn url(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{}/{}", base, path))?)
    }
}

/// Builder for [`Gateway`].
pub struct GatewayBuilder {
    config: GatewayConfig,
    store: Option<Arc<dyn KeyValueStore>>,
    fallback: Option<Arc<dyn FallbackCredential>>,
    http: Option<reqwest::Client>,
}

impl GatewayBuilder {
    /// Persisted store cleared on teardown. Defaults to a [`MemoryStore`].
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Secondary credential source used when a session fetch fails.
    pub fn fallback(mut self, fallback: Arc<dyn FallbackCredential>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Use a preconfigured HTTP client. The default client times out after
    /// the configured request timeout.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<Gateway> {
        let base_url = Url::parse(&self.config.base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!(
                "unsupported base URL scheme: {}",
                base_url.scheme()
            )));
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::default()));

        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .timeout(self.config.request_timeout)
                .build()?,
        };

        Ok(Gateway {
            http,
            base_url,
            session_fetches: InFlight::new(self.config.dedup_ttl),
            config: self.config,
            store,
            fallback: self.fallback,
            session: Arc::new(SessionState {
                token: RwLock::new(None),
                finalizing: AtomicBool::new(false),
                signed_out: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
            }),
            events,
            listeners: Mutex::new(Vec::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> GatewayConfig {
        GatewayConfig {
            base_url: base_url.to_string(),
            ..GatewayConfig::default()
        }
    }

    #[test]
    fn test_build_rejects_invalid_base_url() {
        let result = Gateway::builder(config("not a url")).build();
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_build_rejects_non_http_scheme() {
        let result = Gateway::builder(config("ftp://example.com")).build();
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn test_url_joins_paths_without_double_slashes() {
        let gateway = Gateway::builder(config("http://localhost:3000/api/"))
            .build()
            .unwrap();
        assert_eq!(
            gateway.url("/users/u1").unwrap().as_str(),
            "http://localhost:3000/api/users/u1"
        );
    }

    #[test]
    fn test_encoded_owner_id_stays_one_segment() {
        let gateway = Gateway::builder(config("http://localhost:3000"))
            .build()
            .unwrap();
        let url = gateway
            .url(&platepal_core::user::profile_path("a/b?c#d"))
            .unwrap();
        assert_eq!(url.path(), "/users/a%2Fb%3Fc%23d");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }
}
