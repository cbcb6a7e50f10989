//! Session credential resolution.

use std::env;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use url::Url;

use platepal_core::auth::{is_token_usable, FallbackCredential, SessionGrant, SessionToken};
use platepal_core::cache::FETCH_SESSION_KEY;

use super::{Gateway, SessionState};
use crate::error::{ApiError, Result};

/// Fallback credential read from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl FallbackCredential for EnvCredential {
    fn read(&self) -> Option<String> {
        env::var(&self.var)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

impl Gateway {
    /// Resolves a credential to attach to outbound requests.
    ///
    /// A cached token that is usable for at least the safety margin is
    /// returned without a network call. Otherwise concurrent callers share a
    /// single session fetch. If the fetch fails, the fallback credential is
    /// read; without one the call fails with `AuthUnavailable`.
    pub async fn get_credential(&self) -> Result<String> {
        loop {
            if let Some(token) = self.usable_token().await {
                tracing::trace!("Using cached session token");
                return Ok(token);
            }

            let fetch_running = self.session_fetches.contains(FETCH_SESSION_KEY).await;
            if !fetch_running && self.session.finalizing.load(Ordering::Acquire) {
                tracing::trace!("Session fetch finalizing, backing off");
                tokio::time::sleep(self.config.session_backoff).await;
                continue;
            }
            break;
        }

        let http = self.http.clone();
        let url = self.url(&self.config.session_path);
        let session = Arc::clone(&self.session);
        let timeout = self.config.request_timeout;

        let fetched = self
            .session_fetches
            .run(FETCH_SESSION_KEY, move || async move {
                fetch_session(http, url?, session, timeout).await
            })
            .await;

        match fetched {
            Ok(token) => Ok(token.token),
            Err(err) => {
                let fallback = self.fallback.as_ref().and_then(|source| source.read());
                match fallback {
                    Some(token) => {
                        tracing::warn!(error = %err, "Session fetch failed, using fallback credential");
                        Ok(token)
                    }
                    None => {
                        tracing::warn!(error = %err, "Session fetch failed and no fallback credential is available");
                        Err(ApiError::AuthUnavailable(err.to_string()))
                    }
                }
            }
        }
    }

    /// Returns the cached token if it is still usable.
    async fn usable_token(&self) -> Option<String> {
        let token = self.session.token.read().await;
        token
            .as_ref()
            .filter(|token| is_token_usable(token, Utc::now(), self.config.safety_margin))
            .map(|token| token.token.clone())
    }

    /// Returns the cached session record, usable or not.
    pub async fn current_token(&self) -> Option<SessionToken> {
        self.session.token.read().await.clone()
    }

    /// Returns true while a session fetch is in flight.
    pub async fn session_fetch_in_flight(&self) -> bool {
        !self.session_fetches.is_empty().await
    }
}

/// Calls the session endpoint and caches the issued token.
///
/// The network call is bounded by `timeout`. The token is only cached if no
/// teardown happened while the call was outstanding.
async fn fetch_session(
    http: reqwest::Client,
    url: Url,
    session: Arc<SessionState>,
    timeout: Duration,
) -> Result<SessionToken> {
    let epoch = session.epoch.load(Ordering::Acquire);
    tracing::debug!(url = %url, "Fetching session token");

    let grant = match tokio::time::timeout(timeout, request_grant(&http, url)).await {
        Ok(grant) => grant?,
        Err(_) => {
            return Err(ApiError::RequestTimeout(format!(
                "session fetch exceeded {:?}",
                timeout
            )))
        }
    };
    let token = SessionToken::from_grant(grant, Utc::now());

    session.finalizing.store(true, Ordering::Release);
    {
        let mut cached = session.token.write().await;
        if session.epoch.load(Ordering::Acquire) == epoch {
            *cached = Some(token.clone());
            session.signed_out.store(false, Ordering::Release);
            tracing::info!(expires_at = %token.expires_at, "Session token acquired");
        } else {
            tracing::debug!("Discarding session token fetched before teardown");
        }
    }
    session.finalizing.store(false, Ordering::Release);

    Ok(token)
}

async fn request_grant(http: &reqwest::Client, url: Url) -> Result<SessionGrant> {
    let response = http.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ApiError::from_status(
            status.as_u16(),
            url.path(),
            message,
        ));
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;

    #[tokio::test]
    async fn test_finalizing_fetch_is_awaited_not_duplicated() {
        // Nothing listens on port 1, so starting a new fetch would fail.
        let gateway = Gateway::builder(GatewayConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            session_backoff: Duration::from_millis(5),
            ..GatewayConfig::default()
        })
        .build()
        .unwrap();
        gateway.session.finalizing.store(true, Ordering::Release);

        let session = Arc::clone(&gateway.session);
        let finalizer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            let grant = SessionGrant {
                access_token: "finalized".to_string(),
                expires_in: 3600,
            };
            *session.token.write().await = Some(SessionToken::from_grant(grant, Utc::now()));
            session.finalizing.store(false, Ordering::Release);
        });

        assert_eq!(gateway.get_credential().await.unwrap(), "finalized");
        finalizer.await.unwrap();
        assert!(!gateway.session_fetch_in_flight().await);
    }

    #[test]
    fn test_env_credential_reads_variable() {
        let var = "PLATEPAL_TEST_FALLBACK_CREDENTIAL_SET";
        env::set_var(var, "  fallback-token  ");
        assert_eq!(EnvCredential::new(var).read().as_deref(), Some("fallback-token"));
        env::remove_var(var);
    }

    #[test]
    fn test_env_credential_missing_or_blank_is_none() {
        let var = "PLATEPAL_TEST_FALLBACK_CREDENTIAL_BLANK";
        assert_eq!(EnvCredential::new(var).read(), None);
        env::set_var(var, "   ");
        assert_eq!(EnvCredential::new(var).read(), None);
        env::remove_var(var);
    }
}
