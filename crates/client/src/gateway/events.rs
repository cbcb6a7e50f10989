//! Session lifecycle events and teardown.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};

use async_trait::async_trait;

use super::Gateway;

/// Notification shown when the server ends the session.
pub const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please sign in again.";

/// Events published on [`Gateway::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// A user-facing notification.
    Notice { message: String },
    /// The consumer should navigate to the sign-in flow.
    RedirectToSignIn,
}

/// A component holding state that must be dropped when the session ends.
#[async_trait]
pub trait TeardownListener: Send + Sync {
    async fn on_teardown(&self);
}

impl Gateway {
    /// Registers a component to be reset on teardown.
    ///
    /// Only a weak reference is kept; dropped listeners are pruned.
    pub async fn add_teardown_listener(&self, listener: Weak<dyn TeardownListener>) {
        let mut listeners = self.listeners.lock().await;
        listeners.retain(|existing| existing.strong_count() > 0);
        listeners.push(listener);
    }

    /// Clears the credential cache, session fetches and persisted store,
    /// then resets every registered listener.
    pub async fn teardown(&self) {
        self.session.epoch.fetch_add(1, Ordering::AcqRel);
        *self.session.token.write().await = None;
        self.session_fetches.clear().await;

        if let Err(err) = self.store.clear().await {
            tracing::warn!(error = %err, "Failed to clear persisted store");
        }

        let live: Vec<Arc<dyn TeardownListener>> = {
            let mut listeners = self.listeners.lock().await;
            listeners.retain(|listener| listener.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        for listener in live {
            listener.on_teardown().await;
        }

        tracing::info!("Local session state torn down");
    }

    /// Signs out locally. Same as [`Gateway::teardown`] but no redirect is
    /// ever emitted for this session.
    pub async fn logout(&self) {
        self.session.signed_out.store(true, Ordering::Release);
        self.teardown().await;
        tracing::info!("Logged out");
    }

    /// Terminal handling of a `401`: teardown, then a one-time notice and
    /// redirect intent.
    pub(super) async fn handle_unauthorized(&self, endpoint: &str) {
        tracing::error!(endpoint, "Server rejected the session credential");
        self.teardown().await;

        if !self.session.signed_out.swap(true, Ordering::AcqRel) {
            // No subscribers is not an error.
            let _ = self.events.send(GatewayEvent::Notice {
                message: SESSION_EXPIRED_NOTICE.to_string(),
            });
            let _ = self.events.send(GatewayEvent::RedirectToSignIn);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use platepal_core::cache::KeyValueStore;

    use super::*;
    use crate::config::GatewayConfig;
    use crate::store::MemoryStore;

    struct Counter(AtomicUsize);

    #[async_trait]
    impl TeardownListener for Counter {
        async fn on_teardown(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_teardown_clears_store_and_notifies_live_listeners() {
        let store = Arc::new(MemoryStore::new(10).unwrap());
        store.set("profile_u1", b"{}").await.unwrap();
        let gateway = Gateway::builder(GatewayConfig::default())
            .store(store.clone())
            .build()
            .unwrap();

        let live = Arc::new(Counter(AtomicUsize::new(0)));
        let live_dyn: Arc<dyn TeardownListener> = live.clone();
        gateway.add_teardown_listener(Arc::downgrade(&live_dyn)).await;
        {
            let dropped: Arc<dyn TeardownListener> = Arc::new(Counter(AtomicUsize::new(0)));
            gateway.add_teardown_listener(Arc::downgrade(&dropped)).await;
        }

        gateway.teardown().await;

        assert!(store.is_empty().await);
        assert_eq!(live.0.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.listeners.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_logout_emits_no_events() {
        let gateway = Gateway::builder(GatewayConfig::default()).build().unwrap();
        let mut events = gateway.subscribe();

        gateway.logout().await;

        assert!(events.try_recv().is_err());
        assert!(gateway.current_token().await.is_none());
    }
}
