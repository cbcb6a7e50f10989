//! Trailing debounce keyed by owner.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;

/// Collapses bursts of calls for one key into the last call of the burst.
pub(crate) struct Debouncer {
    window: Duration,
    tickets: Mutex<HashMap<String, u64>>,
}

impl Debouncer {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            tickets: Mutex::new(HashMap::new()),
        }
    }

    /// Waits out the window. Returns true if no later call for `key` arrived
    /// in the meantime, i.e. this call should run.
    pub(crate) async fn settle(&self, key: &str) -> bool {
        if self.window.is_zero() {
            return true;
        }

        let ticket = {
            let mut tickets = self.tickets.lock().await;
            let latest = tickets.entry(key.to_string()).or_insert(0);
            *latest += 1;
            *latest
        };

        tokio::time::sleep(self.window).await;

        let mut tickets = self.tickets.lock().await;
        if tickets.get(key) == Some(&ticket) {
            tickets.remove(key);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_zero_window_always_runs() {
        let debouncer = Debouncer::new(Duration::ZERO);
        assert!(debouncer.settle("u1").await);
        assert!(debouncer.settle("u1").await);
    }

    #[tokio::test]
    async fn test_burst_collapses_to_last_call() {
        let debouncer = Arc::new(Debouncer::new(Duration::from_millis(40)));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let debouncer = Arc::clone(&debouncer);
            handles.push(tokio::spawn(async move { debouncer.settle("u1").await }));
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let mut ran = Vec::new();
        for handle in handles {
            ran.push(handle.await.unwrap());
        }
        assert_eq!(ran, vec![false, false, true]);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let debouncer = Debouncer::new(Duration::from_millis(10));
        let (a, b) = tokio::join!(debouncer.settle("u1"), debouncer.settle("u2"));
        assert!(a && b);
    }
}
