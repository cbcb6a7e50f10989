//! Keyed deduplication of concurrent asynchronous operations.
//!
//! [`InFlight`] maps a logical operation key (`fetch-session`,
//! `fetch-entity:profile:u1`, ...) to a shared task. The first caller for a key
//! spawns the task; every caller arriving while it runs awaits the same
//! result. The task runs on the runtime, so dropping a caller abandons the
//! result without cancelling the underlying operation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

/// Default lifetime of an in-flight entry, independent of any cache TTL.
pub const DEFAULT_DEDUP_TTL: Duration = Duration::from_secs(30);

/// The spawned task of an in-flight entry panicked or was aborted.
#[derive(Debug, Clone, thiserror::Error)]
#[error("in-flight task failed: {0}")]
pub struct TaskFailed(pub String);

type SharedTask<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

struct Slot<T, E> {
    task: SharedTask<T, E>,
    started_at: Instant,
    id: u64,
}

type Slots<T, E> = Arc<Mutex<HashMap<String, Slot<T, E>>>>;

/// A map of shared in-flight tasks keyed by operation identity.
///
/// Invariant: at most one entry exists per key. An entry is removed when its
/// task settles (success or failure) or is replaced once it is older than the
/// dedup TTL.
pub struct InFlight<T, E> {
    slots: Slots<T, E>,
    ttl: Duration,
    next_id: AtomicU64,
}

impl<T, E> InFlight<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<TaskFailed> + 'static,
{
    /// Creates an empty map with the given dedup TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            next_id: AtomicU64::new(0),
        }
    }

    /// Runs the operation for `key`, or attaches to the one already running.
    ///
    /// `make` is only invoked when no live entry exists for `key`.
    pub async fn run<F, Fut>(&self, key: &str, make: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let task = {
            let mut slots = self.slots.lock().await;

            let existing = slots
                .get(key)
                .map(|slot| (slot.started_at.elapsed() < self.ttl, slot.task.clone()));

            match existing {
                Some((true, task)) => {
                    tracing::debug!(key, "Attaching to in-flight task");
                    task
                }
                existing => {
                    if existing.is_some() {
                        tracing::debug!(key, "In-flight entry outlived its TTL, replacing");
                    }
                    let (id, task) = self.spawn(key, make());
                    slots.insert(
                        key.to_string(),
                        Slot {
                            task: task.clone(),
                            started_at: Instant::now(),
                            id,
                        },
                    );
                    task
                }
            }
        };

        task.await
    }

    /// Spawns `fut` and returns the shared handle callers await.
    ///
    /// Must be called with the slot lock held, so the task cannot remove its
    /// entry before the entry is inserted.
    fn spawn<Fut>(&self, key: &str, fut: Fut) -> (u64, SharedTask<T, E>)
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let slots = Arc::clone(&self.slots);
        let owned_key = key.to_string();

        let handle = tokio::spawn(async move {
            let result = fut.await;
            let mut slots = slots.lock().await;
            if slots.get(&owned_key).is_some_and(|slot| slot.id == id) {
                slots.remove(&owned_key);
            }
            result
        });

        let task = async move {
            match handle.await {
                Ok(result) => result,
                Err(err) => Err(E::from(TaskFailed(err.to_string()))),
            }
        }
        .boxed()
        .shared();

        (id, task)
    }

    /// Returns true if a live entry exists for `key`.
    pub async fn contains(&self, key: &str) -> bool {
        let slots = self.slots.lock().await;
        slots
            .get(key)
            .is_some_and(|slot| slot.started_at.elapsed() < self.ttl)
    }

    /// Number of live entries. Expired entries are dropped on the way.
    pub async fn len(&self) -> usize {
        let mut slots = self.slots.lock().await;
        let ttl = self.ttl;
        slots.retain(|_, slot| slot.started_at.elapsed() < ttl);
        slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Forgets every entry. Running tasks finish but are no longer shared.
    pub async fn clear(&self) {
        self.slots.lock().await.clear();
    }

    /// Forgets the entry for `key`. A running task finishes unshared.
    pub async fn remove(&self, key: &str) {
        self.slots.lock().await.remove(key);
    }

    /// Forgets every entry whose key starts with `prefix`.
    pub async fn clear_prefix(&self, prefix: &str) {
        self.slots
            .lock()
            .await
            .retain(|key, _| !key.starts_with(prefix));
    }
}

impl<T, E> Default for InFlight<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + From<TaskFailed> + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_TTL)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum TestError {
        Failed(String),
        Task(String),
    }

    impl From<TaskFailed> for TestError {
        fn from(err: TaskFailed) -> Self {
            TestError::Task(err.0)
        }
    }

    fn counting_op(
        calls: &Arc<AtomicUsize>,
        delay: Duration,
        value: u32,
    ) -> impl Future<Output = Result<u32, TestError>> + Send + 'static {
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            Ok(value)
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_execution() {
        let inflight: Arc<InFlight<u32, TestError>> = Arc::new(InFlight::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let inflight = Arc::clone(&inflight);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                inflight
                    .run("op", || counting_op(&calls, Duration::from_millis(50), 7))
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok(7));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_entry_removed_after_settle() {
        let inflight: InFlight<u32, TestError> = InFlight::default();
        let calls = Arc::new(AtomicUsize::new(0));

        inflight
            .run("op", || counting_op(&calls, Duration::ZERO, 1))
            .await
            .unwrap();
        assert!(inflight.is_empty().await);

        inflight
            .run("op", || counting_op(&calls, Duration::ZERO, 2))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_is_shared_and_removed() {
        let inflight: InFlight<u32, TestError> = InFlight::default();

        let (a, b) = tokio::join!(
            inflight.run("op", || async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err(TestError::Failed("boom".to_string()))
            }),
            inflight.run("op", || async { Ok(99) }),
        );

        assert_eq!(a, Err(TestError::Failed("boom".to_string())));
        assert_eq!(b, Err(TestError::Failed("boom".to_string())));
        assert!(!inflight.contains("op").await);
    }

    #[tokio::test]
    async fn test_distinct_keys_run_independently() {
        let inflight: InFlight<u32, TestError> = InFlight::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            inflight.run("a", || counting_op(&calls, Duration::from_millis(10), 1)),
            inflight.run("b", || counting_op(&calls, Duration::from_millis(10), 2)),
        );

        assert_eq!((a, b), (Ok(1), Ok(2)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_entry_is_replaced() {
        let inflight: Arc<InFlight<u32, TestError>> =
            Arc::new(InFlight::new(Duration::from_millis(20)));
        let calls = Arc::new(AtomicUsize::new(0));

        let slow = {
            let inflight = Arc::clone(&inflight);
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                inflight
                    .run("op", || counting_op(&calls, Duration::from_millis(200), 1))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(60)).await;
        let fresh = inflight
            .run("op", || counting_op(&calls, Duration::ZERO, 2))
            .await;

        assert_eq!(fresh, Ok(2));
        assert_eq!(slow.await.unwrap(), Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_abandoned_caller_does_not_cancel_task() {
        let inflight: Arc<InFlight<u32, TestError>> = Arc::new(InFlight::default());
        let finished = Arc::new(AtomicUsize::new(0));

        let caller = {
            let inflight = Arc::clone(&inflight);
            let finished = Arc::clone(&finished);
            tokio::spawn(async move {
                inflight
                    .run("op", move || async move {
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        finished.fetch_add(1, Ordering::SeqCst);
                        Ok(1)
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(5)).await;
        caller.abort();
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert!(inflight.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear_prefix_only_removes_matching_keys() {
        let inflight: Arc<InFlight<u32, TestError>> = Arc::new(InFlight::default());

        for key in ["fetch-entity:profile:u1", "fetch-entity:profile:u2"] {
            let inflight = Arc::clone(&inflight);
            tokio::spawn(async move {
                inflight
                    .run(key, || async {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(0)
                    })
                    .await
            });
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        inflight.clear_prefix("fetch-entity:profile:u1").await;
        assert!(!inflight.contains("fetch-entity:profile:u1").await);
        assert!(inflight.contains("fetch-entity:profile:u2").await);

        inflight.clear().await;
        assert!(inflight.is_empty().await);
    }
}
