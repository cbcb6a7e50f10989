//! Aggregate user-data cache.
//!
//! [`UserDataCache`] composes one owner's profile, reviews, lists and
//! restaurants into a [`UserAggregate`] published on a watch channel. Reads
//! go through the persisted store first (stale-while-revalidate), fetches go
//! through the [`Gateway`] and are deduplicated per entity kind and owner.

mod debounce;
mod load;
mod pagination;
mod persist;
mod state;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};

use platepal_core::cache::{fetch_operation_key, EntityKind, KeyValueStore};
use platepal_core::error::ErrorKind;
use platepal_core::inflight::InFlight;
use platepal_core::user::{Page, Profile, Restaurant, Review, UserList};

use crate::config::AggregateConfig;
use crate::error::ApiError;
use crate::gateway::{Gateway, TeardownListener};

use debounce::Debouncer;

pub use state::{
    AggregateError, Field, FieldState, FieldStates, LoadingPerField, ProfileState,
    RestaurantsCursor, UserAggregate,
};

/// Stale-while-revalidate cache of one owner's aggregate data.
///
/// Holds a single current owner. Switching owners, [`UserDataCache::detach`]
/// and session teardown start a new generation; fetch results belonging to
/// an older generation are dropped instead of applied. Invalidating a field
/// (refresh, [`UserDataCache::clear_cache`]) bumps its revision, which drops
/// results of fetches started before the invalidation the same way.
pub struct UserDataCache {
    gateway: Arc<Gateway>,
    store: Arc<dyn KeyValueStore>,
    config: AggregateConfig,
    state: watch::Sender<UserAggregate>,
    generation: AtomicU64,
    /// Per-field revision, indexed by `Field::index`.
    revisions: [AtomicU64; 4],
    profiles: InFlight<Profile, ApiError>,
    reviews: InFlight<Page<Review>, ApiError>,
    lists: InFlight<Page<UserList>, ApiError>,
    restaurants: InFlight<Page<Restaurant>, ApiError>,
    debouncer: Debouncer,
    /// Serializes page fetches and keeps them apart from refreshes.
    pagination: Mutex<()>,
}

impl UserDataCache {
    /// Creates a cache on top of `gateway` and registers it for teardown.
    pub async fn new(gateway: Arc<Gateway>, config: AggregateConfig) -> Arc<Self> {
        let (state, _) = watch::channel(UserAggregate::default());
        let cache = Arc::new(Self {
            store: gateway.store(),
            gateway: Arc::clone(&gateway),
            profiles: InFlight::new(config.dedup_ttl),
            reviews: InFlight::new(config.dedup_ttl),
            lists: InFlight::new(config.dedup_ttl),
            restaurants: InFlight::new(config.dedup_ttl),
            debouncer: Debouncer::new(config.load_debounce),
            config,
            state,
            generation: AtomicU64::new(0),
            revisions: Default::default(),
            pagination: Mutex::new(()),
        });

        let listener: Weak<dyn TeardownListener> = Arc::downgrade(&cache) as Weak<dyn TeardownListener>;
        gateway.add_teardown_listener(listener).await;

        cache
    }

    /// Subscribes to aggregate updates.
    pub fn subscribe(&self) -> watch::Receiver<UserAggregate> {
        self.state.subscribe()
    }

    /// Returns a copy of the current aggregate.
    pub fn snapshot(&self) -> UserAggregate {
        self.state.borrow().clone()
    }

    pub fn config(&self) -> &AggregateConfig {
        &self.config
    }

    /// Abandons the current owner, e.g. when the consuming view unmounts.
    ///
    /// Fetches still running complete, but their results are discarded.
    pub fn detach(&self) {
        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::AcqRel);
            *state = UserAggregate::default();
        });
        tracing::debug!("Aggregate detached from owner");
    }

    /// Number of entity fetches currently shared through the in-flight maps.
    pub async fn in_flight_count(&self) -> usize {
        self.profiles.len().await
            + self.reviews.len().await
            + self.lists.len().await
            + self.restaurants.len().await
    }

    /// Makes `owner_id` the current owner and returns the generation its
    /// writes must carry. Switching owners resets the aggregate.
    fn activate(&self, owner_id: &str) -> u64 {
        let mut generation = 0;
        self.state.send_if_modified(|state| {
            if state.is_owner(owner_id) {
                generation = self.generation.load(Ordering::Acquire);
                return false;
            }
            generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
            *state = UserAggregate::for_owner(owner_id);
            true
        });
        generation
    }

    /// Applies `f` to the aggregate if `generation` is still current.
    ///
    /// Returns whether the update was applied.
    fn apply(&self, generation: u64, f: impl FnOnce(&mut UserAggregate)) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::Acquire) != generation {
                return false;
            }
            f(state);
            true
        })
    }

    /// Takes the ticket a fetch of `field` must present to commit.
    fn ticket(&self, field: Field, generation: u64) -> FieldTicket {
        FieldTicket {
            generation,
            field,
            revision: self.revisions[field.index()].load(Ordering::Acquire),
        }
    }

    /// Applies `f` if neither the owner generation nor the field revision
    /// moved since `ticket` was taken.
    fn commit(&self, ticket: FieldTicket, f: impl FnOnce(&mut UserAggregate)) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::Acquire) != ticket.generation
                || self.revisions[ticket.field.index()].load(Ordering::Acquire) != ticket.revision
            {
                return false;
            }
            f(state);
            true
        })
    }

    /// Invalidates `field` of the aggregate being modified. Fetches of the
    /// field that are still running will not commit.
    fn invalidate(&self, state: &mut UserAggregate, field: Field) {
        self.revisions[field.index()].fetch_add(1, Ordering::AcqRel);
        state.transition(field, FieldState::invalidate);
        if field == Field::Restaurants {
            state.pagination = RestaurantsCursor::default();
        }
    }

    /// Drops the in-flight entries of an owner so the next fetch is new.
    async fn forget_in_flight(&self, owner_id: &str) {
        self.profiles
            .remove(&fetch_operation_key(EntityKind::Profile, owner_id, None))
            .await;
        self.reviews
            .remove(&fetch_operation_key(EntityKind::Reviews, owner_id, None))
            .await;
        self.lists
            .remove(&fetch_operation_key(EntityKind::Lists, owner_id, None))
            .await;

        let restaurants = fetch_operation_key(EntityKind::Restaurants, owner_id, None);
        self.restaurants.remove(&restaurants).await;
        self.restaurants
            .clear_prefix(&format!("{}:", restaurants))
            .await;
    }
}

/// Owner generation and field revision a fetch was started under.
#[derive(Debug, Clone, Copy)]
struct FieldTicket {
    generation: u64,
    field: Field,
    revision: u64,
}

#[async_trait]
impl TeardownListener for UserDataCache {
    async fn on_teardown(&self) {
        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::AcqRel);
            *state = UserAggregate {
                error: Some(AggregateError {
                    kind: ErrorKind::Unauthorized,
                    message: "The session has ended".to_string(),
                }),
                ..UserAggregate::default()
            };
        });

        self.profiles.clear().await;
        self.reviews.clear().await;
        self.lists.clear().await;
        self.restaurants.clear().await;

        tracing::debug!("Aggregate cache reset after teardown");
    }
}
