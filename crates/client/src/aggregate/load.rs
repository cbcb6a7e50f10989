//! Loading and refreshing the aggregate.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::{de::DeserializeOwned, Serialize};

use platepal_core::cache::{fetch_operation_key, EntityKind, Freshness};
use platepal_core::inflight::InFlight;
use platepal_core::user::{
    dedup_by_identity, Collection, Identified, Page, PageQuery, Profile, Restaurant, Review,
    UserList,
};

use super::{
    AggregateError, Field, FieldState, FieldTicket, ProfileState, RestaurantsCursor,
    UserAggregate, UserDataCache,
};
use crate::error::{ApiError, Result};

impl UserDataCache {
    /// Loads the aggregate for `owner_id`.
    ///
    /// Debounced per owner: of a burst of calls, only the last one runs.
    /// Cached fields are shown immediately; stale or missing fields are
    /// fetched. Fails with the profile error, or with `Unauthorized` from any
    /// field. Other sub-resource failures are logged only.
    pub async fn load(&self, owner_id: &str) -> Result<()> {
        if !self.debouncer.settle(owner_id).await {
            tracing::trace!(owner_id, "Load collapsed into a later call");
            return Ok(());
        }
        self.load_now(owner_id).await
    }

    /// Invalidates everything cached for `owner_id` and loads it again from
    /// the network. Not debounced.
    pub async fn refresh(&self, owner_id: &str) -> Result<()> {
        let _pagination = self.pagination.lock().await;
        tracing::info!(owner_id, "Refreshing aggregate");
        self.clear_cache(owner_id).await;
        self.load_now(owner_id).await
    }

    pub async fn refresh_profile(&self, owner_id: &str) -> Result<()> {
        self.refresh_field(owner_id, Field::Profile).await
    }

    pub async fn refresh_reviews(&self, owner_id: &str) -> Result<()> {
        self.refresh_field(owner_id, Field::Reviews).await
    }

    pub async fn refresh_lists(&self, owner_id: &str) -> Result<()> {
        self.refresh_field(owner_id, Field::Lists).await
    }

    /// Reloads the first page of restaurants and resets the cursor.
    pub async fn refresh_restaurants(&self, owner_id: &str) -> Result<()> {
        let _pagination = self.pagination.lock().await;
        self.remove_record(EntityKind::RestaurantsCursor, owner_id)
            .await;
        self.refresh_field(owner_id, Field::Restaurants).await
    }

    async fn refresh_field(&self, owner_id: &str, field: Field) -> Result<()> {
        let generation = self.activate(owner_id);
        let kind = field.entity_kind();

        match field {
            Field::Profile => self.profiles.remove(&fetch_operation_key(kind, owner_id, None)).await,
            Field::Reviews => self.reviews.remove(&fetch_operation_key(kind, owner_id, None)).await,
            Field::Lists => self.lists.remove(&fetch_operation_key(kind, owner_id, None)).await,
            Field::Restaurants => {
                let key = fetch_operation_key(kind, owner_id, None);
                self.restaurants.remove(&key).await;
                self.restaurants.clear_prefix(&format!("{}:", key)).await;
            }
        }
        self.remove_record(kind, owner_id).await;

        self.apply(generation, |state| self.invalidate(state, field));

        tracing::debug!(owner_id, ?field, "Refreshing field");
        self.fetch_field(field, owner_id, generation).await
    }

    pub(super) async fn load_now(&self, owner_id: &str) -> Result<()> {
        let generation = self.activate(owner_id);
        self.apply(generation, |state| state.error = None);

        let features = self.config.features;
        let enabled = [
            (Field::Profile, true),
            (Field::Reviews, features.reviews),
            (Field::Lists, features.lists),
            (Field::Restaurants, features.restaurants),
        ];

        let mut due = Vec::new();
        for (field, on) in enabled {
            if on && !self.hydrate(field, owner_id, generation).await {
                due.push(field);
            }
        }

        if due.is_empty() {
            tracing::debug!(owner_id, "Aggregate served from cache");
            return Ok(());
        }
        tracing::debug!(owner_id, fields = ?due, "Fetching aggregate fields");

        let results = join_all(
            due.iter()
                .map(|field| self.fetch_field(*field, owner_id, generation)),
        )
        .await;

        let mut outcome = Ok(());
        for (field, result) in due.iter().zip(results) {
            if let Err(err) = result {
                let surfaced = *field == Field::Profile || err.kind().is_fatal_auth();
                if surfaced && outcome.is_ok() {
                    outcome = Err(err);
                }
            }
        }
        outcome
    }

    /// Shows the persisted value of a field, if any.
    ///
    /// Returns true if the value is fresh and no fetch is needed.
    async fn hydrate(&self, field: Field, owner_id: &str, generation: u64) -> bool {
        match field {
            Field::Profile => {
                let Some(record) = self.read_record::<Profile>(EntityKind::Profile, owner_id).await
                else {
                    return false;
                };
                let freshness = record.freshness();
                self.apply(generation, |state| {
                    state.profile = ProfileState::Visible(record.data);
                    state.set_field_state(Field::Profile, freshness.into());
                });
                freshness == Freshness::Fresh
            }
            Field::Reviews => {
                self.hydrate_collection::<Review>(field, owner_id, generation, |state, items| {
                    state.reviews = items
                })
                .await
            }
            Field::Lists => {
                self.hydrate_collection::<UserList>(field, owner_id, generation, |state, items| {
                    state.lists = items
                })
                .await
            }
            Field::Restaurants => {
                let Some(record) = self
                    .read_record::<Vec<Restaurant>>(EntityKind::Restaurants, owner_id)
                    .await
                else {
                    return false;
                };
                let cursor = self
                    .read_record::<RestaurantsCursor>(EntityKind::RestaurantsCursor, owner_id)
                    .await;

                // Without a cursor the next page is unknown, so refetch.
                let fresh = record.is_fresh() && cursor.as_ref().is_some_and(|c| c.is_fresh());
                let state_after = if fresh {
                    FieldState::Fresh
                } else {
                    FieldState::Stale
                };
                self.apply(generation, |state| {
                    state.restaurants = record.data;
                    state.pagination = cursor.map(|c| c.data).unwrap_or_default();
                    state.set_field_state(Field::Restaurants, state_after);
                });
                fresh
            }
        }
    }

    async fn hydrate_collection<T: DeserializeOwned>(
        &self,
        field: Field,
        owner_id: &str,
        generation: u64,
        set: fn(&mut UserAggregate, Vec<T>),
    ) -> bool {
        let Some(record) = self.read_record::<Vec<T>>(field.entity_kind(), owner_id).await else {
            return false;
        };
        let freshness = record.freshness();
        self.apply(generation, |state| {
            set(state, record.data);
            state.set_field_state(field, freshness.into());
        });
        freshness == Freshness::Fresh
    }

    pub(super) async fn fetch_field(&self, field: Field, owner_id: &str, generation: u64) -> Result<()> {
        match field {
            Field::Profile => self.fetch_profile(owner_id, generation).await,
            Field::Reviews => {
                self.fetch_first_page(
                    field,
                    Collection::Reviews,
                    &self.reviews,
                    owner_id,
                    generation,
                    |state, items| state.reviews = items,
                )
                .await
            }
            Field::Lists => {
                self.fetch_first_page(
                    field,
                    Collection::Lists,
                    &self.lists,
                    owner_id,
                    generation,
                    |state, items| state.lists = items,
                )
                .await
            }
            Field::Restaurants => self.fetch_restaurants(owner_id, generation).await,
        }
    }

    async fn fetch_profile(&self, owner_id: &str, generation: u64) -> Result<()> {
        let ticket = self.ticket(Field::Profile, generation);
        self.commit(ticket, |state| {
            state.transition(Field::Profile, FieldState::begin_fetch)
        });

        let key = fetch_operation_key(EntityKind::Profile, owner_id, None);
        let gateway = Arc::clone(&self.gateway);
        let owner = owner_id.to_string();
        let result = self
            .profiles
            .run(&key, move || async move { gateway.fetch_profile(&owner).await })
            .await;

        match result {
            Ok(profile) => {
                let applied = self.commit(ticket, |state| {
                    state.profile = ProfileState::Visible(profile.clone());
                    state.transition(Field::Profile, FieldState::finish_fetch);
                });
                if applied {
                    self.write_record(EntityKind::Profile, owner_id, &profile)
                        .await;
                }
                Ok(())
            }
            Err(ApiError::NotFound { .. }) => {
                tracing::debug!(owner_id, "Profile is private or does not exist");
                let applied = self.commit(ticket, |state| {
                    state.profile = ProfileState::Absent;
                    state.transition(Field::Profile, FieldState::finish_fetch);
                });
                if applied {
                    self.remove_record(EntityKind::Profile, owner_id).await;
                }
                Ok(())
            }
            Err(err) => {
                let mut kept_stale = false;
                self.commit(ticket, |state| {
                    kept_stale = state.field_state(Field::Profile).has_data();
                    state.transition(Field::Profile, FieldState::fail_fetch);
                    // Stale data stays on screen without an error banner.
                    if !kept_stale {
                        state.error = Some(AggregateError {
                            kind: err.kind(),
                            message: err.to_string(),
                        });
                    }
                });
                if kept_stale {
                    tracing::warn!(owner_id, error = %err, "Profile revalidation failed, keeping cached profile");
                } else {
                    tracing::warn!(owner_id, error = %err, "Failed to load profile");
                }
                Err(err)
            }
        }
    }

    /// Fetches the first page of reviews or lists, replacing the field.
    async fn fetch_first_page<T>(
        &self,
        field: Field,
        collection: Collection,
        inflight: &InFlight<Page<T>, ApiError>,
        owner_id: &str,
        generation: u64,
        set: fn(&mut UserAggregate, Vec<T>),
    ) -> Result<()>
    where
        T: Identified + Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let ticket = self.ticket(field, generation);
        self.commit(ticket, |state| state.transition(field, FieldState::begin_fetch));

        let query = PageQuery::first(self.config.page_size);
        match self
            .fetch_page(inflight, field.entity_kind(), collection, owner_id, query)
            .await
        {
            Ok(page) => {
                let items = dedup_by_identity(page.data);
                let applied = self.commit(ticket, |state| {
                    set(state, items.clone());
                    state.transition(field, FieldState::finish_fetch);
                });
                if applied {
                    self.write_record(field.entity_kind(), owner_id, &items)
                        .await;
                }
                Ok(())
            }
            Err(err) => {
                self.fail_field(ticket, owner_id, &err);
                Err(err)
            }
        }
    }

    async fn fetch_restaurants(&self, owner_id: &str, generation: u64) -> Result<()> {
        let ticket = self.ticket(Field::Restaurants, generation);
        self.commit(ticket, |state| {
            state.transition(Field::Restaurants, FieldState::begin_fetch)
        });

        let query = PageQuery::first(self.config.page_size);
        match self
            .fetch_page(
                &self.restaurants,
                EntityKind::Restaurants,
                Collection::Restaurants,
                owner_id,
                query,
            )
            .await
        {
            Ok(page) => {
                let cursor = RestaurantsCursor::after_page(page.next_cursor);
                let items = dedup_by_identity(page.data);
                let applied = self.commit(ticket, |state| {
                    state.restaurants = items.clone();
                    state.pagination = cursor.clone();
                    state.transition(Field::Restaurants, FieldState::finish_fetch);
                });
                if applied {
                    self.write_record(EntityKind::Restaurants, owner_id, &items)
                        .await;
                    self.write_record(EntityKind::RestaurantsCursor, owner_id, &cursor)
                        .await;
                }
                Ok(())
            }
            Err(err) => {
                self.fail_field(ticket, owner_id, &err);
                Err(err)
            }
        }
    }

    /// Fetches one page through the in-flight map of its kind.
    pub(super) async fn fetch_page<T>(
        &self,
        inflight: &InFlight<Page<T>, ApiError>,
        kind: EntityKind,
        collection: Collection,
        owner_id: &str,
        query: PageQuery,
    ) -> Result<Page<T>>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let extra = match &query {
            PageQuery::Cursor {
                cursor: Some(cursor),
                ..
            } => Some(cursor.as_str()),
            _ => None,
        };
        let key = fetch_operation_key(kind, owner_id, extra);
        let gateway = Arc::clone(&self.gateway);
        let owner = owner_id.to_string();

        inflight
            .run(&key, move || async move {
                gateway
                    .fetch_collection::<T>(&owner, collection, &query)
                    .await
            })
            .await
    }

    /// Records a failed sub-resource fetch; rendered data is kept.
    fn fail_field(&self, ticket: FieldTicket, owner_id: &str, err: &ApiError) {
        let field = ticket.field;
        self.commit(ticket, |state| state.transition(field, FieldState::fail_fetch));
        tracing::warn!(owner_id, ?field, error = %err, "Failed to load sub-resource, continuing");
    }
}
