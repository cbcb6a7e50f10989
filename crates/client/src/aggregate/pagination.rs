//! Cursor-based incremental loading of restaurants.

use std::sync::atomic::Ordering;

use platepal_core::cache::EntityKind;
use platepal_core::user::{append_unique, Collection, PageQuery};

use super::{Field, RestaurantsCursor, UserDataCache};
use crate::error::Result;

impl UserDataCache {
    /// Appends the next page of restaurants for the current owner.
    ///
    /// A no-op when the owner is not loaded, there are no more pages, or a
    /// restaurants fetch (first page, next page or refresh) is running.
    /// Entities already present are skipped, so an identity never appears
    /// twice. A page that arrives after the restaurants were invalidated is
    /// dropped.
    pub async fn load_more_restaurants(&self, owner_id: &str) -> Result<()> {
        let Ok(_pagination) = self.pagination.try_lock() else {
            tracing::debug!(owner_id, "Restaurant page fetch already in progress");
            return Ok(());
        };

        let (ticket, cursor) = {
            let state = self.state.borrow();
            if !state.is_owner(owner_id) {
                tracing::debug!(owner_id, "Owner not loaded, nothing to paginate");
                return Ok(());
            }
            if state.field_state(Field::Restaurants).is_loading() {
                tracing::debug!(owner_id, "Restaurants are loading, skipping page fetch");
                return Ok(());
            }
            match (&state.pagination.cursor, state.pagination.has_more) {
                (Some(cursor), true) => {
                    let generation = self.generation.load(Ordering::Acquire);
                    (self.ticket(Field::Restaurants, generation), cursor.clone())
                }
                _ => {
                    tracing::trace!(owner_id, "No more restaurants");
                    return Ok(());
                }
            }
        };

        tracing::debug!(owner_id, cursor = %cursor, "Loading more restaurants");
        let query = PageQuery::after(cursor, self.config.page_size);
        let page = match self
            .fetch_page(
                &self.restaurants,
                EntityKind::Restaurants,
                Collection::Restaurants,
                owner_id,
                query,
            )
            .await
        {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(owner_id, error = %err, "Failed to load more restaurants");
                return Err(err);
            }
        };

        let next = RestaurantsCursor::after_page(page.next_cursor);
        let mut committed = None;
        self.commit(ticket, |state| {
            let added = append_unique(&mut state.restaurants, page.data);
            state.pagination = next.clone();
            committed = Some((state.restaurants.clone(), added));
        });

        if let Some((restaurants, added)) = committed {
            tracing::debug!(owner_id, added, has_more = next.has_more, "Restaurant page appended");
            self.write_record(EntityKind::Restaurants, owner_id, &restaurants)
                .await;
            self.write_record(EntityKind::RestaurantsCursor, owner_id, &next)
                .await;
        }
        Ok(())
    }
}
