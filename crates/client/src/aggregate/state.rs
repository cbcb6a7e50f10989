//! The aggregate view consumers render, and its per-field lifecycle.

use serde::Serialize;

use platepal_core::cache::{EntityKind, Freshness};
use platepal_core::error::ErrorKind;
use platepal_core::user::{Profile, Restaurant, Review, UserList};

/// Lifecycle of one sub-resource for the current owner.
///
/// `Empty -> Loading -> Fresh`, `Fresh | Stale -> Revalidating -> Fresh`.
/// A failed fetch leads to `Error` when nothing is rendered, or back to
/// `Stale` when cached data is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldState {
    #[default]
    Empty,
    Loading,
    /// Background refresh while stale data stays rendered.
    Revalidating,
    Fresh,
    Stale,
    Error,
}

impl FieldState {
    /// State after a fetch starts.
    pub fn begin_fetch(self) -> Self {
        match self {
            FieldState::Fresh | FieldState::Stale | FieldState::Revalidating => {
                FieldState::Revalidating
            }
            FieldState::Empty | FieldState::Loading | FieldState::Error => FieldState::Loading,
        }
    }

    /// State after a fetch succeeds.
    pub fn finish_fetch(self) -> Self {
        FieldState::Fresh
    }

    /// State after a fetch fails. Rendered data is never dropped.
    pub fn fail_fetch(self) -> Self {
        if self.has_data() {
            FieldState::Stale
        } else {
            FieldState::Error
        }
    }

    /// State after the cache of a field is invalidated. Fetches running at
    /// that point no longer count, so nothing stays loading.
    pub fn invalidate(self) -> Self {
        match self {
            FieldState::Fresh | FieldState::Revalidating => FieldState::Stale,
            FieldState::Loading => FieldState::Empty,
            other => other,
        }
    }

    /// Returns true if the field has data to render.
    pub fn has_data(&self) -> bool {
        matches!(
            self,
            FieldState::Fresh | FieldState::Stale | FieldState::Revalidating
        )
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FieldState::Loading | FieldState::Revalidating)
    }
}

impl From<Freshness> for FieldState {
    fn from(freshness: Freshness) -> Self {
        match freshness {
            Freshness::Fresh => FieldState::Fresh,
            Freshness::Stale => FieldState::Stale,
        }
    }
}

/// Sub-resources of the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Profile,
    Reviews,
    Lists,
    Restaurants,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Profile, Field::Reviews, Field::Lists, Field::Restaurants];

    pub(crate) fn index(&self) -> usize {
        match self {
            Field::Profile => 0,
            Field::Reviews => 1,
            Field::Lists => 2,
            Field::Restaurants => 3,
        }
    }

    /// Kind of the persisted record holding this field.
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Field::Profile => EntityKind::Profile,
            Field::Reviews => EntityKind::Reviews,
            Field::Lists => EntityKind::Lists,
            Field::Restaurants => EntityKind::Restaurants,
        }
    }
}

/// Lifecycle state of every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FieldStates {
    pub profile: FieldState,
    pub reviews: FieldState,
    pub lists: FieldState,
    pub restaurants: FieldState,
}

impl FieldStates {
    pub fn get(&self, field: Field) -> FieldState {
        match field {
            Field::Profile => self.profile,
            Field::Reviews => self.reviews,
            Field::Lists => self.lists,
            Field::Restaurants => self.restaurants,
        }
    }

    fn slot(&mut self, field: Field) -> &mut FieldState {
        match field {
            Field::Profile => &mut self.profile,
            Field::Reviews => &mut self.reviews,
            Field::Lists => &mut self.lists,
            Field::Restaurants => &mut self.restaurants,
        }
    }
}

/// Per-field loading flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LoadingPerField {
    pub profile: bool,
    pub reviews: bool,
    pub lists: bool,
    pub restaurants: bool,
}

/// What is known about the owner's profile.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "status", content = "profile", rename_all = "snake_case")]
pub enum ProfileState {
    #[default]
    Unknown,
    Visible(Profile),
    /// The profile is private or does not exist.
    Absent,
}

impl ProfileState {
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            ProfileState::Visible(profile) => Some(profile),
            _ => None,
        }
    }
}

/// Cursor state of the incrementally loaded restaurants.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantsCursor {
    pub cursor: Option<String>,
    pub has_more: bool,
}

impl RestaurantsCursor {
    /// Cursor state after a page with the given `next_cursor`.
    ///
    /// A missing or empty next cursor is terminal.
    pub fn after_page(next_cursor: Option<String>) -> Self {
        let cursor = next_cursor.filter(|cursor| !cursor.is_empty());
        Self {
            has_more: cursor.is_some(),
            cursor,
        }
    }
}

/// Error surfaced to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Composed view of one owner's data.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAggregate {
    pub owner_id: Option<String>,
    pub profile: ProfileState,
    pub reviews: Vec<Review>,
    pub lists: Vec<UserList>,
    pub restaurants: Vec<Restaurant>,
    pub loading: bool,
    pub loading_per_field: LoadingPerField,
    pub fields: FieldStates,
    pub error: Option<AggregateError>,
    pub pagination: RestaurantsCursor,
}

impl UserAggregate {
    /// Empty aggregate for an owner.
    pub fn for_owner(owner_id: &str) -> Self {
        Self {
            owner_id: Some(owner_id.to_string()),
            ..Self::default()
        }
    }

    pub fn is_owner(&self, owner_id: &str) -> bool {
        self.owner_id.as_deref() == Some(owner_id)
    }

    pub fn has_more_restaurants(&self) -> bool {
        self.pagination.has_more
    }

    pub fn field_state(&self, field: Field) -> FieldState {
        self.fields.get(field)
    }

    /// Sets a field's state and recomputes the loading flags.
    pub fn set_field_state(&mut self, field: Field, state: FieldState) {
        *self.fields.slot(field) = state;
        self.loading_per_field = LoadingPerField {
            profile: self.fields.profile.is_loading(),
            reviews: self.fields.reviews.is_loading(),
            lists: self.fields.lists.is_loading(),
            restaurants: self.fields.restaurants.is_loading(),
        };
        self.loading = self.loading_per_field.profile
            || self.loading_per_field.reviews
            || self.loading_per_field.lists
            || self.loading_per_field.restaurants;
    }

    /// Applies a state transition to a field.
    pub fn transition(&mut self, field: Field, f: impl FnOnce(FieldState) -> FieldState) {
        let next = f(self.field_state(field));
        self.set_field_state(field, next);
    }
}
