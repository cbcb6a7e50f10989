//! User resource operations.

use serde::de::DeserializeOwned;

use platepal_core::user::{collection_path, profile_path, Collection, Page, PageQuery, Profile};

use super::{Gateway, RequestOptions};
use crate::error::Result;

impl Gateway {
    /// Get a user's profile. `NotFound` covers private profiles too.
    pub async fn fetch_profile(&self, owner_id: &str) -> Result<Profile> {
        self.get_json(&profile_path(owner_id)).await
    }

    /// Get one page of a user's collection.
    pub async fn fetch_collection<T: DeserializeOwned>(
        &self,
        owner_id: &str,
        collection: Collection,
        query: &PageQuery,
    ) -> Result<Page<T>> {
        let options = RequestOptions::get().with_query(query.to_query_pairs());
        self.request_json(&collection_path(owner_id, collection), options)
            .await
    }
}
