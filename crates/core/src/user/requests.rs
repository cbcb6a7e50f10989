use serde::{Deserialize, Serialize};

/// Paginated sub-resources of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Reviews,
    Lists,
    Restaurants,
}

impl Collection {
    /// Returns the path segment under `/users/{ownerId}/`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Collection::Reviews => "reviews",
            Collection::Lists => "lists",
            Collection::Restaurants => "restaurants",
        }
    }
}

/// Returns the profile path for an owner.
///
/// The owner id is percent-encoded as a single path segment.
pub fn profile_path(owner_id: &str) -> String {
    format!("/users/{}", urlencoding::encode(owner_id))
}

/// Returns the path of an owner's collection.
pub fn collection_path(owner_id: &str, collection: Collection) -> String {
    format!(
        "/users/{}/{}",
        urlencoding::encode(owner_id),
        collection.path_segment()
    )
}

/// Pagination parameters accepted by the collection endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageQuery {
    /// Page-number pagination, 1-based.
    Number { page: u32, limit: u32 },
    /// Cursor pagination. `cursor: None` requests the first page.
    Cursor { cursor: Option<String>, limit: u32 },
}

impl PageQuery {
    /// First page in cursor mode.
    pub fn first(limit: u32) -> Self {
        PageQuery::Cursor {
            cursor: None,
            limit,
        }
    }

    /// Page following `cursor`.
    pub fn after(cursor: impl Into<String>, limit: u32) -> Self {
        PageQuery::Cursor {
            cursor: Some(cursor.into()),
            limit,
        }
    }

    /// Converts to query-string pairs.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        match self {
            PageQuery::Number { page, limit } => vec![
                ("page".to_string(), page.to_string()),
                ("limit".to_string(), limit.to_string()),
            ],
            PageQuery::Cursor { cursor, limit } => {
                let mut pairs = Vec::with_capacity(2);
                if let Some(cursor) = cursor {
                    pairs.push(("cursor".to_string(), cursor.clone()));
                }
                pairs.push(("limit".to_string(), limit.to_string()));
                pairs
            }
        }
    }
}

/// Response envelope of the collection endpoints.
///
/// A missing `nextCursor` marks the end of the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Returns true if another page can be requested.
    pub fn has_more(&self) -> bool {
        self.next_cursor.as_deref().is_some_and(|c| !c.is_empty())
    }
}
