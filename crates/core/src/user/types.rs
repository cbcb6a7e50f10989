use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entities with a stable identity, used to suppress duplicates in
/// incrementally loaded collections.
pub trait Identified {
    fn identity(&self) -> &str;
}

/// How much of a profile the requesting user may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// The requester owns the profile.
    Owner,
    #[default]
    Public,
    /// Only followers see the collections.
    Followers,
    Private,
    #[serde(other)]
    Unknown,
}

impl AccessLevel {
    /// Returns true if the requester may see the owner's collections.
    pub fn allows_collections(&self) -> bool {
        matches!(self, AccessLevel::Owner | AccessLevel::Public | AccessLevel::Followers)
    }
}

/// A user's public profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub access_level: AccessLevel,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Creates a profile with the given id and username.
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            display_name: None,
            bio: None,
            avatar_url: None,
            access_level: AccessLevel::Public,
            created_at: None,
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the access level.
    pub fn with_access_level(mut self, access_level: AccessLevel) -> Self {
        self.access_level = access_level;
        self
    }

    /// Name to show in the UI: the display name when present.
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// A review a user wrote for a restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub restaurant_id: String,
    #[serde(default)]
    pub restaurant_name: Option<String>,
    /// Rating from 1 to 5.
    pub rating: u8,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Identified for Review {
    fn identity(&self) -> &str {
        &self.id
    }
}

/// A named, user-curated list of restaurants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub restaurant_count: u32,
    #[serde(default)]
    pub is_public: bool,
}

impl Identified for UserList {
    fn identity(&self) -> &str {
        &self.id
    }
}

/// A restaurant the user saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Restaurant {
    /// Creates a restaurant with the given id and name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cuisine: None,
            address: None,
            rating: None,
            image_url: None,
        }
    }

    /// Sets the cuisine.
    pub fn with_cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisine = Some(cuisine.into());
        self
    }
}

impl Identified for Restaurant {
    fn identity(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_deserializes_camel_case_fields() {
        let json = r#"{
            "id": "u1",
            "username": "ada",
            "displayName": "Ada L.",
            "avatarUrl": "https://img.example/ada.png",
            "accessLevel": "followers"
        }"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("Ada L."));
        assert_eq!(profile.access_level, AccessLevel::Followers);
        assert_eq!(profile.shown_name(), "Ada L.");
    }

    #[test]
    fn test_profile_missing_optional_fields_defaults() {
        let profile: Profile = serde_json::from_str(r#"{"id":"u1","username":"ada"}"#).unwrap();
        assert_eq!(profile.access_level, AccessLevel::Public);
        assert_eq!(profile.shown_name(), "ada");
    }

    #[test]
    fn test_unknown_access_level_does_not_fail() {
        let profile: Profile =
            serde_json::from_str(r#"{"id":"u1","username":"ada","accessLevel":"vip"}"#).unwrap();
        assert_eq!(profile.access_level, AccessLevel::Unknown);
        assert!(!profile.access_level.allows_collections());
    }

    #[test]
    fn test_access_level_collections() {
        assert!(AccessLevel::Owner.allows_collections());
        assert!(AccessLevel::Public.allows_collections());
        assert!(AccessLevel::Followers.allows_collections());
        assert!(!AccessLevel::Private.allows_collections());
    }

    #[test]
    fn test_restaurant_identity_is_id() {
        let restaurant = Restaurant::new("r1", "Noodle Bar").with_cuisine("ramen");
        assert_eq!(restaurant.identity(), "r1");
        assert_eq!(restaurant.cuisine.as_deref(), Some("ramen"));
    }
}
