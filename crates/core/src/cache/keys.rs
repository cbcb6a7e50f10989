use std::fmt;

/// Kinds of per-owner records kept in the persisted store.
///
/// Each kind owns a key prefix; a record key is the prefix followed by the
/// owner identifier (`profile_u1`, `cursor_restaurants_u1`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Profile,
    Reviews,
    Lists,
    Restaurants,
    RestaurantsCursor,
}

impl EntityKind {
    /// Every kind, in the order they are invalidated.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Profile,
        EntityKind::Reviews,
        EntityKind::Lists,
        EntityKind::Restaurants,
        EntityKind::RestaurantsCursor,
    ];

    /// Returns the key prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::Profile => "profile_",
            EntityKind::Reviews => "reviews_",
            EntityKind::Lists => "lists_",
            EntityKind::Restaurants => "restaurants_",
            EntityKind::RestaurantsCursor => "cursor_restaurants_",
        }
    }

    /// Short name used in logs and in-flight operation keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Profile => "profile",
            EntityKind::Reviews => "reviews",
            EntityKind::Lists => "lists",
            EntityKind::Restaurants => "restaurants",
            EntityKind::RestaurantsCursor => "restaurants_cursor",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the persisted-store key for an owner's record of the given kind.
pub fn entity_key(kind: EntityKind, owner_id: &str) -> String {
    format!("{}{}", kind.prefix(), owner_id)
}

/// Returns every persisted-store key that belongs to an owner.
pub fn owner_keys(owner_id: &str) -> Vec<String> {
    EntityKind::ALL
        .iter()
        .map(|kind| entity_key(*kind, owner_id))
        .collect()
}

/// Returns the in-flight operation key for fetching an entity.
///
/// `extra` disambiguates fetches of the same kind, e.g. the pagination cursor.
pub fn fetch_operation_key(kind: EntityKind, owner_id: &str, extra: Option<&str>) -> String {
    match extra {
        Some(extra) => format!("fetch-entity:{}:{}:{}", kind, owner_id, extra),
        None => format!("fetch-entity:{}:{}", kind, owner_id),
    }
}

/// In-flight operation key for acquiring a session credential.
pub const FETCH_SESSION_KEY: &str = "fetch-session";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_key_concatenates_prefix_and_owner() {
        assert_eq!(entity_key(EntityKind::Profile, "u1"), "profile_u1");
        assert_eq!(entity_key(EntityKind::Reviews, "u1"), "reviews_u1");
        assert_eq!(entity_key(EntityKind::Lists, "u1"), "lists_u1");
        assert_eq!(entity_key(EntityKind::Restaurants, "u1"), "restaurants_u1");
        assert_eq!(
            entity_key(EntityKind::RestaurantsCursor, "u1"),
            "cursor_restaurants_u1"
        );
    }

    #[test]
    fn test_owner_keys_covers_every_kind() {
        let keys = owner_keys("abc");
        assert_eq!(keys.len(), EntityKind::ALL.len());
        assert!(keys.contains(&"profile_abc".to_string()));
        assert!(keys.contains(&"cursor_restaurants_abc".to_string()));
    }

    #[test]
    fn test_owner_keys_do_not_leak_across_owners() {
        let keys = owner_keys("u1");
        assert!(keys.iter().all(|k| k.ends_with("u1")));
        assert!(!keys.contains(&"profile_u2".to_string()));
    }

    #[test]
    fn test_fetch_operation_key() {
        assert_eq!(
            fetch_operation_key(EntityKind::Profile, "u1", None),
            "fetch-entity:profile:u1"
        );
        assert_eq!(
            fetch_operation_key(EntityKind::Restaurants, "u1", Some("c2")),
            "fetch-entity:restaurants:u1:c2"
        );
    }
}
