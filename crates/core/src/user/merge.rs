//! Identity-based merging for incrementally loaded collections.
//!
//! Pure functions: the same identity never appears twice in a merged
//! collection, whatever the backend returns across pages.

use std::collections::HashSet;

use super::types::Identified;

/// Appends `incoming` to `existing`, skipping entries whose identity is
/// already present (in `existing` or earlier in `incoming`).
///
/// Returns the number of entries appended.
pub fn append_unique<T: Identified>(existing: &mut Vec<T>, incoming: Vec<T>) -> usize {
    let mut seen: HashSet<String> = existing
        .iter()
        .map(|item| item.identity().to_string())
        .collect();
    let before = existing.len();

    for item in incoming {
        if seen.insert(item.identity().to_string()) {
            existing.push(item);
        }
    }

    existing.len() - before
}

/// Removes later duplicates, keeping the first occurrence of each identity.
pub fn dedup_by_identity<T: Identified>(items: Vec<T>) -> Vec<T> {
    let mut result = Vec::with_capacity(items.len());
    append_unique(&mut result, items);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::Restaurant;

    fn ids(items: &[Restaurant]) -> Vec<&str> {
        items.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn append_unique_appends_new_entries_in_order() {
        let mut existing = vec![Restaurant::new("a", "A")];
        let added = append_unique(
            &mut existing,
            vec![Restaurant::new("b", "B"), Restaurant::new("c", "C")],
        );
        assert_eq!(added, 2);
        assert_eq!(ids(&existing), vec!["a", "b", "c"]);
    }

    #[test]
    fn append_unique_skips_overlap_with_existing() {
        let mut existing = vec![Restaurant::new("a", "A"), Restaurant::new("b", "B")];
        let added = append_unique(
            &mut existing,
            vec![Restaurant::new("b", "B again"), Restaurant::new("c", "C")],
        );
        assert_eq!(added, 1);
        assert_eq!(ids(&existing), vec!["a", "b", "c"]);
        assert_eq!(existing[1].name, "B");
    }

    #[test]
    fn append_unique_skips_duplicates_within_incoming() {
        let mut existing = Vec::new();
        let added = append_unique(
            &mut existing,
            vec![
                Restaurant::new("a", "A"),
                Restaurant::new("a", "A twice"),
                Restaurant::new("b", "B"),
            ],
        );
        assert_eq!(added, 2);
        assert_eq!(ids(&existing), vec!["a", "b"]);
    }

    #[test]
    fn dedup_by_identity_keeps_first_occurrence() {
        let result = dedup_by_identity(vec![
            Restaurant::new("x", "first"),
            Restaurant::new("y", "Y"),
            Restaurant::new("x", "second"),
        ]);
        assert_eq!(ids(&result), vec!["x", "y"]);
        assert_eq!(result[0].name, "first");
    }

    #[test]
    fn append_unique_empty_incoming_is_noop() {
        let mut existing = vec![Restaurant::new("a", "A")];
        assert_eq!(append_unique(&mut existing, Vec::new()), 0);
        assert_eq!(existing.len(), 1);
    }
}
