//! Pretty output formatting.

use platepal_core::user::{Profile, Restaurant, Review, UserList};

use crate::aggregate::{FieldState, ProfileState, UserAggregate};

/// Format a profile for display.
pub fn format_profile(profile: &Profile) -> String {
    let mut output = format!(
        "{} (@{})\n  ID: {}\n  Access: {:?}",
        profile.shown_name(),
        profile.username,
        profile.id,
        profile.access_level
    );
    if let Some(bio) = &profile.bio {
        output.push_str(&format!("\n  Bio: {}", bio));
    }
    output
}

/// Format a review for display.
pub fn format_review(review: &Review) -> String {
    let name = review
        .restaurant_name
        .as_deref()
        .unwrap_or(&review.restaurant_id);
    let mut output = format!("{} [{}/5]\n  ID: {}", name, review.rating, review.id);
    if let Some(body) = &review.body {
        output.push_str(&format!("\n  {}", body));
    }
    output
}

/// Format a list for display.
pub fn format_list(list: &UserList) -> String {
    let visibility = if list.is_public { "public" } else { "private" };
    let mut output = format!(
        "{} ({} restaurants, {})\n  ID: {}",
        list.name, list.restaurant_count, visibility, list.id
    );
    if let Some(desc) = &list.description {
        output.push_str(&format!("\n  Description: {}", desc));
    }
    output
}

/// Format a restaurant for display.
pub fn format_restaurant(restaurant: &Restaurant) -> String {
    let mut output = format!("{}\n  ID: {}", restaurant.name, restaurant.id);
    if let Some(cuisine) = &restaurant.cuisine {
        output.push_str(&format!("\n  Cuisine: {}", cuisine));
    }
    if let Some(address) = &restaurant.address {
        output.push_str(&format!("\n  Address: {}", address));
    }
    if let Some(rating) = restaurant.rating {
        output.push_str(&format!("\n  Rating: {:.1}", rating));
    }
    output
}

fn format_section<T>(
    title: &str,
    state: FieldState,
    items: &[T],
    format_item: fn(&T) -> String,
) -> String {
    let mut output = format!("{} ({}, {:?})\n", title, items.len(), state);
    output.push_str(&"-".repeat(40));
    if items.is_empty() {
        output.push_str("\nNone.");
    }
    for item in items {
        output.push_str(&format!("\n{}", format_item(item)));
        output.push('\n');
    }
    output
}

/// Format a whole aggregate for display.
pub fn format_aggregate(aggregate: &UserAggregate) -> String {
    let mut sections = Vec::new();

    sections.push(match &aggregate.profile {
        ProfileState::Visible(profile) => format_profile(profile),
        ProfileState::Absent => "This profile is private or does not exist.".to_string(),
        ProfileState::Unknown => "Profile not loaded.".to_string(),
    });
    sections.push(format_section(
        "REVIEWS",
        aggregate.fields.reviews,
        &aggregate.reviews,
        format_review,
    ));
    sections.push(format_section(
        "LISTS",
        aggregate.fields.lists,
        &aggregate.lists,
        format_list,
    ));

    let mut restaurants = format_section(
        "RESTAURANTS",
        aggregate.fields.restaurants,
        &aggregate.restaurants,
        format_restaurant,
    );
    if aggregate.has_more_restaurants() {
        restaurants.push_str("\n(more available)");
    }
    sections.push(restaurants);

    if let Some(error) = &aggregate.error {
        sections.push(format!("Error [{}]: {}", error.kind, error.message));
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Field;

    #[test]
    fn test_absent_profile_message() {
        let mut aggregate = UserAggregate::for_owner("u1");
        aggregate.profile = ProfileState::Absent;
        assert!(format_aggregate(&aggregate).contains("private or does not exist"));
    }

    #[test]
    fn test_more_marker_only_with_cursor() {
        let mut aggregate = UserAggregate::for_owner("u1");
        aggregate.restaurants = vec![Restaurant::new("r1", "Noodle Bar")];
        aggregate.set_field_state(Field::Restaurants, FieldState::Fresh);
        assert!(!format_aggregate(&aggregate).contains("more available"));

        aggregate.pagination.has_more = true;
        assert!(format_aggregate(&aggregate).contains("more available"));
    }

    #[test]
    fn test_profile_uses_display_name() {
        let profile = Profile::new("u1", "ada").with_display_name("Ada L.");
        assert!(format_profile(&profile).starts_with("Ada L. (@ada)"));
    }
}
