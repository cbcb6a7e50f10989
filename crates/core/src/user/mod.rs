mod merge;
mod requests;
mod types;

pub use merge::{append_unique, dedup_by_identity};
pub use requests::{collection_path, profile_path, Collection, Page, PageQuery};
pub use types::{AccessLevel, Identified, Profile, Restaurant, Review, UserList};
