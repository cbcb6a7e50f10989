mod error;
mod keys;
mod record;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{entity_key, fetch_operation_key, owner_keys, EntityKind, FETCH_SESSION_KEY};
pub use record::{decode_record, encode_record, CachedEntityRecord, Freshness};
pub use traits::KeyValueStore;
