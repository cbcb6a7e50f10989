mod functions;
mod traits;
mod types;

pub use functions::{calculate_expiry, is_token_usable};
pub use traits::FallbackCredential;
pub use types::{SessionGrant, SessionToken};
