//! platepal_client - authenticated request gateway and aggregate user-data
//! cache for the platepal API, plus the `platepal-client` CLI.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod output;
pub mod store;

pub use aggregate::{UserAggregate, UserDataCache};
pub use config::Config;
pub use context::{ClientContext, StoreKind};
pub use error::{ApiError, Result};
pub use gateway::{Gateway, GatewayEvent};
