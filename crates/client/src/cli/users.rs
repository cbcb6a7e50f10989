//! User CLI commands.

use clap::{Parser, Subcommand};

/// User aggregate commands.
#[derive(Debug, Parser)]
pub struct UsersCommand {
    #[command(subcommand)]
    pub action: UsersAction,
}

/// Available user actions.
#[derive(Debug, Subcommand)]
pub enum UsersAction {
    /// Load a user's profile, reviews, lists and restaurants.
    Load {
        /// Owner ID.
        owner: String,
    },
    /// Invalidate the cache for a user and load again.
    Refresh {
        /// Owner ID.
        owner: String,
    },
    /// Load a user, then fetch further pages of restaurants.
    More {
        /// Owner ID.
        owner: String,
        /// Number of additional pages.
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Drop everything cached for a user.
    Clear {
        /// Owner ID.
        owner: String,
    },
}
