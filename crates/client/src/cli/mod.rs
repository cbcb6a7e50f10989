//! CLI command definitions.

pub mod request;
pub mod users;

use clap::{Parser, Subcommand, ValueEnum};

/// CLI client for the platepal API.
#[derive(Debug, Parser)]
#[command(name = "platepal-client")]
#[command(about = "CLI client for the platepal API", long_about = None)]
pub struct Cli {
    /// Server base URL.
    #[arg(long, env = "PLATEPAL_URL", default_value = "http://localhost:3000")]
    pub base_url: String,

    /// Output format.
    #[arg(long, default_value = "pretty")]
    pub format: OutputFormat,

    /// Suppress non-essential output.
    #[arg(long)]
    pub quiet: bool,

    /// Keep the cache in memory instead of the SQLite store.
    #[arg(long)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Raw JSON output.
    Json,
    /// Human-readable output.
    #[default]
    Pretty,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// User aggregate operations.
    Users(users::UsersCommand),
    /// Send an arbitrary authenticated request.
    Request(request::RequestCommand),
    /// Clear the local session and cache.
    Logout,
}
