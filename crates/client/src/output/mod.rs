//! Output formatting functions.

pub mod json;
pub mod pretty;

use crate::aggregate::UserAggregate;
use crate::cli::OutputFormat;
use crate::gateway::GatewayEvent;

/// Format an arbitrary JSON-serializable value for output.
pub fn format_output<T: serde::Serialize>(value: &T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_json(value),
        OutputFormat::Pretty => json::format_json_pretty(value),
    }
}

/// Format an aggregate for output.
pub fn format_aggregate(aggregate: &UserAggregate, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_json(aggregate),
        OutputFormat::Pretty => pretty::format_aggregate(aggregate),
    }
}

/// Format a gateway event for stderr.
pub fn format_event(event: &GatewayEvent) -> String {
    match event {
        GatewayEvent::Notice { message } => message.clone(),
        GatewayEvent::RedirectToSignIn => "Sign in again to continue.".to_string(),
    }
}
