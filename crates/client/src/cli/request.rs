//! Generic request CLI command.

use clap::{Parser, ValueEnum};
use reqwest::Method;

/// Send an authenticated request and print the JSON response.
#[derive(Debug, Parser)]
pub struct RequestCommand {
    /// HTTP method.
    pub method: HttpMethod,
    /// Endpoint path, e.g. `/restaurants/r1`.
    pub path: String,
    /// JSON request body.
    #[arg(long)]
    pub body: Option<String>,
}

/// Supported HTTP methods.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}
