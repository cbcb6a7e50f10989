//! Client error types.

use platepal_core::cache::CacheError;
use platepal_core::error::{status_to_error_kind, ErrorKind};
use platepal_core::inflight::TaskFailed;
use thiserror::Error;

/// Result type alias for client module.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur during gateway and cache operations.
///
/// Cloneable so one failure can be handed to every caller sharing an
/// in-flight fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    RequestTimeout(String),

    #[error("No credential available: {0}")]
    AuthUnavailable(String),

    #[error("Unauthorized: the session has ended")]
    Unauthorized,

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Request rejected with {status}: {message}")]
    Client { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("Cache write failed: {0}")]
    CacheWrite(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl ApiError {
    /// Builds the error for a non-success HTTP status.
    pub fn from_status(status: u16, resource: &str, message: String) -> Self {
        match status_to_error_kind(status) {
            Some(ErrorKind::Unauthorized) => ApiError::Unauthorized,
            Some(ErrorKind::NotFound) => ApiError::NotFound {
                resource: resource.to_string(),
            },
            Some(ErrorKind::ServerError) => ApiError::Server { status, message },
            _ => ApiError::Client { status, message },
        }
    }

    /// Classifies the error.
    ///
    /// Construction-time failures (`InvalidUrl`, `Config`) count as client
    /// errors; a failed background task counts as a network failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) | ApiError::Task(_) => ErrorKind::Network,
            ApiError::RequestTimeout(_) => ErrorKind::RequestTimeout,
            ApiError::AuthUnavailable(_) => ErrorKind::AuthUnavailable,
            ApiError::Unauthorized => ErrorKind::Unauthorized,
            ApiError::NotFound { .. } => ErrorKind::NotFound,
            ApiError::Server { .. } => ErrorKind::ServerError,
            ApiError::Client { .. } | ApiError::InvalidUrl(_) | ApiError::Config(_) => {
                ErrorKind::ClientError
            }
            ApiError::Parse(_) => ErrorKind::ParseError,
            ApiError::CacheWrite(_) => ErrorKind::CacheWriteError,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::RequestTimeout(err.to_string())
        } else if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidUrl(err.to_string())
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        ApiError::CacheWrite(err.to_string())
    }
}

impl From<TaskFailed> for ApiError {
    fn from(err: TaskFailed) -> Self {
        ApiError::Task(err.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_through_taxonomy() {
        assert_eq!(
            ApiError::from_status(401, "/users/u1", String::new()),
            ApiError::Unauthorized
        );
        assert_eq!(
            ApiError::from_status(404, "/users/u1", String::new()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ApiError::from_status(503, "/users/u1", "down".to_string()),
            ApiError::Server {
                status: 503,
                message: "down".to_string()
            }
        );
        assert_eq!(
            ApiError::from_status(422, "/users/u1", "bad".to_string()).kind(),
            ErrorKind::ClientError
        );
    }

    #[test]
    fn test_cache_error_becomes_cache_write() {
        let err: ApiError = CacheError::OperationFailed("disk full".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::CacheWriteError);
    }

    #[test]
    fn test_json_error_becomes_parse() {
        let err: ApiError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::ParseError);
    }

    #[test]
    fn test_not_found_display_names_resource() {
        let err = ApiError::NotFound {
            resource: "/users/u9".to_string(),
        };
        assert_eq!(err.to_string(), "Resource not found: /users/u9");
    }
}
