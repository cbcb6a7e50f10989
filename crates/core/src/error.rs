//! Failure taxonomy shared by the gateway and the aggregate cache.
//!
//! [`ErrorKind`] is a plain classification; the shell attaches messages and
//! context in its own error type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a data-access failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transport-level failure before a response arrived.
    Network,
    /// The client-enforced timeout elapsed and the request was aborted.
    RequestTimeout,
    /// No credential could be obtained.
    AuthUnavailable,
    /// The server answered 401.
    Unauthorized,
    /// The server answered 404.
    NotFound,
    /// The server answered 5xx.
    ServerError,
    /// The server answered another 4xx.
    ClientError,
    /// A response body could not be parsed.
    ParseError,
    /// Best-effort persistence failed.
    CacheWriteError,
}

impl ErrorKind {
    /// Returns true if this kind terminates the signed-in session.
    pub fn is_fatal_auth(&self) -> bool {
        matches!(self, ErrorKind::Unauthorized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network_error",
            ErrorKind::RequestTimeout => "request_timeout",
            ErrorKind::AuthUnavailable => "auth_unavailable",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ServerError => "server_error",
            ErrorKind::ClientError => "client_error",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::CacheWriteError => "cache_write_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a non-success HTTP status code to an [`ErrorKind`].
///
/// - `401` -> `Unauthorized`
/// - `404` -> `NotFound`
/// - other `4xx` -> `ClientError`
/// - `5xx` -> `ServerError`
///
/// Returns `None` for statuses that are not failures (`1xx`-`3xx`).
///
/// # Examples
///
/// ```
/// use platepal_core::error::{status_to_error_kind, ErrorKind};
///
/// assert_eq!(status_to_error_kind(404), Some(ErrorKind::NotFound));
/// assert_eq!(status_to_error_kind(200), None);
/// ```
pub fn status_to_error_kind(status: u16) -> Option<ErrorKind> {
    match status {
        401 => Some(ErrorKind::Unauthorized),
        404 => Some(ErrorKind::NotFound),
        400..=499 => Some(ErrorKind::ClientError),
        500..=599 => Some(ErrorKind::ServerError),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_401_maps_to_unauthorized() {
        assert_eq!(status_to_error_kind(401), Some(ErrorKind::Unauthorized));
    }

    #[test]
    fn test_404_maps_to_not_found() {
        assert_eq!(status_to_error_kind(404), Some(ErrorKind::NotFound));
    }

    #[test]
    fn test_other_4xx_map_to_client_error() {
        for status in [400, 403, 409, 422, 429, 499] {
            assert_eq!(status_to_error_kind(status), Some(ErrorKind::ClientError));
        }
    }

    #[test]
    fn test_5xx_map_to_server_error() {
        for status in [500, 502, 503, 599] {
            assert_eq!(status_to_error_kind(status), Some(ErrorKind::ServerError));
        }
    }

    #[test]
    fn test_success_and_redirect_are_not_errors() {
        for status in [100, 200, 201, 204, 301, 304] {
            assert_eq!(status_to_error_kind(status), None);
        }
    }

    #[test]
    fn test_only_unauthorized_ends_the_session() {
        assert!(ErrorKind::Unauthorized.is_fatal_auth());
        assert!(!ErrorKind::AuthUnavailable.is_fatal_auth());
        assert!(!ErrorKind::ClientError.is_fatal_auth());
        assert!(!ErrorKind::RequestTimeout.is_fatal_auth());
    }

    #[test]
    fn test_display_is_snake_case() {
        assert_eq!(ErrorKind::CacheWriteError.to_string(), "cache_write_error");
        let json = serde_json::to_string(&ErrorKind::RequestTimeout).unwrap();
        assert_eq!(json, r#""request_timeout""#);
    }
}
