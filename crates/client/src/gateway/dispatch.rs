//! Request dispatch and typed JSON helpers.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use tokio::time::Instant;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::Gateway;
use crate::error::{ApiError, Result};

/// Options for a single dispatched request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// JSON body, if any.
    pub body: Option<Value>,
    /// Overrides the configured request timeout.
    pub timeout: Option<Duration>,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            timeout: None,
            query: Vec::new(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    /// Sets a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl Gateway {
    /// Issues an authenticated request.
    ///
    /// Returns the raw response for every status except `401`, which tears
    /// down all local state, emits the sign-in redirect and fails with
    /// `Unauthorized`. Transport failures and timeouts leave the session
    /// untouched.
    ///
    /// The timeout covers resolving the credential, sending the request and
    /// reading the response body.
    pub async fn dispatch(&self, endpoint: &str, options: RequestOptions) -> Result<reqwest::Response> {
        let url = self.url(endpoint)?;
        let timeout = options.timeout.unwrap_or(self.config.request_timeout);
        let deadline = Instant::now() + timeout;
        let timed_out = || {
            ApiError::RequestTimeout(format!(
                "{} {} exceeded {:?}",
                options.method, endpoint, timeout
            ))
        };

        let credential = match tokio::time::timeout_at(deadline, self.get_credential()).await {
            Ok(credential) => credential?,
            Err(_) => {
                tracing::debug!(method = %options.method, endpoint, ?timeout, "Timed out resolving credential");
                return Err(timed_out());
            }
        };

        let mut request = self
            .http
            .request(options.method.clone(), url)
            .bearer_auth(credential)
            .timeout(deadline.saturating_duration_since(Instant::now()));
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        tracing::debug!(method = %options.method, endpoint, "Dispatching request");

        // Dropping the send future on timeout aborts the request.
        let response = match tokio::time::timeout_at(deadline, request.send()).await {
            Ok(sent) => sent?,
            Err(_) => {
                tracing::debug!(method = %options.method, endpoint, ?timeout, "Request timed out");
                return Err(timed_out());
            }
        };

        if response.status() == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized(endpoint).await;
            return Err(ApiError::Unauthorized);
        }

        Ok(response)
    }

    /// GET `endpoint` and parse the body.
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.request_json(endpoint, RequestOptions::get()).await
    }

    /// POST a JSON body and parse the response.
    pub async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let options = RequestOptions::new(Method::POST).with_body(serde_json::to_value(body)?);
        self.request_json(endpoint, options).await
    }

    /// PUT a JSON body and parse the response.
    pub async fn put_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let options = RequestOptions::new(Method::PUT).with_body(serde_json::to_value(body)?);
        self.request_json(endpoint, options).await
    }

    /// PATCH with a JSON body and parse the response.
    pub async fn patch_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let options = RequestOptions::new(Method::PATCH).with_body(serde_json::to_value(body)?);
        self.request_json(endpoint, options).await
    }

    /// DELETE `endpoint`, ignoring any response body.
    pub async fn delete(&self, endpoint: &str) -> Result<()> {
        let response = self
            .dispatch(endpoint, RequestOptions::new(Method::DELETE))
            .await?;
        ensure_success(endpoint, response).await?;
        Ok(())
    }

    /// Dispatches and parses a JSON response. Non-2xx statuses map to errors.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let response = self.dispatch(endpoint, options).await?;
        let response = ensure_success(endpoint, response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Dispatches and returns the body as JSON, `null` when empty.
    pub async fn request_value(&self, endpoint: &str, options: RequestOptions) -> Result<Value> {
        let response = self.dispatch(endpoint, options).await?;
        let response = ensure_success(endpoint, response).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Handle error responses.
async fn ensure_success(endpoint: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(ApiError::from_status(status.as_u16(), endpoint, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_options_builders() {
        let options = RequestOptions::new(Method::POST)
            .with_body(serde_json::json!({"name": "Noodle Bar"}))
            .with_timeout(Duration::from_millis(250))
            .with_query(vec![("limit".to_string(), "5".to_string())]);

        assert_eq!(options.method, Method::POST);
        assert_eq!(options.timeout, Some(Duration::from_millis(250)));
        assert_eq!(options.query.len(), 1);
        assert!(options.body.is_some());
    }

    #[test]
    fn test_default_options_are_bodyless_get() {
        let options = RequestOptions::default();
        assert_eq!(options.method, Method::GET);
        assert!(options.body.is_none());
        assert!(options.timeout.is_none());
    }
}
