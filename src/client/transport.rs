//! HTTP transport for the UpCount API.
//!
//! [`Transport`] is the seam the rest of the client is written against. The
//! [`HttpTransport`] implementation attaches a bearer credential when one is
//! available and, on a `401`, refreshes the credential and retries the request
//! exactly once. Every other failure is returned unchanged.

use std::fmt;
use std::future::Future;

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

use crate::config::ClientConfig;

/// A failed request. `status` is `None` when no response was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: String,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.message),
            None => write!(f, "Request failed: {}", self.message),
        }
    }
}

impl std::error::Error for TransportError {}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// No response, or the server failed. Worth retrying later.
    pub fn is_unavailable(&self) -> bool {
        match self.status {
            None => true,
            Some(status) => status >= 500,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::status(status.as_u16(), e.to_string()),
            None => Self::network(e.to_string()),
        }
    }
}

/// Request/response transport. Paths are relative to the API base URL.
///
/// Successful responses yield the decoded JSON body, or `Value::Null` when the
/// body is empty.
pub trait Transport: Send + Sync {
    fn get(&self, path: &str) -> impl Future<Output = Result<Value, TransportError>> + Send;

    fn post(
        &self,
        path: &str,
        body: &Value,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;

    fn put(
        &self,
        path: &str,
        body: &Value,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;

    fn delete(&self, path: &str) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// Source of the bearer credential attached to requests.
pub trait Credentials: Send + Sync {
    /// The current credential, if there is a session.
    fn token(&self) -> impl Future<Output = Option<String>> + Send;

    /// A renewed credential after the server rejected the current one.
    fn refresh(&self) -> impl Future<Output = Option<String>> + Send;
}

/// [`Transport`] over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpTransport<C> {
    base_url: String,
    credentials: C,
    client: Client,
}

impl<C: Credentials> HttpTransport<C> {
    pub fn new(config: &ClientConfig, credentials: C) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            client,
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let token = self.credentials.token().await;
        let response = self
            .execute(method.clone(), path, body, token.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(%method, path, "Request unauthorized, refreshing credentials");
            match self.credentials.refresh().await {
                Some(fresh) => {
                    let retried = self.execute(method, path, body, Some(&fresh)).await?;
                    return handle_response(retried).await;
                }
                None => tracing::warn!("Credential refresh failed"),
            }
        }

        handle_response(response).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<reqwest::Response, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        req.send().await.map_err(|e| {
            tracing::error!("No response received from {}: {}", url, e);
            TransportError::from(e)
        })
    }
}

/// Decode a response, converting non-2xx statuses to [`TransportError`].
async fn handle_response(response: reqwest::Response) -> Result<Value, TransportError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&body)
            .map_err(|e| TransportError::status(status.as_u16(), format!("Invalid JSON: {}", e)));
    }

    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    tracing::error!(status = status.as_u16(), "API error: {}", message);
    Err(TransportError::status(status.as_u16(), message))
}

impl<C: Credentials> Transport for HttpTransport<C> {
    async fn get(&self, path: &str) -> Result<Value, TransportError> {
        self.send(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        self.send(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<Value, TransportError> {
        self.send(Method::DELETE, path, None).await
    }
}
