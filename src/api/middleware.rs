//! Bearer token authentication for the API.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::config::ServerConfig;

/// Resolves a bearer token to the `userId` it was issued for.
pub trait TokenVerifier: Send + Sync + 'static {
    fn verify(&self, token: &str) -> Option<String>;
}

/// A fixed set of tokens, typically loaded from `UPCOUNT_API_TOKENS`.
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    tokens: HashMap<String, String>,
}

impl StaticTokens {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    pub fn single(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(token.into(), user_id.into());
        Self { tokens }
    }
}

impl TokenVerifier for StaticTokens {
    fn verify(&self, token: &str) -> Option<String> {
        self.tokens.get(token).cloned()
    }
}

/// The authenticated caller, attached to each request by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
}

/// Security configuration for the API.
#[derive(Clone)]
pub struct SecurityConfig {
    verifier: Arc<dyn TokenVerifier>,
}

impl SecurityConfig {
    /// Load accepted tokens from the environment.
    pub fn from_env() -> Self {
        Self::from_server_config(&ServerConfig::from_env())
    }

    pub fn from_server_config(config: &ServerConfig) -> Self {
        if config.tokens.is_empty() {
            tracing::warn!("No API tokens configured; every protected request will be rejected");
        }
        Self::with_verifier(StaticTokens::new(config.tokens.clone()))
    }

    pub fn with_verifier(verifier: impl TokenVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }

    pub fn verify(&self, token: &str) -> Option<String> {
        self.verifier.verify(token)
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Rejects requests without a valid bearer token and attaches the [`Caller`].
pub async fn auth_middleware(
    State(config): State<SecurityConfig>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let user_id = match auth_header {
        Some(header) if header.starts_with("Bearer ") => {
            let token = &header[7..];
            match config.verify(token) {
                Some(user_id) => user_id,
                None => {
                    tracing::warn!("Invalid bearer token provided");
                    return Err(StatusCode::UNAUTHORIZED);
                }
            }
        }
        Some(_) => {
            tracing::warn!("Invalid Authorization header format");
            return Err(StatusCode::UNAUTHORIZED);
        }
        None => {
            tracing::warn!("Missing Authorization header");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    request.extensions_mut().insert(Caller { user_id });
    Ok(next.run(request).await)
}
