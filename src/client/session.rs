//! The application session: every provider, constructed once and owned here.

use std::sync::Arc;

use super::api::Api;
use super::identity::IdentityProvider;
use super::providers::{AppProvider, AuthProvider, GoalsProvider, LogsProvider};
use super::transport::{HttpTransport, Transport, TransportError};
use crate::config::ClientConfig;

/// Credentials drawn from an identity provider's current session.
pub struct IdentityCredentials<I> {
    identity: Arc<I>,
}

impl<I> IdentityCredentials<I> {
    pub fn new(identity: Arc<I>) -> Self {
        Self { identity }
    }
}

impl<I: IdentityProvider> super::transport::Credentials for IdentityCredentials<I> {
    async fn token(&self) -> Option<String> {
        self.identity.current_session().await.ok().map(|s| s.id_token)
    }

    async fn refresh(&self) -> Option<String> {
        match self.identity.refresh_session().await {
            Ok(session) => Some(session.id_token),
            Err(e) => {
                tracing::warn!("Could not refresh session: {}", e);
                None
            }
        }
    }
}

/// The providers for one application session.
///
/// Providers share a single [`Api`] and identity provider. Dropping the
/// session drops all client state.
pub struct Session<T, I> {
    pub identity: Arc<I>,
    pub api: Arc<Api<T>>,
    pub auth: AuthProvider<T, I>,
    pub goals: GoalsProvider<T>,
    pub logs: LogsProvider<T>,
    pub app: AppProvider,
}

/// A session talking HTTP, authenticated through the identity provider.
pub type HttpSession<I> = Session<HttpTransport<IdentityCredentials<I>>, I>;

impl<T: Transport, I: IdentityProvider> Session<T, I> {
    pub fn new(transport: T, identity: Arc<I>, app: AppProvider) -> Self {
        let api = Arc::new(Api::new(transport));
        Self {
            auth: AuthProvider::new(Arc::clone(&api), Arc::clone(&identity)),
            goals: GoalsProvider::new(Arc::clone(&api)),
            logs: LogsProvider::new(Arc::clone(&api)),
            identity,
            api,
            app,
        }
    }

    /// Sign out and drop the signed-in user's collections.
    pub async fn sign_out(&mut self) {
        self.auth.sign_out().await;
        self.goals = GoalsProvider::new(Arc::clone(&self.api));
        self.logs = LogsProvider::new(Arc::clone(&self.api));
    }
}

impl<I: IdentityProvider> HttpSession<I> {
    pub fn connect(
        config: &ClientConfig,
        identity: Arc<I>,
        app: AppProvider,
    ) -> Result<Self, TransportError> {
        let credentials = IdentityCredentials::new(Arc::clone(&identity));
        let transport = HttpTransport::new(config, credentials)?;
        Ok(Self::new(transport, identity, app))
    }

    /// Connect using the environment's client config and the settings saved
    /// in the user's config directory.
    pub fn connect_default(identity: Arc<I>) -> Result<Self, TransportError> {
        Self::connect(&ClientConfig::from_env(), identity, AppProvider::load_default())
    }
}
