use std::sync::Arc;

use thiserror::Error;

use crate::client::api::{Api, ClientError};
use crate::client::identity::{AuthError, AuthSession, IdentityProvider, SignUpResult};
use crate::client::transport::Transport;
use crate::models::{UpdateUserInput, User};
use crate::state::{AuthAction, AuthState, SessionCheck, Store};

pub const SIGN_IN_FAILED: &str = "Login failed. Please try again.";
pub const SIGN_UP_FAILED: &str = "Sign up failed. Please try again.";
pub const CONFIRM_FAILED: &str = "Failed to confirm account. Please try again.";
pub const RESEND_FAILED: &str = "Failed to resend confirmation code. Please try again.";
pub const RESET_FAILED: &str = "Failed to reset password. Please try again.";
pub const UPDATE_USER_FAILED: &str = "Failed to update user profile.";

/// A failed account operation, from either the identity provider or the API.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl SessionError {
    /// The message shown for this failure, or `fallback` when it is not a
    /// recognized condition.
    pub fn message(&self, fallback: &str) -> String {
        match self {
            Self::Auth(e) => e.user_message().unwrap_or(fallback).to_string(),
            Self::Client(_) => fallback.to_string(),
        }
    }
}

/// Owns the signed-in user and session status.
pub struct AuthProvider<T, I> {
    api: Arc<Api<T>>,
    identity: Arc<I>,
    store: Store<AuthState>,
}

impl<T: Transport, I: IdentityProvider> AuthProvider<T, I> {
    pub fn new(api: Arc<Api<T>>, identity: Arc<I>) -> Self {
        Self {
            api,
            identity,
            store: Store::default(),
        }
    }

    pub fn state(&self) -> AuthState {
        self.store.snapshot()
    }

    pub fn store(&self) -> &Store<AuthState> {
        &self.store
    }

    /// Resolve whether there is a usable session, loading the user if so.
    ///
    /// A missing session ends signed out. An unreachable identity provider or
    /// API ends in [`SessionCheck::Unavailable`] so the check can be retried.
    pub async fn check_session(&self) -> SessionCheck {
        self.store.dispatch(AuthAction::Start);

        let action = match self.identity.current_session().await {
            Ok(session) => match self.load_profile(&session).await {
                Ok(user) => AuthAction::Success(user),
                Err(SessionError::Client(e)) if e.is_unavailable() => {
                    tracing::warn!("Could not load profile during session check: {}", e);
                    AuthAction::SessionUnavailable(e.to_string())
                }
                Err(e) => {
                    tracing::warn!("Session present but profile unusable: {}", e);
                    AuthAction::SetAuthenticated(false)
                }
            },
            Err(AuthError::NoSession) => AuthAction::SetAuthenticated(false),
            Err(e) if e.is_unavailable() => {
                tracing::warn!("Identity provider unavailable: {}", e);
                AuthAction::SessionUnavailable(e.to_string())
            }
            Err(e) => {
                tracing::warn!("Session check failed: {}", e);
                AuthAction::SetAuthenticated(false)
            }
        };

        self.store.dispatch(action).session
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<User, SessionError> {
        self.store.dispatch(AuthAction::Start);

        let result = match self.identity.sign_in(username, password).await {
            Ok(session) => self.load_profile(&session).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(user) => {
                tracing::info!(user_id = %user.user_id, "Signed in");
                self.store.dispatch(AuthAction::Success(user.clone()));
                Ok(user)
            }
            Err(e) => Err(self.fail(e, SIGN_IN_FAILED)),
        }
    }

    pub async fn sign_up(
        &self,
        username: &str,
        password: &str,
        email: &str,
        name: &str,
    ) -> Result<SignUpResult, SessionError> {
        self.store.dispatch(AuthAction::Start);
        let result = self.identity.sign_up(username, password, email, name).await;
        self.settle_signed_out(result, SIGN_UP_FAILED)
    }

    pub async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<(), SessionError> {
        self.store.dispatch(AuthAction::Start);
        let result = self.identity.confirm_sign_up(username, code).await;
        self.settle_signed_out(result, CONFIRM_FAILED)
    }

    pub async fn resend_code(&self, username: &str) -> Result<(), SessionError> {
        self.store.dispatch(AuthAction::Start);
        let result = self.identity.resend_code(username).await;
        self.settle_signed_out(result, RESEND_FAILED)
    }

    pub async fn forgot_password(&self, username: &str) -> Result<(), SessionError> {
        self.store.dispatch(AuthAction::Start);
        let result = self.identity.forgot_password(username).await;
        self.settle_signed_out(result, RESET_FAILED)
    }

    pub async fn forgot_password_submit(
        &self,
        username: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), SessionError> {
        self.store.dispatch(AuthAction::Start);
        let result = self
            .identity
            .forgot_password_submit(username, code, new_password)
            .await;
        self.settle_signed_out(result, RESET_FAILED)
    }

    /// Sign out. Local state is reset even if the identity provider fails.
    pub async fn sign_out(&self) {
        if let Err(e) = self.identity.sign_out().await {
            tracing::warn!("Sign out failed at the identity provider: {}", e);
        }
        self.store.dispatch(AuthAction::Logout);
    }

    pub async fn update_user(&self, input: &UpdateUserInput) -> Result<User, SessionError> {
        let user = match self.api.update_user(input).await {
            Ok(user) => user,
            Err(e) => return Err(self.fail(e.into(), UPDATE_USER_FAILED)),
        };
        if let Err(e) = self.identity.update_attributes(&user.user_id, input).await {
            tracing::warn!("Profile saved but identity attributes not updated: {}", e);
        }
        self.store.dispatch(AuthAction::UpdateUser(user.clone()));
        Ok(user)
    }

    pub fn clear_error(&self) {
        self.store.dispatch(AuthAction::ClearError);
    }

    /// The user's profile, created from the session on first sign-in.
    async fn load_profile(&self, session: &AuthSession) -> Result<User, SessionError> {
        match self.api.current_user().await {
            Ok(user) => Ok(user),
            Err(e) if e.is_not_found() => {
                tracing::info!(user_id = %session.user_id, "Creating profile");
                let input = UpdateUserInput {
                    email: Some(session.email.clone()),
                    display_name: Some(session.name.clone()).filter(|n| !n.is_empty()),
                };
                Ok(self.api.update_user(&input).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Finish an operation that leaves the user signed out.
    fn settle_signed_out<R>(
        &self,
        result: Result<R, AuthError>,
        fallback: &str,
    ) -> Result<R, SessionError> {
        match result {
            Ok(value) => {
                self.store.dispatch(AuthAction::SetAuthenticated(false));
                Ok(value)
            }
            Err(e) => Err(self.fail(e.into(), fallback)),
        }
    }

    fn fail(&self, err: SessionError, fallback: &str) -> SessionError {
        tracing::error!("Auth operation failed: {}", err);
        self.store.dispatch(AuthAction::Error(err.message(fallback)));
        err
    }
}
