//! Identity provider interface and an in-memory implementation.
//!
//! The identity provider owns credentials and sessions. The API only ever sees
//! the bearer token it issues, which is resolved back to a `userId` through
//! [`TokenVerifier`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::api::TokenVerifier;
use crate::models::UpdateUserInput;

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_FAILED_SIGN_INS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("user is not confirmed")]
    UserNotConfirmed,
    #[error("incorrect username or password")]
    NotAuthorized,
    #[error("user does not exist")]
    UserNotFound,
    #[error("username already exists")]
    UsernameExists,
    #[error("verification code mismatch")]
    CodeMismatch,
    #[error("verification code expired")]
    ExpiredCode,
    #[error("invalid password: {0}")]
    InvalidPassword(String),
    #[error("attempt limit exceeded")]
    LimitExceeded,
    #[error("no current session")]
    NoSession,
    #[error("network error: {0}")]
    Network(String),
    #[error("{0}")]
    Other(String),
}

impl AuthError {
    /// A message suitable for showing to the user, for recognized conditions.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::UserNotConfirmed => Some("Please confirm your account before signing in."),
            Self::NotAuthorized => Some("Incorrect username or password."),
            Self::UserNotFound => Some("No account found for that username."),
            Self::UsernameExists => Some("An account with that username already exists."),
            Self::CodeMismatch => Some("Invalid verification code. Please try again."),
            Self::ExpiredCode => Some("Verification code has expired. Please request a new one."),
            Self::InvalidPassword(_) => Some("Password does not meet the requirements."),
            Self::LimitExceeded => Some("Too many attempts. Please try again later."),
            Self::NoSession | Self::Network(_) | Self::Other(_) => None,
        }
    }

    /// The identity provider could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: String,
    pub username: String,
    pub email: String,
    /// Display name given at sign-up.
    pub name: String,
    /// Bearer token presented to the API.
    pub id_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpResult {
    pub user_id: String,
    /// Whether the account still needs a confirmation code.
    pub confirmation_required: bool,
}

/// A managed identity service.
pub trait IdentityProvider: Send + Sync {
    fn sign_in(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthSession, AuthError>> + Send;

    fn sign_up(
        &self,
        username: &str,
        password: &str,
        email: &str,
        name: &str,
    ) -> impl Future<Output = Result<SignUpResult, AuthError>> + Send;

    fn confirm_sign_up(
        &self,
        username: &str,
        code: &str,
    ) -> impl Future<Output = Result<(), AuthError>> + Send;

    fn resend_code(&self, username: &str) -> impl Future<Output = Result<(), AuthError>> + Send;

    fn forgot_password(&self, username: &str)
        -> impl Future<Output = Result<(), AuthError>> + Send;

    fn forgot_password_submit(
        &self,
        username: &str,
        code: &str,
        new_password: &str,
    ) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// The current session. Fails with [`AuthError::NoSession`] when signed out.
    fn current_session(&self) -> impl Future<Output = Result<AuthSession, AuthError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Mirror profile changes for `user_id` onto the identity record.
    fn update_attributes(
        &self,
        user_id: &str,
        input: &UpdateUserInput,
    ) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Renew the session's token after it was rejected.
    fn refresh_session(&self) -> impl Future<Output = Result<AuthSession, AuthError>> + Send {
        self.current_session()
    }
}

// ============================================================
// In-memory provider
// ============================================================

#[derive(Debug, Clone)]
struct PendingCode {
    value: String,
    expired: bool,
}

#[derive(Debug, Clone)]
struct Account {
    user_id: String,
    email: String,
    name: String,
    password: String,
    confirmed: bool,
    code: Option<PendingCode>,
    failed_sign_ins: u32,
}

#[derive(Debug, Default)]
struct Directory {
    accounts: HashMap<String, Account>,
    /// Issued tokens mapped to the user they were issued for.
    tokens: HashMap<String, String>,
    session: Option<AuthSession>,
    offline: bool,
}

impl Directory {
    fn online(&self) -> Result<(), AuthError> {
        if self.offline {
            return Err(AuthError::Network("identity service unreachable".into()));
        }
        Ok(())
    }

    fn account_mut(&mut self, username: &str) -> Result<&mut Account, AuthError> {
        self.accounts
            .get_mut(username)
            .ok_or(AuthError::UserNotFound)
    }

    fn issue_token(&mut self, user_id: &str) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(token.clone(), user_id.to_string());
        token
    }
}

/// Identity provider that keeps accounts in memory.
///
/// Accounts must be confirmed with the code issued at sign-up before they can
/// sign in; tests read that code through [`LocalIdentity::pending_code`].
/// Tokens it issues are accepted by the API when the provider is installed as
/// the server's [`TokenVerifier`].
#[derive(Debug, Clone, Default)]
pub struct LocalIdentity {
    directory: Arc<Mutex<Directory>>,
}

impl LocalIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// The confirmation or reset code last issued to `username`.
    pub fn pending_code(&self, username: &str) -> Option<String> {
        let directory = self.directory.lock();
        directory
            .accounts
            .get(username)
            .and_then(|a| a.code.as_ref())
            .map(|c| c.value.clone())
    }

    /// Simulate losing connectivity to the identity service.
    pub fn set_offline(&self, offline: bool) {
        self.directory.lock().offline = offline;
    }

    /// Revoke every issued token while keeping the session, as if it timed out.
    pub fn expire_tokens(&self) {
        self.directory.lock().tokens.clear();
    }

    /// Mark every outstanding code as expired.
    pub fn expire_codes(&self) {
        let mut directory = self.directory.lock();
        for code in directory.accounts.values_mut().filter_map(|a| a.code.as_mut()) {
            code.expired = true;
        }
    }
}

fn check_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::InvalidPassword(format!(
            "must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn new_code() -> PendingCode {
    PendingCode {
        value: format!("{:06}", Uuid::new_v4().as_u128() % 1_000_000),
        expired: false,
    }
}

fn redeem_code(account: &mut Account, code: &str) -> Result<(), AuthError> {
    match &account.code {
        Some(pending) if pending.value != code => Err(AuthError::CodeMismatch),
        Some(pending) if pending.expired => Err(AuthError::ExpiredCode),
        Some(_) => {
            account.code = None;
            Ok(())
        }
        None => Err(AuthError::CodeMismatch),
    }
}

impl IdentityProvider for LocalIdentity {
    async fn sign_in(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        let mut directory = self.directory.lock();
        directory.online()?;

        let account = directory.account_mut(username)?;
        if account.failed_sign_ins >= MAX_FAILED_SIGN_INS {
            return Err(AuthError::LimitExceeded);
        }
        if account.password != password {
            account.failed_sign_ins += 1;
            return Err(AuthError::NotAuthorized);
        }
        if !account.confirmed {
            return Err(AuthError::UserNotConfirmed);
        }
        account.failed_sign_ins = 0;
        let (user_id, email, name) = (
            account.user_id.clone(),
            account.email.clone(),
            account.name.clone(),
        );

        let id_token = directory.issue_token(&user_id);
        let session = AuthSession {
            user_id,
            username: username.to_string(),
            email,
            name,
            id_token,
        };
        directory.session = Some(session.clone());
        tracing::info!(username, "Signed in");
        Ok(session)
    }

    async fn sign_up(
        &self,
        username: &str,
        password: &str,
        email: &str,
        name: &str,
    ) -> Result<SignUpResult, AuthError> {
        let mut directory = self.directory.lock();
        directory.online()?;

        if directory.accounts.contains_key(username) {
            return Err(AuthError::UsernameExists);
        }
        check_password(password)?;

        let user_id = Uuid::new_v4().to_string();
        directory.accounts.insert(
            username.to_string(),
            Account {
                user_id: user_id.clone(),
                email: email.to_string(),
                name: name.to_string(),
                password: password.to_string(),
                confirmed: false,
                code: Some(new_code()),
                failed_sign_ins: 0,
            },
        );
        Ok(SignUpResult {
            user_id,
            confirmation_required: true,
        })
    }

    async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<(), AuthError> {
        let mut directory = self.directory.lock();
        directory.online()?;

        let account = directory.account_mut(username)?;
        redeem_code(account, code)?;
        account.confirmed = true;
        Ok(())
    }

    async fn resend_code(&self, username: &str) -> Result<(), AuthError> {
        let mut directory = self.directory.lock();
        directory.online()?;

        let account = directory.account_mut(username)?;
        if account.confirmed {
            return Err(AuthError::Other("User is already confirmed.".into()));
        }
        account.code = Some(new_code());
        Ok(())
    }

    async fn forgot_password(&self, username: &str) -> Result<(), AuthError> {
        let mut directory = self.directory.lock();
        directory.online()?;

        let account = directory.account_mut(username)?;
        account.code = Some(new_code());
        Ok(())
    }

    async fn forgot_password_submit(
        &self,
        username: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let mut directory = self.directory.lock();
        directory.online()?;

        let account = directory.account_mut(username)?;
        check_password(new_password)?;
        redeem_code(account, code)?;
        account.password = new_password.to_string();
        account.failed_sign_ins = 0;
        Ok(())
    }

    async fn current_session(&self) -> Result<AuthSession, AuthError> {
        let directory = self.directory.lock();
        directory.online()?;
        directory.session.clone().ok_or(AuthError::NoSession)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut directory = self.directory.lock();
        if let Some(session) = directory.session.take() {
            directory.tokens.remove(&session.id_token);
        }
        Ok(())
    }

    async fn update_attributes(
        &self,
        user_id: &str,
        input: &UpdateUserInput,
    ) -> Result<(), AuthError> {
        let mut directory = self.directory.lock();
        directory.online()?;

        let account = directory
            .accounts
            .values_mut()
            .find(|a| a.user_id == user_id)
            .ok_or(AuthError::UserNotFound)?;
        if let Some(email) = &input.email {
            account.email = email.clone();
        }
        if let Some(name) = &input.display_name {
            account.name = name.clone();
        }
        let (email, name) = (account.email.clone(), account.name.clone());

        if let Some(session) = directory.session.as_mut().filter(|s| s.user_id == user_id) {
            session.email = email;
            session.name = name;
        }
        Ok(())
    }

    async fn refresh_session(&self) -> Result<AuthSession, AuthError> {
        let mut directory = self.directory.lock();
        directory.online()?;

        let Some(mut session) = directory.session.clone() else {
            return Err(AuthError::NoSession);
        };
        directory.tokens.remove(&session.id_token);
        session.id_token = directory.issue_token(&session.user_id);
        directory.session = Some(session.clone());
        tracing::debug!(user_id = %session.user_id, "Refreshed session token");
        Ok(session)
    }
}

impl TokenVerifier for LocalIdentity {
    fn verify(&self, token: &str) -> Option<String> {
        self.directory.lock().tokens.get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn confirmed(identity: &LocalIdentity, username: &str, password: &str) {
        identity
            .sign_up(username, password, "ada@example.com", "Ada")
            .await
            .unwrap();
        let code = identity.pending_code(username).unwrap();
        identity.confirm_sign_up(username, &code).await.unwrap();
    }

    #[tokio::test]
    async fn sign_in_requires_confirmation() {
        let identity = LocalIdentity::new();
        identity
            .sign_up("ada", "correct-horse", "ada@example.com", "Ada")
            .await
            .unwrap();

        let err = identity.sign_in("ada", "correct-horse").await.unwrap_err();
        assert_eq!(err, AuthError::UserNotConfirmed);

        let code = identity.pending_code("ada").unwrap();
        identity.confirm_sign_up("ada", &code).await.unwrap();
        let session = identity.sign_in("ada", "correct-horse").await.unwrap();
        assert_eq!(identity.verify(&session.id_token), Some(session.user_id));
    }

    #[tokio::test]
    async fn rejects_short_passwords_and_duplicate_usernames() {
        let identity = LocalIdentity::new();
        let err = identity
            .sign_up("ada", "short", "a@b.co", "Ada")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidPassword(_)));

        confirmed(&identity, "ada", "correct-horse").await;
        let err = identity
            .sign_up("ada", "correct-horse", "a@b.co", "Ada")
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::UsernameExists);
    }

    #[tokio::test]
    async fn locks_out_after_repeated_failures() {
        let identity = LocalIdentity::new();
        confirmed(&identity, "ada", "correct-horse").await;

        for _ in 0..MAX_FAILED_SIGN_INS {
            let err = identity.sign_in("ada", "wrong-password").await.unwrap_err();
            assert_eq!(err, AuthError::NotAuthorized);
        }
        let err = identity.sign_in("ada", "correct-horse").await.unwrap_err();
        assert_eq!(err, AuthError::LimitExceeded);
    }

    #[tokio::test]
    async fn code_mismatch_and_expiry() {
        let identity = LocalIdentity::new();
        identity
            .sign_up("ada", "correct-horse", "ada@example.com", "Ada")
            .await
            .unwrap();
        let code = identity.pending_code("ada").unwrap();

        let wrong = if code == "000000" { "111111" } else { "000000" };
        let err = identity.confirm_sign_up("ada", wrong).await.unwrap_err();
        assert_eq!(err, AuthError::CodeMismatch);

        identity.expire_codes();
        let err = identity.confirm_sign_up("ada", &code).await.unwrap_err();
        assert_eq!(err, AuthError::ExpiredCode);

        identity.resend_code("ada").await.unwrap();
        let fresh = identity.pending_code("ada").unwrap();
        identity.confirm_sign_up("ada", &fresh).await.unwrap();
    }

    #[tokio::test]
    async fn password_reset_replaces_password() {
        let identity = LocalIdentity::new();
        confirmed(&identity, "ada", "correct-horse").await;

        identity.forgot_password("ada").await.unwrap();
        let code = identity.pending_code("ada").unwrap();
        identity
            .forgot_password_submit("ada", &code, "battery-staple")
            .await
            .unwrap();

        assert_eq!(
            identity.sign_in("ada", "correct-horse").await.unwrap_err(),
            AuthError::NotAuthorized
        );
        identity.sign_in("ada", "battery-staple").await.unwrap();
    }

    #[tokio::test]
    async fn refresh_rotates_the_token() {
        let identity = LocalIdentity::new();
        confirmed(&identity, "ada", "correct-horse").await;
        let session = identity.sign_in("ada", "correct-horse").await.unwrap();

        identity.expire_tokens();
        assert_eq!(identity.verify(&session.id_token), None);

        let refreshed = identity.refresh_session().await.unwrap();
        assert_ne!(refreshed.id_token, session.id_token);
        assert_eq!(identity.verify(&refreshed.id_token), Some(session.user_id));
    }

    #[tokio::test]
    async fn attributes_follow_the_user_id() {
        let identity = LocalIdentity::new();
        confirmed(&identity, "ada", "correct-horse").await;
        let session = identity.sign_in("ada", "correct-horse").await.unwrap();
        assert_eq!(session.name, "Ada");

        let input = UpdateUserInput {
            email: Some("lovelace@example.com".to_string()),
            display_name: Some("Ada L.".to_string()),
        };
        identity
            .update_attributes(&session.user_id, &input)
            .await
            .unwrap();

        let current = identity.current_session().await.unwrap();
        assert_eq!(current.email, "lovelace@example.com");
        assert_eq!(current.name, "Ada L.");

        assert_eq!(
            identity.update_attributes("nobody", &input).await.unwrap_err(),
            AuthError::UserNotFound
        );
    }

    #[tokio::test]
    async fn offline_and_signed_out_are_distinct() {
        let identity = LocalIdentity::new();
        assert_eq!(
            identity.current_session().await.unwrap_err(),
            AuthError::NoSession
        );

        identity.set_offline(true);
        let err = identity.current_session().await.unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(err.user_message(), None);
    }
}
