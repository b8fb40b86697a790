use crate::models::User;

use super::{Action, Reducer};

/// Outcome of the last session check against the identity provider.
///
/// `Unauthenticated` means the provider answered and there is no session.
/// `Unavailable` means the provider could not be reached, so the answer is
/// unknown and the check can be retried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionCheck {
    #[default]
    Unchecked,
    Authenticated,
    Unauthenticated,
    Unavailable(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub session: SessionCheck,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthAction {
    Start,
    Success(User),
    /// Leaves `is_authenticated` as it was.
    Error(String),
    /// Resolves a check without treating it as an error.
    SetAuthenticated(bool),
    /// The session check failed for infrastructure reasons. Not an error for
    /// the user; they are treated as signed out.
    SessionUnavailable(String),
    /// Resets to the initial state.
    Logout,
    UpdateUser(User),
    ClearError,
}

impl Action for AuthAction {
    fn name(&self) -> &'static str {
        match self {
            Self::Start => "auth/start",
            Self::Success(_) => "auth/success",
            Self::Error(_) => "auth/error",
            Self::SetAuthenticated(_) => "auth/set_authenticated",
            Self::SessionUnavailable(_) => "auth/session_unavailable",
            Self::Logout => "auth/logout",
            Self::UpdateUser(_) => "auth/update_user",
            Self::ClearError => "auth/clear_error",
        }
    }
}

impl Reducer for AuthState {
    type Action = AuthAction;

    fn reduce(&self, action: AuthAction) -> Self {
        match action {
            AuthAction::Start => Self {
                is_loading: true,
                error: None,
                ..self.clone()
            },
            AuthAction::Success(user) => Self {
                user: Some(user),
                is_authenticated: true,
                is_loading: false,
                session: SessionCheck::Authenticated,
                ..self.clone()
            },
            AuthAction::Error(message) => Self {
                is_loading: false,
                error: Some(message),
                ..self.clone()
            },
            AuthAction::SetAuthenticated(is_authenticated) => Self {
                is_authenticated,
                is_loading: false,
                session: if is_authenticated {
                    SessionCheck::Authenticated
                } else {
                    SessionCheck::Unauthenticated
                },
                ..self.clone()
            },
            AuthAction::SessionUnavailable(reason) => Self {
                is_authenticated: false,
                is_loading: false,
                session: SessionCheck::Unavailable(reason),
                ..self.clone()
            },
            AuthAction::Logout => Self::default(),
            AuthAction::UpdateUser(user) => Self {
                user: Some(user),
                ..self.clone()
            },
            AuthAction::ClearError => Self {
                error: None,
                ..self.clone()
            },
        }
    }
}

impl AuthState {
    /// Whether the last session check could not reach the identity provider.
    pub fn should_retry_session(&self) -> bool {
        matches!(self.session, SessionCheck::Unavailable(_))
    }
}
