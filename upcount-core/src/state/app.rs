use serde::{Deserialize, Serialize};

use super::{Action, Reducer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// App-wide settings and status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub theme: Theme,
    pub is_offline_mode: bool,
    pub push_notifications_enabled: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    SetTheme(Theme),
    ToggleOfflineMode,
    TogglePushNotifications,
    SetLoading(bool),
    SetError(Option<String>),
}

impl Action for AppAction {
    fn name(&self) -> &'static str {
        match self {
            Self::SetTheme(_) => "app/set_theme",
            Self::ToggleOfflineMode => "app/toggle_offline_mode",
            Self::TogglePushNotifications => "app/toggle_push_notifications",
            Self::SetLoading(_) => "app/set_loading",
            Self::SetError(_) => "app/set_error",
        }
    }
}

impl Reducer for AppState {
    type Action = AppAction;

    fn reduce(&self, action: AppAction) -> Self {
        match action {
            AppAction::SetTheme(theme) => Self {
                theme,
                ..self.clone()
            },
            AppAction::ToggleOfflineMode => Self {
                is_offline_mode: !self.is_offline_mode,
                ..self.clone()
            },
            AppAction::TogglePushNotifications => Self {
                push_notifications_enabled: !self.push_notifications_enabled,
                ..self.clone()
            },
            AppAction::SetLoading(is_loading) => Self {
                is_loading,
                ..self.clone()
            },
            AppAction::SetError(error) => Self {
                error,
                ..self.clone()
            },
        }
    }
}

/// The persisted subset of [`AppState`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub offline_mode: bool,
    #[serde(default)]
    pub push_notifications: bool,
}

impl AppSettings {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            theme: state.theme,
            offline_mode: state.is_offline_mode,
            push_notifications: state.push_notifications_enabled,
        }
    }

    /// Initial app state restored from these settings.
    pub fn into_state(self) -> AppState {
        AppState {
            theme: self.theme,
            is_offline_mode: self.offline_mode,
            push_notifications_enabled: self.push_notifications,
            ..AppState::default()
        }
    }
}
