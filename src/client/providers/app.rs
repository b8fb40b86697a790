use crate::config::SettingsFile;
use crate::state::{AppAction, AppSettings, AppState, Store, Theme};

pub const SAVE_FAILED: &str = "Failed to save settings.";

/// Owns app-wide settings, persisting them when a settings file is attached.
pub struct AppProvider {
    store: Store<AppState>,
    settings: Option<SettingsFile>,
}

impl AppProvider {
    /// Settings kept for this session only.
    pub fn in_memory() -> Self {
        Self {
            store: Store::default(),
            settings: None,
        }
    }

    /// Settings persisted in the platform config directory, or kept in
    /// memory when there is no such directory.
    pub fn load_default() -> Self {
        match SettingsFile::default_location() {
            Ok(file) => Self::with_settings(file),
            Err(e) => {
                tracing::warn!("Settings will not be persisted: {:#}", e);
                Self::in_memory()
            }
        }
    }

    /// Restore settings from `file` and write changes back to it.
    pub fn with_settings(file: SettingsFile) -> Self {
        let initial = file.load().into_state();
        Self {
            store: Store::new(initial),
            settings: Some(file),
        }
    }

    pub fn state(&self) -> AppState {
        self.store.snapshot()
    }

    pub fn store(&self) -> &Store<AppState> {
        &self.store
    }

    pub fn set_theme(&self, theme: Theme) {
        self.store.dispatch(AppAction::SetTheme(theme));
        self.persist();
    }

    pub fn toggle_theme(&self) {
        let next = match self.store.with(|s| s.theme) {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        self.set_theme(next);
    }

    pub fn toggle_offline_mode(&self) {
        self.store.dispatch(AppAction::ToggleOfflineMode);
        self.persist();
    }

    pub fn toggle_push_notifications(&self) {
        self.store.dispatch(AppAction::TogglePushNotifications);
        self.persist();
    }

    pub fn set_loading(&self, is_loading: bool) {
        self.store.dispatch(AppAction::SetLoading(is_loading));
    }

    pub fn set_error(&self, error: Option<String>) {
        self.store.dispatch(AppAction::SetError(error));
    }

    fn persist(&self) {
        let Some(file) = &self.settings else {
            return;
        };
        let settings = self.store.with(AppSettings::from_state);
        if let Err(e) = file.save(&settings) {
            tracing::error!("Failed to save settings: {:#}", e);
            self.store
                .dispatch(AppAction::SetError(Some(SAVE_FAILED.to_string())));
        }
    }
}
