//! Configuration loaded from the environment and the user's config directory.
//!
//! - `UPCOUNT_API_URL` - API base URL for clients (default: `http://localhost:3000/api/v1`)
//! - `UPCOUNT_API_TIMEOUT_SECS` - client request timeout in seconds (default: 10)
//! - `UPCOUNT_DB_PATH` - server database file (default: platform data directory)
//! - `UPCOUNT_API_TOKENS` - comma-separated `token=userId` pairs accepted by the server

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use upcount_core::state::AppSettings;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const APP_NAME: &str = "upcount";
const SETTINGS_FILE: &str = "config.json";

/// Client-side connection settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("UPCOUNT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let timeout = std::env::var("UPCOUNT_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        Self { base_url, timeout }
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Development server settings.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Database file. `None` uses the platform data directory.
    pub db_path: Option<PathBuf>,
    /// Bearer tokens accepted by the server, mapped to the caller's `userId`.
    pub tokens: HashMap<String, String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let db_path = std::env::var("UPCOUNT_DB_PATH").ok().map(PathBuf::from);
        let tokens = std::env::var("UPCOUNT_API_TOKENS")
            .map(|s| parse_token_pairs(&s))
            .unwrap_or_default();
        Self { db_path, tokens }
    }
}

/// Parse `token=userId` pairs separated by commas. Malformed pairs are skipped.
pub fn parse_token_pairs(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (token, user_id) = pair.split_once('=')?;
            let (token, user_id) = (token.trim(), user_id.trim());
            if token.is_empty() || user_id.is_empty() {
                tracing::warn!("Ignoring malformed token pair: {:?}", pair);
                return None;
            }
            Some((token.to_string(), user_id.to_string()))
        })
        .collect()
}

/// Persisted app settings stored as JSON in the user's config directory.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The settings file in the platform config directory.
    pub fn default_location() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(Self::in_dir(&base))
    }

    /// The settings file under `config_dir`, in the app's own subdirectory.
    pub fn in_dir(config_dir: &Path) -> Self {
        Self::new(config_dir.join(APP_NAME).join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, falling back to defaults if the file is missing or unreadable.
    pub fn load(&self) -> AppSettings {
        match self.try_load() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to load settings, using defaults: {:#}", e);
                AppSettings::default()
            }
        }
    }

    fn try_load(&self) -> Result<AppSettings> {
        if !self.path.exists() {
            return Ok(AppSettings::default());
        }

        let content = fs::read_to_string(&self.path).context("Failed to read settings file")?;
        let settings = serde_json::from_str(&content).context("Failed to parse settings file")?;
        Ok(settings)
    }

    pub fn save(&self, settings: &AppSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
        fs::write(&self.path, content).context("Failed to write settings file")?;
        Ok(())
    }
}
