use crate::error::{config_error, env_error, SyncResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env::{self, VarError};
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the configuration document
pub const DEFAULT_CONFIG_PATH: &str = "config.json";
/// Games synced when the document does not list any
pub const DEFAULT_GAMES: &[&str] = &["ETS2"];
/// Events processed per run
pub const DEFAULT_MAX_EVENTS_PER_RUN: usize = 7;
/// Length of an inserted entry and of the duplicate-search window
pub const DEFAULT_EVENT_DURATION_HOURS: i64 = 2;
/// Longest accepted entry duration, one week
pub const MAX_EVENT_DURATION_HOURS: i64 = 24 * 7;
pub const DEFAULT_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Event source endpoint
    pub url: String,
    /// OAuth scopes requested for the calendar credential
    pub scopes: Vec<String>,
    /// Target Google Calendar ID
    pub calendar_id: String,
    /// Game tags whose events are synced
    #[serde(default = "default_games")]
    pub games: Vec<String>,
    /// Maximum number of events checked or inserted per run
    #[serde(default = "default_max_events_per_run")]
    pub max_events_per_run: usize,
    /// Duration of inserted entries, in hours
    #[serde(default = "default_event_duration_hours")]
    pub event_duration_hours: i64,
    /// Cached authorized-user credential
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
    /// OAuth client secrets downloaded from the Google console
    #[serde(default = "default_client_secrets_path")]
    pub client_secrets_path: PathBuf,
    #[serde(default = "default_calendar_api_base")]
    pub calendar_api_base: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_games() -> Vec<String> {
    DEFAULT_GAMES.iter().map(|g| g.to_string()).collect()
}

fn default_max_events_per_run() -> usize {
    DEFAULT_MAX_EVENTS_PER_RUN
}

fn default_event_duration_hours() -> i64 {
    DEFAULT_EVENT_DURATION_HOURS
}

fn default_token_path() -> PathBuf {
    PathBuf::from("token.json")
}

fn default_client_secrets_path() -> PathBuf {
    PathBuf::from("google_token.json")
}

fn default_calendar_api_base() -> String {
    DEFAULT_CALENDAR_API_BASE.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> SyncResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let path = optional_env("CONVOY_CONFIG")?
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = Self::from_file(&path)?;

        if let Some(url) = optional_env("CONVOY_EVENTS_URL")? {
            config.url = url;
        }
        if let Some(calendar_id) = optional_env("GOOGLE_CALENDAR_ID")? {
            config.calendar_id = calendar_id;
        }

        config.validate()?;
        Ok(config)
    }

    /// Read a configuration document, picking the format from the extension
    pub fn from_file(path: &Path) -> SyncResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            config_error(&format!("Failed to read {}: {}", path.display(), e))
        })?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    pub fn from_json_str(content: &str) -> SyncResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> SyncResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reject documents the pipeline cannot run with
    pub fn validate(&self) -> SyncResult<()> {
        if self.url.trim().is_empty() {
            return Err(config_error("`url` must not be empty"));
        }
        if self.calendar_id.trim().is_empty() {
            return Err(config_error("`calendar_id` must not be empty"));
        }
        if self.games.is_empty() {
            return Err(config_error("`games` must list at least one game"));
        }
        if self.max_events_per_run == 0 {
            return Err(config_error("`max_events_per_run` must be positive"));
        }
        if self.event_duration_hours <= 0 {
            return Err(config_error("`event_duration_hours` must be positive"));
        }
        if self.event_duration_hours > MAX_EVENT_DURATION_HOURS {
            return Err(config_error(&format!(
                "`event_duration_hours` must be at most {}",
                MAX_EVENT_DURATION_HOURS
            )));
        }
        Ok(())
    }
}

fn optional_env(key: &str) -> SyncResult<Option<String>> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(env_error(key)),
    }
}
