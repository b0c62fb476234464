use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Failed to fetch events: {0}")]
    #[diagnostic(
        code(convoy_calendar::fetch),
        help("check that the event source `url` is reachable")
    )]
    Fetch(String),

    #[error("Authorization error: {0}")]
    #[diagnostic(
        code(convoy_calendar::auth),
        help("run `get_calendar_token` to create a fresh credential file")
    )]
    Auth(String),

    #[error("Failed to parse timestamp '{value}': {reason}")]
    #[diagnostic(code(convoy_calendar::parse))]
    Parse { value: String, reason: String },

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(convoy_calendar::google_calendar))]
    GoogleCalendar(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(convoy_calendar::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(convoy_calendar::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(convoy_calendar::io))]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(convoy_calendar::http))]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(convoy_calendar::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(convoy_calendar::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type SyncResult<T> = Result<T, Error>;

/// Helper to create fetch errors
pub fn fetch_error(message: &str) -> Error {
    Error::Fetch(message.to_string())
}

/// Helper to create authorization errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create timestamp parse errors
pub fn parse_error(value: &str, reason: impl ToString) -> Error {
    Error::Parse {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Invalid environment variable: {}", var))
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
