use serde::{Deserialize, Serialize};

/// Body accepted by the Google Calendar `events.insert` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub summary: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub reminders: Reminders,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    /// RFC3339 timestamp
    pub date_time: String,
    pub time_zone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
    pub overrides: Vec<ReminderOverride>,
}

impl Reminders {
    /// Default reminders disabled, no overrides
    pub fn none() -> Self {
        Self {
            use_default: false,
            overrides: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderOverride {
    pub method: String,
    pub minutes: u32,
}

/// Simplified view of an entry already present in the calendar
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "htmlLink")]
    pub html_link: Option<String>,
}

/// Search parameters for `events.list`
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    /// RFC3339 UTC lower bound
    pub time_min: String,
    /// RFC3339 UTC upper bound
    pub time_max: String,
    /// Free-text query, matched loosely by the server
    pub text: String,
}

/// Result of a successful insert
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsertedEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(rename = "htmlLink", default)]
    pub html_link: Option<String>,
}

/// Page of results from `events.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventList {
    #[serde(default)]
    pub items: Vec<CalendarEvent>,
    pub next_page_token: Option<String>,
}
