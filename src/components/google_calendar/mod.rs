mod client;
pub mod models;
pub mod time;
pub mod token;

pub use client::{CalendarService, GoogleCalendarClient};
pub use models::{CalendarEntry, CalendarEvent, EventQuery, InsertedEntry};
pub use token::{CredentialProvider, FileTokenProvider, StaticTokenProvider};
