pub mod event_source;
pub mod google_calendar;
pub mod reconcile;

pub use event_source::{EventSource, HttpEventSource};
pub use google_calendar::{CalendarService, GoogleCalendarClient};
pub use reconcile::ReconciliationEngine;
