use crate::components::event_source::CanonicalEvent;
use crate::components::google_calendar::models::{
    CalendarEntry, CalendarEvent, EventDateTime, EventQuery, InsertedEntry, Reminders,
};
use crate::components::google_calendar::time::{parse_start, to_rfc3339, window};
use crate::components::google_calendar::CalendarService;
use crate::config::{Config, DEFAULT_EVENT_DURATION_HOURS, DEFAULT_MAX_EVENTS_PER_RUN};
use crate::error::{config_error, Error, SyncResult};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

/// Time zone written on every inserted entry
pub const ENTRY_TIME_ZONE: &str = "UTC";

/// Throttle and window settings for a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Events processed per run, counting both duplicates and inserts
    pub max_events: usize,
    /// Duration of inserted entries and of the duplicate-search window
    pub event_duration: Duration,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            max_events: DEFAULT_MAX_EVENTS_PER_RUN,
            event_duration: Duration::hours(DEFAULT_EVENT_DURATION_HOURS),
        }
    }
}

impl TryFrom<&Config> for ReconcileOptions {
    type Error = Error;

    fn try_from(config: &Config) -> SyncResult<Self> {
        let event_duration = Duration::try_hours(config.event_duration_hours)
            .filter(|d| *d > Duration::zero())
            .ok_or_else(|| {
                config_error(&format!(
                    "`event_duration_hours` out of range: {}",
                    config.event_duration_hours
                ))
            })?;
        Ok(Self {
            max_events: config.max_events_per_run,
            event_duration,
        })
    }
}

/// Outcome of one completed run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Events that entered the per-event loop
    pub considered: usize,
    /// Events dropped for lacking a start time
    pub dropped_missing_start: usize,
    /// Events already present in the calendar
    pub skipped_duplicates: usize,
    pub inserted: Vec<InsertedEntry>,
}

/// An event whose start has been parsed, ready to reconcile
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    pub event: CanonicalEvent,
    pub start: DateTime<Utc>,
}

/// Reconciles canonical events against a calendar, inserting the missing ones
pub struct ReconciliationEngine<S> {
    calendar: S,
    options: ReconcileOptions,
}

impl<S: CalendarService> ReconciliationEngine<S> {
    pub fn new(calendar: S, options: ReconcileOptions) -> Self {
        Self { calendar, options }
    }

    pub fn calendar(&self) -> &S {
        &self.calendar
    }

    /// Run one reconciliation pass
    ///
    /// Any unparseable start time or calendar failure aborts the whole run;
    /// entries inserted before the failure stay in the calendar.
    pub async fn reconcile(&self, events: Vec<CanonicalEvent>) -> SyncResult<RunReport> {
        let total = events.len();
        let scheduled = schedule(events)?;

        let mut report = RunReport {
            dropped_missing_start: total - scheduled.len(),
            ..Default::default()
        };
        if report.dropped_missing_start > 0 {
            debug!(
                "Dropped {} events without a start time",
                report.dropped_missing_start
            );
        }

        if scheduled.is_empty() {
            info!("No events found.");
            return Ok(report);
        }

        for item in scheduled.iter().take(self.options.max_events) {
            report.considered += 1;

            if self.event_exists(item).await? {
                debug!("Event '{}' already in calendar, skipping", item.event.name);
                report.skipped_duplicates += 1;
                continue;
            }

            let inserted = self.insert(item).await?;
            info!(
                "Event created: {}",
                inserted.html_link.as_deref().unwrap_or(&inserted.id)
            );
            report.inserted.push(inserted);
        }

        if scheduled.len() > self.options.max_events {
            info!(
                "Reached the limit of {} events, {} left for a later run",
                self.options.max_events,
                scheduled.len() - self.options.max_events
            );
        }

        Ok(report)
    }

    /// Whether the calendar already holds an entry titled exactly like `item`
    ///
    /// The server-side text query only narrows candidates; exact title
    /// equality decides.
    pub async fn event_exists(&self, item: &ScheduledEvent) -> SyncResult<bool> {
        let query = self.query_for(item)?;
        let candidates = self.calendar.list_events(&query).await?;
        Ok(has_exact_title(&candidates, &item.event.name))
    }

    async fn insert(&self, item: &ScheduledEvent) -> SyncResult<InsertedEntry> {
        let entry = build_entry(item, self.options.event_duration)?;
        self.calendar.insert_event(&entry).await
    }

    fn query_for(&self, item: &ScheduledEvent) -> SyncResult<EventQuery> {
        let (from, to) = window(item.start, self.options.event_duration)?;
        Ok(EventQuery {
            time_min: to_rfc3339(from),
            time_max: to_rfc3339(to),
            text: item.event.name.clone(),
        })
    }
}

/// Drop events without a start and sort the rest by start time
///
/// Fails on the first start time that does not parse. The sort is stable, so
/// events sharing a start keep their feed order.
pub fn schedule(events: Vec<CanonicalEvent>) -> SyncResult<Vec<ScheduledEvent>> {
    let mut scheduled = events
        .into_iter()
        .filter_map(|event| match event.start.as_deref() {
            Some(start) if !start.is_empty() => Some(
                parse_start(start).map(|start| ScheduledEvent { event, start }),
            ),
            _ => None,
        })
        .collect::<SyncResult<Vec<_>>>()?;

    scheduled.sort_by_key(|item| item.start);
    Ok(scheduled)
}

pub fn has_exact_title(candidates: &[CalendarEvent], name: &str) -> bool {
    candidates
        .iter()
        .any(|existing| existing.summary.as_deref() == Some(name))
}

/// Calendar entry for `item`, lasting `duration`, with reminders off
pub fn build_entry(item: &ScheduledEvent, duration: Duration) -> SyncResult<CalendarEntry> {
    let (start, end) = window(item.start, duration)?;
    Ok(CalendarEntry {
        summary: item.event.name.clone(),
        description: item.event.description.clone(),
        start: EventDateTime {
            date_time: to_rfc3339(start),
            time_zone: ENTRY_TIME_ZONE.to_string(),
        },
        end: EventDateTime {
            date_time: to_rfc3339(end),
            time_zone: ENTRY_TIME_ZONE.to_string(),
        },
        reminders: Reminders::none(),
    })
}
