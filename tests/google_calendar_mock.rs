use async_trait::async_trait;
use chrono::Duration;
use convoy_calendar::components::event_source::models::{EventType, RawEvent};
use convoy_calendar::components::event_source::EventSource;
use convoy_calendar::components::google_calendar::models::{
    CalendarEntry, CalendarEvent, EventQuery, InsertedEntry,
};
use convoy_calendar::components::google_calendar::CalendarService;
use convoy_calendar::components::event_source::CanonicalEvent;
use convoy_calendar::components::reconcile::{
    build_entry, schedule, ReconcileOptions, ReconciliationEngine,
};
use convoy_calendar::error::{auth_error, fetch_error, Error, SyncResult};
use convoy_calendar::pipeline::run_once;
use std::sync::Mutex;

/// Mock calendar that keeps inserted entries and serves them back on search
#[derive(Default)]
pub struct MockCalendar {
    entries: Mutex<Vec<CalendarEntry>>,
    insert_calls: Mutex<usize>,
    reject_auth: bool,
}

impl MockCalendar {
    /// Create a mock that already holds `entries`
    pub fn with_entries(entries: Vec<CalendarEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            ..Default::default()
        }
    }

    pub fn insert_calls(&self) -> usize {
        *self.insert_calls.lock().unwrap()
    }

    pub fn entries(&self) -> Vec<CalendarEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarService for MockCalendar {
    async fn list_events(&self, query: &EventQuery) -> SyncResult<Vec<CalendarEvent>> {
        if self.reject_auth {
            return Err(auth_error("token expired"));
        }
        let needle = query.text.to_lowercase();
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            // Overlap with [time_min, time_max); RFC3339 UTC strings sort chronologically
            .filter(|e| e.start.date_time < query.time_max && e.end.date_time > query.time_min)
            .filter(|e| e.summary.to_lowercase().contains(&needle))
            .map(|e| CalendarEvent {
                id: e.summary.clone(),
                summary: Some(e.summary.clone()),
                description: Some(e.description.clone()),
                html_link: None,
            })
            .collect())
    }

    async fn insert_event(&self, entry: &CalendarEntry) -> SyncResult<InsertedEntry> {
        *self.insert_calls.lock().unwrap() += 1;
        self.entries.lock().unwrap().push(entry.clone());
        Ok(InsertedEntry {
            id: format!("evt{}", self.insert_calls()),
            summary: Some(entry.summary.clone()),
            html_link: Some(format!(
                "https://www.google.com/calendar/event?eid=evt{}",
                self.insert_calls()
            )),
        })
    }
}

/// Mock event source returning a fixed feed
pub struct MockSource {
    events: Option<Vec<RawEvent>>,
}

#[async_trait]
impl EventSource for MockSource {
    async fn fetch(&self) -> SyncResult<Vec<RawEvent>> {
        self.events
            .clone()
            .ok_or_else(|| fetch_error("Failed to fetch events. Status code: 503"))
    }
}

fn raw(game: &str, name: &str, meetup_at: Option<&str>) -> RawEvent {
    RawEvent {
        game: game.to_string(),
        name: name.to_string(),
        event_type: EventType {
            key: "VTC".to_string(),
        },
        meetup_at: meetup_at.map(str::to_string),
        start_at: Some("2024-03-01 19:00:00".to_string()),
        ..Default::default()
    }
}

fn games() -> Vec<String> {
    vec!["ETS2".to_string()]
}

#[tokio::test]
async fn test_single_event_inserted() {
    let source = MockSource {
        events: Some(vec![raw("ETS2", "Convoy A", Some("2024-03-01 18:00:00"))]),
    };
    let engine = ReconciliationEngine::new(MockCalendar::default(), ReconcileOptions::default());

    let report = run_once(&source, &games(), &engine).await.unwrap();

    assert_eq!(report.inserted.len(), 1);
    let calendar = engine.calendar();
    assert_eq!(calendar.insert_calls(), 1);

    let entry = &calendar.entries()[0];
    assert_eq!(entry.summary, "Convoy A VTC");
    assert_eq!(entry.start.date_time, "2024-03-01T18:00:00Z");
    assert_eq!(entry.end.date_time, "2024-03-01T20:00:00Z");
    assert_eq!(entry.start.time_zone, "UTC");
}

#[tokio::test]
async fn test_existing_entry_skipped() {
    let source = MockSource {
        events: Some(vec![raw("ETS2", "Convoy A", Some("2024-03-01 18:00:00"))]),
    };

    // Seed the calendar with what a previous run would have written
    let seed = ReconciliationEngine::new(MockCalendar::default(), ReconcileOptions::default());
    run_once(&source, &games(), &seed).await.unwrap();
    let existing = seed.calendar().entries();
    assert_eq!(existing[0].summary, "Convoy A VTC");

    let engine = ReconciliationEngine::new(
        MockCalendar::with_entries(existing),
        ReconcileOptions::default(),
    );
    let report = run_once(&source, &games(), &engine).await.unwrap();

    assert_eq!(engine.calendar().insert_calls(), 0);
    assert_eq!(report.skipped_duplicates, 1);
}

#[tokio::test]
async fn test_loose_match_is_not_a_duplicate() {
    let source = MockSource {
        events: Some(vec![raw("ETS2", "Convoy A", Some("2024-03-01 18:00:00"))]),
    };

    // Same window, title contains the name but is not equal to it
    let scheduled = schedule(vec![CanonicalEvent {
        name: "Convoy A VTC (cancelled)".to_string(),
        description: String::new(),
        start: Some("2024-03-01 18:00:00".to_string()),
    }])
    .unwrap();
    let existing = build_entry(&scheduled[0], Duration::hours(2)).unwrap();

    let engine = ReconciliationEngine::new(
        MockCalendar::with_entries(vec![existing]),
        ReconcileOptions::default(),
    );
    let report = run_once(&source, &games(), &engine).await.unwrap();

    assert_eq!(report.skipped_duplicates, 0);
    assert_eq!(engine.calendar().insert_calls(), 1);
}

#[tokio::test]
async fn test_same_title_outside_window_is_inserted() {
    let source = MockSource {
        events: Some(vec![raw("ETS2", "Convoy A", Some("2024-03-01 18:00:00"))]),
    };
    let scheduled = schedule(vec![CanonicalEvent {
        name: "Convoy A VTC".to_string(),
        description: String::new(),
        start: Some("2024-02-23 18:00:00".to_string()),
    }])
    .unwrap();
    let last_week = build_entry(&scheduled[0], Duration::hours(2)).unwrap();

    let engine = ReconciliationEngine::new(
        MockCalendar::with_entries(vec![last_week]),
        ReconcileOptions::default(),
    );
    run_once(&source, &games(), &engine).await.unwrap();

    assert_eq!(engine.calendar().insert_calls(), 1);
}

#[tokio::test]
async fn test_idempotent_across_runs() {
    let source = MockSource {
        events: Some(vec![
            raw("ETS2", "Convoy A", Some("2024-03-01 18:00:00")),
            raw("ETS2", "Convoy B", Some("2024-03-02 18:00:00")),
            raw("ATS", "Convoy C", Some("2024-03-03 18:00:00")),
            raw("ETS2", "Forming", None),
        ]),
    };
    let engine = ReconciliationEngine::new(MockCalendar::default(), ReconcileOptions::default());

    let first = run_once(&source, &games(), &engine).await.unwrap();
    assert_eq!(first.inserted.len(), 2);
    assert_eq!(first.dropped_missing_start, 1);

    let second = run_once(&source, &games(), &engine).await.unwrap();
    assert!(second.inserted.is_empty());
    assert_eq!(second.skipped_duplicates, 2);
    assert_eq!(engine.calendar().insert_calls(), 2);
}

#[tokio::test]
async fn test_fetch_failure_aborts() {
    let source = MockSource { events: None };
    let engine = ReconciliationEngine::new(MockCalendar::default(), ReconcileOptions::default());

    let result = run_once(&source, &games(), &engine).await;

    assert!(matches!(result, Err(Error::Fetch(_))));
    assert_eq!(engine.calendar().insert_calls(), 0);
}

#[tokio::test]
async fn test_auth_failure_aborts_before_insert() {
    let source = MockSource {
        events: Some(vec![raw("ETS2", "Convoy A", Some("2024-03-01 18:00:00"))]),
    };
    let engine = ReconciliationEngine::new(
        MockCalendar {
            reject_auth: true,
            ..Default::default()
        },
        ReconcileOptions::default(),
    );

    let result = run_once(&source, &games(), &engine).await;

    assert!(matches!(result, Err(Error::Auth(_))));
    assert_eq!(engine.calendar().insert_calls(), 0);
}

#[tokio::test]
async fn test_cap_of_seven() {
    let events = (1..=10)
        .map(|day| {
            raw(
                "ETS2",
                &format!("Convoy {}", day),
                Some(&format!("2024-05-{:02} 18:00:00", day)),
            )
        })
        .collect();
    let source = MockSource {
        events: Some(events),
    };
    let engine = ReconciliationEngine::new(MockCalendar::default(), ReconcileOptions::default());

    run_once(&source, &games(), &engine).await.unwrap();

    assert_eq!(engine.calendar().insert_calls(), 7);
    let titles: Vec<String> = engine
        .calendar()
        .entries()
        .into_iter()
        .map(|e| e.summary)
        .collect();
    assert_eq!(titles.first().map(String::as_str), Some("Convoy 1 VTC"));
    assert_eq!(titles.last().map(String::as_str), Some("Convoy 7 VTC"));
}
