use crate::components::event_source::{normalize, EventSource};
use crate::components::google_calendar::CalendarService;
use crate::components::reconcile::{ReconciliationEngine, RunReport};
use crate::error::SyncResult;
use tracing::info;

/// Fetch, normalize and reconcile once
///
/// A fetch failure aborts before the calendar is touched.
pub async fn run_once<E, S>(
    source: &E,
    games: &[String],
    engine: &ReconciliationEngine<S>,
) -> SyncResult<RunReport>
where
    E: EventSource + ?Sized,
    S: CalendarService,
{
    let raw_events = source.fetch().await?;
    let events = normalize(&raw_events, games);
    info!(
        "{} of {} events match games {:?}",
        events.len(),
        raw_events.len(),
        games
    );

    let report = engine.reconcile(events).await?;
    info!(
        "Sync complete: {} inserted, {} already present, {} without start time",
        report.inserted.len(),
        report.skipped_duplicates,
        report.dropped_missing_start
    );
    Ok(report)
}
