use super::models::RawEvent;
use serde::{Deserialize, Serialize};

/// Normalized event used for reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    /// Display name followed by the event-type key
    pub name: String,
    pub description: String,
    /// Meetup time, "YYYY-MM-DD HH:MM:SS"; `None` for incomplete records
    pub start: Option<String>,
}

/// Keep events for the allowed games and map them to [`CanonicalEvent`]s
///
/// A game matches when the event's game tag contains an allow-list entry.
/// Timestamps are copied verbatim and only validated later, when sorted.
pub fn normalize(events: &[RawEvent], games: &[String]) -> Vec<CanonicalEvent> {
    events
        .iter()
        .filter(|event| is_allowed_game(event, games))
        .map(to_canonical)
        .collect()
}

pub fn is_allowed_game(event: &RawEvent, games: &[String]) -> bool {
    games
        .iter()
        .any(|game| !game.is_empty() && event.game.contains(game.as_str()))
}

pub fn to_canonical(event: &RawEvent) -> CanonicalEvent {
    CanonicalEvent {
        name: format!("{} {}", event.name, event.event_type.key),
        description: describe(event),
        start: event.meetup_at.clone(),
    }
}

fn describe(event: &RawEvent) -> String {
    let meetup_at = event.meetup_at.as_deref().unwrap_or_default();
    let start_at = event.start_at.as_deref().unwrap_or_default();

    // Departure runs straight into Arrival, as calendar entries have always shown it
    format!(
        "Departure: {}, {}Arrival: {}, {} \nGame: {} \nServer: {} - {} \nMeetup At: {} \nStart At: {}",
        event.departure.location,
        event.departure.city,
        event.arrive.location,
        event.arrive.city,
        event.game,
        event.server.name,
        event.server.id,
        meetup_at,
        start_at,
    )
}
