use super::models::{CalendarEntry, CalendarEvent, EventList, EventQuery, InsertedEntry};
use super::token::CredentialProvider;
use crate::error::{auth_error, google_calendar_error, SyncResult};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Calendar operations used by the reconciliation engine
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Entries overlapping the query window whose text loosely matches `query.text`
    async fn list_events(&self, query: &EventQuery) -> SyncResult<Vec<CalendarEvent>>;

    /// Create an entry and return the created resource
    async fn insert_event(&self, entry: &CalendarEntry) -> SyncResult<InsertedEntry>;
}

/// Google Calendar v3 REST client for a single calendar
#[derive(Clone)]
pub struct GoogleCalendarClient {
    api_base: String,
    calendar_id: String,
    credentials: Arc<dyn CredentialProvider>,
    client: Client,
}

impl GoogleCalendarClient {
    pub fn new(
        api_base: impl Into<String>,
        calendar_id: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            calendar_id: calendar_id.into(),
            credentials,
            client: Client::new(),
        }
    }

    /// `{base}/calendars/{calendar_id}/events`, with the id path-encoded
    fn events_url(&self) -> SyncResult<Url> {
        let mut url = Url::parse(self.api_base.trim_end_matches('/'))
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| google_calendar_error("Calendar API base cannot hold a path"))?
            .pop_if_empty()
            .extend(["calendars", self.calendar_id.as_str(), "events"]);
        Ok(url)
    }

    async fn check_status(response: Response, action: &str) -> SyncResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string());
        let message = format!("Failed to {}: HTTP {} - {}", action, status, error_body);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(auth_error(&message))
        } else {
            Err(google_calendar_error(&message))
        }
    }
}

#[async_trait]
impl CalendarService for GoogleCalendarClient {
    async fn list_events(&self, query: &EventQuery) -> SyncResult<Vec<CalendarEvent>> {
        let access_token = self.credentials.access_token().await?;
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.events_url()?;
            {
                let mut pairs = url.query_pairs_mut();
                pairs
                    .append_pair("timeMin", &query.time_min)
                    .append_pair("timeMax", &query.time_max)
                    .append_pair("q", &query.text)
                    .append_pair("singleEvents", "true")
                    .append_pair("orderBy", "startTime");
                if let Some(token) = &page_token {
                    pairs.append_pair("pageToken", token);
                }
            }

            let response = self
                .client
                .get(url)
                .bearer_auth(&access_token)
                .send()
                .await
                .map_err(|e| google_calendar_error(&format!("Failed to fetch events: {}", e)))?;
            let response = Self::check_status(response, "fetch events").await?;

            let page: EventList = response.json().await.map_err(|e| {
                google_calendar_error(&format!("Failed to parse events response: {}", e))
            })?;
            events.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(
            "Found {} candidate entries for '{}' in [{}, {})",
            events.len(),
            query.text,
            query.time_min,
            query.time_max
        );
        Ok(events)
    }

    async fn insert_event(&self, entry: &CalendarEntry) -> SyncResult<InsertedEntry> {
        let access_token = self.credentials.access_token().await?;
        let url = self.events_url()?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&access_token)
            .json(entry)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to insert event: {}", e)))?;
        let response = Self::check_status(response, "insert event").await?;

        response.json().await.map_err(|e| {
            google_calendar_error(&format!("Failed to parse insert response: {}", e))
        })
    }
}
