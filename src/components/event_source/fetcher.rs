use super::models::{EventsEnvelope, RawEvent, EVENT_CATEGORIES};
use crate::error::{fetch_error, SyncResult};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

/// Source of raw event records
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch every event the source currently publishes, as one flat list
    async fn fetch(&self) -> SyncResult<Vec<RawEvent>>;
}

/// Event source backed by the TruckersMP events endpoint
#[derive(Clone)]
pub struct HttpEventSource {
    url: String,
    client: Client,
}

impl HttpEventSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, Client::new())
    }

    pub fn with_client(url: impl Into<String>, client: Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn fetch(&self) -> SyncResult<Vec<RawEvent>> {
        info!("Fetching events from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| fetch_error(&format!("An error occurred: {}", e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(fetch_error(&format!(
                "Failed to fetch events. Status code: {}",
                status.as_u16()
            )));
        }

        let envelope: EventsEnvelope = response
            .json()
            .await
            .map_err(|e| fetch_error(&format!("Failed to parse events response: {}", e)))?;

        for key in EVENT_CATEGORIES {
            match envelope.response.category(key) {
                Some(bucket) => debug!("Category '{}' has {} events", key, bucket.len()),
                None => debug!("Category '{}' not present in response", key),
            }
        }

        let events = envelope.response.into_events();
        info!("Fetched {} raw events", events.len());
        Ok(events)
    }
}
