use serde::{Deserialize, Deserializer, Serialize};

/// Event buckets published by the event source, in the order they are read
pub const EVENT_CATEGORIES: [&str; 4] = ["upcoming", "now", "today", "featured"];

/// Envelope returned by the events endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct EventsEnvelope {
    pub response: EventBuckets,
}

/// Category buckets; a bucket the source omits is simply absent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventBuckets {
    pub upcoming: Option<Vec<RawEvent>>,
    pub now: Option<Vec<RawEvent>>,
    pub today: Option<Vec<RawEvent>>,
    pub featured: Option<Vec<RawEvent>>,
}

impl EventBuckets {
    /// Look up a bucket by its category key
    pub fn category(&self, key: &str) -> Option<&[RawEvent]> {
        let bucket = match key {
            "upcoming" => &self.upcoming,
            "now" => &self.now,
            "today" => &self.today,
            "featured" => &self.featured,
            _ => return None,
        };
        bucket.as_deref()
    }

    /// Concatenate all present buckets in category order
    pub fn into_events(self) -> Vec<RawEvent> {
        [self.upcoming, self.now, self.today, self.featured]
            .into_iter()
            .flatten()
            .flatten()
            .collect()
    }
}

/// Event record as published by the event source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub game: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_type: EventType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub departure: Place,
    #[serde(default, deserialize_with = "null_as_default")]
    pub arrive: Place,
    #[serde(default, deserialize_with = "null_as_default")]
    pub server: Server,
    /// Pre-departure gathering time, "YYYY-MM-DD HH:MM:SS"
    #[serde(default)]
    pub meetup_at: Option<String>,
    #[serde(default)]
    pub start_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventType {
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub id: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Server ids arrive as numbers from the live API and as strings from older dumps
fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}
