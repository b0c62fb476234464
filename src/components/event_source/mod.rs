mod fetcher;
pub mod models;
pub mod normalize;

pub use fetcher::{EventSource, HttpEventSource};
pub use models::RawEvent;
pub use normalize::{normalize, CanonicalEvent};
