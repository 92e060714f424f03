use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tag used for events that carry no explicit event type.
pub const DEFAULT_EVENT_TAG: &str = "detection";

/// An event pushed by the platform, either over the stream or fetched
/// through the events resource.
///
/// Events are open-ended; only the fields the client routes on are modeled
/// and everything else is preserved in `payload`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorEvent {
    /// Event type used for listener dispatch (e.g. `"detection"`,
    /// `"alert"`). Absent types dispatch under [`DEFAULT_EVENT_TAG`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    /// The watcher that produced this event, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watcher_id: Option<String>,

    /// Remaining event fields (detections, timestamps, media references).
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl MonitorEvent {
    /// The listener-dispatch tag for this event.
    pub fn tag(&self) -> &str {
        self.event_type.as_deref().unwrap_or(DEFAULT_EVENT_TAG)
    }
}
