use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What a watcher monitors. Exactly one of the three kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchTarget {
    /// A live stream URL.
    StreamUrl(String),
    /// A registered device id.
    Device(String),
    /// A business location id.
    Business(String),
}

impl WatchTarget {
    /// The watch endpoint path for this target kind.
    pub(crate) fn path(&self) -> &'static str {
        match self {
            Self::StreamUrl(_) => "/streams/watch",
            Self::Device(_) => "/devices/watch",
            Self::Business(_) => "/businesses/watch",
        }
    }

    /// The payload field name and value for this target.
    pub(crate) fn field(&self) -> (&'static str, &str) {
        match self {
            Self::StreamUrl(url) => ("streamUrl", url),
            Self::Device(id) => ("deviceId", id),
            Self::Business(id) => ("businessId", id),
        }
    }
}

/// Detection configuration for a watch subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionConfig {
    /// Detection sensitivity in `0.0..=1.0`.
    pub sensitivity: f64,

    /// Object-type labels to detect (e.g. `"person"`, `"vehicle"`).
    #[serde(default)]
    pub object_types: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.5,
            object_types: Vec::new(),
        }
    }
}

/// How the platform delivers events for a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    /// Low-latency push over the persistent event stream.
    Stream,
    /// Durable webhook callbacks.
    Webhook,
}

/// Event-delivery settings for a watch subscription.
///
/// Webhook delivery requires `webhook_url`; the watch call validates this
/// locally before any request is made.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    /// Delivery method for this watcher.
    pub method: DeliveryMethod,

    /// Callback URL, required when `method` is [`DeliveryMethod::Webhook`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl NotificationSettings {
    /// Stream delivery.
    pub fn stream() -> Self {
        Self {
            method: DeliveryMethod::Stream,
            webhook_url: None,
        }
    }

    /// Webhook delivery to the given URL.
    pub fn webhook(url: impl Into<String>) -> Self {
        Self {
            method: DeliveryMethod::Webhook,
            webhook_url: Some(url.into()),
        }
    }
}

/// A remote watch subscription, as returned by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watcher {
    /// Server-assigned watcher id.
    pub watcher_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_config: Option<DetectionConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_settings: Option<NotificationSettings>,

    /// Creation timestamp as reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Remaining fields from the server payload.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
