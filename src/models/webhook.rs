use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A registered webhook endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    /// Server-assigned webhook id. Absent in creation requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Callback URL.
    pub url: String,

    /// Event types this webhook receives. Empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,

    /// Remaining fields from the server payload.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
