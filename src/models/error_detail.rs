use serde::{Deserialize, Serialize};

/// Structured error detail inside a non-2xx response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Human-readable error message.
    pub message: String,

    /// Machine-readable error code, when the server provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Envelope the platform wraps errors in. Either `{"error": {...}}` or a
/// top-level `{"message": "..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<ErrorDetail>,

    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorEnvelope {
    /// Extract the best available message, if any.
    pub fn message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .map(|detail| detail.message.as_str())
            .or(self.message.as_deref())
    }
}
