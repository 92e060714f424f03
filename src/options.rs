//! Connection-level options for the event stream.
//!
//! These control stream behavior only: whether the persistent event stream
//! is used at all, and how stream loss is retried. HTTP resource calls are
//! unaffected by any of them.

use serde::{Deserialize, Serialize};

/// Options governing the persistent event-stream connection.
///
/// # Example
///
/// ```rust
/// use argus_link::ConnectionOptions;
///
/// let options = ConnectionOptions::default()
///     .with_auto_reconnect(true)
///     .with_reconnect_delay_ms(2000)
///     .with_max_reconnect_attempts(10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Attempt to use the persistent event stream for push delivery.
    /// When `false` the client runs HTTP-only and events arrive via
    /// webhooks configured server-side.
    /// Default: true
    #[serde(default = "default_true")]
    pub use_event_stream: bool,

    /// Automatically reconnect after a server-initiated stream disconnect.
    /// Default: true
    #[serde(default = "default_true")]
    pub auto_reconnect: bool,

    /// Delay in milliseconds before each automatic reconnect attempt.
    /// Default: 1000ms
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Maximum number of automatic reconnect attempts before the session
    /// settles into degraded HTTP-only mode. A successful reconnect resets
    /// the counter. Manual retries bypass this ceiling.
    /// Default: 5
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

fn default_true() -> bool {
    true
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            use_event_stream: true,
            auto_reconnect: true,
            reconnect_delay_ms: 1000,
            max_reconnect_attempts: 5,
        }
    }
}

impl ConnectionOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the event stream entirely.
    pub fn with_event_stream(mut self, enabled: bool) -> Self {
        self.use_event_stream = enabled;
        self
    }

    /// Enable or disable automatic reconnection.
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Set the delay between automatic reconnect attempts.
    pub fn with_reconnect_delay_ms(mut self, delay_ms: u64) -> Self {
        self.reconnect_delay_ms = delay_ms;
        self
    }

    /// Set the maximum number of automatic reconnect attempts.
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }
}
