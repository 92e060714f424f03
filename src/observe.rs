//! Observability sink for warnings the client never raises to callers.
//!
//! Stream-health failures and listener panics are downgraded to sink events
//! rather than errors. The default [`LogSink`] forwards to the `log` crate;
//! tests inject [`NullSink`] for silent, deterministic runs.

use std::sync::Arc;

/// Severity of an observability event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Destination for diagnostics the client does not surface as errors.
///
/// Implementations must never panic; the client calls the sink from its
/// background connection task.
pub trait ObservabilitySink: Send + Sync {
    /// Record a diagnostic event. `context` carries supplementary detail
    /// (an error string, an event tag) and may be empty.
    fn log(&self, level: LogLevel, message: &str, context: &str);
}

/// Default sink forwarding to the `log` crate macros.
#[derive(Debug, Default, Clone)]
pub struct LogSink;

impl ObservabilitySink for LogSink {
    fn log(&self, level: LogLevel, message: &str, context: &str) {
        match level {
            LogLevel::Debug => log::debug!("{} {}", message, context),
            LogLevel::Info => log::info!("{} {}", message, context),
            LogLevel::Warn => log::warn!("{} {}", message, context),
            LogLevel::Error => log::error!("{} {}", message, context),
        }
    }
}

/// Sink that discards everything. Useful in tests.
#[derive(Debug, Default, Clone)]
pub struct NullSink;

impl ObservabilitySink for NullSink {
    fn log(&self, _level: LogLevel, _message: &str, _context: &str) {}
}

/// Shared sink handle used across the client and its background task.
pub type SharedSink = Arc<dyn ObservabilitySink>;
