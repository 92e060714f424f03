//! Data models for the argus-link client library.
//!
//! Request and response structures for resource calls and stream messages,
//! one file per model.

pub mod connect_result;
pub mod error_detail;
pub mod identity;
pub mod monitor_event;
pub mod rate_limit;
pub mod watcher;
pub mod webhook;

pub use connect_result::ConnectResult;
pub use error_detail::{ErrorDetail, ErrorEnvelope};
pub use identity::{AccountRef, Identity};
pub use monitor_event::{MonitorEvent, DEFAULT_EVENT_TAG};
pub use rate_limit::RateLimitSnapshot;
pub use watcher::{DeliveryMethod, DetectionConfig, NotificationSettings, WatchTarget, Watcher};
pub use webhook::Webhook;
