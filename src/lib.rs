//! Rust client for the Argus security-monitoring platform.
//!
//! The crate exposes one entry point, [`ArgusClient`], which wraps two
//! surfaces behind a single session:
//!
//! - **Resource calls** over HTTP: watch subscriptions, event history,
//!   webhooks, file storage, analytics, integrations, and notifications.
//!   Each call is a single authenticated round trip with no retries.
//! - **An optional event stream**: a persistent connection managed by a
//!   background task that delivers detections to registered listeners,
//!   with bounded automatic reconnection. The stream is best-effort; its
//!   loss degrades the client to HTTP-only mode and never fails resource
//!   calls.
//!
//! ```no_run
//! use std::sync::Arc;
//! use argus_link::{ArgusClient, WatchParams, WatchTarget};
//!
//! # async fn run() -> argus_link::Result<()> {
//! let client = ArgusClient::new("ak_live_...")?;
//! client.connect().await?;
//!
//! client
//!     .on("detection", Arc::new(|event| {
//!         println!("detection from {:?}", event.watcher_id);
//!     }))
//!     .await;
//!
//! let watcher = client
//!     .watch(WatchParams::new(WatchTarget::Device("front-door".into())))
//!     .await?;
//! println!("watching via {}", watcher.watcher_id);
//! # Ok(())
//! # }
//! ```
//!
//! Transports are trait objects ([`HttpTransport`], [`StreamTransport`]) so
//! tests can drive the full client against in-process stubs.

pub mod api;
pub mod client;
pub mod connection;
pub mod error;
mod executor;
mod listeners;
pub mod models;
pub mod observe;
pub mod options;
pub mod stream;
pub mod transport;
mod watchers;

pub use api::events::EventQuery;
pub use api::watchers::WatchParams;
pub use client::{ArgusClient, ArgusClientBuilder, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
pub use connection::SessionState;
pub use error::{ArgusError, ErrorCategory, RequestFailure, Result};
pub use listeners::{EventCallback, WILDCARD_TAG};
pub use models::{
    AccountRef, ConnectResult, DeliveryMethod, DetectionConfig, Identity, MonitorEvent,
    NotificationSettings, RateLimitSnapshot, WatchTarget, Watcher, Webhook,
};
pub use observe::{LogLevel, LogSink, NullSink, ObservabilitySink, SharedSink};
pub use options::ConnectionOptions;
pub use stream::{StreamHandle, StreamMessage, StreamTransport, WsStreamTransport};
pub use transport::{
    HttpMethod, HttpTransport, MultipartFile, RequestBody, TransportRequest, TransportResponse,
};
