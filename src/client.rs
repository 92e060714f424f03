//! The `ArgusClient` facade and its builder.
//!
//! The client is cheap to clone; all clones share the same session state,
//! listener table, watch registry, and background stream task.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use crate::connection::{ConnectionManager, SessionState, StreamContext};
use crate::error::{ArgusError, Result};
use crate::executor::RequestExecutor;
use crate::listeners::{EventCallback, ListenerTable};
use crate::models::{ConnectResult, Identity, RateLimitSnapshot};
use crate::observe::{LogLevel, LogSink, SharedSink};
use crate::options::ConnectionOptions;
use crate::stream::{StreamTransport, WsStreamTransport};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::watchers::WatchRegistry;

/// Default platform endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.argusmonitor.io/v1";

/// Default HTTP request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Argus security-monitoring platform.
///
/// Resource calls go over HTTP; real-time detections arrive over an optional
/// persistent event stream managed by a background task. The stream is a
/// best-effort enhancement: losing it never fails resource calls.
///
/// # Example
///
/// ```no_run
/// use argus_link::ArgusClient;
///
/// # async fn run() -> argus_link::Result<()> {
/// let client = ArgusClient::builder()
///     .api_key("ak_live_...")
///     .build()?;
/// let session = client.connect().await?;
/// println!("connected: {}", session.connected);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ArgusClient {
    pub(crate) base_url: String,
    pub(crate) options: ConnectionOptions,
    pub(crate) request_timeout: Duration,
    pub(crate) executor: RequestExecutor,
    pub(crate) credential: String,
    pub(crate) stream_transport: Option<Arc<dyn StreamTransport>>,
    pub(crate) sink: SharedSink,
    pub(crate) listeners: Arc<ListenerTable>,
    pub(crate) registry: Arc<WatchRegistry>,
    pub(crate) state: Arc<RwLock<SessionState>>,
    pub(crate) identity: Arc<Mutex<Option<Identity>>>,
    pub(crate) connection: Arc<Mutex<Option<ConnectionManager>>>,
}

impl std::fmt::Debug for ArgusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgusClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ArgusClient {
    /// Build a client against the default endpoint with default options.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    pub fn builder() -> ArgusClientBuilder {
        ArgusClientBuilder::default()
    }

    /// Validate the credential and establish the session.
    ///
    /// Stream setup (when enabled) is attempted after validation succeeds;
    /// its failure is logged and the session stays usable in HTTP-only mode.
    /// A second `connect()` while one is in flight is rejected.
    pub async fn connect(&self) -> Result<ConnectResult> {
        {
            let mut state = self.write_state()?;
            if *state == SessionState::Connecting {
                return Err(ArgusError::Connection(
                    "connection already in progress".to_string(),
                ));
            }
            *state = SessionState::Connecting;
        }

        let identity = match self.validate_credential().await {
            Ok(identity) => identity,
            Err(e) => {
                if let Ok(mut state) = self.state.write() {
                    *state = SessionState::Disconnected;
                }
                return Err(e);
            },
        };

        if let Ok(mut cached) = self.identity.lock() {
            *cached = Some(identity.clone());
        }
        {
            let mut state = self.write_state()?;
            *state = SessionState::Connected;
        }
        self.sink.log(LogLevel::Info, "session established", "");

        if self.options.use_event_stream {
            if let Some(transport) = &self.stream_transport {
                let manager = ConnectionManager::spawn(StreamContext {
                    transport: transport.clone(),
                    base_url: self.base_url.clone(),
                    credential: self.credential.clone(),
                    ack_timeout: self.request_timeout,
                    options: self.options.clone(),
                    listeners: self.listeners.clone(),
                    sink: self.sink.clone(),
                    state: self.state.clone(),
                });
                if !manager.ensure_stream().await {
                    self.sink.log(
                        LogLevel::Warn,
                        "event stream unavailable; continuing in HTTP-only mode",
                        "",
                    );
                }
                if let Ok(mut slot) = self.connection.lock() {
                    *slot = Some(manager);
                }
            }
        }

        Ok(ConnectResult {
            connected: true,
            user: identity.user,
            organization: identity.organization,
        })
    }

    /// Tear down the session: stop the stream task, clear the watch registry
    /// and all listeners, and reset the reconnect counter. Idempotent.
    pub async fn disconnect(&self) {
        let manager = self.connection.lock().ok().and_then(|mut slot| slot.take());
        if let Some(manager) = manager {
            manager.shutdown().await;
        }
        self.registry.clear();
        self.listeners.clear();
        if let Ok(mut state) = self.state.write() {
            *state = SessionState::Disconnected;
        }
        self.sink.log(LogLevel::Info, "session closed", "");
    }

    /// Register a callback for events carrying `tag`. The tag `"all"`
    /// receives every event. Registering while the stream is down triggers a
    /// best-effort lazy setup attempt.
    pub async fn on(&self, tag: impl Into<String>, callback: EventCallback) {
        self.listeners.register(&tag.into(), callback);

        if !self.options.use_event_stream || self.is_stream_connected() {
            return;
        }
        let allows = self
            .state
            .read()
            .map(|s| s.allows_requests())
            .unwrap_or(false);
        if !allows {
            return;
        }
        let manager = self
            .connection
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().cloned());
        if let Some(manager) = manager {
            if !manager.ensure_stream().await {
                self.sink.log(
                    LogLevel::Warn,
                    "event stream unavailable; listener registered for later delivery",
                    "",
                );
            }
        }
    }

    /// Remove listeners for `tag`. With a callback, removes registrations of
    /// that exact callback; with `None`, removes every listener on the tag.
    pub fn off(&self, tag: &str, callback: Option<&EventCallback>) {
        self.listeners.unregister(tag, callback);
    }

    /// One manual stream setup attempt, bypassing the automatic attempt
    /// ceiling. Returns whether the stream is connected afterwards.
    pub async fn retry_stream(&self) -> bool {
        let manager = self
            .connection
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().cloned());
        match manager {
            Some(manager) => manager.retry().await,
            None => false,
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .map(|s| *s)
            .unwrap_or(SessionState::Disconnected)
    }

    /// Whether the event stream is currently up.
    pub fn is_stream_connected(&self) -> bool {
        self.connection
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(ConnectionManager::is_stream_connected))
            .unwrap_or(false)
    }

    /// Identity captured during the last successful `connect()`.
    pub fn identity(&self) -> Option<Identity> {
        self.identity.lock().ok().and_then(|cached| cached.clone())
    }

    /// Most recent rate-limit headers observed across all requests.
    pub fn rate_limit(&self) -> RateLimitSnapshot {
        self.executor.rate_limit()
    }

    /// Gate for resource calls: connected sessions only (a lost stream does
    /// not block requests).
    pub(crate) fn ensure_connected(&self) -> Result<()> {
        if self.state().allows_requests() {
            Ok(())
        } else {
            Err(ArgusError::NotConnected)
        }
    }

    async fn validate_credential(&self) -> Result<Identity> {
        let value = self
            .executor
            .execute(crate::transport::HttpMethod::Get, "/auth/validate", None)
            .await
            .map_err(|e| {
                ArgusError::Connection(format!("credential validation failed: {}", e))
            })?;
        serde_json::from_value(value)
            .map_err(|e| ArgusError::Connection(format!("invalid validation response: {}", e)))
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, SessionState>> {
        self.state
            .write()
            .map_err(|_| ArgusError::Connection("session state poisoned".to_string()))
    }
}

/// Builder for [`ArgusClient`].
pub struct ArgusClientBuilder {
    api_key: Option<String>,
    base_url: String,
    request_timeout: Duration,
    options: ConnectionOptions,
    http_transport: Option<Arc<dyn HttpTransport>>,
    stream_transport: Option<Arc<dyn StreamTransport>>,
    use_default_stream_transport: bool,
    sink: Option<SharedSink>,
}

impl Default for ArgusClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            options: ConnectionOptions::default(),
            http_transport: None,
            stream_transport: None,
            use_default_stream_transport: true,
            sink: None,
        }
    }
}

impl ArgusClientBuilder {
    /// API key identifying the account. Required.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the HTTP transport (tests inject stubs here).
    pub fn http_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.http_transport = Some(transport);
        self
    }

    /// Replace the stream transport (tests inject stubs here).
    pub fn stream_transport(mut self, transport: Arc<dyn StreamTransport>) -> Self {
        self.stream_transport = Some(transport);
        self
    }

    /// Disable the event stream entirely; the client runs HTTP-only.
    pub fn without_stream_transport(mut self) -> Self {
        self.stream_transport = None;
        self.use_default_stream_transport = false;
        self
    }

    pub fn observability_sink(mut self, sink: SharedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<ArgusClient> {
        let credential = match self.api_key {
            Some(key) if !key.trim().is_empty() => key,
            _ => {
                return Err(ArgusError::Configuration(
                    "an API key is required".to_string(),
                ));
            },
        };
        if self.base_url.trim().is_empty() {
            return Err(ArgusError::Configuration(
                "base URL must not be empty".to_string(),
            ));
        }

        let sink: SharedSink = self.sink.unwrap_or_else(|| Arc::new(LogSink));
        let http: Arc<dyn HttpTransport> = match self.http_transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.request_timeout)?),
        };
        let stream_transport: Option<Arc<dyn StreamTransport>> = match self.stream_transport {
            Some(transport) => Some(transport),
            None if self.use_default_stream_transport => Some(Arc::new(WsStreamTransport)),
            None => None,
        };

        let executor = RequestExecutor::new(
            self.base_url.clone(),
            credential.clone(),
            http,
            Arc::new(Mutex::new(RateLimitSnapshot::default())),
        );

        Ok(ArgusClient {
            base_url: self.base_url,
            options: self.options,
            request_timeout: self.request_timeout,
            executor,
            credential,
            stream_transport,
            sink: sink.clone(),
            listeners: Arc::new(ListenerTable::new(sink)),
            registry: Arc::new(WatchRegistry::new()),
            state: Arc::new(RwLock::new(SessionState::Disconnected)),
            identity: Arc::new(Mutex::new(None)),
            connection: Arc::new(Mutex::new(None)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_api_key() {
        let err = ArgusClient::builder().build().unwrap_err();
        assert!(matches!(err, ArgusError::Configuration(_)));

        let err = ArgusClient::builder().api_key("   ").build().unwrap_err();
        assert!(matches!(err, ArgusError::Configuration(_)));
    }

    #[test]
    fn test_builder_defaults() {
        let client = ArgusClient::builder().api_key("k1").build().unwrap();
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
        assert_eq!(client.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(client.state(), SessionState::Disconnected);
        assert!(!client.is_stream_connected());
    }

    #[test]
    fn test_resource_calls_gated_until_connected() {
        let client = ArgusClient::builder().api_key("k1").build().unwrap();
        assert!(matches!(
            client.ensure_connected(),
            Err(ArgusError::NotConnected)
        ));
    }
}
