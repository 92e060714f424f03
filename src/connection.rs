//! Connection lifecycle and the background stream task.
//!
//! The session's state machine lives here. The stream connection is owned by
//! a background task driven through a command channel; the public client
//! never touches the socket directly. Stream failures are reported to the
//! observability sink and never raised to callers — HTTP resource calls must
//! keep working while the stream is down (webhooks are the durable fallback).

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{ArgusError, Result};
use crate::listeners::ListenerTable;
use crate::observe::{LogLevel, SharedSink};
use crate::options::ConnectionOptions;
use crate::stream::{StreamHandle, StreamMessage, StreamTransport};

/// Tag under which notification messages are dispatched, regardless of any
/// event-type field they carry.
pub(crate) const NOTIFICATION_TAG: &str = "notification";

/// Session lifecycle state.
///
/// `Reconnecting` covers the window between stream loss and recovery (or
/// give-up); resource calls remain fully functional in that state. Degraded
/// HTTP-only mode is `Connected` with the stream down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Initial state, and terminal state after an explicit `disconnect()`.
    Disconnected,
    /// A `connect()` call is in flight. At most one per session.
    Connecting,
    /// Credential validated; resource calls are available (stream up or not).
    Connected,
    /// The stream was lost and automatic reconnection is in progress.
    Reconnecting,
}

impl SessionState {
    /// Whether resource calls are permitted in this state.
    pub fn allows_requests(&self) -> bool {
        matches!(self, Self::Connected | Self::Reconnecting)
    }
}

/// Everything the background task needs to open and serve the stream.
pub(crate) struct StreamContext {
    pub transport: Arc<dyn StreamTransport>,
    pub base_url: String,
    pub credential: String,
    /// Connect-acknowledgment race window; equals the request timeout.
    pub ack_timeout: Duration,
    pub options: ConnectionOptions,
    pub listeners: Arc<ListenerTable>,
    pub sink: SharedSink,
    pub state: Arc<RwLock<SessionState>>,
}

/// Commands sent from the client to the background stream task.
enum ConnCmd {
    /// Best-effort stream setup (connect-time and lazy `on()` setup).
    EnsureStream { result_tx: oneshot::Sender<bool> },
    /// Caller-invoked retry: exactly one fresh attempt, bypassing the
    /// automatic attempt ceiling.
    Retry { result_tx: oneshot::Sender<bool> },
    /// Tear down the stream and stop the task.
    Shutdown,
}

/// Handle to the background stream task. Cheap to clone.
#[derive(Clone)]
pub(crate) struct ConnectionManager {
    cmd_tx: mpsc::Sender<ConnCmd>,
    stream_connected: Arc<AtomicBool>,
    reconnect_attempts: Arc<AtomicU32>,
    _task: Arc<JoinHandle<()>>,
}

impl ConnectionManager {
    /// Spawn the background task. The stream starts down; callers drive
    /// setup through [`ensure_stream`](Self::ensure_stream).
    pub(crate) fn spawn(ctx: StreamContext) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let stream_connected = Arc::new(AtomicBool::new(false));
        let reconnect_attempts = Arc::new(AtomicU32::new(0));

        let task = tokio::spawn(connection_task(
            cmd_rx,
            ctx,
            stream_connected.clone(),
            reconnect_attempts.clone(),
        ));

        Self {
            cmd_tx,
            stream_connected,
            reconnect_attempts,
            _task: Arc::new(task),
        }
    }

    /// Attempt stream setup if it is not already up. Returns whether the
    /// stream is connected afterwards; never fails.
    pub(crate) async fn ensure_stream(&self) -> bool {
        let (result_tx, result_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(ConnCmd::EnsureStream { result_tx })
            .await
            .is_err()
        {
            return false;
        }
        result_rx.await.unwrap_or(false)
    }

    /// One fresh setup attempt regardless of the automatic attempt counter.
    pub(crate) async fn retry(&self) -> bool {
        let (result_tx, result_rx) = oneshot::channel();
        if self.cmd_tx.send(ConnCmd::Retry { result_tx }).await.is_err() {
            return false;
        }
        result_rx.await.unwrap_or(false)
    }

    /// Tear down the stream, cancel pending timers, and reset the counter.
    pub(crate) async fn shutdown(&self) {
        let _ = self.cmd_tx.send(ConnCmd::Shutdown).await;
        self.stream_connected.store(false, Ordering::SeqCst);
        self.reconnect_attempts.store(0, Ordering::SeqCst);
    }

    /// Whether the stream is currently open and acknowledged.
    pub(crate) fn is_stream_connected(&self) -> bool {
        self.stream_connected.load(Ordering::SeqCst)
    }
}

/// Restrict a state write to the Connected/Reconnecting pair so the task
/// never overrides an explicit `disconnect()`.
fn set_stream_state(state: &Arc<RwLock<SessionState>>, value: SessionState) {
    if let Ok(mut current) = state.write() {
        if current.allows_requests() {
            *current = value;
        }
    }
}

/// Open the stream and race the server's connect acknowledgment against the
/// timeout. On timeout the attempt future is dropped, tearing down any
/// partially created socket.
async fn open_stream(ctx: &StreamContext) -> Result<Box<dyn StreamHandle>> {
    let attempt = async {
        let mut handle = ctx.transport.open(&ctx.base_url, &ctx.credential).await?;
        loop {
            match handle.next_message().await {
                Some(StreamMessage::Connect) => return Ok(handle),
                Some(StreamMessage::ConnectError(e)) => {
                    handle.close().await;
                    return Err(ArgusError::Stream(e));
                },
                Some(StreamMessage::Disconnect(reason)) => {
                    handle.close().await;
                    return Err(ArgusError::Stream(reason));
                },
                Some(_) => continue,
                None => {
                    return Err(ArgusError::Stream(
                        "stream closed before acknowledgment".to_string(),
                    ));
                },
            }
        }
    };

    match tokio::time::timeout(ctx.ack_timeout, attempt).await {
        Ok(result) => result,
        Err(_) => Err(ArgusError::Timeout(format!(
            "stream acknowledgment timed out after {:?}",
            ctx.ack_timeout
        ))),
    }
}

/// The background task owning the stream connection.
///
/// Lifecycle:
/// 1. Idle until an `EnsureStream`/`Retry` command arrives
/// 2. While up: route inbound events to the listener table
/// 3. On server-initiated loss: bounded auto-reconnect after the configured
///    delay, counter reset on success
/// 4. After the ceiling: settle into degraded HTTP-only mode
async fn connection_task(
    mut cmd_rx: mpsc::Receiver<ConnCmd>,
    ctx: StreamContext,
    stream_connected: Arc<AtomicBool>,
    reconnect_attempts: Arc<AtomicU32>,
) {
    let mut handle: Option<Box<dyn StreamHandle>> = None;
    let mut pending_reconnect = false;

    loop {
        if let Some(h) = handle.as_mut() {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(ConnCmd::EnsureStream { result_tx })
                    | Some(ConnCmd::Retry { result_tx }) => {
                        // Already up.
                        let _ = result_tx.send(true);
                    },
                    Some(ConnCmd::Shutdown) | None => {
                        h.close().await;
                        stream_connected.store(false, Ordering::SeqCst);
                        return;
                    },
                },
                msg = h.next_message() => match msg {
                    Some(StreamMessage::Event(event)) => {
                        ctx.listeners.dispatch(&event);
                    },
                    Some(StreamMessage::Notification(event)) => {
                        ctx.listeners.dispatch_tagged(NOTIFICATION_TAG, &event);
                    },
                    Some(StreamMessage::System(payload)) => {
                        ctx.sink.log(
                            LogLevel::Debug,
                            "stream system message",
                            &payload.to_string(),
                        );
                    },
                    Some(StreamMessage::Connect) => {},
                    Some(StreamMessage::Disconnect(reason)) => {
                        ctx.sink.log(LogLevel::Warn, "event stream disconnected", &reason);
                        stream_connected.store(false, Ordering::SeqCst);
                        handle = None;
                        pending_reconnect = true;
                    },
                    Some(StreamMessage::ConnectError(e)) => {
                        ctx.sink.log(LogLevel::Warn, "event stream error", &e);
                        stream_connected.store(false, Ordering::SeqCst);
                        handle = None;
                        pending_reconnect = true;
                    },
                    None => {
                        ctx.sink.log(LogLevel::Warn, "event stream ended", "");
                        stream_connected.store(false, Ordering::SeqCst);
                        handle = None;
                        pending_reconnect = true;
                    },
                }
            }
        } else if pending_reconnect && ctx.options.auto_reconnect {
            let attempts = reconnect_attempts.load(Ordering::SeqCst);
            if attempts >= ctx.options.max_reconnect_attempts {
                ctx.sink.log(
                    LogLevel::Warn,
                    "max stream reconnect attempts reached; continuing in HTTP-only mode",
                    &format!("attempts={}", attempts),
                );
                pending_reconnect = false;
                set_stream_state(&ctx.state, SessionState::Connected);
                continue;
            }

            set_stream_state(&ctx.state, SessionState::Reconnecting);

            // Backoff sleep, cancellable by shutdown. An ensure/retry command
            // arriving during the wait short-circuits into an immediate
            // attempt whose outcome answers that command.
            let sleep = tokio::time::sleep(Duration::from_millis(ctx.options.reconnect_delay_ms));
            tokio::pin!(sleep);
            let mut waiters: Vec<oneshot::Sender<bool>> = Vec::new();
            let mut shutdown = false;
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(ConnCmd::EnsureStream { result_tx })
                    | Some(ConnCmd::Retry { result_tx }) => {
                        waiters.push(result_tx);
                    },
                    Some(ConnCmd::Shutdown) | None => {
                        shutdown = true;
                    },
                },
                _ = &mut sleep => {},
            }
            if shutdown {
                stream_connected.store(false, Ordering::SeqCst);
                return;
            }

            reconnect_attempts.fetch_add(1, Ordering::SeqCst);
            match open_stream(&ctx).await {
                Ok(h) => {
                    ctx.sink.log(LogLevel::Info, "event stream reconnected", "");
                    handle = Some(h);
                    stream_connected.store(true, Ordering::SeqCst);
                    reconnect_attempts.store(0, Ordering::SeqCst);
                    pending_reconnect = false;
                    set_stream_state(&ctx.state, SessionState::Connected);
                    for waiter in waiters {
                        let _ = waiter.send(true);
                    }
                },
                Err(e) => {
                    ctx.sink.log(
                        LogLevel::Warn,
                        "stream reconnect attempt failed",
                        &e.to_string(),
                    );
                    for waiter in waiters {
                        let _ = waiter.send(false);
                    }
                },
            }
        } else {
            // Idle: stream down, no automatic work scheduled.
            match cmd_rx.recv().await {
                Some(ConnCmd::EnsureStream { result_tx }) | Some(ConnCmd::Retry { result_tx }) => {
                    match open_stream(&ctx).await {
                        Ok(h) => {
                            handle = Some(h);
                            stream_connected.store(true, Ordering::SeqCst);
                            reconnect_attempts.store(0, Ordering::SeqCst);
                            pending_reconnect = false;
                            set_stream_state(&ctx.state, SessionState::Connected);
                            let _ = result_tx.send(true);
                        },
                        Err(e) => {
                            ctx.sink.log(
                                LogLevel::Warn,
                                "stream setup failed; continuing in HTTP-only mode",
                                &e.to_string(),
                            );
                            let _ = result_tx.send(false);
                        },
                    }
                },
                Some(ConnCmd::Shutdown) | None => {
                    stream_connected.store(false, Ordering::SeqCst);
                    return;
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::NullSink;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct FailingTransport {
        opens: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl StreamTransport for FailingTransport {
        async fn open(
            &self,
            _base_url: &str,
            _credential: &str,
        ) -> Result<Box<dyn StreamHandle>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            Err(ArgusError::Stream("connection refused".to_string()))
        }
    }

    fn context(transport: Arc<dyn StreamTransport>) -> StreamContext {
        StreamContext {
            transport,
            base_url: "https://api.test".to_string(),
            credential: "k1".to_string(),
            ack_timeout: Duration::from_millis(200),
            options: ConnectionOptions::default().with_reconnect_delay_ms(1),
            listeners: Arc::new(ListenerTable::new(Arc::new(NullSink))),
            sink: Arc::new(NullSink),
            state: Arc::new(RwLock::new(SessionState::Connected)),
        }
    }

    #[tokio::test]
    async fn test_ensure_stream_reports_failure_without_raising() {
        let opens = Arc::new(AtomicUsize::new(0));
        let manager = ConnectionManager::spawn(context(Arc::new(FailingTransport {
            opens: opens.clone(),
        })));

        assert!(!manager.ensure_stream().await);
        assert!(!manager.is_stream_connected());
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_attempts_exactly_once() {
        let opens = Arc::new(AtomicUsize::new(0));
        let manager = ConnectionManager::spawn(context(Arc::new(FailingTransport {
            opens: opens.clone(),
        })));

        assert!(!manager.retry().await);
        assert!(!manager.retry().await);
        assert_eq!(opens.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let opens = Arc::new(AtomicUsize::new(0));
        let manager = ConnectionManager::spawn(context(Arc::new(FailingTransport { opens })));

        manager.shutdown().await;
        manager.shutdown().await;
        assert!(!manager.is_stream_connected());
        // Commands after shutdown resolve to false instead of hanging.
        assert!(!manager.ensure_stream().await);
    }

    #[test]
    fn test_state_request_gating() {
        assert!(SessionState::Connected.allows_requests());
        assert!(SessionState::Reconnecting.allows_requests());
        assert!(!SessionState::Connecting.allows_requests());
        assert!(!SessionState::Disconnected.allows_requests());
    }
}
