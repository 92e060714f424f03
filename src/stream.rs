//! Event-stream transport: the persistent push channel.
//!
//! The connection manager consumes the [`StreamTransport`] / [`StreamHandle`]
//! traits; [`WsStreamTransport`] is the WebSocket implementation. The
//! capability is resolved once at client construction — a client built
//! without one runs HTTP-only, with webhooks as the durable fallback.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        error::Error as WsError,
        http::header::{HeaderValue, AUTHORIZATION},
        protocol::Message,
    },
};
use url::Url;

use crate::error::{ArgusError, Result};
use crate::models::MonitorEvent;

/// Capacity of the channel between the socket reader task and the handle.
const STREAM_CHANNEL_CAPACITY: usize = 1024;

/// A named message emitted by the stream.
#[derive(Debug, Clone)]
pub enum StreamMessage {
    /// Server acknowledged the connection; the stream is usable.
    Connect,
    /// Server closed the stream, with a reason.
    Disconnect(String),
    /// The connection attempt failed at the protocol level.
    ConnectError(String),
    /// A pushed monitoring event.
    Event(MonitorEvent),
    /// A pushed user notification. Always dispatched under the
    /// `"notification"` tag regardless of any event-type field.
    Notification(MonitorEvent),
    /// Platform housekeeping message; observability only.
    System(Value),
}

/// Wire format of stream frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum WireMessage {
    Connect,
    Disconnect {
        #[serde(default)]
        reason: Option<String>,
    },
    Event {
        payload: MonitorEvent,
    },
    Notification {
        payload: MonitorEvent,
    },
    System {
        #[serde(default)]
        payload: Value,
    },
}

impl From<WireMessage> for StreamMessage {
    fn from(wire: WireMessage) -> Self {
        match wire {
            WireMessage::Connect => Self::Connect,
            WireMessage::Disconnect { reason } => {
                Self::Disconnect(reason.unwrap_or_else(|| "server closed stream".to_string()))
            },
            WireMessage::Event { payload } => Self::Event(payload),
            WireMessage::Notification { payload } => Self::Notification(payload),
            WireMessage::System { payload } => Self::System(payload),
        }
    }
}

/// An open stream connection.
#[async_trait]
pub trait StreamHandle: Send {
    /// Next message, or `None` when the stream has ended.
    async fn next_message(&mut self) -> Option<StreamMessage>;

    /// Close the stream. Dropping the handle must also tear it down.
    async fn close(&mut self);
}

/// Capability to open stream connections.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Open a stream against the platform's streaming endpoint derived from
    /// `base_url`, authenticating with `credential`.
    async fn open(&self, base_url: &str, credential: &str) -> Result<Box<dyn StreamHandle>>;
}

/// Derive the streaming endpoint URL from the HTTP base endpoint:
/// http(s) maps to ws(s) and `/stream` is appended to the path.
pub(crate) fn resolve_stream_url(base_url: &str) -> Result<String> {
    let mut url = Url::parse(base_url.trim()).map_err(|e| {
        ArgusError::Configuration(format!("invalid base endpoint '{}': {}", base_url, e))
    })?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ArgusError::Configuration(format!(
                "unsupported base endpoint scheme '{}'; expected http(s) or ws(s)",
                other
            )));
        },
    };
    url.set_scheme(scheme)
        .map_err(|_| ArgusError::Configuration("failed to derive stream URL".to_string()))?;

    let path = format!("{}/stream", url.path().trim_end_matches('/'));
    url.set_path(&path);
    Ok(url.to_string())
}

/// WebSocket stream transport.
#[derive(Debug, Default, Clone)]
pub struct WsStreamTransport;

impl WsStreamTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StreamTransport for WsStreamTransport {
    async fn open(&self, base_url: &str, credential: &str) -> Result<Box<dyn StreamHandle>> {
        let url = resolve_stream_url(base_url)?;
        debug!("[ARGUS_STREAM] opening {}", url);

        let mut request = url.into_client_request().map_err(|e| {
            ArgusError::Stream(format!("failed to build stream request: {}", e))
        })?;
        let header = HeaderValue::from_str(&format!("Bearer {}", credential))
            .map_err(|_| ArgusError::Stream("credential is not header-safe".to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, header);

        let (socket, _response) = connect_async(request).await.map_err(map_handshake_error)?;

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let reader = tokio::spawn(read_loop(socket, tx));

        Ok(Box::new(WsHandle {
            rx,
            reader: Some(reader),
        }))
    }
}

fn map_handshake_error(error: WsError) -> ArgusError {
    match error {
        WsError::Http(response) => {
            let status = response.status().as_u16();
            let message = match status {
                401 => "unauthorized: stream endpoint rejected the credential".to_string(),
                403 => "forbidden: stream access denied".to_string(),
                code => format!("stream handshake failed with status {}", code),
            };
            ArgusError::Stream(message)
        },
        other => ArgusError::Stream(format!("stream connection failed: {}", other)),
    }
}

type WsSocket =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn read_loop(mut socket: WsSocket, tx: mpsc::Sender<StreamMessage>) {
    while let Some(frame) = socket.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<WireMessage>(text.as_str()) {
                Ok(wire) => {
                    if tx.send(wire.into()).await.is_err() {
                        // Handle dropped; stop reading.
                        let _ = socket.close(None).await;
                        return;
                    }
                },
                Err(e) => {
                    warn!("[ARGUS_STREAM] unparseable frame: {}", e);
                },
            },
            Ok(Message::Ping(payload)) => {
                let _ = socket.send(Message::Pong(payload)).await;
            },
            Ok(Message::Pong(_)) | Ok(Message::Binary(_)) | Ok(Message::Frame(_)) => {},
            Ok(Message::Close(frame)) => {
                let reason = frame
                    .map(|f| f.reason.to_string())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "server closed stream".to_string());
                let _ = tx.send(StreamMessage::Disconnect(reason)).await;
                return;
            },
            Err(e) => {
                let _ = tx
                    .send(StreamMessage::Disconnect(format!("stream error: {}", e)))
                    .await;
                return;
            },
        }
    }
    let _ = tx
        .send(StreamMessage::Disconnect("stream ended".to_string()))
        .await;
}

struct WsHandle {
    rx: mpsc::Receiver<StreamMessage>,
    reader: Option<JoinHandle<()>>,
}

#[async_trait]
impl StreamHandle for WsHandle {
    async fn next_message(&mut self) -> Option<StreamMessage> {
        self.rx.recv().await
    }

    async fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.rx.close();
    }
}

impl Drop for WsHandle {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}
