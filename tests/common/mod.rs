//! Shared in-process stubs for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use argus_link::{
    ArgusClient, HttpMethod, HttpTransport, RequestFailure, StreamHandle, StreamMessage,
    StreamTransport, TransportRequest, TransportResponse,
};

/// Canned HTTP responses keyed by `"METHOD /path"`; records every request.
pub struct StubHttpTransport {
    routes: Mutex<HashMap<String, (u16, String)>>,
    recorded: Mutex<Vec<TransportRequest>>,
    /// Applied to every request; lets tests hold a `connect()` in flight.
    delay: Option<Duration>,
}

impl StubHttpTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            routes: Mutex::new(HashMap::new()),
            recorded: Mutex::new(Vec::new()),
            delay: None,
        })
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            routes: Mutex::new(HashMap::new()),
            recorded: Mutex::new(Vec::new()),
            delay: Some(delay),
        })
    }

    /// Register a canned response for `"METHOD /path"`.
    pub fn route(self: &Arc<Self>, key: &str, status: u16, body: &str) -> Arc<Self> {
        self.routes
            .lock()
            .unwrap()
            .insert(key.to_string(), (status, body.to_string()));
        self.clone()
    }

    /// Route answering credential validation with a minimal identity.
    pub fn with_valid_credential(self: &Arc<Self>) -> Arc<Self> {
        self.route(
            "GET /auth/validate",
            200,
            r#"{"user":{"id":"u1"},"organization":{"id":"o1"}}"#,
        )
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.recorded.lock().unwrap().clone()
    }

    /// Requests whose URL path matches `path` (query string ignored).
    pub fn requests_to(&self, path: &str) -> Vec<TransportRequest> {
        self.requests()
            .into_iter()
            .filter(|r| {
                let without_query = r.url.split('?').next().unwrap_or(&r.url);
                without_query.ends_with(path)
            })
            .collect()
    }
}

#[async_trait]
impl HttpTransport for StubHttpTransport {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, RequestFailure> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.recorded.lock().unwrap().push(request.clone());

        // Match routes by path suffix so the base URL's `/v1` prefix (and
        // any query string) does not have to appear in route keys.
        let without_query = request.url.split('?').next().unwrap_or(&request.url);
        let method = request.method.as_str();
        let canned = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(key, _)| {
                key.strip_prefix(method)
                    .and_then(|rest| rest.strip_prefix(' '))
                    .map(|key_path| without_query.ends_with(key_path))
                    .unwrap_or(false)
            })
            .map(|(_, response)| response.clone());

        match canned {
            Some((status, body)) => Ok(TransportResponse {
                status,
                headers: HashMap::new(),
                body,
            }),
            None => Ok(TransportResponse {
                status: 404,
                headers: HashMap::new(),
                body: format!(
                    r#"{{"error":{{"message":"no stub for {} {}"}}}}"#,
                    method, without_query
                ),
            }),
        }
    }
}

/// One scripted outcome for a stream-open attempt.
pub enum StreamScript {
    /// The open attempt fails outright.
    Fail,
    /// The open succeeds: a connect acknowledgment is delivered, followed by
    /// the scripted messages. With `hold` the stream then stays open.
    Connect {
        messages: Vec<StreamMessage>,
        hold: bool,
    },
}

/// Stream transport that replays scripted open outcomes in order. Attempts
/// beyond the script fail.
pub struct ScriptedStreamTransport {
    script: Mutex<VecDeque<StreamScript>>,
    opens: AtomicUsize,
    // Keeps held streams open by retaining their senders.
    held: Mutex<Vec<mpsc::Sender<StreamMessage>>>,
}

impl ScriptedStreamTransport {
    pub fn new(script: Vec<StreamScript>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            opens: AtomicUsize::new(0),
            held: Mutex::new(Vec::new()),
        })
    }

    /// Transport whose every open attempt fails.
    pub fn always_failing() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn open_attempts(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

struct ScriptedHandle {
    rx: mpsc::Receiver<StreamMessage>,
}

#[async_trait]
impl StreamHandle for ScriptedHandle {
    async fn next_message(&mut self) -> Option<StreamMessage> {
        self.rx.recv().await
    }

    async fn close(&mut self) {
        self.rx.close();
    }
}

#[async_trait]
impl StreamTransport for ScriptedStreamTransport {
    async fn open(
        &self,
        _base_url: &str,
        _credential: &str,
    ) -> argus_link::Result<Box<dyn StreamHandle>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(StreamScript::Connect { messages, hold }) => {
                let (tx, rx) = mpsc::channel(64);
                tx.send(StreamMessage::Connect).await.ok();
                for message in messages {
                    tx.send(message).await.ok();
                }
                if hold {
                    self.held.lock().unwrap().push(tx);
                }
                Ok(Box::new(ScriptedHandle { rx }))
            },
            Some(StreamScript::Fail) | None => Err(argus_link::ArgusError::Stream(
                "scripted open failure".to_string(),
            )),
        }
    }
}

/// Opt-in logging for debugging test runs (`RUST_LOG=debug cargo test`).
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A connected client over the given stubs, with stream options tuned for
/// fast tests.
pub async fn connected_client(
    http: Arc<StubHttpTransport>,
    stream: Option<Arc<ScriptedStreamTransport>>,
) -> ArgusClient {
    init_logging();
    let mut builder = ArgusClient::builder()
        .api_key("test-key")
        .base_url("https://api.test/v1")
        .http_transport(http)
        .observability_sink(Arc::new(argus_link::NullSink))
        .options(
            argus_link::ConnectionOptions::default()
                .with_reconnect_delay_ms(5)
                .with_max_reconnect_attempts(3),
        );
    builder = match stream {
        Some(stream) => builder.stream_transport(stream),
        None => builder.without_stream_transport(),
    };
    let client = builder.build().expect("client builds");
    client.connect().await.expect("connect succeeds");
    client
}

/// Assert a request carries no body (GET/DELETE must never send one).
pub fn assert_no_body(request: &TransportRequest) {
    assert!(
        request.body.is_none(),
        "{} {} unexpectedly carried a body",
        request.method.as_str(),
        request.url
    );
}

/// The bearer header value attached to a recorded request.
pub fn bearer_of(request: &TransportRequest) -> Option<String> {
    request
        .headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
        .map(|(_, value)| value.clone())
}

pub fn is_get(request: &TransportRequest) -> bool {
    request.method == HttpMethod::Get
}
