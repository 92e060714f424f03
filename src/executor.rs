//! Single-request executor: one authenticated call, one normalized result.
//!
//! Builds the full URL, attaches the bearer credential, enforces the
//! body-only-on-mutating-methods rule, records rate-limit response metadata,
//! and maps non-2xx responses to categorized failures. Never retries; retry
//! policy belongs to callers (the stream reconnect loop is the only one).

use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::{debug, warn};
use serde_json::Value;

use crate::error::{ArgusError, RequestFailure, Result};
use crate::models::{ErrorEnvelope, RateLimitSnapshot};
use crate::transport::{
    HttpMethod, HttpTransport, MultipartFile, RequestBody, TransportRequest, TransportResponse,
};

#[derive(Clone)]
pub(crate) struct RequestExecutor {
    base_url: String,
    credential: String,
    transport: Arc<dyn HttpTransport>,
    rate_limit: Arc<Mutex<RateLimitSnapshot>>,
}

impl RequestExecutor {
    pub(crate) fn new(
        base_url: String,
        credential: String,
        transport: Arc<dyn HttpTransport>,
        rate_limit: Arc<Mutex<RateLimitSnapshot>>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
            transport,
            rate_limit,
        }
    }

    /// Latest rate-limit header values, merged across responses.
    pub(crate) fn rate_limit(&self) -> RateLimitSnapshot {
        self.rate_limit
            .lock()
            .map(|snapshot| snapshot.clone())
            .unwrap_or_default()
    }

    /// Issue one authenticated request and normalize the outcome.
    ///
    /// `body` is ignored for GET and DELETE. The credential is attached as a
    /// bearer token and never appears in logs or error messages.
    pub(crate) async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        let body = if method.is_mutating() {
            body.map(RequestBody::Json)
        } else {
            None
        };
        self.round_trip(method, path, body).await
    }

    /// Issue a multipart upload. Bypasses the JSON body path.
    pub(crate) async fn execute_multipart(
        &self,
        path: &str,
        file: MultipartFile,
    ) -> Result<Value> {
        self.round_trip(HttpMethod::Post, path, Some(RequestBody::Multipart(file)))
            .await
    }

    async fn round_trip(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let request = TransportRequest {
            method,
            url,
            headers: vec![(
                "Authorization".to_string(),
                format!("Bearer {}", self.credential),
            )],
            body,
        };

        debug!("[ARGUS_HTTP] {} {}", method.as_str(), path);
        let start = Instant::now();

        let response = self
            .transport
            .send(request)
            .await
            .map_err(ArgusError::Request)?;

        let duration_ms = start.elapsed().as_millis();
        debug!(
            "[ARGUS_HTTP] {} {} -> status={} duration_ms={}",
            method.as_str(),
            path,
            response.status,
            duration_ms
        );

        self.record_rate_limit(&response);

        if (200..300).contains(&response.status) {
            if response.body.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(&response.body).map_err(|e| {
                ArgusError::Request(RequestFailure::from_status(
                    response.status,
                    format!("invalid response payload: {}", e),
                ))
            })
        } else {
            let message = extract_error_message(&response.body, response.status);
            warn!(
                "[ARGUS_HTTP] {} {} failed: status={} message=\"{}\"",
                method.as_str(),
                path,
                response.status,
                message
            );
            Err(RequestFailure::from_status(response.status, message).into())
        }
    }

    /// Fold rate-limit headers into the shared snapshot. Missing headers
    /// leave the previous values untouched; the snapshot is advisory and
    /// last-writer-wins.
    fn record_rate_limit(&self, response: &TransportResponse) {
        let parse = |name: &str| -> Option<u64> {
            response.headers.get(name).and_then(|v| v.parse().ok())
        };
        let limit = parse("x-ratelimit-limit");
        let remaining = parse("x-ratelimit-remaining");
        let reset = parse("x-ratelimit-reset");
        if limit.is_some() || remaining.is_some() || reset.is_some() {
            if let Ok(mut snapshot) = self.rate_limit.lock() {
                snapshot.merge(limit, remaining, reset);
            }
        }
    }
}

/// Pull the best error message out of a non-2xx body, falling back to a
/// synthesized one from the status code.
fn extract_error_message(body: &str, status: u16) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if let Some(message) = envelope.message() {
            return message.to_string();
        }
    }
    format!("request failed with status {}", status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    /// Replays a canned response and records what it was asked to send.
    struct CannedTransport {
        status: u16,
        headers: HashMap<String, String>,
        body: String,
        seen: Mutex<Vec<TransportRequest>>,
        fail: bool,
    }

    impl CannedTransport {
        fn ok(body: &str) -> Self {
            Self::with_status(200, body)
        }

        fn with_status(status: u16, body: &str) -> Self {
            Self {
                status,
                headers: HashMap::new(),
                body: body.to_string(),
                seen: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn transport_failure() -> Self {
            Self {
                fail: true,
                ..Self::ok("")
            }
        }
    }

    #[async_trait]
    impl HttpTransport for CannedTransport {
        async fn send(
            &self,
            request: TransportRequest,
        ) -> std::result::Result<TransportResponse, RequestFailure> {
            self.seen.lock().unwrap().push(request);
            if self.fail {
                return Err(RequestFailure::transport("connection refused"));
            }
            Ok(TransportResponse {
                status: self.status,
                headers: self.headers.clone(),
                body: self.body.clone(),
            })
        }
    }

    fn executor_with(transport: Arc<CannedTransport>) -> RequestExecutor {
        RequestExecutor::new(
            "https://api.test".to_string(),
            "k1".to_string(),
            transport,
            Arc::new(Mutex::new(RateLimitSnapshot::default())),
        )
    }

    #[tokio::test]
    async fn test_get_never_carries_body() {
        let transport = Arc::new(CannedTransport::ok("{}"));
        let executor = executor_with(transport.clone());
        executor
            .execute(HttpMethod::Get, "/events", Some(json!({"x": 1})))
            .await
            .unwrap();
        let seen = transport.seen.lock().unwrap();
        assert!(seen[0].body.is_none());
        assert_eq!(seen[0].url, "https://api.test/events");
    }

    #[tokio::test]
    async fn test_bearer_credential_attached() {
        let transport = Arc::new(CannedTransport::ok("{}"));
        let executor = executor_with(transport.clone());
        executor.execute(HttpMethod::Get, "/events", None).await.unwrap();
        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].headers[0].1, "Bearer k1");
    }

    #[tokio::test]
    async fn test_status_categorization() {
        for (status, category) in [
            (401, ErrorCategory::Unauthorized),
            (403, ErrorCategory::Forbidden),
            (404, ErrorCategory::NotFound),
            (500, ErrorCategory::ServerError),
            (429, ErrorCategory::ClientError),
        ] {
            let transport = Arc::new(CannedTransport::with_status(status, "{}"));
            let executor = executor_with(transport);
            let err = executor
                .execute(HttpMethod::Get, "/events", None)
                .await
                .unwrap_err();
            assert_eq!(err.category(), Some(category), "status {}", status);
            assert_eq!(err.status(), Some(status));
        }
    }

    #[tokio::test]
    async fn test_structured_error_message_extracted() {
        let transport = Arc::new(CannedTransport::with_status(
            403,
            r#"{"error":{"message":"key lacks scope"}}"#,
        ));
        let executor = executor_with(transport);
        let err = executor
            .execute(HttpMethod::Get, "/events", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("key lacks scope"));
    }

    #[tokio::test]
    async fn test_unparseable_error_synthesizes_message() {
        let transport = Arc::new(CannedTransport::with_status(502, "<html>bad gateway</html>"));
        let executor = executor_with(transport);
        let err = executor
            .execute(HttpMethod::Get, "/events", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("status 502"));
    }

    #[tokio::test]
    async fn test_transport_failure_has_no_status() {
        let transport = Arc::new(CannedTransport::transport_failure());
        let executor = executor_with(transport);
        let err = executor
            .execute(HttpMethod::Get, "/events", None)
            .await
            .unwrap_err();
        assert_eq!(err.category(), Some(ErrorCategory::Transport));
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_rate_limit_partial_update() {
        let mut transport = CannedTransport::ok("{}");
        transport
            .headers
            .insert("x-ratelimit-limit".to_string(), "100".to_string());
        transport
            .headers
            .insert("x-ratelimit-remaining".to_string(), "42".to_string());
        let transport = Arc::new(transport);
        let rate_limit = Arc::new(Mutex::new(RateLimitSnapshot {
            limit: Some(50),
            remaining: Some(1),
            reset: Some(99),
        }));
        let executor = RequestExecutor::new(
            "https://api.test".to_string(),
            "k1".to_string(),
            transport,
            rate_limit.clone(),
        );
        executor.execute(HttpMethod::Get, "/events", None).await.unwrap();
        let snapshot = *rate_limit.lock().unwrap();
        assert_eq!(snapshot.limit, Some(100));
        assert_eq!(snapshot.remaining, Some(42));
        // reset header absent: previous value kept, never zeroed
        assert_eq!(snapshot.reset, Some(99));
    }

    #[tokio::test]
    async fn test_empty_success_body_is_null() {
        let transport = Arc::new(CannedTransport::with_status(204, ""));
        let executor = executor_with(transport);
        let value = executor
            .execute(HttpMethod::Delete, "/watchers/w1", None)
            .await
            .unwrap();
        assert!(value.is_null());
    }
}
