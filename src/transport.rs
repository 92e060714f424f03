//! HTTP transport abstraction.
//!
//! The executor talks to the platform through the [`HttpTransport`] trait so
//! tests can run against in-process stubs. [`ReqwestTransport`] is the
//! production implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ArgusError, RequestFailure, Result};

/// HTTP method for a transport request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Whether requests with this method carry a body. GET and DELETE never do.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// Method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// A file part for multipart uploads.
#[derive(Debug, Clone)]
pub struct MultipartFile {
    /// Form field name, usually `"file"`.
    pub field: String,
    /// File name reported to the server.
    pub file_name: String,
    /// MIME type of the content.
    pub content_type: String,
    /// Raw file bytes.
    pub data: Vec<u8>,
}

/// Request body variants. JSON for ordinary mutating calls, multipart for
/// file uploads (which bypass the JSON path entirely).
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart(MultipartFile),
}

/// A single outbound request handed to the transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    /// Fully resolved URL (base endpoint + path).
    pub url: String,
    /// Header name/value pairs, already including authorization.
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

/// A response received from the transport.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    /// Response headers with lowercased names.
    pub headers: HashMap<String, String>,
    /// Raw response body.
    pub body: String,
}

/// Generic HTTP client seam.
///
/// Implementations return `Err` only for transport-level failures where no
/// response was received (DNS, timeout, connection refused); any received
/// response, including non-2xx, is an `Ok`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, RequestFailure>;
}

/// Production transport backed by a pooled [`reqwest::Client`].
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with the given request timeout.
    ///
    /// Keep-alive pooling mirrors the server's idle window so repeated calls
    /// avoid per-request TCP handshakes.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ArgusError::Configuration(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, RequestFailure> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        builder = match request.body {
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::Multipart(file)) => {
                let part = reqwest::multipart::Part::bytes(file.data)
                    .file_name(file.file_name)
                    .mime_str(&file.content_type)
                    .map_err(|e| {
                        RequestFailure::transport(format!("invalid content type: {}", e))
                    })?;
                builder.multipart(reqwest::multipart::Form::new().part(file.field, part))
            },
            None => builder,
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                RequestFailure::transport(format!("request timed out: {}", e))
            } else {
                RequestFailure::transport(format!("request failed to send: {}", e))
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| RequestFailure::transport(format!("failed to read response: {}", e)))?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
