//! Webhook endpoint management.

use serde_json::{json, Value};

use crate::api::require_id;
use crate::client::ArgusClient;
use crate::error::{ArgusError, Result};
use crate::models::Webhook;
use crate::transport::HttpMethod;

impl ArgusClient {
    /// Register (or update) a webhook endpoint.
    pub async fn set_webhook(&self, webhook: Webhook) -> Result<Webhook> {
        self.ensure_connected()?;
        if webhook.url.trim().is_empty() {
            return Err(ArgusError::Validation(
                "webhook url must not be empty".to_string(),
            ));
        }

        let payload = serde_json::to_value(&webhook)
            .map_err(|e| ArgusError::Validation(format!("invalid webhook: {}", e)))?;
        let value = self
            .executor
            .execute(HttpMethod::Post, "/webhooks", Some(payload))
            .await?;
        serde_json::from_value(value)
            .map_err(|e| ArgusError::Decode(format!("unexpected webhook response: {}", e)))
    }

    /// List registered webhook endpoints.
    pub async fn get_webhooks(&self) -> Result<Vec<Webhook>> {
        self.ensure_connected()?;
        let value = self
            .executor
            .execute(HttpMethod::Get, "/webhooks", None)
            .await?;
        let list = match value {
            Value::Array(_) => value,
            Value::Object(mut map) => map.remove("webhooks").unwrap_or(Value::Array(Vec::new())),
            _ => Value::Array(Vec::new()),
        };
        serde_json::from_value(list)
            .map_err(|e| ArgusError::Decode(format!("unexpected webhooks response: {}", e)))
    }

    /// Delete a webhook endpoint.
    pub async fn delete_webhook(&self, webhook_id: &str) -> Result<Value> {
        self.ensure_connected()?;
        require_id(webhook_id, "webhook id")?;
        self.executor
            .execute(
                HttpMethod::Delete,
                &format!("/webhooks/{}", webhook_id),
                None,
            )
            .await
    }

    /// Ask the platform to send a test delivery to a webhook endpoint.
    pub async fn test_webhook(&self, webhook_id: &str) -> Result<Value> {
        self.ensure_connected()?;
        require_id(webhook_id, "webhook id")?;
        self.executor
            .execute(
                HttpMethod::Post,
                &format!("/webhooks/{}/test", webhook_id),
                Some(json!({})),
            )
            .await
    }
}
