//! Watch subscription management.

use serde_json::{json, Value};

use crate::api::require_id;
use crate::client::ArgusClient;
use crate::error::{ArgusError, Result};
use crate::models::{
    DeliveryMethod, DetectionConfig, NotificationSettings, WatchTarget, Watcher,
};
use crate::observe::LogLevel;
use crate::transport::HttpMethod;

/// Parameters for [`ArgusClient::watch`].
#[derive(Debug, Clone)]
pub struct WatchParams {
    /// What to monitor.
    pub target: WatchTarget,
    /// Detection settings; server defaults apply when absent.
    pub detection: Option<DetectionConfig>,
    /// Delivery settings; defaulted from the current stream state when
    /// absent (stream delivery if the stream is up, webhook otherwise).
    pub notification: Option<NotificationSettings>,
}

impl WatchParams {
    pub fn new(target: WatchTarget) -> Self {
        Self {
            target,
            detection: None,
            notification: None,
        }
    }

    pub fn detection(mut self, config: DetectionConfig) -> Self {
        self.detection = Some(config);
        self
    }

    pub fn notification(mut self, settings: NotificationSettings) -> Self {
        self.notification = Some(settings);
        self
    }
}

impl ArgusClient {
    /// Create a watch subscription and track it locally.
    ///
    /// Webhook delivery without a callback URL is rejected before any
    /// request is made.
    pub async fn watch(&self, params: WatchParams) -> Result<Watcher> {
        self.ensure_connected()?;

        let (field, value) = params.target.field();
        require_id(value, "watch target")?;

        let notification = match params.notification {
            Some(settings) => settings,
            None if self.is_stream_connected() => NotificationSettings::stream(),
            None => NotificationSettings {
                method: DeliveryMethod::Webhook,
                webhook_url: None,
            },
        };
        if notification.method == DeliveryMethod::Webhook
            && notification
                .webhook_url
                .as_deref()
                .map_or(true, |url| url.trim().is_empty())
        {
            return Err(ArgusError::Validation(
                "webhook delivery requires a webhookUrl".to_string(),
            ));
        }

        let mut payload = json!({
            "notificationSettings": notification,
        });
        payload[field] = Value::String(value.to_string());
        if let Some(detection) = &params.detection {
            payload["detectionConfig"] = serde_json::to_value(detection)
                .map_err(|e| ArgusError::Validation(format!("invalid detection config: {}", e)))?;
        }

        let value = self
            .executor
            .execute(HttpMethod::Post, params.target.path(), Some(payload))
            .await?;
        let watcher: Watcher = serde_json::from_value(value)
            .map_err(|e| ArgusError::Decode(format!("unexpected watch response: {}", e)))?;

        self.registry.upsert(watcher.clone());
        self.sink.log(LogLevel::Info, "watch created", &watcher.watcher_id);
        Ok(watcher)
    }

    /// Remove a watch subscription remotely and locally.
    pub async fn unwatch(&self, watcher_id: &str) -> Result<Value> {
        self.ensure_connected()?;
        require_id(watcher_id, "watcher id")?;

        let result = self
            .executor
            .execute(
                HttpMethod::Delete,
                &format!("/watchers/{}", watcher_id),
                None,
            )
            .await?;
        self.registry.remove(watcher_id);
        Ok(result)
    }

    /// Fetch the server's watcher list and make it the authoritative local
    /// view, replacing any stale entries.
    pub async fn get_active_watchers(&self) -> Result<Vec<Watcher>> {
        self.ensure_connected()?;

        let value = self
            .executor
            .execute(HttpMethod::Get, "/watchers", None)
            .await?;
        let watchers: Vec<Watcher> = match value {
            Value::Array(_) => serde_json::from_value(value),
            Value::Object(mut map) => match map.remove("watchers") {
                Some(list) => serde_json::from_value(list),
                None => Ok(Vec::new()),
            },
            _ => Ok(Vec::new()),
        }
        .map_err(|e| ArgusError::Decode(format!("unexpected watchers response: {}", e)))?;

        self.registry.replace_all(watchers.clone());
        Ok(watchers)
    }

    /// The locally tracked watcher set. No request is made.
    pub fn tracked_watchers(&self) -> Vec<Watcher> {
        self.registry.list()
    }
}
