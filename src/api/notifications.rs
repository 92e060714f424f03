//! Notification inbox and delivery preferences.

use serde_json::{json, Value};

use crate::api::{query_path, require_id};
use crate::client::ArgusClient;
use crate::error::{ArgusError, Result};
use crate::transport::HttpMethod;

impl ArgusClient {
    /// List notifications, optionally only unread ones.
    pub async fn get_notifications(
        &self,
        unread_only: bool,
        limit: Option<u32>,
    ) -> Result<Value> {
        self.ensure_connected()?;
        let limit = limit.map(|n| n.to_string());
        let unread = unread_only.then_some("true");
        let path = query_path(
            "/notifications",
            &[("unread", unread), ("limit", limit.as_deref())],
        );
        self.executor.execute(HttpMethod::Get, &path, None).await
    }

    /// Mark a notification as read.
    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<Value> {
        self.ensure_connected()?;
        require_id(notification_id, "notification id")?;
        self.executor
            .execute(
                HttpMethod::Post,
                &format!("/notifications/{}/read", notification_id),
                None,
            )
            .await
    }

    /// Fetch delivery preferences (channels, quiet hours).
    pub async fn get_notification_preferences(&self) -> Result<Value> {
        self.ensure_connected()?;
        self.executor
            .execute(HttpMethod::Get, "/notifications/preferences", None)
            .await
    }

    /// Replace delivery preferences.
    pub async fn set_notification_preferences(&self, preferences: Value) -> Result<Value> {
        self.ensure_connected()?;
        if !preferences.is_object() {
            return Err(ArgusError::Validation(
                "notification preferences must be a JSON object".to_string(),
            ));
        }
        self.executor
            .execute(
                HttpMethod::Put,
                "/notifications/preferences",
                Some(preferences),
            )
            .await
    }

    /// Register a mobile device token for push delivery.
    pub async fn register_device_token(&self, platform: &str, token: &str) -> Result<Value> {
        self.ensure_connected()?;
        require_id(platform, "platform")?;
        require_id(token, "device token")?;
        self.executor
            .execute(
                HttpMethod::Post,
                "/notifications/devices",
                Some(json!({ "platform": platform, "token": token })),
            )
            .await
    }

    /// Remove a previously registered device token.
    pub async fn remove_device_token(&self, token: &str) -> Result<Value> {
        self.ensure_connected()?;
        require_id(token, "device token")?;
        self.executor
            .execute(
                HttpMethod::Delete,
                &format!("/notifications/devices/{}", token),
                None,
            )
            .await
    }
}
