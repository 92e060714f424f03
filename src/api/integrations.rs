//! Third-party integration management (alarm panels, chat ops, SIEM feeds).

use serde_json::Value;

use crate::api::require_id;
use crate::client::ArgusClient;
use crate::error::{ArgusError, Result};
use crate::transport::HttpMethod;

impl ArgusClient {
    /// List configured integrations.
    pub async fn get_integrations(&self) -> Result<Value> {
        self.ensure_connected()?;
        self.executor
            .execute(HttpMethod::Get, "/integrations", None)
            .await
    }

    /// Create an integration. `config` carries the provider-specific body.
    pub async fn create_integration(&self, config: Value) -> Result<Value> {
        self.ensure_connected()?;
        if !config.is_object() {
            return Err(ArgusError::Validation(
                "integration config must be a JSON object".to_string(),
            ));
        }
        self.executor
            .execute(HttpMethod::Post, "/integrations", Some(config))
            .await
    }

    /// Fetch one integration's configuration.
    pub async fn get_integration(&self, integration_id: &str) -> Result<Value> {
        self.ensure_connected()?;
        require_id(integration_id, "integration id")?;
        self.executor
            .execute(
                HttpMethod::Get,
                &format!("/integrations/{}", integration_id),
                None,
            )
            .await
    }

    /// Update an existing integration.
    pub async fn update_integration(&self, integration_id: &str, config: Value) -> Result<Value> {
        self.ensure_connected()?;
        require_id(integration_id, "integration id")?;
        self.executor
            .execute(
                HttpMethod::Put,
                &format!("/integrations/{}", integration_id),
                Some(config),
            )
            .await
    }

    /// Remove an integration.
    pub async fn delete_integration(&self, integration_id: &str) -> Result<Value> {
        self.ensure_connected()?;
        require_id(integration_id, "integration id")?;
        self.executor
            .execute(
                HttpMethod::Delete,
                &format!("/integrations/{}", integration_id),
                None,
            )
            .await
    }

    /// Exercise an integration's delivery path with a synthetic event.
    pub async fn test_integration(&self, integration_id: &str) -> Result<Value> {
        self.ensure_connected()?;
        require_id(integration_id, "integration id")?;
        self.executor
            .execute(
                HttpMethod::Post,
                &format!("/integrations/{}/test", integration_id),
                None,
            )
            .await
    }

    /// Manually trigger an integration with an arbitrary payload.
    pub async fn trigger_integration(
        &self,
        integration_id: &str,
        payload: Value,
    ) -> Result<Value> {
        self.ensure_connected()?;
        require_id(integration_id, "integration id")?;
        self.executor
            .execute(
                HttpMethod::Post,
                &format!("/integrations/{}/trigger", integration_id),
                Some(payload),
            )
            .await
    }
}
