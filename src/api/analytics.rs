//! Analytics and AI-generated insights.

use serde_json::Value;

use crate::api::{query_path, require_id};
use crate::client::ArgusClient;
use crate::error::Result;
use crate::transport::HttpMethod;

impl ArgusClient {
    /// Aggregate detection analytics over the given window.
    pub async fn get_analytics(
        &self,
        since: Option<&str>,
        until: Option<&str>,
    ) -> Result<Value> {
        self.ensure_connected()?;
        let path = query_path("/analytics", &[("since", since), ("until", until)]);
        self.executor.execute(HttpMethod::Get, &path, None).await
    }

    /// Pre-computed dashboard rollups (per-day counts, top watchers).
    pub async fn get_dashboard_analytics(&self) -> Result<Value> {
        self.ensure_connected()?;
        self.executor
            .execute(HttpMethod::Get, "/analytics/dashboard", None)
            .await
    }

    /// AI-generated insights (anomalies, patterns) for the account.
    pub async fn get_insights(&self, limit: Option<u32>) -> Result<Value> {
        self.ensure_connected()?;
        let limit = limit.map(|n| n.to_string());
        let path = query_path("/insights", &[("limit", limit.as_deref())]);
        self.executor.execute(HttpMethod::Get, &path, None).await
    }

    /// Mark an insight as reviewed.
    pub async fn acknowledge_insight(&self, insight_id: &str) -> Result<Value> {
        self.ensure_connected()?;
        require_id(insight_id, "insight id")?;
        self.executor
            .execute(
                HttpMethod::Post,
                &format!("/insights/{}/acknowledge", insight_id),
                None,
            )
            .await
    }
}
