//! Detection event history and statistics.

use serde_json::Value;

use crate::api::{query_path, require_id};
use crate::client::ArgusClient;
use crate::error::Result;
use crate::transport::HttpMethod;

/// Filters for [`ArgusClient::query_events`].
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Restrict to one event type (e.g. `"intrusion"`).
    pub event_type: Option<String>,
    /// Restrict to events from one watcher.
    pub watcher_id: Option<String>,
    /// ISO-8601 lower bound.
    pub since: Option<String>,
    /// ISO-8601 upper bound.
    pub until: Option<String>,
    /// Page size.
    pub limit: Option<u32>,
}

impl ArgusClient {
    /// Query historical detection events.
    pub async fn query_events(&self, query: EventQuery) -> Result<Value> {
        self.ensure_connected()?;
        let limit = query.limit.map(|n| n.to_string());
        let path = query_path(
            "/events",
            &[
                ("type", query.event_type.as_deref()),
                ("watcherId", query.watcher_id.as_deref()),
                ("since", query.since.as_deref()),
                ("until", query.until.as_deref()),
                ("limit", limit.as_deref()),
            ],
        );
        self.executor.execute(HttpMethod::Get, &path, None).await
    }

    /// Fetch a single event by id.
    pub async fn get_event(&self, event_id: &str) -> Result<Value> {
        self.ensure_connected()?;
        require_id(event_id, "event id")?;
        self.executor
            .execute(HttpMethod::Get, &format!("/events/{}", event_id), None)
            .await
    }

    /// Mark an event as acknowledged by the operator.
    pub async fn acknowledge_event(&self, event_id: &str) -> Result<Value> {
        self.ensure_connected()?;
        require_id(event_id, "event id")?;
        self.executor
            .execute(
                HttpMethod::Post,
                &format!("/events/{}/acknowledge", event_id),
                None,
            )
            .await
    }

    /// Aggregate event counts grouped by type over the given window.
    pub async fn get_event_statistics(
        &self,
        since: Option<&str>,
        until: Option<&str>,
    ) -> Result<Value> {
        self.ensure_connected()?;
        let path = query_path("/events/statistics", &[("since", since), ("until", until)]);
        self.executor.execute(HttpMethod::Get, &path, None).await
    }
}
