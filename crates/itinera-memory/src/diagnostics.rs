// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operational records: provider API events and per-turn debug logs.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info};

use itinera_core::{Container, DocumentQuery, DocumentStore, ItineraError, PartitionKey, ids};

use crate::sessions::to_internal;
use crate::types::{ApiEvent, DebugLog, PropertyEntry};

/// Payload for a provider API event.
#[derive(Debug, Clone, Default)]
pub struct NewApiEvent {
    pub provider: String,
    pub operation: String,
    pub request: Value,
    pub response: Value,
    pub keywords: Vec<String>,
}

/// Per-turn diagnostic observations, flattened into the stored property
/// bag. Unknown values keep their defaults rather than being omitted so a
/// log entry always carries the full set of keys.
#[derive(Debug, Clone)]
pub struct NewDebugLog {
    pub message_id: Option<String>,
    pub agent_selected: String,
    pub previous_agent: String,
    pub finish_reason: String,
    pub model_name: String,
    pub system_fingerprint: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
    pub cached_tokens: i64,
    pub transfer_success: bool,
    pub tool_calls: Vec<Value>,
}

impl Default for NewDebugLog {
    fn default() -> Self {
        Self {
            message_id: None,
            agent_selected: "Unknown".to_string(),
            previous_agent: "Unknown".to_string(),
            finish_reason: "Unknown".to_string(),
            model_name: "Unknown".to_string(),
            system_fingerprint: "Unknown".to_string(),
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
            cached_tokens: 0,
            transfer_success: false,
            tool_calls: Vec::new(),
        }
    }
}

/// Append-only store for API events and debug logs.
///
/// Both record kinds are write-once observability data: failures here are
/// real errors (the caller chose to record), but nothing in the
/// conversation path depends on them.
#[derive(Clone)]
pub struct DiagnosticsStore {
    store: Arc<dyn DocumentStore>,
}

impl DiagnosticsStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Record one call against an external provider.
    pub async fn record_api_event(
        &self,
        session_id: &str,
        tenant_id: &str,
        new: NewApiEvent,
    ) -> Result<ApiEvent, ItineraError> {
        let id = ids::prefixed_id("api");
        let event = ApiEvent {
            id: id.clone(),
            event_id: id.clone(),
            session_id: session_id.to_string(),
            tenant_id: tenant_id.to_string(),
            provider: new.provider,
            operation: new.operation,
            request: new.request,
            response: new.response,
            ts: ids::now_rfc3339(),
            keywords: new.keywords,
        };
        let pk = PartitionKey::event(tenant_id, session_id);
        let doc = serde_json::to_value(&event).map_err(to_internal)?;
        self.store.upsert(Container::Events, &pk, doc).await?;
        info!(
            event_id = %id,
            provider = %event.provider,
            operation = %event.operation,
            "recorded API event"
        );
        Ok(event)
    }

    /// Store one per-turn debug log.
    pub async fn store_debug_log(
        &self,
        session_id: &str,
        tenant_id: &str,
        user_id: &str,
        new: NewDebugLog,
    ) -> Result<DebugLog, ItineraError> {
        let id = ids::prefixed_id("debug");
        let now = ids::now_rfc3339();
        let entry = |key: &str, value: Value| PropertyEntry {
            key: key.to_string(),
            value,
            time_stamp: now.clone(),
        };
        let property_bag = vec![
            entry("agent_selected", json!(new.agent_selected)),
            entry("previous_agent", json!(new.previous_agent)),
            entry("finish_reason", json!(new.finish_reason)),
            entry("model_name", json!(new.model_name)),
            entry("system_fingerprint", json!(new.system_fingerprint)),
            entry("input_tokens", json!(new.input_tokens)),
            entry("output_tokens", json!(new.output_tokens)),
            entry("total_tokens", json!(new.total_tokens)),
            entry("cached_tokens", json!(new.cached_tokens)),
            entry("transfer_success", json!(new.transfer_success)),
            entry("tool_calls", json!(new.tool_calls)),
        ];
        let log = DebugLog {
            id: id.clone(),
            debug_log_id: id.clone(),
            message_id: new.message_id,
            log_type: "debug_log".to_string(),
            session_id: session_id.to_string(),
            tenant_id: tenant_id.to_string(),
            user_id: user_id.to_string(),
            time_stamp: now,
            property_bag,
        };
        let pk = PartitionKey::conversation(tenant_id, user_id, session_id);
        let doc = serde_json::to_value(&log).map_err(to_internal)?;
        self.store.upsert(Container::DebugLogs, &pk, doc).await?;
        debug!(debug_log_id = %id, session_id, "stored debug log");
        Ok(log)
    }

    /// Point lookup of one debug log within its conversation partition.
    pub async fn get_debug_log(
        &self,
        debug_log_id: &str,
        session_id: &str,
        tenant_id: &str,
        user_id: &str,
    ) -> Result<Option<DebugLog>, ItineraError> {
        let pk = PartitionKey::conversation(tenant_id, user_id, session_id);
        match self
            .store
            .read(Container::DebugLogs, debug_log_id, &pk)
            .await?
        {
            Some(doc) => Ok(Some(serde_json::from_value(doc).map_err(to_internal)?)),
            None => Ok(None),
        }
    }

    /// The latest debug logs for a session, newest first, capped at `limit`.
    pub async fn query_debug_logs(
        &self,
        session_id: &str,
        tenant_id: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<DebugLog>, ItineraError> {
        let pk = PartitionKey::conversation(tenant_id, user_id, session_id);
        let docs = self
            .store
            .query(
                Container::DebugLogs,
                DocumentQuery::default()
                    .within(pk)
                    .order_desc("timeStamp")
                    .top(limit),
            )
            .await?;
        let mut logs = Vec::with_capacity(docs.len());
        for doc in docs {
            logs.push(serde_json::from_value(doc).map_err(to_internal)?);
        }
        Ok(logs)
    }

    /// API events for a session, newest first.
    pub async fn list_api_events(
        &self,
        session_id: &str,
        tenant_id: &str,
    ) -> Result<Vec<ApiEvent>, ItineraError> {
        let pk = PartitionKey::event(tenant_id, session_id);
        let docs = self
            .store
            .query(
                Container::Events,
                DocumentQuery::default().within(pk).order_desc("ts"),
            )
            .await?;
        let mut events = Vec::with_capacity(docs.len());
        for doc in docs {
            events.push(serde_json::from_value(doc).map_err(to_internal)?);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itinera_store::SqliteDocumentStore;

    async fn diagnostics() -> DiagnosticsStore {
        let store = SqliteDocumentStore::open_in_memory().await.unwrap();
        DiagnosticsStore::new(Arc::new(store))
    }

    #[tokio::test]
    async fn api_event_roundtrip() {
        let diagnostics = diagnostics().await;
        let recorded = diagnostics
            .record_api_event(
                "session_1",
                "t1",
                NewApiEvent {
                    provider: "openai".into(),
                    operation: "chat.completions".into(),
                    request: json!({"model": "gpt-4o"}),
                    response: json!({"finishReason": "stop"}),
                    keywords: vec!["paris".into()],
                },
            )
            .await
            .unwrap();
        assert!(recorded.event_id.starts_with("api_"));

        let events = diagnostics.list_api_events("session_1", "t1").await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], recorded);
    }

    #[tokio::test]
    async fn debug_log_roundtrip_by_id() {
        let diagnostics = diagnostics().await;
        let stored = diagnostics
            .store_debug_log(
                "session_1",
                "t1",
                "u1",
                NewDebugLog {
                    agent_selected: "planner".into(),
                    previous_agent: "router".into(),
                    total_tokens: 321,
                    transfer_success: true,
                    ..NewDebugLog::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(stored.log_type, "debug_log");

        let fetched = diagnostics
            .get_debug_log(&stored.debug_log_id, "session_1", "t1", "u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched, stored);

        let selected = fetched
            .property_bag
            .iter()
            .find(|entry| entry.key == "agent_selected")
            .unwrap();
        assert_eq!(selected.value, json!("planner"));
        let tokens = fetched
            .property_bag
            .iter()
            .find(|entry| entry.key == "total_tokens")
            .unwrap();
        assert_eq!(tokens.value, json!(321));
    }

    #[tokio::test]
    async fn get_missing_debug_log_is_none() {
        let diagnostics = diagnostics().await;
        assert!(
            diagnostics
                .get_debug_log("debug_ghost", "session_1", "t1", "u1")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn query_is_newest_first_and_capped() {
        let diagnostics = diagnostics().await;
        for agent in ["router", "planner", "booking"] {
            diagnostics
                .store_debug_log(
                    "session_1",
                    "t1",
                    "u1",
                    NewDebugLog {
                        agent_selected: agent.into(),
                        ..NewDebugLog::default()
                    },
                )
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let logs = diagnostics
            .query_debug_logs("session_1", "t1", "u1", 2)
            .await
            .unwrap();
        assert_eq!(logs.len(), 2);
        let agents: Vec<&Value> = logs
            .iter()
            .map(|log| &log.property_bag[0].value)
            .collect();
        assert_eq!(agents, [&json!("booking"), &json!("planner")]);
    }

    #[tokio::test]
    async fn debug_logs_are_session_scoped() {
        let diagnostics = diagnostics().await;
        diagnostics
            .store_debug_log("session_1", "t1", "u1", NewDebugLog::default())
            .await
            .unwrap();
        let other = diagnostics
            .query_debug_logs("session_2", "t1", "u1", 10)
            .await
            .unwrap();
        assert!(other.is_empty());
    }
}
