// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session metadata: creation, lookup, activity tracking, agent handoffs.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use itinera_core::traits::PatchOp;
use itinera_core::{
    Container, DocumentQuery, DocumentStore, ItineraError, PartitionKey, ids,
};

use crate::types::{HandoffOutcome, Session};

/// CRUD and bookkeeping over session documents.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn DocumentStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a fresh session with zeroed counters and status `active`.
    pub async fn create(
        &self,
        tenant_id: &str,
        user_id: &str,
        active_agent: &str,
        title: Option<&str>,
    ) -> Result<Session, ItineraError> {
        let id = ids::prefixed_id("session");
        let now = ids::now_rfc3339();
        let session = Session {
            id: id.clone(),
            session_id: id.clone(),
            tenant_id: tenant_id.to_string(),
            user_id: user_id.to_string(),
            title: title.map(str::to_string),
            active_agent: Some(active_agent.to_string()),
            created_at: now.clone(),
            last_activity_at: now,
            status: "active".to_string(),
            message_count: 0,
        };
        let pk = PartitionKey::conversation(tenant_id, user_id, &id);
        let doc = serde_json::to_value(&session).map_err(to_internal)?;
        self.store.upsert(Container::Sessions, &pk, doc).await?;
        info!(session_id = %id, tenant_id, user_id, "created session");
        Ok(session)
    }

    /// Exact-match lookup scoped to tenant and user. Cross-partition: the
    /// caller rarely holds the full partition key.
    pub async fn get(
        &self,
        session_id: &str,
        tenant_id: &str,
        user_id: &str,
    ) -> Result<Option<Session>, ItineraError> {
        let docs = self
            .store
            .query(
                Container::Sessions,
                DocumentQuery::default()
                    .eq("sessionId", session_id)
                    .eq("tenantId", tenant_id)
                    .eq("userId", user_id)
                    .top(1),
            )
            .await?;
        match docs.into_iter().next() {
            Some(doc) => Ok(Some(serde_json::from_value(doc).map_err(to_internal)?)),
            None => Ok(None),
        }
    }

    /// Bump `lastActivityAt` and increment `messageCount`.
    ///
    /// Called as a side effect of message append; the caller decides what a
    /// failure means (append treats it as best-effort).
    pub async fn touch(
        &self,
        session_id: &str,
        tenant_id: &str,
        user_id: &str,
    ) -> Result<(), ItineraError> {
        let Some(mut session) = self.get(session_id, tenant_id, user_id).await? else {
            return Err(ItineraError::Internal(format!(
                "cannot touch unknown session {session_id}"
            )));
        };
        session.last_activity_at = ids::now_rfc3339();
        session.message_count += 1;
        let pk = PartitionKey::conversation(tenant_id, user_id, session_id);
        let doc = serde_json::to_value(&session).map_err(to_internal)?;
        self.store.upsert(Container::Sessions, &pk, doc).await?;
        debug!(session_id, count = session.message_count, "touched session");
        Ok(())
    }

    /// Record an agent handoff, best-effort.
    ///
    /// Prefers a targeted patch (add when the field is absent, replace when
    /// present); falls back to full read-modify-write when the patch fails.
    /// Never returns an error: handoff bookkeeping must not break the
    /// conversation, so both failure modes come back as an outcome value.
    pub async fn set_active_agent(
        &self,
        session_id: &str,
        tenant_id: &str,
        user_id: &str,
        agent: &str,
    ) -> HandoffOutcome {
        let session = match self.get(session_id, tenant_id, user_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                warn!(session_id, "handoff target session not found");
                return HandoffOutcome::Failed;
            }
            Err(e) => {
                warn!(session_id, error = %e, "handoff lookup failed");
                return HandoffOutcome::Failed;
            }
        };

        let pk = PartitionKey::conversation(tenant_id, user_id, session_id);
        let op = if session.active_agent.is_some() {
            PatchOp::Replace {
                path: "/activeAgent".to_string(),
                value: json!(agent),
            }
        } else {
            PatchOp::Add {
                path: "/activeAgent".to_string(),
                value: json!(agent),
            }
        };
        match self
            .store
            .patch(Container::Sessions, session_id, &pk, vec![op])
            .await
        {
            Ok(()) => {
                debug!(session_id, agent, "active agent patched");
                return HandoffOutcome::Patched;
            }
            Err(e) => {
                warn!(session_id, error = %e, "handoff patch failed, trying upsert");
            }
        }

        // Fallback: re-read for freshness, then overwrite the whole document.
        let refreshed = match self.get(session_id, tenant_id, user_id).await {
            Ok(Some(session)) => session,
            Ok(None) => session,
            Err(e) => {
                warn!(session_id, error = %e, "handoff refresh failed, using stale copy");
                session
            }
        };
        let mut doc = match serde_json::to_value(&refreshed) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(session_id, error = %e, "handoff serialization failed");
                return HandoffOutcome::Failed;
            }
        };
        if let Value::Object(map) = &mut doc {
            map.insert("activeAgent".to_string(), json!(agent));
        }
        match self.store.upsert(Container::Sessions, &pk, doc).await {
            Ok(()) => {
                debug!(session_id, agent, "active agent upserted");
                HandoffOutcome::Upserted
            }
            Err(e) => {
                warn!(session_id, error = %e, "handoff upsert failed, giving up");
                HandoffOutcome::Failed
            }
        }
    }
}

pub(crate) fn to_internal(e: serde_json::Error) -> ItineraError {
    ItineraError::Internal(format!("document (de)serialization failed: {e}"))
}
