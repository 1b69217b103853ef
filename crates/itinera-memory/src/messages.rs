// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The append-only message log.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use itinera_core::{Container, DocumentQuery, DocumentStore, ItineraError, PartitionKey, ids};

use crate::sessions::{SessionStore, to_internal};
use crate::types::{AppendReceipt, Message};

/// Payload for a new conversation turn.
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub role: String,
    pub content: String,
    pub tool_call: Option<Value>,
    pub embedding: Option<Vec<f32>>,
    pub keywords: Vec<String>,
}

/// Append-only record of conversation turns, ordered by timestamp.
///
/// Appends within one writer are totally ordered by `ts`; nothing sequences
/// concurrent writers to the same session, so callers needing strict order
/// must serialize their own writes per session.
#[derive(Clone)]
pub struct MessageLog {
    store: Arc<dyn DocumentStore>,
    sessions: SessionStore,
}

impl MessageLog {
    pub fn new(store: Arc<dyn DocumentStore>, sessions: SessionStore) -> Self {
        Self { store, sessions }
    }

    /// Append one turn, then bump session activity.
    ///
    /// The message write is the primary operation and its failure
    /// propagates: a user turn must never be silently lost. The session
    /// touch is a side effect; its failure is logged and reported in the
    /// receipt as `activity_recorded = false`.
    pub async fn append(
        &self,
        session_id: &str,
        tenant_id: &str,
        user_id: &str,
        new: NewMessage,
    ) -> Result<AppendReceipt, ItineraError> {
        let id = ids::prefixed_id("msg");
        let message = Message {
            id: id.clone(),
            message_id: id.clone(),
            session_id: session_id.to_string(),
            tenant_id: tenant_id.to_string(),
            user_id: user_id.to_string(),
            role: new.role,
            content: new.content,
            tool_call: new.tool_call,
            embedding: new.embedding,
            ts: ids::now_rfc3339(),
            keywords: new.keywords,
            superseded: false,
            ttl: None,
        };
        let pk = PartitionKey::conversation(tenant_id, user_id, session_id);
        let doc = serde_json::to_value(&message).map_err(to_internal)?;
        self.store.upsert(Container::Messages, &pk, doc).await?;
        debug!(message_id = %id, session_id, "appended message");

        let activity_recorded = match self.sessions.touch(session_id, tenant_id, user_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(session_id, error = %e, "session activity bump failed after append");
                false
            }
        };
        Ok(AppendReceipt {
            message_id: id,
            activity_recorded,
        })
    }

    /// Messages for a session, newest first.
    ///
    /// Superseded messages are excluded unless asked for. This read path
    /// degrades: a store failure is logged and yields an empty sequence
    /// rather than an error.
    pub async fn list(
        &self,
        session_id: &str,
        tenant_id: &str,
        user_id: &str,
        include_superseded: bool,
    ) -> Result<Vec<Message>, ItineraError> {
        let pk = PartitionKey::conversation(tenant_id, user_id, session_id);
        let mut query = DocumentQuery::default().within(pk).order_desc("ts");
        if !include_superseded {
            query = query.not_true("superseded");
        }
        let docs = match self.store.query(Container::Messages, query).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(session_id, error = %e, "message list failed, returning empty");
                return Ok(Vec::new());
            }
        };
        let mut messages = Vec::with_capacity(docs.len());
        for doc in docs {
            messages.push(serde_json::from_value(doc).map_err(to_internal)?);
        }
        Ok(messages)
    }
}
