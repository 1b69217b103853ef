// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summary compaction: fold a span of messages into one record and retire
//! the originals.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use itinera_core::{Container, DocumentQuery, DocumentStore, ItineraError, PartitionKey, ids};

use crate::sessions::to_internal;
use crate::types::{Summary, SummaryReceipt, SummarySpan};

/// Creates and lists conversation summaries.
#[derive(Clone)]
pub struct SummaryStore {
    store: Arc<dyn DocumentStore>,
    retention_secs: i64,
}

impl SummaryStore {
    /// `retention_secs` is how long a superseded message survives before
    /// expiry (30 days in the default configuration).
    pub fn new(store: Arc<dyn DocumentStore>, retention_secs: i64) -> Self {
        Self {
            store,
            retention_secs,
        }
    }

    /// Write a summary and mark the messages it folds as superseded.
    ///
    /// A message may be claimed by at most one summary: if any message in
    /// `supersedes` is already superseded, the call fails with a conflict
    /// before anything is written. After the summary document lands, the
    /// per-message marking is best-effort: individual failures are logged,
    /// listed in the receipt, and never roll back the summary.
    pub async fn create(
        &self,
        session_id: &str,
        tenant_id: &str,
        user_id: &str,
        text: &str,
        span: SummarySpan,
        embedding: Option<Vec<f32>>,
        supersedes: Vec<String>,
    ) -> Result<SummaryReceipt, ItineraError> {
        let pk = PartitionKey::conversation(tenant_id, user_id, session_id);

        // Disjointness check up front, while nothing has been written.
        let mut candidates = Vec::with_capacity(supersedes.len());
        for message_id in &supersedes {
            let doc = self.store.read(Container::Messages, message_id, &pk).await?;
            if let Some(doc) = &doc {
                if doc.get("superseded").and_then(serde_json::Value::as_bool) == Some(true) {
                    return Err(ItineraError::Conflict(format!(
                        "message {message_id} is already superseded by another summary"
                    )));
                }
            }
            candidates.push((message_id.clone(), doc));
        }

        let id = ids::prefixed_id("summary");
        let summary = Summary {
            id: id.clone(),
            summary_id: id.clone(),
            session_id: session_id.to_string(),
            tenant_id: tenant_id.to_string(),
            user_id: user_id.to_string(),
            span,
            text: text.to_string(),
            embedding,
            created_at: ids::now_rfc3339(),
            supersedes: supersedes.clone(),
        };
        let doc = serde_json::to_value(&summary).map_err(to_internal)?;
        self.store.upsert(Container::Summaries, &pk, doc).await?;
        info!(summary_id = %id, session_id, folds = supersedes.len(), "created summary");

        let mut superseded = Vec::new();
        let mut failed = Vec::new();
        for (message_id, doc) in candidates {
            let Some(mut doc) = doc else {
                warn!(message_id = %message_id, "superseded message not found, skipping");
                failed.push(message_id);
                continue;
            };
            if let Some(map) = doc.as_object_mut() {
                map.insert("superseded".to_string(), json!(true));
                map.insert("ttl".to_string(), json!(self.retention_secs));
            }
            match self.store.upsert(Container::Messages, &pk, doc).await {
                Ok(()) => {
                    debug!(message_id = %message_id, "marked message superseded");
                    superseded.push(message_id);
                }
                Err(e) => {
                    warn!(message_id = %message_id, error = %e, "failed to mark message superseded");
                    failed.push(message_id);
                }
            }
        }
        Ok(SummaryReceipt {
            summary_id: id,
            superseded,
            failed,
        })
    }

    /// Summaries for a session, newest first.
    pub async fn list(
        &self,
        session_id: &str,
        tenant_id: &str,
        user_id: &str,
    ) -> Result<Vec<Summary>, ItineraError> {
        let pk = PartitionKey::conversation(tenant_id, user_id, session_id);
        let docs = self
            .store
            .query(
                Container::Summaries,
                DocumentQuery::default().within(pk).order_desc("createdAt"),
            )
            .await?;
        let mut summaries = Vec::with_capacity(docs.len());
        for doc in docs {
            summaries.push(serde_json::from_value(doc).map_err(to_internal)?);
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{MessageLog, NewMessage};
    use crate::sessions::SessionStore;
    use async_trait::async_trait;
    use itinera_store::SqliteDocumentStore;
    use serde_json::Value;

    const THIRTY_DAYS: i64 = 30 * 24 * 60 * 60;

    struct Fixture {
        sessions: SessionStore,
        log: MessageLog,
        summaries: SummaryStore,
        session_id: String,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn DocumentStore> =
            Arc::new(SqliteDocumentStore::open_in_memory().await.unwrap());
        let sessions = SessionStore::new(store.clone());
        let log = MessageLog::new(store.clone(), sessions.clone());
        let summaries = SummaryStore::new(store, THIRTY_DAYS);
        let session = sessions.create("t1", "u1", "planner", None).await.unwrap();
        Fixture {
            sessions,
            log,
            summaries,
            session_id: session.session_id,
        }
    }

    async fn append(f: &Fixture, content: &str) -> String {
        let receipt = f
            .log
            .append(
                &f.session_id,
                "t1",
                "u1",
                NewMessage {
                    role: "user".into(),
                    content: content.into(),
                    ..NewMessage::default()
                },
            )
            .await
            .unwrap();
        receipt.message_id
    }

    #[tokio::test]
    async fn summary_supersedes_its_messages() {
        let f = fixture().await;
        let m1 = append(&f, "first").await;
        let m2 = append(&f, "second").await;
        let m3 = append(&f, "third").await;

        let session = f.sessions.get(&f.session_id, "t1", "u1").await.unwrap().unwrap();
        assert_eq!(session.message_count, 3);

        let receipt = f
            .summaries
            .create(
                &f.session_id,
                "t1",
                "u1",
                "user asked about two things",
                SummarySpan { from: 1, to: 2 },
                None,
                vec![m1.clone(), m2.clone()],
            )
            .await
            .unwrap();
        assert_eq!(receipt.superseded, vec![m1.clone(), m2.clone()]);
        assert!(receipt.failed.is_empty());

        // Default reads exclude the folded messages.
        let visible = f.log.list(&f.session_id, "t1", "u1", false).await.unwrap();
        let ids: Vec<&str> = visible.iter().map(|m| m.message_id.as_str()).collect();
        assert_eq!(ids, [m3.as_str()]);

        // Superseded messages remain visible on request, with retention ttl.
        let all = f.log.list(&f.session_id, "t1", "u1", true).await.unwrap();
        assert_eq!(all.len(), 3);
        let folded = all.iter().find(|m| m.message_id == m1).unwrap();
        assert!(folded.superseded);
        assert_eq!(folded.ttl, Some(THIRTY_DAYS));

        let listed = f.summaries.list(&f.session_id, "t1", "u1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].supersedes.len(), 2);
        assert_eq!(listed[0].span, SummarySpan { from: 1, to: 2 });
    }

    #[tokio::test]
    async fn double_claim_is_a_conflict() {
        let f = fixture().await;
        let m1 = append(&f, "first").await;

        f.summaries
            .create(
                &f.session_id,
                "t1",
                "u1",
                "summary one",
                SummarySpan { from: 1, to: 1 },
                None,
                vec![m1.clone()],
            )
            .await
            .unwrap();

        let err = f
            .summaries
            .create(
                &f.session_id,
                "t1",
                "u1",
                "summary two",
                SummarySpan { from: 1, to: 1 },
                None,
                vec![m1],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ItineraError::Conflict(_)));

        // The conflicting summary was never written.
        let listed = f.summaries.list(&f.session_id, "t1", "u1").await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn missing_message_goes_to_failed_list() {
        let f = fixture().await;
        let m1 = append(&f, "first").await;

        let receipt = f
            .summaries
            .create(
                &f.session_id,
                "t1",
                "u1",
                "summary",
                SummarySpan { from: 1, to: 2 },
                None,
                vec![m1.clone(), "msg_missing000".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(receipt.superseded, vec![m1]);
        assert_eq!(receipt.failed, vec!["msg_missing000".to_string()]);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let f = fixture().await;
        let m1 = append(&f, "first").await;
        let m2 = append(&f, "second").await;

        f.summaries
            .create(&f.session_id, "t1", "u1", "older", SummarySpan { from: 1, to: 1 }, None, vec![m1])
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        f.summaries
            .create(&f.session_id, "t1", "u1", "newer", SummarySpan { from: 2, to: 2 }, None, vec![m2])
            .await
            .unwrap();

        let listed = f.summaries.list(&f.session_id, "t1", "u1").await.unwrap();
        let texts: Vec<&str> = listed.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, ["newer", "older"]);
    }

    /// Store wrapper that fails message upserts carrying `superseded=true`:
    /// the summary lands but the markings cannot.
    struct NoMarkStore<S>(S);

    #[async_trait]
    impl<S: DocumentStore> DocumentStore for NoMarkStore<S> {
        async fn read(
            &self,
            container: Container,
            id: &str,
            pk: &PartitionKey,
        ) -> Result<Option<Value>, ItineraError> {
            self.0.read(container, id, pk).await
        }

        async fn query(
            &self,
            container: Container,
            query: DocumentQuery,
        ) -> Result<Vec<Value>, ItineraError> {
            self.0.query(container, query).await
        }

        async fn upsert(
            &self,
            container: Container,
            pk: &PartitionKey,
            doc: Value,
        ) -> Result<(), ItineraError> {
            if container == Container::Messages && doc["superseded"] == true {
                return Err(ItineraError::StoreUnavailable {
                    source: "marking disabled".into(),
                });
            }
            self.0.upsert(container, pk, doc).await
        }

        async fn patch(
            &self,
            container: Container,
            id: &str,
            pk: &PartitionKey,
            ops: Vec<itinera_core::traits::PatchOp>,
        ) -> Result<(), ItineraError> {
            self.0.patch(container, id, pk, ops).await
        }
    }

    #[tokio::test]
    async fn marking_failures_do_not_roll_back_the_summary() {
        let inner = SqliteDocumentStore::open_in_memory().await.unwrap();
        let store: Arc<dyn DocumentStore> = Arc::new(NoMarkStore(inner));
        let sessions = SessionStore::new(store.clone());
        let log = MessageLog::new(store.clone(), sessions.clone());
        let summaries = SummaryStore::new(store, THIRTY_DAYS);
        let session = sessions.create("t1", "u1", "planner", None).await.unwrap();
        let receipt = log
            .append(
                &session.session_id,
                "t1",
                "u1",
                NewMessage {
                    role: "user".into(),
                    content: "first".into(),
                    ..NewMessage::default()
                },
            )
            .await
            .unwrap();

        let summary_receipt = summaries
            .create(
                &session.session_id,
                "t1",
                "u1",
                "summary",
                SummarySpan { from: 1, to: 1 },
                None,
                vec![receipt.message_id.clone()],
            )
            .await
            .unwrap();
        assert!(summary_receipt.superseded.is_empty());
        assert_eq!(summary_receipt.failed, vec![receipt.message_id.clone()]);

        // The summary exists despite the marking failure.
        let listed = summaries.list(&session.session_id, "t1", "u1").await.unwrap();
        assert_eq!(listed.len(), 1);
        // And the message is still visible in default reads.
        let visible = log.list(&session.session_id, "t1", "u1", false).await.unwrap();
        assert_eq!(visible.len(), 1);
    }
}
