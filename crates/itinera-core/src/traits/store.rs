// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The document store contract.
//!
//! Every domain store receives an `Arc<dyn DocumentStore>` at construction.
//! There are no global client handles; the store's lifecycle belongs to
//! whoever constructed it.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ItineraError;
use crate::types::{Container, PartitionKey};

/// A single equality-or-threshold predicate over a top-level document field.
#[derive(Debug, Clone)]
pub enum Filter {
    /// `field = value` (string, number, or boolean).
    Eq { field: String, value: Value },
    /// `field >= value` for numeric fields (salience threshold).
    Gte { field: String, value: f64 },
    /// `field IN (values)` for string fields (memory type sets).
    In { field: String, values: Vec<String> },
    /// `field` is absent, null, or `false` — the default-read exclusion
    /// used for `superseded`.
    NotTrue { field: String },
}

/// Sort order on a top-level document field.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

/// Vector-similarity ranking over a stored embedding field.
///
/// Candidates surviving the exact filters are ranked by cosine distance to
/// `query`, ascending (most similar first); candidates farther than
/// `max_distance` are discarded.
#[derive(Debug, Clone)]
pub struct VectorRank {
    pub field: String,
    pub query: Vec<f32>,
    pub max_distance: f32,
}

/// A filtering query against one container.
///
/// When `partition_key` is `None` the query is a cross-partition scan.
/// `vector` and `order_by` are mutually exclusive; when both are present
/// the vector ranking wins.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    pub partition_key: Option<PartitionKey>,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub vector: Option<VectorRank>,
    pub top: Option<usize>,
}

impl DocumentQuery {
    /// Scope the query to a single partition.
    pub fn within(mut self, pk: PartitionKey) -> Self {
        self.partition_key = Some(pk);
        self
    }

    /// Add an equality predicate.
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    /// Add a numeric `>=` predicate.
    pub fn gte(mut self, field: &str, value: f64) -> Self {
        self.filters.push(Filter::Gte {
            field: field.to_string(),
            value,
        });
        self
    }

    /// Add a string set-membership predicate.
    pub fn one_of(mut self, field: &str, values: Vec<String>) -> Self {
        self.filters.push(Filter::In {
            field: field.to_string(),
            values,
        });
        self
    }

    /// Exclude documents where `field` is `true`.
    pub fn not_true(mut self, field: &str) -> Self {
        self.filters.push(Filter::NotTrue {
            field: field.to_string(),
        });
        self
    }

    /// Sort descending on `field`.
    pub fn order_desc(mut self, field: &str) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            descending: true,
        });
        self
    }

    /// Sort ascending on `field`.
    pub fn order_asc(mut self, field: &str) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            descending: false,
        });
        self
    }

    /// Rank by cosine distance to `query` over the embedding in `field`.
    pub fn rank_by_vector(mut self, field: &str, query: Vec<f32>, max_distance: f32) -> Self {
        self.vector = Some(VectorRank {
            field: field.to_string(),
            query,
            max_distance,
        });
        self
    }

    /// Return at most `n` documents.
    pub fn top(mut self, n: usize) -> Self {
        self.top = Some(n);
        self
    }
}

/// One step of a partial update against a document.
///
/// Paths are single-field JSON-pointer style, e.g. `/activeAgent`.
#[derive(Debug, Clone)]
pub enum PatchOp {
    /// Set the field, creating it if absent.
    Add { path: String, value: Value },
    /// Set the field; fails if the field is absent.
    Replace { path: String, value: Value },
}

impl PatchOp {
    /// The target field name with the leading `/` stripped.
    pub fn field(&self) -> &str {
        let path = match self {
            PatchOp::Add { path, .. } => path,
            PatchOp::Replace { path, .. } => path,
        };
        path.strip_prefix('/').unwrap_or(path)
    }
}

/// Keyed document storage with partitioned filtering queries, partial
/// updates, and TTL-driven expiry.
///
/// Single-document writes are atomic; nothing spanning documents is. A
/// positive numeric `ttl` field (seconds) on an upserted document schedules
/// its expiry; a non-positive sentinel means "no expiration" and must be
/// treated as if the field were absent.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point lookup by id within a partition. `None` when absent or expired.
    async fn read(
        &self,
        container: Container,
        id: &str,
        partition_key: &PartitionKey,
    ) -> Result<Option<Value>, ItineraError>;

    /// Filtering query, optionally partition-scoped.
    async fn query(
        &self,
        container: Container,
        query: DocumentQuery,
    ) -> Result<Vec<Value>, ItineraError>;

    /// Insert-or-overwrite by the document's `id` field.
    async fn upsert(
        &self,
        container: Container,
        partition_key: &PartitionKey,
        doc: Value,
    ) -> Result<(), ItineraError>;

    /// Apply ordered patch operations to one document atomically.
    async fn patch(
        &self,
        container: Container,
        id: &str,
        partition_key: &PartitionKey,
        ops: Vec<PatchOp>,
    ) -> Result<(), ItineraError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_builder_accumulates_filters() {
        let q = DocumentQuery::default()
            .eq("sessionId", "session_abc")
            .gte("salience", 0.5)
            .one_of("memoryType", vec!["episodic".into()])
            .not_true("superseded")
            .order_desc("ts")
            .top(5);

        assert_eq!(q.filters.len(), 4);
        assert!(q.order_by.as_ref().unwrap().descending);
        assert_eq!(q.top, Some(5));
        assert!(q.partition_key.is_none(), "defaults to cross-partition");
    }

    #[test]
    fn patch_op_field_strips_leading_slash() {
        let op = PatchOp::Replace {
            path: "/activeAgent".into(),
            value: json!("planner"),
        };
        assert_eq!(op.field(), "activeAgent");

        let bare = PatchOp::Add {
            path: "activeAgent".into(),
            value: json!("planner"),
        };
        assert_eq!(bare.field(), "activeAgent");
    }

    #[test]
    fn vector_rank_carries_threshold() {
        let q = DocumentQuery::default().rank_by_vector("embedding", vec![0.1, 0.2], 0.075);
        let rank = q.vector.unwrap();
        assert_eq!(rank.field, "embedding");
        assert!((rank.max_distance - 0.075).abs() < f32::EPSILON);
    }
}
