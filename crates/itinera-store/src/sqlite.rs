// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed `DocumentStore` implementation.
//!
//! Documents are stored as JSON bodies in a single `documents` table keyed
//! by `(container, id, partition_key)`. Exact filters compile to
//! `json_extract` predicates; vector ranking runs in Rust over the rows
//! that survive the exact filters. Expired documents are purged lazily
//! before every read and query.

use std::fmt;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{OptionalExtension, params, params_from_iter};
use serde_json::Value;
use tracing::{debug, warn};

use itinera_core::{Container, DocumentQuery, DocumentStore, Filter, ItineraError, PartitionKey};
use itinera_core::traits::PatchOp;

use crate::database::{Database, map_tr_err};
use crate::vector::{cosine_distance, embedding_field};

/// A patch that failed for a document-level reason (missing document or
/// replacing an absent field) rather than a storage fault. Carried through
/// the call closure's boxed error and downcast on the way out.
#[derive(Debug)]
struct PatchFailure(String);

impl fmt::Display for PatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for PatchFailure {}

/// `DocumentStore` over a single SQLite database.
pub struct SqliteDocumentStore {
    db: Database,
}

impl SqliteDocumentStore {
    /// Open (or create) the store at `path`.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, ItineraError> {
        let db = Database::open_with(path, wal_mode).await?;
        Ok(Self { db })
    }

    /// In-memory store for tests.
    pub async fn open_in_memory() -> Result<Self, ItineraError> {
        let db = Database::open_in_memory().await?;
        Ok(Self { db })
    }

    /// Checkpoint and release the underlying database.
    pub async fn close(&self) -> Result<(), ItineraError> {
        self.db.close().await
    }

    /// Delete every document whose expiry has passed. Runs before each
    /// read so expired documents are never observable.
    async fn purge_expired(&self) -> Result<(), ItineraError> {
        let now = itinera_core::ids::now_rfc3339();
        let purged = self
            .db
            .connection()
            .call(move |conn| {
                let n = conn.execute(
                    "DELETE FROM documents WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                    params![now],
                )?;
                Ok(n)
            })
            .await
            .map_err(map_tr_err)?;
        if purged > 0 {
            debug!(purged, "purged expired documents");
        }
        Ok(())
    }
}

/// Field names come from code, not user input, but the SQL is built by
/// string interpolation so reject anything outside `[A-Za-z0-9_]`.
fn validate_field(field: &str) -> Result<(), ItineraError> {
    if !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ItineraError::Query {
            message: format!("invalid field name {field:?}"),
            source: None,
        })
    }
}

/// Map a JSON scalar to an SQL parameter comparable against `json_extract`
/// output (SQLite's JSON1 surfaces booleans as 0/1 integers).
fn scalar_param(value: &Value) -> Result<SqlValue, ItineraError> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(SqlValue::Real(f))
            } else {
                Err(ItineraError::Query {
                    message: format!("unrepresentable number {n}"),
                    source: None,
                })
            }
        }
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        other => Err(ItineraError::Query {
            message: format!("non-scalar filter value {other}"),
            source: None,
        }),
    }
}

/// Compile a `DocumentQuery` into SQL text plus positional parameters.
/// The `LIMIT` is only pushed down when no vector ranking follows, since
/// ranking reorders the candidate set.
fn build_sql(
    container: Container,
    query: &DocumentQuery,
    now: &str,
) -> Result<(String, Vec<SqlValue>), ItineraError> {
    // The purge before each call removes expired rows, but a row can cross
    // its deadline between that DELETE and this SELECT; the guard keeps it
    // from ever being observed.
    let mut sql = String::from(
        "SELECT body FROM documents WHERE container = ?
         AND (expires_at IS NULL OR expires_at > ?)",
    );
    let mut binds: Vec<SqlValue> = vec![
        SqlValue::Text(container.to_string()),
        SqlValue::Text(now.to_string()),
    ];

    if let Some(pk) = &query.partition_key {
        sql.push_str(" AND partition_key = ?");
        binds.push(SqlValue::Text(pk.joined()));
    }

    for filter in &query.filters {
        match filter {
            Filter::Eq { field, value } => {
                validate_field(field)?;
                sql.push_str(&format!(" AND json_extract(body, '$.{field}') = ?"));
                binds.push(scalar_param(value)?);
            }
            Filter::Gte { field, value } => {
                validate_field(field)?;
                sql.push_str(&format!(" AND json_extract(body, '$.{field}') >= ?"));
                binds.push(SqlValue::Real(*value));
            }
            Filter::In { field, values } => {
                validate_field(field)?;
                if values.is_empty() {
                    return Err(ItineraError::Query {
                        message: format!("empty IN set for field {field:?}"),
                        source: None,
                    });
                }
                let placeholders = vec!["?"; values.len()].join(", ");
                sql.push_str(&format!(
                    " AND json_extract(body, '$.{field}') IN ({placeholders})"
                ));
                for v in values {
                    binds.push(SqlValue::Text(v.clone()));
                }
            }
            Filter::NotTrue { field } => {
                validate_field(field)?;
                // Absent and null both extract to NULL; false extracts to 0.
                sql.push_str(&format!(
                    " AND COALESCE(json_extract(body, '$.{field}'), 0) = 0"
                ));
            }
        }
    }

    if query.vector.is_none() {
        if let Some(order) = &query.order_by {
            validate_field(&order.field)?;
            let dir = if order.descending { "DESC" } else { "ASC" };
            sql.push_str(&format!(
                " ORDER BY json_extract(body, '$.{}') {dir}",
                order.field
            ));
        }
        if let Some(top) = query.top {
            sql.push_str(" LIMIT ?");
            binds.push(SqlValue::Integer(top as i64));
        }
    }

    Ok((sql, binds))
}

/// Rank candidates by cosine distance to the query vector, ascending.
/// Documents without a parseable embedding of matching dimension are
/// skipped, as are those beyond `max_distance`.
fn rank_candidates(
    docs: Vec<Value>,
    field: &str,
    query: &[f32],
    max_distance: f32,
    top: Option<usize>,
) -> Vec<Value> {
    let mut ranked: Vec<(f32, Value)> = Vec::new();
    for doc in docs {
        let Some(embedding) = embedding_field(&doc, field) else {
            continue;
        };
        if embedding.len() != query.len() {
            warn!(
                expected = query.len(),
                actual = embedding.len(),
                "skipping document with mismatched embedding dimensions"
            );
            continue;
        }
        let distance = cosine_distance(query, &embedding);
        if distance <= max_distance {
            ranked.push((distance, doc));
        }
    }
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
    if let Some(top) = top {
        ranked.truncate(top);
    }
    ranked.into_iter().map(|(_, doc)| doc).collect()
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn read(
        &self,
        container: Container,
        id: &str,
        partition_key: &PartitionKey,
    ) -> Result<Option<Value>, ItineraError> {
        self.purge_expired().await?;
        let id = id.to_string();
        let pk = partition_key.joined();
        let now = itinera_core::ids::now_rfc3339();
        let body: Option<String> = self
            .db
            .connection()
            .call(move |conn| {
                let row = conn
                    .query_row(
                        "SELECT body FROM documents
                         WHERE container = ?1 AND id = ?2 AND partition_key = ?3
                         AND (expires_at IS NULL OR expires_at > ?4)",
                        params![container.to_string(), id, pk, now],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(map_tr_err)?;
        match body {
            Some(raw) => {
                let doc = serde_json::from_str(&raw).map_err(|e| ItineraError::Query {
                    message: "stored document is not valid JSON".to_string(),
                    source: Some(Box::new(e)),
                })?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    async fn query(
        &self,
        container: Container,
        query: DocumentQuery,
    ) -> Result<Vec<Value>, ItineraError> {
        if let Some(rank) = &query.vector {
            if rank.query.is_empty() {
                return Err(ItineraError::Query {
                    message: "vector ranking requires a non-empty query vector".to_string(),
                    source: None,
                });
            }
        }
        self.purge_expired().await?;
        let now = itinera_core::ids::now_rfc3339();
        let (sql, binds) = build_sql(container, &query, &now)?;
        let bodies: Vec<String> = self
            .db
            .connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params_from_iter(binds), |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;

        let mut docs = Vec::with_capacity(bodies.len());
        for raw in bodies {
            let doc = serde_json::from_str(&raw).map_err(|e| ItineraError::Query {
                message: "stored document is not valid JSON".to_string(),
                source: Some(Box::new(e)),
            })?;
            docs.push(doc);
        }

        if let Some(rank) = &query.vector {
            docs = rank_candidates(docs, &rank.field, &rank.query, rank.max_distance, query.top);
        }
        Ok(docs)
    }

    async fn upsert(
        &self,
        container: Container,
        partition_key: &PartitionKey,
        doc: Value,
    ) -> Result<(), ItineraError> {
        let id = doc
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ItineraError::Query {
                message: "document has no string `id` field".to_string(),
                source: None,
            })?;

        // A positive numeric ttl (seconds) schedules expiry relative to
        // now; zero, negative, or absent means the document never expires.
        let expires_at = doc
            .get("ttl")
            .and_then(Value::as_i64)
            .filter(|secs| *secs > 0)
            .map(|secs| {
                (Utc::now() + Duration::seconds(secs))
                    .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                    .to_string()
            });

        let body = doc.to_string();
        let pk = partition_key.joined();
        let now = itinera_core::ids::now_rfc3339();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO documents (container, id, partition_key, body, expires_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT (container, id, partition_key) DO UPDATE SET
                         body = excluded.body,
                         expires_at = excluded.expires_at,
                         updated_at = excluded.updated_at",
                    params![container.to_string(), id, pk, body, expires_at, now],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn patch(
        &self,
        container: Container,
        id: &str,
        partition_key: &PartitionKey,
        ops: Vec<PatchOp>,
    ) -> Result<(), ItineraError> {
        for op in &ops {
            validate_field(op.field())?;
        }
        let id = id.to_string();
        let pk = partition_key.joined();
        let now = itinera_core::ids::now_rfc3339();
        self.db
            .connection()
            .call(
                move |conn| -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
                let tx = conn.transaction()?;
                let body: Option<String> = tx
                    .query_row(
                        "SELECT body FROM documents
                         WHERE container = ?1 AND id = ?2 AND partition_key = ?3",
                        params![container.to_string(), id, pk],
                        |row| row.get(0),
                    )
                    .optional()?;
                let Some(raw) = body else {
                    return Err(Box::new(PatchFailure(
                        format!("document {id} not found in {container}"),
                    )));
                };
                let mut doc: Value = serde_json::from_str(&raw)?;
                let Some(map) = doc.as_object_mut() else {
                    return Err(Box::new(PatchFailure(
                        format!("document {id} is not a JSON object"),
                    )));
                };
                for op in &ops {
                    let field = op.field().to_string();
                    match op {
                        PatchOp::Add { value, .. } => {
                            map.insert(field, value.clone());
                        }
                        PatchOp::Replace { value, .. } => {
                            if !map.contains_key(&field) {
                                return Err(Box::new(PatchFailure(format!(
                                    "cannot replace absent field {field:?} on {id}"
                                ))));
                            }
                            map.insert(field, value.clone());
                        }
                    }
                }
                tx.execute(
                    "UPDATE documents SET body = ?1, updated_at = ?2
                     WHERE container = ?3 AND id = ?4 AND partition_key = ?5",
                    params![doc.to_string(), now, container.to_string(), id, pk],
                )?;
                tx.commit()?;
                Ok(())
                },
            )
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Error(inner) if inner.is::<PatchFailure>() => {
                    ItineraError::Query {
                        message: inner.to_string(),
                        source: None,
                    }
                }
                tokio_rusqlite::Error::Error(source) => ItineraError::StoreUnavailable { source },
                tokio_rusqlite::Error::Close(c) => map_tr_err(tokio_rusqlite::Error::Close(c)),
                other => ItineraError::StoreUnavailable {
                    source: other.to_string().into(),
                },
            })
    }
}
