// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-lived user memories with salience ranking and type-driven decay.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use itinera_core::{Container, DocumentQuery, DocumentStore, ItineraError, PartitionKey, ids};

use crate::sessions::to_internal;
use crate::types::{Memory, MemoryType};

/// Payload for a new memory.
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub memory_type: MemoryType,
    pub text: String,
    pub facets: Map<String, Value>,
    pub salience: f64,
    pub justification: String,
    pub embedding: Option<Vec<f32>>,
}

/// Stores and retrieves salience-ranked user memories.
#[derive(Clone)]
pub struct MemoryStore {
    store: Arc<dyn DocumentStore>,
    episodic_ttl_secs: i64,
    top_k: usize,
}

impl MemoryStore {
    /// `episodic_ttl_secs` is the decay window for episodic memories
    /// (90 days in the default configuration); `top_k` caps query results.
    pub fn new(store: Arc<dyn DocumentStore>, episodic_ttl_secs: i64, top_k: usize) -> Self {
        Self {
            store,
            episodic_ttl_secs,
            top_k,
        }
    }

    /// Retention is a function of the memory type alone, so the policy
    /// stays centrally auditable rather than caller-supplied. A
    /// non-positive configured window is the "no expiration" sentinel and
    /// is normalized away entirely.
    fn ttl_for(&self, memory_type: MemoryType) -> Option<i64> {
        match memory_type {
            MemoryType::Episodic => Some(self.episodic_ttl_secs).filter(|secs| *secs > 0),
            MemoryType::Declarative | MemoryType::Procedural => None,
        }
    }

    /// Persist a new memory.
    pub async fn store(
        &self,
        tenant_id: &str,
        user_id: &str,
        new: NewMemory,
    ) -> Result<Memory, ItineraError> {
        let id = ids::prefixed_id("mem");
        let now = ids::now_rfc3339();
        let memory = Memory {
            id: id.clone(),
            memory_id: id.clone(),
            user_id: user_id.to_string(),
            tenant_id: tenant_id.to_string(),
            memory_type: new.memory_type,
            text: new.text,
            facets: new.facets,
            embedding: new.embedding,
            salience: new.salience.clamp(0.0, 1.0),
            ttl: self.ttl_for(new.memory_type),
            justification: new.justification,
            last_used_at: now.clone(),
            extracted_at: now,
        };
        let pk = PartitionKey::memory(tenant_id, user_id, &id);
        let doc = serde_json::to_value(&memory).map_err(to_internal)?;
        self.store.upsert(Container::Memories, &pk, doc).await?;
        info!(memory_id = %id, memory_type = %memory.memory_type, user_id, "stored memory");
        Ok(memory)
    }

    /// Top-K memories for a user by recency, above a salience floor and
    /// optionally restricted to a set of types.
    ///
    /// This is a threshold-and-recency filter, not a similarity search:
    /// stored embeddings are not consulted here.
    pub async fn query(
        &self,
        tenant_id: &str,
        user_id: &str,
        memory_types: Option<&[MemoryType]>,
        min_salience: f64,
    ) -> Result<Vec<Memory>, ItineraError> {
        let mut query = DocumentQuery::default()
            .eq("userId", user_id)
            .eq("tenantId", tenant_id)
            .gte("salience", min_salience)
            .order_desc("extractedAt")
            .top(self.top_k);
        if let Some(types) = memory_types {
            if !types.is_empty() {
                query = query.one_of(
                    "memoryType",
                    types.iter().map(MemoryType::to_string).collect(),
                );
            }
        }
        let docs = self.store.query(Container::Memories, query).await?;
        debug!(user_id, count = docs.len(), "queried memories");
        let mut memories = Vec::with_capacity(docs.len());
        for doc in docs {
            memories.push(serde_json::from_value(doc).map_err(to_internal)?);
        }
        Ok(memories)
    }
}
