// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Itinera workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The logical containers the document store exposes.
///
/// Each container holds one entity kind. The store is free to map these to
/// tables, collections, or physical containers as it sees fit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Sessions,
    Messages,
    Summaries,
    Memories,
    Places,
    Trips,
    Users,
    Events,
    DebugLogs,
}

/// Hierarchical partition key for a document.
///
/// Records sharing a conversation or a geographic scope share a partition so
/// range queries over them stay cheap. The component order is fixed per
/// entity kind and must match on every read of the same document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionKey(Vec<String>);

impl PartitionKey {
    /// Build a partition key from raw components.
    pub fn new<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(components.into_iter().map(Into::into).collect())
    }

    /// `(tenantId, userId, sessionId)` — sessions, messages, and summaries.
    pub fn conversation(tenant_id: &str, user_id: &str, session_id: &str) -> Self {
        Self::new([tenant_id, user_id, session_id])
    }

    /// `(tenantId, userId, memoryId)` — user memories.
    pub fn memory(tenant_id: &str, user_id: &str, memory_id: &str) -> Self {
        Self::new([tenant_id, user_id, memory_id])
    }

    /// `(tenantId, userId, tripId)` — trips.
    pub fn trip(tenant_id: &str, user_id: &str, trip_id: &str) -> Self {
        Self::new([tenant_id, user_id, trip_id])
    }

    /// `(tenantId, userId)` — user profiles.
    pub fn user(tenant_id: &str, user_id: &str) -> Self {
        Self::new([tenant_id, user_id])
    }

    /// `(tenantId, sessionId)` — API events, which carry no user.
    pub fn event(tenant_id: &str, session_id: &str) -> Self {
        Self::new([tenant_id, session_id])
    }

    /// `geoScopeId` alone — the shared place catalog.
    pub fn geo(geo_scope_id: &str) -> Self {
        Self::new([geo_scope_id])
    }

    /// The key components in order.
    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// Canonical string form used by stores that key on a single column.
    pub fn joined(&self) -> String {
        self.0.join("/")
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.joined())
    }
}
