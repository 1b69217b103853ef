// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain document types.
//!
//! Every entity serializes to the camelCase JSON shape the document store
//! holds; `serde_json::to_value`/`from_value` is the only translation
//! between these structs and stored documents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// One conversation between a user and the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub session_id: String,
    pub tenant_id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_agent: Option<String>,
    pub created_at: String,
    pub last_activity_at: String,
    pub status: String,
    pub message_count: i64,
}

/// One conversation turn. Immutable after append except for the single
/// `superseded` transition, which also attaches a retention `ttl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub message_id: String,
    pub session_id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub ts: String,
    pub keywords: Vec<String>,
    pub superseded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
}

/// The message-index span a summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySpan {
    pub from: i64,
    pub to: i64,
}

/// A compaction of a span of messages into one record. `supersedes` lists
/// the message ids it folds; those sets are disjoint across summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub id: String,
    pub summary_id: String,
    pub session_id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub span: SummarySpan,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: String,
    pub supersedes: Vec<String>,
}

/// Memory category. Episodic memories decay; the other kinds are durable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    Declarative,
    Episodic,
    Procedural,
}

/// A durable, salience-ranked fact about a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: String,
    pub memory_id: String,
    pub user_id: String,
    pub tenant_id: String,
    pub memory_type: MemoryType,
    pub text: String,
    pub facets: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub salience: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    pub justification: String,
    pub last_used_at: String,
    pub extracted_at: String,
}

/// A point of interest in the shared catalog, keyed by geographic scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub geo_scope_id: String,
    #[serde(rename = "type")]
    pub place_type: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub accessibility: Vec<String>,
    pub hours: Value,
    pub price_tier: i64,
    pub rating: f64,
    #[serde(default)]
    pub embedding: Vec<f32>,
}

/// A geographic catalog partition with a human-readable label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoScope {
    pub id: String,
    pub display_name: String,
}

/// A planned trip within one geographic scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub trip_id: String,
    pub user_id: String,
    pub tenant_id: String,
    pub scope: Value,
    pub dates: Value,
    pub travelers: Vec<String>,
    pub constraints: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_duration: Option<i64>,
    pub days: Vec<Value>,
    pub status: String,
}

/// A user profile within a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub user_id: String,
    pub tenant_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Map<String, Value>,
    pub created_at: String,
}

/// One call against an external provider, recorded for auditability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    pub id: String,
    pub event_id: String,
    pub session_id: String,
    pub tenant_id: String,
    pub provider: String,
    pub operation: String,
    pub request: Value,
    pub response: Value,
    pub ts: String,
    pub keywords: Vec<String>,
}

/// One key/value observation inside a debug log's property bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyEntry {
    pub key: String,
    pub value: Value,
    pub time_stamp: String,
}

/// A per-turn diagnostic record: which agent handled the turn, token
/// accounting, and model metadata, flattened into a property bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugLog {
    pub id: String,
    pub debug_log_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(rename = "type")]
    pub log_type: String,
    pub session_id: String,
    pub tenant_id: String,
    pub user_id: String,
    pub time_stamp: String,
    pub property_bag: Vec<PropertyEntry>,
}

/// Outcome of a message append. The message write either succeeded or the
/// whole call failed; the session activity bump is best-effort and its
/// result is reported here instead of being silently swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReceipt {
    pub message_id: String,
    pub activity_recorded: bool,
}

/// Outcome of summary creation. The summary itself always exists when this
/// is returned; `failed` lists message ids whose supersession marking did
/// not stick, for caller-driven reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryReceipt {
    pub summary_id: String,
    pub superseded: Vec<String>,
    pub failed: Vec<String>,
}

/// How an agent handoff was recorded. Handoff bookkeeping is best-effort;
/// even `Failed` is not an error to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffOutcome {
    /// Targeted field-level patch succeeded.
    Patched,
    /// Patch failed; full read-modify-write fallback succeeded.
    Upserted,
    /// Both attempts failed; the handoff was not recorded.
    Failed,
}
