// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Itinera persistence layer.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Itinera configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ItineraConfig {
    /// Document store backend settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Embedding service settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Retrieval and retention policy settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Document store backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("itinera").join("itinera.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("itinera.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Embedding service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// HTTP endpoint of the embedding service.
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,

    /// Embedding model identifier sent with each request.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Expected output vector dimension. Responses of any other length
    /// are rejected.
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            dimensions: default_embedding_dimensions(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_embedding_endpoint() -> String {
    "http://127.0.0.1:8089/embed".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimensions() -> usize {
    1536
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Retrieval and retention policy configuration.
///
/// Retention rules are fixed policy, configured here rather than supplied
/// per call, so they stay centrally auditable.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Maximum cosine distance for a place to qualify as a match (0.0-1.0).
    #[serde(default = "default_place_distance_threshold")]
    pub place_distance_threshold: f64,

    /// Maximum number of places returned per query.
    #[serde(default = "default_place_top_k")]
    pub place_top_k: usize,

    /// Maximum number of memories returned per query.
    #[serde(default = "default_memory_top_k")]
    pub memory_top_k: usize,

    /// Days a superseded message is retained before expiry.
    #[serde(default = "default_message_retention_days")]
    pub message_retention_days: i64,

    /// Lifetime in days of episodic memories. Declarative and procedural
    /// memories never expire.
    #[serde(default = "default_episodic_ttl_days")]
    pub episodic_ttl_days: i64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            place_distance_threshold: default_place_distance_threshold(),
            place_top_k: default_place_top_k(),
            memory_top_k: default_memory_top_k(),
            message_retention_days: default_message_retention_days(),
            episodic_ttl_days: default_episodic_ttl_days(),
        }
    }
}

fn default_place_distance_threshold() -> f64 {
    0.075
}

fn default_place_top_k() -> usize {
    5
}

fn default_memory_top_k() -> usize {
    5
}

fn default_message_retention_days() -> i64 {
    30
}

fn default_episodic_ttl_days() -> i64 {
    90
}
