// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Itinera persistence layer.

use thiserror::Error;

/// The primary error type used across the Itinera workspace.
///
/// "Not found" is never an error: lookups return `Option<T>` so callers can
/// distinguish an absent document from a store they could not reach.
#[derive(Debug, Error)]
pub enum ItineraError {
    /// Configuration errors (invalid TOML, missing required fields, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The document store cannot be reached or a primary write failed.
    #[error("store unavailable: {source}")]
    StoreUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A malformed or failed query against the document store.
    #[error("query error: {message}")]
    Query {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A write that would violate a uniqueness rule, e.g. a summary
    /// claiming a message another summary already superseded.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Embedding service errors (unreachable endpoint, dimension mismatch).
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
