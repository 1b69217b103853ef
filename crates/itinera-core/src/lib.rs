// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Itinera persistence and retrieval layer.
//!
//! This crate provides the foundational error type, the identity and
//! partitioning scheme, and the trait contracts for the two external
//! collaborators: the document store and the embedding service.

pub mod error;
pub mod ids;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ItineraError;
pub use traits::{
    DocumentQuery, DocumentStore, Embedder, Filter, OrderBy, PatchOp, VectorRank, embed_or_none,
};
pub use types::{Container, PartitionKey};
