// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the domain layer and its external collaborators.

pub mod embedding;
pub mod store;

pub use embedding::{Embedder, embed_or_none};
pub use store::{DocumentQuery, DocumentStore, Filter, OrderBy, PatchOp, VectorRank};
