// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The embedding service contract.

use async_trait::async_trait;
use tracing::warn;

use crate::error::ItineraError;

/// Maps text to a fixed-length vector.
///
/// Treated as a black box: it returns a vector of `dimensions()` length or
/// fails. Callers on critical paths (place search) propagate the failure;
/// non-critical callers go through [`embed_or_none`].
#[async_trait]
pub trait Embedder: Send + Sync {
    /// The fixed output dimension of this embedder.
    fn dimensions(&self) -> usize;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ItineraError>;
}

/// Fail-soft embedding for non-critical paths.
///
/// Empty text and service failures both yield `None`; failures are logged
/// so they stay observable without failing the caller.
pub async fn embed_or_none(embedder: &dyn Embedder, text: &str) -> Option<Vec<f32>> {
    if text.trim().is_empty() {
        return None;
    }
    match embedder.embed(text).await {
        Ok(vector) => Some(vector),
        Err(e) => {
            warn!(error = %e, "embedding failed, continuing without vector");
            None
        }
    }
}
