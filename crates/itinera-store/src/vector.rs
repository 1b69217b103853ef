// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cosine distance over stored embeddings.
//!
//! SQLite has no native vector type, so embeddings live inside the JSON
//! body and ranking happens in Rust after the exact filters have run.

use serde_json::Value;

/// Cosine similarity between two vectors. Returns 0.0 when either norm is
/// zero or the dimensions disagree.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Cosine distance, `1 - similarity`. Smaller means more similar.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Extract a numeric array field from a document as an embedding vector.
///
/// Returns `None` when the field is absent, not an array, or contains
/// non-numeric elements.
pub fn embedding_field(doc: &Value, field: &str) -> Option<Vec<f32>> {
    let array = doc.get(field)?.as_array()?;
    let mut out = Vec::with_capacity(array.len());
    for v in array {
        out.push(v.as_f64()? as f32);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_vectors_have_zero_distance() {
        let v = vec![0.3, 0.5, 0.2];
        assert!(cosine_distance(&v, &v).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_distance_one() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!((cosine_distance(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_have_distance_two() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_distance(&a, &b) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn mismatched_dimensions_yield_zero_similarity() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn zero_norm_is_not_a_division_error() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn embedding_field_parses_numeric_arrays() {
        let doc = json!({"embedding": [0.1, 0.2, 0.3]});
        let v = embedding_field(&doc, "embedding").unwrap();
        assert_eq!(v.len(), 3);
        assert!((v[1] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn embedding_field_rejects_non_numeric() {
        let doc = json!({"embedding": [0.1, "x"]});
        assert!(embedding_field(&doc, "embedding").is_none());
        let doc = json!({"embedding": "not-an-array"});
        assert!(embedding_field(&doc, "embedding").is_none());
        let doc = json!({});
        assert!(embedding_field(&doc, "embedding").is_none());
    }
}
