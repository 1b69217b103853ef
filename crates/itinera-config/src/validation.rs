// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of configuration values.
//!
//! Figment catches structural problems (unknown keys, type mismatches);
//! this pass catches values that parse but make no sense.

use itinera_core::ItineraError;

use crate::model::ItineraConfig;

/// Validate a deserialized configuration.
///
/// All problems are collected into a single `Config` error so the operator
/// sees every issue at once rather than one per restart.
pub fn validate_config(config: &ItineraConfig) -> Result<(), ItineraError> {
    let mut problems = Vec::new();

    if config.store.database_path.trim().is_empty() {
        problems.push("store.database_path must not be empty".to_string());
    }

    if config.embedding.dimensions == 0 {
        problems.push("embedding.dimensions must be at least 1".to_string());
    }
    if config.embedding.request_timeout_secs == 0 {
        problems.push("embedding.request_timeout_secs must be at least 1".to_string());
    }
    if config.embedding.endpoint.trim().is_empty() {
        problems.push("embedding.endpoint must not be empty".to_string());
    }

    let threshold = config.retrieval.place_distance_threshold;
    if !(0.0..=1.0).contains(&threshold) || threshold == 0.0 {
        problems.push(format!(
            "retrieval.place_distance_threshold must be in (0.0, 1.0], got {threshold}"
        ));
    }
    if config.retrieval.place_top_k == 0 {
        problems.push("retrieval.place_top_k must be at least 1".to_string());
    }
    if config.retrieval.memory_top_k == 0 {
        problems.push("retrieval.memory_top_k must be at least 1".to_string());
    }
    if config.retrieval.message_retention_days <= 0 {
        problems.push("retrieval.message_retention_days must be positive".to_string());
    }
    if config.retrieval.episodic_ttl_days <= 0 {
        problems.push("retrieval.episodic_ttl_days must be positive".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ItineraError::Config(problems.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ItineraConfig::default()).is_ok());
    }

    #[test]
    fn zero_dimensions_is_rejected() {
        let mut config = ItineraConfig::default();
        config.embedding.dimensions = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("embedding.dimensions"));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut config = ItineraConfig::default();
        config.retrieval.place_distance_threshold = 1.5;
        assert!(validate_config(&config).is_err());

        config.retrieval.place_distance_threshold = 0.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn all_problems_are_reported_together() {
        let mut config = ItineraConfig::default();
        config.embedding.dimensions = 0;
        config.retrieval.place_top_k = 0;
        let err = validate_config(&config).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("embedding.dimensions"));
        assert!(text.contains("retrieval.place_top_k"));
    }
}
