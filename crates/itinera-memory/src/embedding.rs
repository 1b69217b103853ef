// SPDX-FileCopyrightText: 2026 Itinera Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP embedding client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use itinera_config::EmbeddingConfig;
use itinera_core::{Embedder, ItineraError};

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// `Embedder` backed by an HTTP embedding service.
///
/// Sends `{"model", "input"}` and expects `{"embedding": [..]}` back.
/// Responses whose vector length differs from the configured dimension are
/// rejected rather than silently stored.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, ItineraError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ItineraError::Embedding {
                message: "failed to build HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ItineraError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await
            .map_err(|e| ItineraError::Embedding {
                message: format!("embedding request to {} failed", self.endpoint),
                source: Some(Box::new(e)),
            })?;
        if !response.status().is_success() {
            return Err(ItineraError::Embedding {
                message: format!("embedding service returned {}", response.status()),
                source: None,
            });
        }
        let body: EmbedResponse = response.json().await.map_err(|e| ItineraError::Embedding {
            message: "malformed embedding response".to_string(),
            source: Some(Box::new(e)),
        })?;
        if body.embedding.len() != self.dimensions {
            return Err(ItineraError::Embedding {
                message: format!(
                    "expected {} dimensions, got {}",
                    self.dimensions,
                    body.embedding.len()
                ),
                source: None,
            });
        }
        Ok(body.embedding)
    }
}
